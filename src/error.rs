use std::io;
use std::path::PathBuf;

use colored::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotesError {
    #[error("Path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Not a Python file, skipping: {}", .0.display())]
    NotAPythonFile(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid UTF-8: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Failed to write {}, original left untouched: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error reading {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid filespec pattern '{spec}': {source}")]
    InvalidFilespec {
        spec: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to render JSON report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    Output(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, NotesError>;

impl NotesError {
    /// Warnings are reported but do not make the run fail.
    pub fn is_warning(&self) -> bool {
        matches!(self, NotesError::NotAPythonFile(_))
    }

    /// Print the error to stderr with a coloured severity prefix.
    pub fn emit(&self) {
        if self.is_warning() {
            eprintln!("{}: {}", "Warning".yellow().bold(), self);
        } else {
            eprintln!("{}: {}", "Error".red().bold(), self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_non_python_files_are_warnings() {
        assert!(NotesError::NotAPythonFile(PathBuf::from("a.txt")).is_warning());
        assert!(!NotesError::PathNotFound(PathBuf::from("missing")).is_warning());
        let write = NotesError::Write {
            path: PathBuf::from("a.py"),
            source: io::Error::other("disk full"),
        };
        assert!(!write.is_warning());
    }

    #[test]
    fn test_messages_name_the_path() {
        let err = NotesError::PathNotFound(PathBuf::from("nowhere/x.py"));
        assert_eq!(err.to_string(), "Path does not exist: nowhere/x.py");
        let err = NotesError::Write {
            path: PathBuf::from("a.py"),
            source: io::Error::other("disk full"),
        };
        assert!(err.to_string().contains("a.py"), "{err}");
        assert!(err.to_string().contains("disk full"), "{err}");
    }
}
