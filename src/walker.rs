//! Target enumeration: a single `.py` file or a directory tree walked in
//! filesystem order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{NotesError, Result};

const READ_DIR_FAIL_TAG: &str = "__pynotes_read_dir_fail__";
const FILE_TYPE_FAIL_TAG: &str = "__pynotes_file_type_fail__.py";
pub(crate) const FAULT_ENV_VAR: &str = "PYNOTES_ENABLE_FAULTS";

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub ignore: Vec<String>,
    pub non_recursive: bool,
    pub max_depth: usize,
    pub filespec: Option<Pattern>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions {
            ignore: Vec::new(),
            non_recursive: false,
            max_depth: 100,
            filespec: None,
        }
    }
}

impl WalkOptions {
    pub fn parse_filespec(spec: Option<&str>) -> Result<Option<Pattern>> {
        spec.map(|spec| {
            Pattern::new(spec).map_err(|source| NotesError::InvalidFilespec {
                spec: spec.to_string(),
                source,
            })
        })
        .transpose()
    }
}

pub(crate) fn failure_injection_enabled() -> bool {
    cfg!(test) || std::env::var_os(FAULT_ENV_VAR).is_some()
}

pub(crate) fn should_simulate_path_failure(path: &Path, needle: &str) -> bool {
    failure_injection_enabled()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name == needle)
            .unwrap_or(false)
}

fn read_dir(path: &Path) -> io::Result<fs::ReadDir> {
    if should_simulate_path_failure(path, READ_DIR_FAIL_TAG) {
        return Err(io::Error::other("simulated read_dir failure"));
    }
    fs::read_dir(path)
}

fn entry_file_type(entry: &fs::DirEntry) -> io::Result<fs::FileType> {
    if should_simulate_path_failure(&entry.path(), FILE_TYPE_FAIL_TAG) {
        return Err(io::Error::other("simulated file_type failure"));
    }
    entry.file_type()
}

pub fn is_python_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("py")
}

/// Read a whole source file as UTF-8.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| NotesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|source| NotesError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Files found under one target path plus the errors met on the way.
#[derive(Debug, Default)]
pub struct Targets {
    pub files: Vec<PathBuf>,
    pub errors: Vec<NotesError>,
}

/// Resolve a command line path into the Python files it names.
///
/// A missing path or an explicitly named non-`.py` file is returned as an
/// error. Problems below a directory are collected in `Targets::errors` and
/// the walk goes on with the next entry.
pub fn resolve_targets(path: &Path, options: &WalkOptions) -> Result<Targets> {
    let metadata = fs::metadata(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            NotesError::PathNotFound(path.to_path_buf())
        } else {
            NotesError::Walk {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    if metadata.is_dir() {
        let root = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut walker = Walker {
            options,
            root: &root,
            targets: Targets::default(),
        };
        walker.walk(path, 0);
        return Ok(walker.targets);
    }

    if metadata.is_file() && is_python_file(path) {
        return Ok(Targets {
            files: vec![path.to_path_buf()],
            errors: Vec::new(),
        });
    }

    Err(NotesError::NotAPythonFile(path.to_path_buf()))
}

struct Walker<'a> {
    options: &'a WalkOptions,
    root: &'a Path,
    targets: Targets,
}

impl Walker<'_> {
    fn is_ignored(&self, path: &Path) -> bool {
        self.options
            .ignore
            .iter()
            .any(|dir| path.ends_with(Path::new(dir)))
    }

    fn matches_filespec(&self, file_path: &Path) -> bool {
        let Some(pattern) = self.options.filespec.as_ref() else {
            return true;
        };
        let absolute = fs::canonicalize(file_path).unwrap_or_else(|_| file_path.to_path_buf());
        let relative = absolute.strip_prefix(self.root).unwrap_or(&absolute);
        match relative.to_str() {
            Some(rel) => pattern.matches(&rel.replace('\\', "/")),
            None => false,
        }
    }

    fn walk(&mut self, dir: &Path, depth: usize) {
        if depth > self.options.max_depth {
            tracing::warn!(
                "maximum directory depth ({}) reached at {}",
                self.options.max_depth,
                dir.display()
            );
            return;
        }

        let entries = match read_dir(dir) {
            Ok(entries) => entries,
            Err(source) => {
                self.targets.errors.push(NotesError::Walk {
                    path: dir.to_path_buf(),
                    source,
                });
                return;
            }
        };

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(source) => {
                    self.targets.errors.push(NotesError::Walk {
                        path: dir.to_path_buf(),
                        source,
                    });
                    continue;
                }
            };

            let entry_path = entry.path();
            let file_type = match entry_file_type(&entry) {
                Ok(ft) => ft,
                Err(source) => {
                    self.targets.errors.push(NotesError::Walk {
                        path: entry_path,
                        source,
                    });
                    continue;
                }
            };

            if file_type.is_dir() {
                if self.options.non_recursive || self.is_ignored(&entry_path) {
                    tracing::debug!("skipping directory {}", entry_path.display());
                    continue;
                }
                self.walk(&entry_path, depth + 1);
            } else if file_type.is_file()
                && is_python_file(&entry_path)
                && self.matches_filespec(&entry_path)
            {
                tracing::debug!("found {}", entry_path.display());
                self.targets.files.push(entry_path);
            }
        }
    }
}
