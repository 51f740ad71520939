//! Removal mode: strip comments from a file and replace it atomically.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{NotesError, Result};
use crate::scanner;
use crate::walker::{read_source, should_simulate_path_failure};

const WRITE_FAIL_TAG: &str = "__pynotes_write_fail__.py";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub comment_lines: usize,
    pub rewritten: bool,
}

/// Strip every comment from the file at `path`.
///
/// The new contents are written next to the original and renamed over it, so
/// a failure leaves the original untouched. Files without comments are not
/// rewritten at all.
pub fn remove_notes_in_file(path: &Path) -> Result<RemovalOutcome> {
    let source = read_source(path)?;
    let comment_lines = scanner::scan(&source).comment_line_count;
    let stripped = scanner::strip(&source);

    if stripped == source {
        tracing::debug!("no comments in {}", path.display());
        return Ok(RemovalOutcome {
            comment_lines,
            rewritten: false,
        });
    }

    replace_contents(path, &stripped).map_err(|source| NotesError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        "removed {} comment lines from {}",
        comment_lines,
        path.display()
    );

    Ok(RemovalOutcome {
        comment_lines,
        rewritten: true,
    })
}

fn replace_contents(path: &Path, contents: &str) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path)?.permissions();

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(contents.as_bytes())?;
    if should_simulate_path_failure(path, WRITE_FAIL_TAG) {
        return Err(io::Error::other("simulated write failure"));
    }
    temp.flush()?;
    let _ = temp.as_file().sync_all();
    fs::set_permissions(temp.path(), permissions)?;

    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_notes_rewrites_file() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("sample.py");
        fs::write(
            &path,
            "\"\"\"Module doc.\"\"\"\nimport os  # os\n# standalone\nURL = \"http://x#frag\"\n",
        )?;

        let outcome = remove_notes_in_file(&path).expect("removal succeeds");
        assert_eq!(outcome.comment_lines, 3);
        assert!(outcome.rewritten);
        assert_eq!(
            fs::read_to_string(&path)?,
            "import os\nURL = \"http://x#frag\"\n"
        );

        let again = remove_notes_in_file(&path).expect("second removal succeeds");
        assert_eq!(again.comment_lines, 0);
        assert!(!again.rewritten);
        Ok(())
    }

    #[test]
    fn test_clean_file_is_left_alone() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("clean.py");
        fs::write(&path, "x = 1\n")?;
        let before = fs::metadata(&path)?.modified()?;

        let outcome = remove_notes_in_file(&path).expect("removal succeeds");
        assert_eq!(outcome, RemovalOutcome::default());
        assert_eq!(fs::metadata(&path)?.modified()?, before);
        Ok(())
    }

    #[test]
    fn test_write_failure_keeps_original_and_leaves_no_temp_file() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(WRITE_FAIL_TAG);
        let original = "x = 1  # note\n";
        fs::write(&path, original)?;

        let err = remove_notes_in_file(&path).unwrap_err();
        assert!(matches!(err, NotesError::Write { .. }), "{err:?}");
        assert_eq!(fs::read_to_string(&path)?, original);
        let leftovers = fs::read_dir(temp_dir.path())?.count();
        assert_eq!(leftovers, 1, "temporary file should be cleaned up");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_survive_rewrite() -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("tool.py");
        fs::write(&path, "#!/usr/bin/env python3\nprint(1)  # go\n")?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;

        remove_notes_in_file(&path).expect("removal succeeds");
        let mode = fs::metadata(&path)?.permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
        assert_eq!(
            fs::read_to_string(&path)?,
            "#!/usr/bin/env python3\nprint(1)\n"
        );
        Ok(())
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let err = remove_notes_in_file(&temp_dir.path().join("gone.py")).unwrap_err();
        assert!(matches!(err, NotesError::Read { .. }), "{err:?}");
    }
}
