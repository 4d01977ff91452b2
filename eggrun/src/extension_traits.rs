use std::fs::{create_dir_all, remove_dir_all};
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("{program} exited without success (code: {code:?})")]
pub struct CommandExitStatusError {
    pub program: String,
    /// `None` if the process was killed by a signal
    pub code: Option<i32>,
}

/// An extension trait that is intended to add a passthrough run method to the std::process::Command struct.
pub trait CommandExt {
    /// Run in the foreground with stdin, stdout and stderr inherited.
    fn run_passthrough(&mut self) -> Result<()>;
}

impl CommandExt for Command {
    fn run_passthrough(&mut self) -> Result<()> {
        let program = self.get_program().to_string_lossy().to_string();

        let status = self
            .status()
            .context(format!("failed to run command: {program}"))?;

        match status.success() {
            true => Ok(()),
            false => Err(CommandExitStatusError {
                program,
                code: status.code(),
            }
            .into()),
        }
    }
}

pub trait PathExt {
    /// Create the directory and any missing parents; fine if it already exists.
    fn create_dir(&self) -> Result<()>;
    /// Recursively remove the directory if it exists. Returns whether anything was removed.
    fn remove_dir_tree(&self) -> Result<bool>;
}

impl PathExt for Path {
    fn create_dir(&self) -> Result<()> {
        create_dir_all(self)
            .context(format!("failed to create directory: {}", self.to_string_lossy()))
    }

    fn remove_dir_tree(&self) -> Result<bool> {
        if !self.is_dir() {
            return Ok(false);
        }

        remove_dir_all(self)
            .context(format!("failed to remove directory: {}", self.to_string_lossy()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::{check, let_assert};

    #[test]
    fn test_create_dir_is_idempotent() -> Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("a/b/c");

        dir.create_dir()?;
        dir.create_dir()?;
        check!(dir.is_dir());
        Ok(())
    }

    #[test]
    fn test_create_dir_over_a_file_fails() -> Result<()> {
        let root = tempfile::tempdir()?;
        let file = root.path().join("file");
        std::fs::write(&file, "x")?;

        check!(file.create_dir().is_err());
        Ok(())
    }

    #[test]
    fn test_remove_dir_tree() -> Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("scratch");
        dir.join("nested").create_dir()?;
        std::fs::write(dir.join("nested/file"), "x")?;

        assert!(dir.remove_dir_tree()?);
        check!(!dir.exists());
        assert!(!dir.remove_dir_tree()?);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_is_kept() {
        let result = Command::new("sh").args(["-c", "exit 3"]).run_passthrough();

        let_assert!(Err(err) = result);
        let_assert!(Some(status) = err.downcast_ref::<CommandExitStatusError>());
        check!(status.code == Some(3));
        check!(status.program == "sh");
    }

    #[test]
    fn test_missing_program_fails() {
        let result = Command::new("/nonexistent/eggrun-test/emapper.py").run_passthrough();

        let_assert!(Err(err) = result);
        check!(err.downcast_ref::<CommandExitStatusError>().is_none());
    }
}
