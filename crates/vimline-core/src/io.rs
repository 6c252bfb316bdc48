//! File and process collaborators.
//!
//! Ex commands never touch the filesystem or spawn processes directly; they
//! go through the traits here so hosts (and tests) can supply their own.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{FileError, ProcessError};

pub trait FileSystem: Send + Sync {
    /// Read a whole file as UTF-8 text.
    fn read_text<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, FileError>>;

    fn write_text<'a>(&'a self, path: &'a Path, text: String) -> BoxFuture<'a, Result<(), FileError>>;
}

pub trait ProcessRunner: Send + Sync {
    /// Run a command string and capture its standard output.
    fn run<'a>(
        &'a self,
        command: &'a str,
        cwd: Option<&'a Path>,
    ) -> BoxFuture<'a, Result<String, ProcessError>>;
}

/// Local files through `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFileSystem;

impl FileSystem for TokioFileSystem {
    fn read_text<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, FileError>> {
        Box::pin(async move {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| FileError::from_io(path.to_path_buf(), e))?;
            debug!(path = %path.display(), bytes = bytes.len(), "file read");
            String::from_utf8(bytes).map_err(|_| FileError::InvalidUtf8(path.to_path_buf()))
        })
    }

    fn write_text<'a>(&'a self, path: &'a Path, text: String) -> BoxFuture<'a, Result<(), FileError>> {
        Box::pin(async move {
            tokio::fs::write(path, text.as_bytes())
                .await
                .map_err(|e| FileError::from_io(path.to_path_buf(), e))
        })
    }
}

/// Runs command strings through a shell, `sh -c` by default.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: Vec<String>,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(vec!["sh".to_string(), "-c".to_string()])
    }
}

impl ShellRunner {
    /// `shell` is the program and its leading arguments; the command string
    /// is appended as the last argument.
    pub fn new(shell: Vec<String>) -> Self {
        Self { shell }
    }
}

impl ProcessRunner for ShellRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        cwd: Option<&'a Path>,
    ) -> BoxFuture<'a, Result<String, ProcessError>> {
        Box::pin(async move {
            let spawn_error = |source| ProcessError::Spawn {
                command: command.to_string(),
                source,
            };
            let (program, args) = self
                .shell
                .split_first()
                .ok_or_else(|| spawn_error(io::Error::new(io::ErrorKind::InvalidInput, "no shell configured")))?;

            let mut cmd = Command::new(program);
            cmd.args(args)
                .arg(command)
                .stdin(Stdio::null())
                .kill_on_drop(true);
            if let Some(dir) = cwd {
                cmd.current_dir(dir);
            }
            let output = cmd.output().await.map_err(spawn_error)?;

            if output.status.success() {
                debug!(%command, bytes = output.stdout.len(), "command finished");
                return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
            }
            let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
            warn!(%command, status = ?output.status, %stderr, "command failed");
            Err(match output.status.code() {
                Some(code) => ProcessError::NonZeroExit {
                    command: command.to_string(),
                    code,
                    stderr,
                },
                None => ProcessError::Signal {
                    command: command.to_string(),
                    signal: signal(&output.status),
                },
            })
        })
    }
}

#[cfg(unix)]
fn signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal(_: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// The collaborators handed to every Ex command.
#[derive(Clone)]
pub struct Environment {
    pub fs: Arc<dyn FileSystem>,
    pub processes: Arc<dyn ProcessRunner>,
}

impl Environment {
    pub fn new(fs: impl FileSystem + 'static, processes: impl ProcessRunner + 'static) -> Self {
        Self {
            fs: Arc::new(fs),
            processes: Arc::new(processes),
        }
    }

    /// Local files and a real shell. An empty `shell` means `sh -c`.
    pub fn system(shell: Vec<String>) -> Self {
        let runner = if shell.is_empty() {
            ShellRunner::default()
        } else {
            ShellRunner::new(shell)
        };
        Self::new(TokioFileSystem, runner)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;

    /// In-memory files.
    #[derive(Debug, Clone, Default)]
    pub struct FakeFileSystem {
        files: Arc<Mutex<HashMap<PathBuf, String>>>,
    }

    impl FakeFileSystem {
        pub fn with_file(path: &str, text: &str) -> Self {
            let fs = Self::default();
            fs.files
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), text.to_string());
            fs
        }

        pub fn contents(&self, path: &str) -> Option<String> {
            self.files.lock().unwrap().get(Path::new(path)).cloned()
        }
    }

    impl FileSystem for FakeFileSystem {
        fn read_text<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, FileError>> {
            let found = self.files.lock().unwrap().get(path).cloned();
            Box::pin(async move { found.ok_or_else(|| FileError::NotFound(path.to_path_buf())) })
        }

        fn write_text<'a>(&'a self, path: &'a Path, text: String) -> BoxFuture<'a, Result<(), FileError>> {
            self.files.lock().unwrap().insert(path.to_path_buf(), text);
            Box::pin(async { Ok(()) })
        }
    }

    /// Canned command output; unknown commands exit with status 127.
    #[derive(Debug, Clone, Default)]
    pub struct FakeProcesses {
        outputs: HashMap<String, String>,
        calls: Arc<Mutex<Vec<(String, Option<PathBuf>)>>>,
    }

    impl FakeProcesses {
        pub fn with_output(command: &str, output: &str) -> Self {
            let mut fake = Self::default();
            fake.outputs.insert(command.to_string(), output.to_string());
            fake
        }

        pub fn calls(&self) -> Vec<(String, Option<PathBuf>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ProcessRunner for FakeProcesses {
        fn run<'a>(
            &'a self,
            command: &'a str,
            cwd: Option<&'a Path>,
        ) -> BoxFuture<'a, Result<String, ProcessError>> {
            self.calls
                .lock()
                .unwrap()
                .push((command.to_string(), cwd.map(Path::to_path_buf)));
            let result = self
                .outputs
                .get(command)
                .cloned()
                .ok_or_else(|| ProcessError::NonZeroExit {
                    command: command.to_string(),
                    code: 127,
                    stderr: "command not found".to_string(),
                });
            Box::pin(async move { result })
        }
    }
}
