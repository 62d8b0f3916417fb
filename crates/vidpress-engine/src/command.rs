//! Builder for executing external tool commands with timeout support.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use vidpress_core::{Error, Result};

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use vidpress_engine::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> vidpress_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .arg("-v").arg("quiet")
///     .arg("-print_format").arg("json")
///     .arg("-show_format")
///     .arg("-show_streams")
///     .arg("/path/to/video.mp4")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            current_dir: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Set the working directory the process is spawned in.
    pub fn current_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.current_dir = Some(dir.into());
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - Returns [`Error::Tool`] if the process times out (message includes
    ///   the timeout duration).
    /// - Returns [`Error::Tool`] if the process exits with a non-zero status
    ///   (message includes stderr).
    /// - Returns [`Error::Tool`] if spawning the process fails.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| Error::Tool {
            tool: program_name.clone(),
            message: format!("failed to spawn: {e}"),
        })?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        match result {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !output.status.success() {
                    return Err(Error::Tool {
                        tool: program_name,
                        message: format!(
                            "exited with status {}: {}",
                            output.status,
                            tool_output.stderr.trim()
                        ),
                    });
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(Error::Tool {
                tool: program_name,
                message: format!("I/O error waiting for process: {e}"),
            }),
            Err(_elapsed) => {
                // Timeout expired; kill_on_drop reaps the child when the
                // cancelled future is dropped.
                Err(Error::Tool {
                    tool: program_name,
                    message: format!("timed out after {:?}", self.timeout),
                })
            }
        }
    }

    /// Execute the command, invoking `on_stderr_line` for every line the
    /// process writes to stderr as it arrives.
    ///
    /// Used for tools that stream a progress protocol on stderr (ffmpeg's
    /// `-progress pipe:2`). Stdout is still captured in full.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`execute`](Self::execute).
    pub async fn execute_streaming(
        &self,
        mut on_stderr_line: impl FnMut(&str) + Send,
    ) -> Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| Error::Tool {
            tool: program_name.clone(),
            message: format!("failed to spawn: {e}"),
        })?;

        let stderr = child.stderr.take().ok_or_else(|| Error::Tool {
            tool: program_name.clone(),
            message: "stderr pipe unavailable".into(),
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| Error::Tool {
            tool: program_name.clone(),
            message: "stdout pipe unavailable".into(),
        })?;

        let work = async {
            // Drain stderr line by line and stdout in bulk concurrently so
            // neither pipe can fill up and stall the child.
            let stderr_task = async {
                let mut collected = String::new();
                let mut lines = BufReader::new(stderr).lines();
                while let Some(line) = lines.next_line().await? {
                    on_stderr_line(&line);
                    collected.push_str(&line);
                    collected.push('\n');
                }
                Ok::<_, std::io::Error>(collected)
            };
            let stdout_task = async {
                let mut buf = Vec::new();
                stdout.read_to_end(&mut buf).await?;
                Ok::<_, std::io::Error>(buf)
            };

            let (stderr_text, stdout_buf) = tokio::try_join!(stderr_task, stdout_task)?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stdout_buf, stderr_text))
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(Ok((status, stdout_buf, stderr_text))) => {
                let tool_output = ToolOutput {
                    status,
                    stdout: String::from_utf8_lossy(&stdout_buf).to_string(),
                    stderr: stderr_text,
                };

                if !status.success() {
                    return Err(Error::Tool {
                        tool: program_name,
                        message: format!(
                            "exited with status {}: {}",
                            status,
                            tool_output.stderr.trim()
                        ),
                    });
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(Error::Tool {
                tool: program_name,
                message: format!("I/O error waiting for process: {e}"),
            }),
            Err(_elapsed) => Err(Error::Tool {
                tool: program_name,
                message: format!("timed out after {:?}", self.timeout),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_echo() {
        // `echo` should be universally available.
        let output = ToolCommand::new(PathBuf::from("echo"))
            .arg("hello")
            .execute()
            .await;

        match output {
            Ok(out) => {
                assert!(out.status.success());
                assert!(out.stdout.trim().contains("hello"));
            }
            Err(_) => {
                // On some minimal environments echo may not exist; skip.
            }
        }
    }

    #[tokio::test]
    async fn execute_nonexistent_tool() {
        let result = ToolCommand::new(PathBuf::from("nonexistent_tool_xyz_12345"))
            .execute()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn timeout_fires() {
        // `sleep 10` should be killed well before 10 seconds.
        let result = ToolCommand::new(PathBuf::from("sleep"))
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute()
            .await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("timed out"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn streaming_receives_stderr_lines() {
        let mut seen = Vec::new();
        let result = ToolCommand::new(PathBuf::from("sh"))
            .arg("-c")
            .arg("echo one 1>&2; echo two 1>&2")
            .execute_streaming(|line| seen.push(line.to_string()))
            .await;

        match result {
            Ok(out) => {
                assert!(out.status.success());
                assert_eq!(seen, vec!["one".to_string(), "two".to_string()]);
                assert!(out.stderr.contains("one"));
            }
            Err(_) => {
                // `sh` unavailable; skip.
            }
        }
    }

    #[tokio::test]
    async fn streaming_nonzero_exit_carries_stderr() {
        let result = ToolCommand::new(PathBuf::from("sh"))
            .arg("-c")
            .arg("echo boom 1>&2; exit 3")
            .execute_streaming(|_| {})
            .await;

        if let Err(err) = result {
            let msg = err.to_string();
            assert!(msg.contains("boom"), "unexpected error: {msg}");
        }
    }
}
