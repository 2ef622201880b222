use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::types::{CliMessage, ResultMessage};
use crate::{AgentError, Result};

// ─── ClaudeOptions ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ClaudeOptions {
    /// Path to the `claude` binary. `None` resolves `claude` from PATH.
    pub executable: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

// ─── ClaudeProcess ────────────────────────────────────────────────────────

/// A running `claude --print --output-format stream-json` subprocess.
///
/// The prompt is written to stdin as plain text and stdin is closed; the
/// reply is read as JSONL from stdout. Stderr is captured in a background
/// task and surfaced on process exit errors. The child is killed if the
/// process handle is dropped before it exits.
pub(crate) struct ClaudeProcess {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr_buf: Arc<Mutex<String>>,
}

impl ClaudeProcess {
    pub(crate) async fn spawn(prompt: &str, opts: &ClaudeOptions) -> Result<Self> {
        let mut cmd = build_command(opts);
        cmd.env_remove("CLAUDECODE");
        Self::from_command(cmd, prompt).await
    }

    pub(crate) async fn from_command(mut cmd: Command, prompt: &str) -> Result<Self> {
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Process("stdout not captured".into()))?;

        let stderr_buf = Arc::new(Mutex::new(String::new()));
        if let Some(stderr) = child.stderr.take() {
            let buf = Arc::clone(&stderr_buf);
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    if let Ok(mut b) = buf.lock() {
                        if !b.is_empty() {
                            b.push('\n');
                        }
                        b.push_str(&line);
                    }
                }
            });
        }

        if let Some(stdin) = child.stdin.take() {
            write_prompt(stdin, prompt).await?;
        }

        Ok(Self {
            child,
            lines: BufReader::new(stdout).lines(),
            stderr_buf,
        })
    }

    /// Read stdout until the terminal `result` message.
    ///
    /// Lines that are valid JSON with an unrecognised `type` (system init,
    /// assistant turns, rate limit events) are skipped. Returns `Ok(None)` if
    /// stdout closes first.
    pub(crate) async fn next_result(&mut self) -> Result<Option<ResultMessage>> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<CliMessage>(trimmed) {
                Ok(CliMessage::Result(r)) => return Ok(Some(r)),
                Err(e) => {
                    if is_other_message_type(trimmed) {
                        continue;
                    }
                    return Err(AgentError::Parse {
                        line: trimmed.to_owned(),
                        source: e,
                    });
                }
            }
        }
    }

    /// Wait for the child to exit and return an error if the exit code is
    /// non-zero or the process was killed by a signal.
    pub(crate) async fn wait_exit_error(&mut self) -> Option<AgentError> {
        let status = match self.child.wait().await {
            Ok(s) => s,
            Err(e) => return Some(AgentError::Io(e)),
        };

        if status.success() {
            return None;
        }

        let stderr = self.stderr();
        let head = match status.code() {
            Some(code) => format!("claude exited with code {code}"),
            None => "claude terminated by signal".to_string(),
        };
        let msg = if stderr.is_empty() {
            head
        } else {
            format!("{head}\nstderr: {stderr}")
        };
        Some(AgentError::Process(msg))
    }

    pub(crate) fn stderr(&self) -> String {
        self.stderr_buf
            .lock()
            .ok()
            .map(|b| b.clone())
            .unwrap_or_default()
    }
}

async fn write_prompt(mut stdin: ChildStdin, prompt: &str) -> Result<()> {
    // A child that exits without reading its input still gets its output
    // inspected; only other write failures are errors.
    let written = async {
        stdin.write_all(prompt.as_bytes()).await?;
        stdin.flush().await
    }
    .await;
    match written {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(AgentError::Io(e)),
    }
}

/// Valid JSON carrying a `"type"` this crate does not model.
fn is_other_message_type(line: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(line)
        .map(|v| v.get("type").is_some())
        .unwrap_or(false)
}

// ─── Command builder ──────────────────────────────────────────────────────

fn build_command(opts: &ClaudeOptions) -> Command {
    let exe = opts.executable.as_deref().unwrap_or("claude");
    let mut cmd = Command::new(exe);

    cmd.arg("--print")
        .arg("--output-format")
        .arg("stream-json")
        .arg("--verbose")
        .arg("--max-turns")
        .arg("1");

    if let Some(model) = &opts.model {
        cmd.arg("--model").arg(model);
    }

    if let Some(sp) = &opts.system_prompt {
        cmd.arg("--system-prompt").arg(sp);
    }

    cmd
}

// ─── Tests ────────────────────────────────────────────────────────────────
