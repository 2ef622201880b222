use std::future::Future;
use std::time::Duration;

use crate::process::{ClaudeOptions, ClaudeProcess};
use crate::{AgentError, Result};

// ─── Completion ───────────────────────────────────────────────────────────

/// One system prompt plus one user prompt in, one block of text out.
pub trait Completion {
    fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

// ─── ClaudeCli ────────────────────────────────────────────────────────────

/// Completion through a `claude` print-mode subprocess per call.
#[derive(Debug, Clone, Default)]
pub struct ClaudeCli {
    pub executable: Option<String>,
    pub model: Option<String>,
}

impl ClaudeCli {
    pub fn new(executable: Option<String>, model: Option<String>) -> Self {
        Self { executable, model }
    }

    async fn run(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        let opts = ClaudeOptions {
            executable: self.executable.clone(),
            model: self.model.clone(),
            system_prompt: Some(system_prompt.to_string()),
        };
        let mut process = ClaudeProcess::spawn(prompt, &opts).await?;

        let result = match process.next_result().await? {
            Some(r) => r,
            None => {
                return Err(process.wait_exit_error().await.unwrap_or_else(|| {
                    AgentError::Process("claude exited without a result message".into())
                }));
            }
        };

        tracing::debug!(
            subtype = result.subtype(),
            cost_usd = result.total_cost_usd(),
            "claude result"
        );

        if result.is_error() {
            let stderr = process.stderr();
            let detail = result.result_text().unwrap_or(result.subtype());
            return Err(AgentError::Process(if stderr.is_empty() {
                format!("claude reported an error: {detail}")
            } else {
                format!("claude reported an error: {detail}\nstderr: {stderr}")
            }));
        }

        let text = result.result_text().unwrap_or_default().to_string();
        if let Some(err) = process.wait_exit_error().await {
            return Err(err);
        }
        if text.trim().is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(text)
    }
}

impl Completion for ClaudeCli {
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        self.run(system_prompt, prompt).await
    }
}

// ─── AttemptPolicy ────────────────────────────────────────────────────────

/// Per-call deadline and how many times a failed call is tried in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            max_attempts: 1,
        }
    }
}

/// Run `completion` under `policy`, returning the first successful text or
/// the last error. Each attempt is bounded by `policy.timeout`.
pub async fn complete_with_policy<C: Completion>(
    completion: &C,
    system_prompt: &str,
    prompt: &str,
    policy: AttemptPolicy,
) -> Result<String> {
    let attempts = policy.max_attempts.max(1);
    let mut last_err = AgentError::EmptyResponse;

    for attempt in 1..=attempts {
        let outcome =
            tokio::time::timeout(policy.timeout, completion.complete(system_prompt, prompt)).await;
        let err = match outcome {
            Ok(Ok(text)) => return Ok(text),
            Ok(Err(e)) => e,
            Err(_) => AgentError::Timeout {
                secs: policy.timeout.as_secs(),
            },
        };
        if attempt < attempts {
            tracing::warn!(attempt, max_attempts = attempts, error = %err, "completion failed, retrying");
        }
        last_err = err;
    }

    Err(last_err)
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Completion for Flaky {
        async fn complete(&self, _system_prompt: &str, prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                Err(AgentError::Process(format!("failure {n}")))
            } else {
                Ok(format!("ok: {prompt}"))
            }
        }
    }

    struct Slow;

    impl Completion for Slow {
        async fn complete(&self, _system_prompt: &str, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    fn policy(max_attempts: u32) -> AttemptPolicy {
        AttemptPolicy {
            timeout: Duration::from_secs(5),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn single_attempt_surfaces_first_error() {
        let c = Flaky {
            failures: 1,
            calls: AtomicU32::new(0),
        };
        let err = complete_with_policy(&c, "s", "p", policy(1)).await.unwrap_err();
        assert!(err.to_string().contains("failure 1"));
        assert_eq!(c.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let c = Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
        };
        let text = complete_with_policy(&c, "s", "batch", policy(3)).await.unwrap();
        assert_eq!(text, "ok: batch");
        assert_eq!(c.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_attempts_return_last_error() {
        let c = Flaky {
            failures: 5,
            calls: AtomicU32::new(0),
        };
        let err = complete_with_policy(&c, "s", "p", policy(2)).await.unwrap_err();
        assert!(err.to_string().contains("failure 2"));
    }

    #[tokio::test]
    async fn slow_completion_times_out() {
        let p = AttemptPolicy {
            timeout: Duration::from_millis(50),
            max_attempts: 1,
        };
        let err = complete_with_policy(&Slow, "s", "p", p).await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn claude_cli_returns_result_text() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let exe = dir.path().join("claude");
        std::fs::write(
            &exe,
            "#!/bin/sh\ncat >/dev/null\necho '{\"type\":\"result\",\"subtype\":\"success\",\"result\":\"[]\",\"is_error\":false}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cli = ClaudeCli::new(Some(exe.display().to_string()), None);
        assert_eq!(cli.complete("sys", "batch").await.unwrap(), "[]");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn claude_cli_error_result_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let exe = dir.path().join("claude");
        std::fs::write(
            &exe,
            "#!/bin/sh\necho '{\"type\":\"result\",\"subtype\":\"error_max_turns\",\"is_error\":true}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cli = ClaudeCli::new(Some(exe.display().to_string()), None);
        let err = cli.complete("sys", "batch").await.unwrap_err();
        assert!(err.to_string().contains("error_max_turns"));
    }
}
