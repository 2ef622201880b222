use anyhow::Context;
use pairing_agent::{complete_with_policy, AttemptPolicy, ChatCompletions, ClaudeCli};
use pairing_core::config::OracleBackend;
use pairing_core::oracle::{parse_response, render_batch, system_prompt, Batch, Oracle};
use pairing_core::types::ProposedAllocation;
use pairing_core::PairingError;
use std::time::Duration;
use tokio::runtime::Runtime;

enum Backend {
    Claude(ClaudeCli),
    Chat(ChatCompletions),
}

/// Oracle backed by a completion agent. Each round renders the batch, blocks
/// on the agent under the configured attempt policy and parses the reply.
pub struct AgentOracle {
    backend: Backend,
    policy: AttemptPolicy,
    runtime: Runtime,
}

impl AgentOracle {
    pub fn from_config(cfg: &OracleBackend) -> anyhow::Result<Self> {
        let policy = AttemptPolicy {
            timeout: Duration::from_secs(cfg.timeout_secs()),
            max_attempts: cfg.max_attempts(),
        };
        let backend = match cfg {
            OracleBackend::ClaudeCli {
                model, executable, ..
            } => Backend::Claude(ClaudeCli::new(executable.clone(), Some(model.clone()))),
            OracleBackend::ChatCompletions {
                base_url,
                model,
                api_key_env,
                azure_api_version,
                timeout_secs,
                ..
            } => {
                let key = std::env::var(api_key_env)
                    .with_context(|| format!("oracle api key variable {api_key_env} is not set"))?;
                let client = ChatCompletions::new(
                    base_url.as_str(),
                    model.as_str(),
                    key,
                    Duration::from_secs(*timeout_secs),
                )
                .context("failed to build chat completions client")?;
                Backend::Chat(match azure_api_version {
                    Some(v) => client.with_azure_api_version(v.as_str()),
                    None => client,
                })
            }
        };
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        Ok(Self {
            backend,
            policy,
            runtime,
        })
    }
}

impl Oracle for AgentOracle {
    fn propose(&mut self, batch: &Batch) -> pairing_core::Result<Vec<ProposedAllocation>> {
        let prompt = render_batch(batch)?;
        let backend = &self.backend;
        let policy = self.policy;

        let reply = self.runtime.block_on(async {
            match backend {
                Backend::Claude(c) => complete_with_policy(c, system_prompt(), &prompt, policy).await,
                Backend::Chat(c) => complete_with_policy(c, system_prompt(), &prompt, policy).await,
            }
        });
        let text = reply.map_err(|e| PairingError::Oracle {
            round: batch.round,
            message: e.to_string(),
        })?;
        tracing::debug!(round = batch.round, bytes = text.len(), "oracle replied");

        parse_response(batch.round, &text)
    }
}
