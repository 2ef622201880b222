//! `pairing-agent`: text completion backends for the pairing oracle.
//!
//! # Architecture
//!
//! ```text
//! complete_with_policy(completion, system, prompt, AttemptPolicy)
//!     │                         per-call timeout, bounded retries
//!     ▼
//! Completion (trait)
//!     ├── ClaudeCli        ← spawns `claude --print --output-format stream-json`
//!     │                      prompt on stdin, reads the terminal `result` line
//!     └── ChatCompletions  ← POST {base}/chat/completions (OpenAI)
//!                            or {base}/openai/deployments/{model}/… (Azure)
//! ```
//!
//! Nothing here knows about mentors or batches; callers pass the rendered
//! prompt and parse the returned text themselves.

pub mod chat;
pub mod error;
pub mod runner;
pub mod types;

pub(crate) mod process;

pub use chat::ChatCompletions;
pub use error::AgentError;
pub use process::ClaudeOptions;
pub use runner::{complete_with_policy, AttemptPolicy, ClaudeCli, Completion};
pub use types::{ChatMessage, CliMessage, ResultMessage};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AgentError>;
