use crate::directory::DEFAULT_GRAPH_URL;
use crate::error::{PairingError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BatchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// People per oracle call the planner aims for (mentors count themselves
    /// plus their capacity).
    #[serde(default = "default_target_capacity")]
    pub target_capacity: usize,
}

fn default_target_capacity() -> usize {
    12
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            target_capacity: default_target_capacity(),
        }
    }
}

// ---------------------------------------------------------------------------
// OracleBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OracleBackend {
    /// The `claude` CLI in print mode.
    ClaudeCli {
        #[serde(default = "default_claude_model")]
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        executable: Option<String>,
        #[serde(default = "default_oracle_timeout")]
        timeout_secs: u64,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
    /// An OpenAI-compatible chat completions endpoint. Setting
    /// `azure_api_version` switches to Azure OpenAI deployment URLs.
    ChatCompletions {
        base_url: String,
        #[serde(default = "default_chat_model")]
        model: String,
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        azure_api_version: Option<String>,
        #[serde(default = "default_oracle_timeout")]
        timeout_secs: u64,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
}

fn default_claude_model() -> String {
    "claude-sonnet-4-6".to_string()
}

fn default_chat_model() -> String {
    "gpt-4-32k".to_string()
}

fn default_api_key_env() -> String {
    "AZURE_OPENAI_KEY".to_string()
}

fn default_oracle_timeout() -> u64 {
    600
}

fn default_max_attempts() -> u32 {
    1
}

impl Default for OracleBackend {
    fn default() -> Self {
        OracleBackend::ClaudeCli {
            model: default_claude_model(),
            executable: None,
            timeout_secs: default_oracle_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl OracleBackend {
    pub fn timeout_secs(&self) -> u64 {
        match self {
            OracleBackend::ClaudeCli { timeout_secs, .. }
            | OracleBackend::ChatCompletions { timeout_secs, .. } => *timeout_secs,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        match self {
            OracleBackend::ClaudeCli { max_attempts, .. }
            | OracleBackend::ChatCompletions { max_attempts, .. } => *max_attempts,
        }
    }
}

// ---------------------------------------------------------------------------
// DirectoryBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectoryBackend {
    /// No lookups; every participant record must already carry a manager.
    #[default]
    None,
    /// Microsoft Graph, authenticated with a bearer token from `token_env`.
    Graph {
        #[serde(default = "default_graph_url")]
        base_url: String,
        #[serde(default = "default_token_env")]
        token_env: String,
        #[serde(default = "default_directory_timeout")]
        timeout_secs: u64,
    },
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

fn default_token_env() -> String {
    "ACCESS_TOKEN".to_string()
}

fn default_directory_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub oracle: OracleBackend,
    #[serde(default)]
    pub directory: DirectoryBackend,
}

fn default_version() -> u32 {
    1
}

fn default_input() -> PathBuf {
    PathBuf::from(paths::DEFAULT_INPUT_FILE)
}

fn default_output() -> PathBuf {
    PathBuf::from(paths::DEFAULT_OUTPUT_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            input: default_input(),
            output: default_output(),
            batch: BatchConfig::default(),
            oracle: OracleBackend::default(),
            directory: DirectoryBackend::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(PairingError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn input_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.input)
    }

    pub fn output_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.output)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.batch.target_capacity == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "batch.target_capacity must be at least 1".to_string(),
            });
        } else if self.batch.target_capacity > 200 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "batch.target_capacity={} is large; oracle replies may be truncated",
                    self.batch.target_capacity
                ),
            });
        }

        for (label, path) in [("input", &self.input), ("output", &self.output)] {
            if crate::io::DataFormat::from_path(path).is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "{label} '{}' must end in .json, .yaml or .yml",
                        path.display()
                    ),
                });
            }
        }

        if self.oracle.max_attempts() == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "oracle.max_attempts must be at least 1".to_string(),
            });
        }
        if self.oracle.timeout_secs() == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "oracle.timeout_secs must be at least 1".to_string(),
            });
        }

        match &self.oracle {
            OracleBackend::ClaudeCli { executable, .. } => {
                let exe = executable.as_deref().unwrap_or("claude");
                if which::which(exe).is_err() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!("oracle executable '{exe}' not found on PATH"),
                    });
                }
            }
            OracleBackend::ChatCompletions {
                base_url,
                api_key_env,
                ..
            } => {
                if base_url.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: "oracle.base_url is empty".to_string(),
                    });
                }
                if std::env::var(api_key_env).is_err() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!("oracle api key variable {api_key_env} is not set"),
                    });
                }
            }
        }

        if let DirectoryBackend::Graph { token_env, .. } = &self.directory {
            if std::env::var(token_env).is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("directory token variable {token_env} is not set"),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
