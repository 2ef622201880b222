use serde::{Deserialize, Serialize};

// ─── claude CLI messages ──────────────────────────────────────────────────

/// The subset of `claude --print --output-format stream-json` messages this
/// crate acts on. Every other `type` is read past.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CliMessage {
    Result(ResultMessage),
}

/// `type = "result"`: the terminal message of a print-mode run.
///
/// `subtype` distinguishes success from the error conditions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum ResultMessage {
    Success(ResultSuccess),
    ErrorDuringExecution(ResultError),
    ErrorMaxTurns(ResultError),
    ErrorMaxBudgetUsd(ResultError),
}

impl ResultMessage {
    pub fn is_error(&self) -> bool {
        match self {
            ResultMessage::Success(r) => r.is_error,
            _ => true,
        }
    }

    /// The final result text. `None` for error subtypes.
    pub fn result_text(&self) -> Option<&str> {
        if let ResultMessage::Success(r) = self {
            Some(&r.result)
        } else {
            None
        }
    }

    pub fn total_cost_usd(&self) -> f64 {
        match self {
            ResultMessage::Success(r) => r.total_cost_usd,
            ResultMessage::ErrorDuringExecution(r)
            | ResultMessage::ErrorMaxTurns(r)
            | ResultMessage::ErrorMaxBudgetUsd(r) => r.total_cost_usd,
        }
    }

    pub fn subtype(&self) -> &'static str {
        match self {
            ResultMessage::Success(_) => "success",
            ResultMessage::ErrorDuringExecution(_) => "error_during_execution",
            ResultMessage::ErrorMaxTurns(_) => "error_max_turns",
            ResultMessage::ErrorMaxBudgetUsd(_) => "error_max_budget_usd",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResultSuccess {
    #[serde(default)]
    pub session_id: String,
    pub result: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub num_turns: u32,
    #[serde(default)]
    pub total_cost_usd: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResultError {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub num_turns: u32,
    #[serde(default)]
    pub total_cost_usd: f64,
    #[serde(default)]
    pub errors: Vec<String>,
}

// ─── Chat completions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Omitted for Azure, where the deployment in the URL picks the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_result_success() {
        let json = r#"{
            "type": "result",
            "subtype": "success",
            "session_id": "abc-123",
            "result": "[]",
            "duration_ms": 5000,
            "is_error": false,
            "num_turns": 1,
            "total_cost_usd": 0.0042,
            "usage": {"input_tokens": 1200, "output_tokens": 400}
        }"#;
        let CliMessage::Result(result) = serde_json::from_str(json).unwrap();
        assert!(!result.is_error());
        assert_eq!(result.result_text(), Some("[]"));
        assert!((result.total_cost_usd() - 0.0042).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_result_error_subtype() {
        let json = r#"{
            "type": "result",
            "subtype": "error_during_execution",
            "session_id": "abc-123",
            "is_error": true,
            "errors": ["overloaded"]
        }"#;
        let CliMessage::Result(result) = serde_json::from_str(json).unwrap();
        assert!(result.is_error());
        assert_eq!(result.result_text(), None);
        assert_eq!(result.subtype(), "error_during_execution");
    }

    #[test]
    fn success_flagged_as_error_counts_as_error() {
        let json = r#"{"type":"result","subtype":"success","result":"API Error","is_error":true}"#;
        let CliMessage::Result(result) = serde_json::from_str(json).unwrap();
        assert!(result.is_error());
    }

    #[test]
    fn chat_request_omits_model_for_azure() {
        let req = ChatRequest {
            model: None,
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
        };
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("model").is_none());
        assert_eq!(value["messages"][1]["role"], "user");
    }

    #[test]
    fn chat_response_tolerates_null_content() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":null},"finish_reason":"content_filter"}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices[0].message.content, None);
        assert_eq!(resp.choices[0].finish_reason.as_deref(), Some("content_filter"));
    }
}
