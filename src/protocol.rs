//! Wire types exchanged with the evaluator.

use serde::{Deserialize, Serialize};

/// Form body of `POST eval`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationRequest {
    pub input: String,
}

impl EvaluationRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Body returned by `POST eval`.
///
/// Decoding never fails on an unknown `type`: such bodies become
/// [`EvaluationResponse::Invalid`] and are reported by the mapper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "WireResponse")]
pub enum EvaluationResponse {
    Expr { value: String },
    Error { message: String },
    Invalid { reason: String },
}

impl EvaluationResponse {
    pub fn expr(value: impl Into<String>) -> Self {
        EvaluationResponse::Expr {
            value: value.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        EvaluationResponse::Error {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl From<WireResponse> for EvaluationResponse {
    fn from(wire: WireResponse) -> Self {
        match (wire.kind.as_deref(), wire.value, wire.message) {
            (Some("expr"), Some(value), _) => EvaluationResponse::Expr { value },
            (Some("error"), _, Some(message)) => EvaluationResponse::Error { message },
            (Some("expr"), None, _) => EvaluationResponse::Invalid {
                reason: "'expr' response is missing 'value'".to_string(),
            },
            (Some("error"), _, None) => EvaluationResponse::Invalid {
                reason: "'error' response is missing 'message'".to_string(),
            },
            (Some(kind), _, _) => EvaluationResponse::Invalid {
                reason: format!("unrecognized response type '{}'", kind),
            },
            (None, _, _) => EvaluationResponse::Invalid {
                reason: "response has no 'type' field".to_string(),
            },
        }
    }
}

/// Body returned by `GET completions`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CompletionsResponse {
    Values { values: Vec<String> },
    Error { message: String },
}
