use serde_json::{Map, Value};

use crate::error::RelayError;

pub const DEFAULT_SOURCE_LANGUAGE: &str = "Python";
pub const DEFAULT_TARGET_LANGUAGE: &str = "JavaScript";

/// Semantic operation selected by the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Generate,
    Debug,
    Explain,
    Convert,
    Review,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Debug => "debug",
            Self::Explain => "explain",
            Self::Convert => "convert",
            Self::Review => "review",
        }
    }
}

/// Fields extracted from a request body, tagged by operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptRequest {
    Generate { prompt: String },
    Debug { code: String },
    Explain { code: String },
    Convert { code: String, source: String, target: String },
    Review { code: String },
}

impl PromptRequest {
    pub fn from_payload(operation: Operation, payload: &Value) -> Result<Self, RelayError> {
        let fields = payload.as_object().ok_or(RelayError::InvalidBody)?;

        let request = match operation {
            Operation::Generate => Self::Generate {
                prompt: required(fields, "prompt")?,
            },
            Operation::Debug => Self::Debug {
                code: required(fields, "code")?,
            },
            Operation::Explain => Self::Explain {
                code: required(fields, "code")?,
            },
            Operation::Convert => Self::Convert {
                code: required(fields, "code")?,
                source: optional(fields, "source", DEFAULT_SOURCE_LANGUAGE),
                target: optional(fields, "target", DEFAULT_TARGET_LANGUAGE),
            },
            Operation::Review => Self::Review {
                code: required(fields, "code")?,
            },
        };
        Ok(request)
    }

    /// Render the instruction sent to the model.
    pub fn render(&self) -> String {
        match self {
            Self::Generate { prompt } => prompt.clone(),
            Self::Debug { code } => format!(
                "The following code has a bug. Fix it and explain the fix:\n\n\n{}",
                fenced(code, "")
            ),
            Self::Explain { code } => format!(
                "Explain the following code line by line:\n\n{}",
                fenced(code, "")
            ),
            Self::Convert {
                code,
                source,
                target,
            } => format!(
                "Convert the following code from {} to {}:\n\n{}",
                source,
                target,
                fenced(code, &source.to_lowercase())
            ),
            Self::Review { code } => format!(
                "Review the following code. Point out bugs, security issues and style problems, \
                 and suggest concrete improvements:\n\n{}",
                fenced(code, "")
            ),
        }
    }
}

fn fenced(code: &str, label: &str) -> String {
    format!("```{}\n{}\n```", label, code)
}

fn required(fields: &Map<String, Value>, name: &'static str) -> Result<String, RelayError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(RelayError::MissingField(name))
}

fn optional(fields: &Map<String, Value>, name: &str, default: &str) -> String {
    fields
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}
