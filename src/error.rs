use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Cannot convert {value} with rule '{rule}': {reason}")]
    Conversion {
        rule: &'static str,
        value: String,
        reason: String,
    },

    #[error("Type conflict in {operation}: {reason}")]
    TypeConflict {
        operation: &'static str,
        reason: String,
    },

    #[error("Rendering '{node}' failed: {message}")]
    Render { node: String, message: String },

    #[error("Invalid renderer configuration: {0}")]
    InvalidConfig(String),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Formatting error")]
    Fmt,
}

impl RenderError {
    pub(crate) fn conversion(
        rule: &'static str,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        RenderError::Conversion {
            rule,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(err: serde_yaml::Error) -> Self {
        RenderError::Yaml(err.to_string())
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Json(err.to_string())
    }
}

impl From<std::fmt::Error> for RenderError {
    fn from(_: std::fmt::Error) -> Self {
        RenderError::Fmt
    }
}
