use crate::catalog::UnknownValue;

/// Input errors raised by the engine. All of them describe bad caller input;
/// I/O failures belong to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid {field} filter '{value}'")]
    InvalidFilter { field: &'static str, value: String },
    #[error("invalid capsule size '{0}': expected a positive integer")]
    InvalidCapsuleSize(String),
}

impl From<UnknownValue> for EngineError {
    fn from(value: UnknownValue) -> Self {
        Self::InvalidFilter {
            field: value.field,
            value: value.value,
        }
    }
}
