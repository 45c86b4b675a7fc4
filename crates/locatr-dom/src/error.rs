use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Source is empty")]
    EmptySource,

    #[error("Failed to parse source: {0}")]
    Parse(String),

    #[error("Invalid XPath '{xpath}': {reason}")]
    InvalidXPath { xpath: String, reason: String },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Element is not visible")]
    NotVisible,
}
