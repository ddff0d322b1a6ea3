use thiserror::Error;

/// Errors from the document serializer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// YAML serialization failed.
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
