use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("trigger word '{0}' is already registered")]
    DuplicateTrigger(String),

    #[error("trigger word '{0}' not found")]
    TriggerNotFound(String),

    #[error("failed to persist mapping config: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("failed to serialize mapping config: {0}")]
    Serialize(#[from] serde_json::Error),
}
