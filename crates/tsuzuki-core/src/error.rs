use thiserror::Error;

#[derive(Debug, Error)]
pub enum TsuzukiError {
    #[error("adapter failure: {0}")]
    Adapter(String),

    #[error("not found in store: {0}")]
    NotFound(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}
