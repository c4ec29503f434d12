use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backing store unavailable or corrupt
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("No node tree for tenant: {0}")]
    TreeNotFound(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("The root node cannot be removed")]
    RootRemoval,

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Relevance judge failed: {0}")]
    Relevance(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistError {
    /// Lookup misses (tree, node or thread) as opposed to storage faults
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TreeNotFound(_) | Self::NodeNotFound(_) | Self::ThreadNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
