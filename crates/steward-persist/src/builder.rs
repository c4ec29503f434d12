use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dbs::memory::{InMemoryNodeRepository, InMemoryThreadRepository};
use crate::error::{PersistError, Result};
use crate::repositories::{NodeRepository, ThreadRepository};

/// Which backing store to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

/// Repositories for one process, shared by every exchange
#[derive(Clone)]
pub struct Persistence {
    pub threads: Arc<dyn ThreadRepository>,
    pub nodes: Arc<dyn NodeRepository>,
}

impl Persistence {
    pub fn in_memory() -> Self {
        Self {
            threads: Arc::new(InMemoryThreadRepository::new()),
            nodes: Arc::new(InMemoryNodeRepository::new()),
        }
    }
}

pub struct PersistenceBuilder {
    backend: StorageBackend,
    mongodb_uri: Option<String>,
    database: Option<String>,
}

impl PersistenceBuilder {
    pub fn new() -> Self {
        Self {
            backend: StorageBackend::Memory,
            mongodb_uri: None,
            database: None,
        }
    }

    pub fn backend(mut self, backend: StorageBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn mongodb_uri(mut self, uri: impl Into<String>) -> Self {
        self.mongodb_uri = Some(uri.into());
        self
    }

    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }

    pub async fn build(self) -> Result<Persistence> {
        match self.backend {
            StorageBackend::Memory => Ok(Persistence::in_memory()),
            StorageBackend::Mongodb => self.build_mongo().await,
        }
    }

    #[cfg(feature = "mongodb")]
    async fn build_mongo(self) -> Result<Persistence> {
        use crate::dbs::mongo::MongoPersistenceClient;

        let mongodb_uri = self
            .mongodb_uri
            .ok_or_else(|| PersistError::Internal("mongodb_uri is required".to_string()))?;
        let database = self
            .database
            .ok_or_else(|| PersistError::Internal("database is required".to_string()))?;

        let (threads, nodes) = MongoPersistenceClient::connect(&mongodb_uri, &database)
            .await?
            .into_parts();

        Ok(Persistence {
            threads: Arc::new(threads),
            nodes: Arc::new(nodes),
        })
    }

    #[cfg(not(feature = "mongodb"))]
    async fn build_mongo(self) -> Result<Persistence> {
        Err(PersistError::Connection(
            "built without the `mongodb` feature".to_string(),
        ))
    }
}

impl Default for PersistenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
