use mongodb::Client;

use crate::dbs::mongo::repositories::{MongoNodeRepository, MongoThreadRepository};
use crate::error::{PersistError, Result};

pub struct MongoPersistenceClient {
    thread_repo: MongoThreadRepository,
    node_repo: MongoNodeRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and prepare both repositories
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let thread_repo = MongoThreadRepository::new(&client, database);
        thread_repo.ensure_indexes().await?;
        let node_repo = MongoNodeRepository::new(&client, database);

        tracing::info!(database, "connected to MongoDB");

        Ok(Self {
            thread_repo,
            node_repo,
        })
    }

    pub fn into_parts(self) -> (MongoThreadRepository, MongoNodeRepository) {
        (self.thread_repo, self.node_repo)
    }
}
