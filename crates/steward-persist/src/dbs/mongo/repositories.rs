use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use tokio::sync::Mutex;

use crate::dbs::mongo::models::{MongoFamily, MongoThread};
use crate::error::{PersistError, Result};
use crate::models::{next_handle, Datanode, ThreadRecord};
use crate::repositories::{NodeRepository, ThreadRepository};

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
    // Serializes handle allocation within this process; the unique index
    // catches races across processes.
    allocation: Arc<Mutex<()>>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self {
            collection,
            allocation: Arc::new(Mutex::new(())),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "tenant": 1, "handle": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl ThreadRepository for MongoThreadRepository {
    async fn get_thread(&self, tenant: &str, handle: &str) -> Result<Option<ThreadRecord>> {
        let filter = doc! { "tenant": tenant, "handle": handle };
        Ok(self.collection.find_one(filter).await?.map(Into::into))
    }

    async fn create_thread(&self, tenant: &str, provider_thread_id: &str) -> Result<ThreadRecord> {
        let _guard = self.allocation.lock().await;

        let existing: Vec<MongoThread> = self
            .collection
            .find(doc! { "tenant": tenant })
            .await?
            .try_collect()
            .await?;

        let handle = next_handle(existing.iter().map(|t| t.handle.as_str()))?;
        let record = ThreadRecord::new(handle, provider_thread_id);

        self.collection
            .insert_one(MongoThread::new(tenant, &record))
            .await?;
        Ok(record)
    }

    async fn rename_thread(&self, tenant: &str, handle: &str, display_name: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "tenant": tenant, "handle": handle },
                doc! { "$set": { "display_name": display_name } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn list_threads(&self, tenant: &str) -> Result<BTreeMap<String, ThreadRecord>> {
        let threads: Vec<MongoThread> = self
            .collection
            .find(doc! { "tenant": tenant })
            .await?
            .try_collect()
            .await?;

        Ok(threads
            .into_iter()
            .map(|t| (t.handle.clone(), t.into()))
            .collect())
    }
}

#[derive(Clone)]
pub struct MongoNodeRepository {
    collection: Collection<MongoFamily>,
}

impl MongoNodeRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("families");
        Self { collection }
    }
}

#[async_trait]
impl NodeRepository for MongoNodeRepository {
    async fn load_tree(&self, tenant: &str) -> Result<Datanode> {
        self.collection
            .find_one(doc! { "_id": tenant })
            .await?
            .map(|family| family.nodes)
            .ok_or_else(|| PersistError::TreeNotFound(tenant.to_string()))
    }

    async fn save_tree(&self, tenant: &str, tree: &Datanode) -> Result<()> {
        let family = MongoFamily {
            tenant: tenant.to_string(),
            nodes: tree.clone(),
        };

        // Single-document replace, readers see the old or the new tree
        self.collection
            .replace_one(doc! { "_id": tenant }, family)
            .upsert(true)
            .await?;
        Ok(())
    }
}
