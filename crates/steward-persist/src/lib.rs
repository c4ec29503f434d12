pub mod models;
pub mod repositories;
pub mod dbs;
pub mod nodes;
pub mod prune;
pub mod error;
pub mod builder;

pub use models::{
    Datanode, NodePayload, SkeletonNode, ThreadRecord, DEFAULT_NODE_TYPE, ROOT_NODE_ID,
};
pub use repositories::{NodeRepository, ThreadRepository};
pub use dbs::memory::{InMemoryNodeRepository, InMemoryThreadRepository};
pub use nodes::NodeStore;
pub use prune::{ModelRelevanceJudge, RelevanceJudge};
pub use error::{PersistError, Result};
pub use builder::{Persistence, PersistenceBuilder, StorageBackend};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::{MongoNodeRepository, MongoPersistenceClient, MongoThreadRepository};
