pub mod client;
pub mod models;
pub mod repositories;

pub use client::MongoPersistenceClient;
pub use repositories::{MongoNodeRepository, MongoThreadRepository};
