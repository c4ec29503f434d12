pub mod thread;
pub mod datanode;

pub use thread::{next_handle, ThreadRecord};
pub use datanode::{
    generate_node_id, Datanode, NodePayload, SkeletonNode, DEFAULT_NODE_TYPE, ROOT_NODE_ID,
};
