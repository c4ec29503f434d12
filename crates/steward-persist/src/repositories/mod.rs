pub mod thread;
pub mod node;

pub use thread::ThreadRepository;
pub use node::NodeRepository;
