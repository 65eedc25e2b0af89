pub mod engine;
pub mod nodes;

pub use engine::Orchestrator;
pub use nodes::GraphNodes;
