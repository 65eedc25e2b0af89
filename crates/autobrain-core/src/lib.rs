pub mod config;
pub mod error;
pub mod event;
pub mod state;
pub mod traits;

pub use config::ModelConfig;
pub use error::{AutobrainError, Result};
pub use event::GraphEvent;
pub use state::*;
