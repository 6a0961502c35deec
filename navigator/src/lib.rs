pub mod config;
pub mod error;
pub mod geometry;
pub mod location;
pub mod models;
pub mod progress;
pub mod reactor;
pub mod replay;
pub mod route;
pub mod spatial;

pub use config::NavigatorConfig;
pub use error::NavigatorError;
pub use progress::{Resolver, resolve_progress};
pub use reactor::{InstructionReactor, ReactorState};
