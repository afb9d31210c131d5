pub mod config;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod update;

pub use config::Config;
pub use error::UpdateError;
pub use update::{Orchestrator, Outcome};
