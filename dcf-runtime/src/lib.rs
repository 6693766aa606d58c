pub use crate::builder::{EngineBuilder, LogLevel};
pub use crate::commit::CommitStats;
pub use crate::engine::Engine;
pub use crate::error::{Error, Result};
pub use crate::scheduler::Scheduler;
pub use crate::workers::WorkerPool;

mod builder;
mod commit;
mod engine;
mod error;
mod scheduler;
mod workers;
