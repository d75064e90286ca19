pub mod config;
pub mod core;
pub mod decompose;
pub mod error;
pub mod log;
pub mod orchestration;
pub mod queue;
pub mod workflow;

pub use error::{Error, Result};
