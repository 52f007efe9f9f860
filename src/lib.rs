pub mod backend;
pub mod common;
pub mod config;
pub mod events;
pub mod studio;
pub mod task;

pub use config::StudioConfig;
pub use studio::{Studio, StudioError};
