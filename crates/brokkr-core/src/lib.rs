//! Core library for the Brokkr CLI
//!
//! Holds everything the other crates share: the resolved filesystem layout
//! (`PathsConfig`), the YAML configuration store backing the clone registry,
//! and the fixed product conventions (directory names, default sources,
//! reserved names).

pub mod config;
pub mod error;
pub mod paths;
pub mod product;
pub mod utils;

pub use config::{Config, ConfigStore, EnvironmentSection};
pub use error::{Error, Result};
pub use paths::PathsConfig;
pub use utils::get_home_dir;
