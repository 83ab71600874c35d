pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use adapters::MossClient;
pub use core::{
    engine::{prepare_target, ReportEngine},
    pipeline::MossPipeline,
    submission::Submission,
};
pub use utils::error::{MossError, Result};
