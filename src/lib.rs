pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{
    cli::LocalStorage,
    settings::{ClientConfig, Overrides},
    toml_config::TomlConfig,
};

pub use self::core::{
    client::ExtractionClient,
    download::{DownloadOrchestrator, RetryPolicy},
    engine::{ExtractionEngine, RunOptions, RunSummary},
    session::SessionState,
};
pub use domain::model::{DocumentType, NormalizedResultSet, RenameOptions};
pub use utils::error::{ClientError, Result};
