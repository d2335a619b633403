pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use config::{toml_config::TomlConfig, ClientConfig};
pub use core::{
    client::FastlyClient,
    deploy::{CertificateDeployer, DeployRequest},
};
pub use domain::model::{DeployAction, DeployOutcome, Document, Page, PageMeta, Record};
pub use domain::ports::TlsCertificateApi;
pub use utils::error::{FastlyError, Result};
