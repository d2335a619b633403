pub mod client;
pub mod deploy;

pub use crate::domain::model::{DeployAction, DeployOutcome, Document, Page, PageMeta, Record};
pub use crate::domain::ports::TlsCertificateApi;
pub use crate::utils::error::Result;
