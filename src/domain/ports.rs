use crate::domain::model::{Document, Record};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Operations a certificate deployment needs from the TLS API.
#[async_trait]
pub trait TlsCertificateApi: Send + Sync {
    async fn create_private_key(&self, key: &str, domain: &str) -> Result<Document>;

    async fn delete_private_key(&self, id: Option<&str>) -> Result<()>;

    async fn get_certificate_by_domain(&self, domain: &str) -> Result<Option<Record>>;

    async fn create_certificate(&self, certificate: &str, intermediates: &str)
        -> Result<Document>;

    async fn update_certificate(
        &self,
        id: &str,
        certificate: &str,
        intermediates: &str,
    ) -> Result<Document>;

    async fn delete_certificate(&self, id: Option<&str>) -> Result<()>;
}
