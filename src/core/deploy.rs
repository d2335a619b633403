use crate::domain::model::{DeployAction, DeployOutcome};
use crate::domain::ports::TlsCertificateApi;
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub domain: String,
    pub private_key: String,
    pub certificate: String,
    pub intermediates: String,
    /// Key from the previous renewal, deleted once the certificate is in place.
    pub replace_key_id: Option<String>,
}

/// Pushes a renewed certificate for one domain.
pub struct CertificateDeployer<A: TlsCertificateApi> {
    api: A,
}

impl<A: TlsCertificateApi> CertificateDeployer<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub async fn deploy(&self, request: &DeployRequest) -> Result<DeployOutcome> {
        tracing::info!("🚀 Deploying certificate for {}", request.domain);

        // 金鑰必須先上傳，憑證才能對應到它
        let private_key = self
            .api
            .create_private_key(&request.private_key, &request.domain)
            .await?;

        let existing = self.api.get_certificate_by_domain(&request.domain).await?;
        let (certificate, action) = match existing.and_then(|record| record.id) {
            Some(id) => {
                tracing::info!("📜 {}: updating existing certificate {}", request.domain, id);
                let document = self
                    .api
                    .update_certificate(&id, &request.certificate, &request.intermediates)
                    .await?;
                (document, DeployAction::Updated)
            }
            None => {
                tracing::info!("📜 {}: no certificate yet, creating one", request.domain);
                let document = self
                    .api
                    .create_certificate(&request.certificate, &request.intermediates)
                    .await?;
                (document, DeployAction::Created)
            }
        };

        if let Some(old_key) = request.replace_key_id.as_deref() {
            self.api.delete_private_key(Some(old_key)).await?;
        }

        tracing::info!("✅ {}: certificate {:?}", request.domain, action);
        Ok(DeployOutcome {
            domain: request.domain.clone(),
            private_key,
            certificate,
            action,
            replaced_key_id: request.replace_key_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Document, Record};
    use crate::utils::error::FastlyError;
    use serde_json::Map;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockApi {
        existing: Option<Record>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockApi {
        fn with_existing(id: &str) -> Self {
            Self {
                existing: Some(Record {
                    id: Some(id.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }
        }

        async fn calls(&self) -> Vec<String> {
            self.calls.lock().await.clone()
        }

        async fn record(&self, call: String) {
            self.calls.lock().await.push(call);
        }
    }

    fn document(id: &str) -> Document {
        Document {
            data: Record {
                id: Some(id.to_string()),
                ..Default::default()
            },
            included: None,
            extra: Map::new(),
        }
    }

    #[async_trait::async_trait]
    impl TlsCertificateApi for MockApi {
        async fn create_private_key(&self, _key: &str, domain: &str) -> Result<Document> {
            self.record(format!("create_private_key:{}", domain)).await;
            Ok(document("key-new"))
        }

        async fn delete_private_key(&self, id: Option<&str>) -> Result<()> {
            let id = id.ok_or(FastlyError::MissingIdentifier {
                operation: "deleting private key",
            })?;
            self.record(format!("delete_private_key:{}", id)).await;
            Ok(())
        }

        async fn get_certificate_by_domain(&self, domain: &str) -> Result<Option<Record>> {
            self.record(format!("get_certificate_by_domain:{}", domain)).await;
            Ok(self.existing.clone())
        }

        async fn create_certificate(&self, certificate: &str, _intermediates: &str) -> Result<Document> {
            self.record(format!("create_certificate:{}", certificate)).await;
            Ok(document("cert-new"))
        }

        async fn update_certificate(
            &self,
            id: &str,
            certificate: &str,
            _intermediates: &str,
        ) -> Result<Document> {
            self.record(format!("update_certificate:{}:{}", id, certificate)).await;
            Ok(document(id))
        }

        async fn delete_certificate(&self, id: Option<&str>) -> Result<()> {
            self.record(format!("delete_certificate:{:?}", id)).await;
            Ok(())
        }
    }

    fn request(replace_key_id: Option<&str>) -> DeployRequest {
        DeployRequest {
            domain: "example.com".to_string(),
            private_key: "KEY".to_string(),
            certificate: "CERT".to_string(),
            intermediates: "CHAIN".to_string(),
            replace_key_id: replace_key_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_deploy_creates_when_missing() {
        let api = MockApi::default();
        let deployer = CertificateDeployer::new(api.clone());

        let outcome = deployer.deploy(&request(None)).await.unwrap();

        assert_eq!(outcome.action, DeployAction::Created);
        assert_eq!(outcome.certificate.data.id.as_deref(), Some("cert-new"));
        assert_eq!(
            api.calls().await,
            vec![
                "create_private_key:example.com",
                "get_certificate_by_domain:example.com",
                "create_certificate:CERT",
            ]
        );
    }

    #[tokio::test]
    async fn test_deploy_updates_existing_and_replaces_key() {
        let api = MockApi::with_existing("cert-1");
        let deployer = CertificateDeployer::new(api.clone());

        let outcome = deployer.deploy(&request(Some("key-old"))).await.unwrap();

        assert_eq!(outcome.action, DeployAction::Updated);
        assert_eq!(outcome.replaced_key_id.as_deref(), Some("key-old"));
        assert_eq!(
            api.calls().await,
            vec![
                "create_private_key:example.com",
                "get_certificate_by_domain:example.com",
                "update_certificate:cert-1:CERT",
                "delete_private_key:key-old",
            ]
        );
    }

    #[tokio::test]
    async fn test_deploy_creates_when_existing_has_no_id() {
        let api = MockApi {
            existing: Some(Record::default()),
            ..Default::default()
        };
        let deployer = CertificateDeployer::new(api.clone());

        let outcome = deployer.deploy(&request(None)).await.unwrap();
        assert_eq!(outcome.action, DeployAction::Created);
    }
}
