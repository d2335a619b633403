use crate::config::ClientConfig;
use crate::domain::model::{Document, Page, Record};
use crate::domain::ports::TlsCertificateApi;
use crate::utils::error::{FastlyError, Result};
use crate::utils::validation::Validate;
use chrono::{SecondsFormat, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";
pub const API_KEY_HEADER: &str = "Fastly-Key";
pub const PAGE_SIZE: u32 = 20;

const PAGE_NUMBER_PARAM: &str = "page_number";
const PAGE_SIZE_PARAM: &str = "page_size";
const DOMAIN_FILTER_PARAM: &str = "filter[tls_domain.id][match]";

/// Fastly TLS API client.
///
/// Cloning is cheap and clones share the memoized TLS configuration id.
#[derive(Clone)]
pub struct FastlyClient {
    inner: Arc<Inner>,
}

struct Inner {
    api_key: String,
    tls_configuration_name: String,
    base_url: String,
    client: Client,
    tls_configuration_id: OnceCell<Option<String>>,
}

impl FastlyClient {
    /// Builds the client and, when called inside a tokio runtime, starts
    /// resolving the TLS configuration id in the background.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = Self {
            inner: Arc::new(Inner {
                api_key: config.api_key,
                tls_configuration_name: config.tls_configuration_name,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                client: builder.build()?,
                tls_configuration_id: OnceCell::new(),
            }),
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let prefetch = client.clone();
            handle.spawn(async move {
                if let Err(e) = prefetch.tls_configuration_id().await {
                    tracing::warn!("⚠️ TLS configuration lookup failed: {}", e);
                }
            });
        }

        Ok(client)
    }

    pub fn tls_configuration_name(&self) -> &str {
        &self.inner.tls_configuration_name
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.inner.base_url, path))?)
    }

    /// 發送請求；只有帶 body 時才加上 JSON:API 的 Content-Type/Accept
    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Response> {
        tracing::debug!("📡 {} {}", method, url);

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header(API_KEY_HEADER, &self.inner.api_key);

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, JSON_API_MEDIA_TYPE)
                .header(ACCEPT, JSON_API_MEDIA_TYPE)
                .body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        tracing::debug!("📡 API response status: {}", response.status());

        Ok(response.error_for_status()?)
    }

    async fn get_page(&self, base: &Url, filters: &[(&str, &str)], page_number: u32) -> Result<Page> {
        let mut url = base.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair(PAGE_NUMBER_PARAM, &page_number.to_string())
                .append_pair(PAGE_SIZE_PARAM, &PAGE_SIZE.to_string());
            for (name, value) in filters {
                query.append_pair(name, value);
            }
        }

        let page = self.send(Method::GET, url, None).await?.json::<Page>().await?;
        Ok(page)
    }

    /// Fetches every page of a list endpoint and concatenates the records.
    ///
    /// `page_number` and `page_size` are owned by the fetcher; passing either
    /// as a filter (or in `path`'s query string) is rejected. Pages are
    /// requested one after another until the latest page reports
    /// `current_page == total_pages`; every fetched page is appended. The
    /// returned envelope keeps the first page's `meta`.
    pub async fn fetch_list(&self, path: &str, filters: &[(&str, &str)]) -> Result<Page> {
        let base = self.endpoint(path)?;

        let reserved = [PAGE_NUMBER_PARAM, PAGE_SIZE_PARAM];
        let collision = filters
            .iter()
            .map(|(name, _)| name.to_string())
            .chain(base.query_pairs().map(|(name, _)| name.into_owned()))
            .find(|name| reserved.contains(&name.as_str()));
        if let Some(name) = collision {
            return Err(FastlyError::ValidationError {
                message: format!("query parameter '{}' is managed by the paginator", name),
            });
        }

        let mut page_number = 1;
        let mut result = self.get_page(&base, filters, page_number).await?;
        let mut latest = result.meta.clone();

        while latest.has_more() {
            page_number += 1;
            let next = self.get_page(&base, filters, page_number).await?;
            let previous = latest.current_page;
            latest = next.meta.clone();
            result.absorb(next);

            // 頁碼沒有前進 (或缺少 meta) 時停止，避免無限迴圈
            if latest.current_page <= previous {
                tracing::warn!(
                    "⚠️ {}: page {} reported current_page {}, stopping pagination",
                    path,
                    page_number,
                    latest.current_page
                );
                break;
            }
        }

        tracing::debug!(
            "📄 {}: collected {} records over {} page(s)",
            path,
            result.data.len(),
            page_number
        );
        Ok(result)
    }

    pub async fn list_tls_configurations(&self) -> Result<Page> {
        self.fetch_list("/tls/configurations", &[]).await
    }

    /// Id of the configured TLS configuration, looked up once per client.
    ///
    /// Concurrent callers share the in-flight lookup. `None` means no
    /// configuration carries the configured name; that answer is memoized
    /// too. A failed lookup is not, so the next caller retries.
    pub async fn tls_configuration_id(&self) -> Result<Option<String>> {
        let id = self
            .inner
            .tls_configuration_id
            .get_or_try_init(|| self.resolve_tls_configuration_id())
            .await?;
        Ok(id.clone())
    }

    async fn resolve_tls_configuration_id(&self) -> Result<Option<String>> {
        let wanted = self.inner.tls_configuration_name.as_str();
        let configurations = self.list_tls_configurations().await?;

        let id = configurations
            .data
            .into_iter()
            .find(|configuration| configuration.attribute_str("name") == Some(wanted))
            .and_then(|configuration| configuration.id);

        match &id {
            Some(id) => tracing::info!("🔧 TLS configuration '{}' resolved to {}", wanted, id),
            None => tracing::warn!("⚠️ TLS configuration '{}' not found", wanted),
        }
        Ok(id)
    }

    /// Uploads a private key named `<domain>-<timestamp>`; a new key is
    /// created on every renewal.
    pub async fn create_private_key(&self, key: &str, domain: &str) -> Result<Document> {
        let name = private_key_name(domain);
        let url = self.endpoint("/tls/private_keys")?;
        let body = private_key_body(key, &name);

        let document = self
            .send(Method::POST, url, Some(&body))
            .await?
            .json::<Document>()
            .await?;
        tracing::info!("🔑 Created private key {}", name);
        Ok(document)
    }

    pub async fn delete_private_key(&self, id: Option<&str>) -> Result<()> {
        let id = require_id(id, "deleting private key")?;
        let url = self.endpoint(&format!("/tls/private_keys/{}", id))?;

        self.send(Method::DELETE, url, None).await?;
        tracing::info!("🗑️ Deleted private key {}", id);
        Ok(())
    }

    /// First certificate whose `tls_domains` relationship lists `domain`.
    ///
    /// The API filter also returns partial matches, so every page is
    /// collected and checked for an exact match.
    pub async fn get_certificate_by_domain(&self, domain: &str) -> Result<Option<Record>> {
        let certificates = self
            .fetch_list("/tls/bulk/certificates", &[(DOMAIN_FILTER_PARAM, domain)])
            .await?;

        let found = certificates
            .data
            .into_iter()
            .find(|certificate| certificate.has_tls_domain(domain));

        if found.is_none() {
            tracing::debug!("🔍 No certificate found for {}", domain);
        }
        Ok(found)
    }

    pub async fn create_certificate(&self, certificate: &str, intermediates: &str) -> Result<Document> {
        let configuration_id = self.tls_configuration_id().await?.ok_or_else(|| {
            FastlyError::TlsConfigurationNotFound {
                name: self.inner.tls_configuration_name.clone(),
            }
        })?;

        let url = self.endpoint("/tls/bulk_certificates")?;
        let body = create_certificate_body(certificate, intermediates, &configuration_id);

        let document = self
            .send(Method::POST, url, Some(&body))
            .await?
            .json::<Document>()
            .await?;
        tracing::info!(
            "📜 Created certificate {}",
            document.data.id.as_deref().unwrap_or("<no id>")
        );
        Ok(document)
    }

    pub async fn update_certificate(
        &self,
        id: &str,
        certificate: &str,
        intermediates: &str,
    ) -> Result<Document> {
        let id = require_id(Some(id), "updating certificate")?;
        let url = self.endpoint(&format!("/tls/bulk_certificates/{}", id))?;
        let body = update_certificate_body(id, certificate, intermediates);

        let document = self
            .send(Method::PATCH, url, Some(&body))
            .await?
            .json::<Document>()
            .await?;
        tracing::info!("📜 Updated certificate {}", id);
        Ok(document)
    }

    pub async fn delete_certificate(&self, id: Option<&str>) -> Result<()> {
        let id = require_id(id, "deleting certificate")?;
        let url = self.endpoint(&format!("/tls/bulk_certificates/{}", id))?;

        self.send(Method::DELETE, url, None).await?;
        tracing::info!("🗑️ Deleted certificate {}", id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl TlsCertificateApi for FastlyClient {
    async fn create_private_key(&self, key: &str, domain: &str) -> Result<Document> {
        FastlyClient::create_private_key(self, key, domain).await
    }

    async fn delete_private_key(&self, id: Option<&str>) -> Result<()> {
        FastlyClient::delete_private_key(self, id).await
    }

    async fn get_certificate_by_domain(&self, domain: &str) -> Result<Option<Record>> {
        FastlyClient::get_certificate_by_domain(self, domain).await
    }

    async fn create_certificate(&self, certificate: &str, intermediates: &str) -> Result<Document> {
        FastlyClient::create_certificate(self, certificate, intermediates).await
    }

    async fn update_certificate(
        &self,
        id: &str,
        certificate: &str,
        intermediates: &str,
    ) -> Result<Document> {
        FastlyClient::update_certificate(self, id, certificate, intermediates).await
    }

    async fn delete_certificate(&self, id: Option<&str>) -> Result<()> {
        FastlyClient::delete_certificate(self, id).await
    }
}

fn require_id<'a>(id: Option<&'a str>, operation: &'static str) -> Result<&'a str> {
    id.filter(|id| !id.is_empty())
        .ok_or(FastlyError::MissingIdentifier { operation })
}

fn private_key_name(domain: &str) -> String {
    format!(
        "{}-{}",
        domain,
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

fn private_key_body(key: &str, name: &str) -> Value {
    json!({
        "data": {
            "type": "tls_private_key",
            "attributes": {
                "key": key,
                "name": name
            }
        }
    })
}

fn create_certificate_body(certificate: &str, intermediates: &str, configuration_id: &str) -> Value {
    json!({
        "data": {
            "type": "tls_bulk_certificate",
            "attributes": {
                "allow_untrusted_root": false,
                "cert_blob": certificate,
                "intermediates_blob": intermediates
            },
            "relationships": {
                "tls_configurations": {
                    "data": [
                        { "type": "tls_configuration", "id": configuration_id }
                    ]
                }
            }
        }
    })
}

fn update_certificate_body(id: &str, certificate: &str, intermediates: &str) -> Value {
    json!({
        "data": {
            "id": id,
            "type": "tls_bulk_certificate",
            "attributes": {
                "allow_untrusted_root": false,
                "cert_blob": certificate,
                "intermediates_blob": intermediates
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(Some("abc"), "deleting certificate").unwrap(), "abc");
        assert!(matches!(
            require_id(None, "deleting certificate"),
            Err(FastlyError::MissingIdentifier { operation: "deleting certificate" })
        ));
        assert!(require_id(Some(""), "deleting certificate").is_err());
    }

    #[test]
    fn test_private_key_name_has_iso_timestamp() {
        let name = private_key_name("example.com");
        let timestamp = name.strip_prefix("example.com-").unwrap();

        assert!(timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        // 與 JS toISOString 一致: 毫秒精度
        assert_eq!(timestamp.len(), "2024-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn test_create_certificate_body_links_configuration() {
        let body = create_certificate_body("CERT", "CHAIN", "cfg-1");

        assert_eq!(body["data"]["type"], "tls_bulk_certificate");
        assert_eq!(body["data"]["attributes"]["allow_untrusted_root"], false);
        assert_eq!(body["data"]["attributes"]["cert_blob"], "CERT");
        assert_eq!(body["data"]["attributes"]["intermediates_blob"], "CHAIN");
        assert_eq!(
            body["data"]["relationships"]["tls_configurations"]["data"][0],
            json!({"type": "tls_configuration", "id": "cfg-1"})
        );
    }

    #[test]
    fn test_update_certificate_body_has_no_relationships() {
        let body = update_certificate_body("cert-9", "CERT", "CHAIN");

        assert_eq!(body["data"]["id"], "cert-9");
        assert!(body["data"].get("relationships").is_none());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = FastlyClient::new(ClientConfig::new("", "Production"));
        assert!(matches!(result, Err(FastlyError::MissingConfigError { .. })));
    }

    #[test]
    fn test_new_outside_runtime_defers_lookup() {
        let client = FastlyClient::new(ClientConfig::new("key", "Production")).unwrap();
        assert_eq!(client.tls_configuration_name(), "Production");
        assert!(client.inner.tls_configuration_id.get().is_none());
    }
}
