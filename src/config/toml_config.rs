use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::utils::error::{FastlyError, Result};
use crate::utils::validation::{validate_required_field, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 設定檔格式:
///
/// ```toml
/// [fastly]
/// api_key = "${FASTLY_API_KEY}"
/// tls_configuration_name = "Production"
/// base_url = "https://api.fastly.com"
/// timeout_seconds = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub fastly: FastlySection,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FastlySection {
    pub api_key: Option<String>,
    pub tls_configuration_name: Option<String>,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl std::fmt::Debug for FastlySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastlySection")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("tls_configuration_name", &self.tls_configuration_name)
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FastlyError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FastlyError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FASTLY_API_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FastlyError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 轉成客戶端配置並驗證
    pub fn into_client_config(self) -> Result<ClientConfig> {
        let section = self.fastly;
        let api_key = validate_required_field("fastly.api_key", &section.api_key)?;
        let name = validate_required_field(
            "fastly.tls_configuration_name",
            &section.tls_configuration_name,
        )?;

        let config = ClientConfig {
            api_key: api_key.clone(),
            tls_configuration_name: name.clone(),
            base_url: section
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_seconds: section.timeout_seconds,
        };
        config.validate()?;
        Ok(config)
    }
}
