use crate::config::toml_config::TomlConfig;
use crate::config::ClientConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "fastly-tls")]
#[command(about = "Manage Fastly TLS private keys and bulk certificates")]
pub struct CliConfig {
    #[arg(long, global = true, help = "TOML file with a [fastly] section")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "FASTLY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true, env = "FASTLY_TLS_CONFIGURATION")]
    pub tls_configuration: Option<String>,

    #[arg(long, global = true, env = "FASTLY_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, global = true, help = "Per-request timeout in seconds")]
    pub timeout_seconds: Option<u64>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List TLS configurations
    Configurations,
    /// Show the certificate serving a domain
    Certificate {
        #[arg(long)]
        domain: String,
    },
    /// Upload a key and create or update the domain's certificate
    Deploy {
        #[arg(long)]
        domain: String,
        #[arg(long, help = "PEM private key file")]
        key: PathBuf,
        #[arg(long, help = "PEM certificate file")]
        cert: PathBuf,
        #[arg(long, help = "PEM intermediates file")]
        intermediates: PathBuf,
        #[arg(long, help = "Private key id to delete after deployment")]
        replace_key: Option<String>,
    },
    /// Delete a private key
    DeleteKey {
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete a bulk certificate
    DeleteCertificate {
        #[arg(long)]
        id: Option<String>,
    },
}

impl CliConfig {
    /// 設定檔為基底，命令列/環境變數覆蓋
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut file = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        let section = &mut file.fastly;
        if let Some(api_key) = &self.api_key {
            section.api_key = Some(api_key.clone());
        }
        if let Some(name) = &self.tls_configuration {
            section.tls_configuration_name = Some(name.clone());
        }
        if let Some(base_url) = &self.base_url {
            section.base_url = Some(base_url.clone());
        }
        if let Some(timeout) = self.timeout_seconds {
            section.timeout_seconds = Some(timeout);
        }

        file.into_client_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[fastly]\napi_key = \"file-key\"\ntls_configuration_name = \"Staging\"\n"
        )
        .unwrap();

        let cli = CliConfig::try_parse_from([
            "fastly-tls",
            "--config",
            file.path().to_str().unwrap(),
            "--tls-configuration",
            "Production",
            "configurations",
        ])
        .unwrap();

        let config = cli.client_config().unwrap();
        assert_eq!(config.api_key, "file-key");
        assert_eq!(config.tls_configuration_name, "Production");
    }

    #[test]
    fn test_parse_deploy_command() {
        let cli = CliConfig::try_parse_from([
            "fastly-tls",
            "deploy",
            "--domain",
            "example.com",
            "--key",
            "key.pem",
            "--cert",
            "cert.pem",
            "--intermediates",
            "chain.pem",
            "--replace-key",
            "old-key",
        ])
        .unwrap();

        match cli.command {
            Command::Deploy {
                domain,
                replace_key,
                ..
            } => {
                assert_eq!(domain, "example.com");
                assert_eq!(replace_key.as_deref(), Some("old-key"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
