use anyhow::Context;
use clap::Parser;
use fastly_tls::config::cli::Command;
use fastly_tls::utils::error::ErrorSeverity;
use fastly_tls::utils::logger;
use fastly_tls::{CertificateDeployer, CliConfig, DeployRequest, FastlyClient, FastlyError};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli.command);

    if let Err(e) = run(cli).await {
        let exit_code = match e.downcast_ref::<FastlyError>() {
            Some(err) => {
                tracing::error!("❌ {} (Severity: {:?})", err, err.severity());
                eprintln!("❌ {}", err.user_friendly_message());
                eprintln!("💡 {}", err.recovery_suggestion());
                match err.severity() {
                    ErrorSeverity::Medium => 2,
                    ErrorSeverity::High => 1,
                    ErrorSeverity::Critical => 3,
                }
            }
            None => {
                tracing::error!("❌ {:#}", e);
                eprintln!("❌ {:#}", e);
                1
            }
        };

        std::process::exit(exit_code);
    }
}

async fn run(cli: CliConfig) -> anyhow::Result<()> {
    let client = FastlyClient::new(cli.client_config()?)?;

    match cli.command {
        Command::Configurations => {
            let configurations = client.list_tls_configurations().await?;
            for configuration in &configurations.data {
                println!(
                    "{}\t{}",
                    configuration.id.as_deref().unwrap_or("-"),
                    configuration.attribute_str("name").unwrap_or("-")
                );
            }
        }
        Command::Certificate { domain } => match client.get_certificate_by_domain(&domain).await? {
            Some(certificate) => println!("{}", serde_json::to_string_pretty(&certificate)?),
            None => {
                tracing::warn!("⚠️ No certificate found for {}", domain);
                println!("No certificate found for {}", domain);
            }
        },
        Command::Deploy {
            domain,
            key,
            cert,
            intermediates,
            replace_key,
        } => {
            let request = DeployRequest {
                domain,
                private_key: read_pem(&key).await?,
                certificate: read_pem(&cert).await?,
                intermediates: read_pem(&intermediates).await?,
                replace_key_id: replace_key,
            };

            let outcome = CertificateDeployer::new(client).deploy(&request).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::DeleteKey { id } => {
            client.delete_private_key(id.as_deref()).await?;
            println!("✅ Private key deleted");
        }
        Command::DeleteCertificate { id } => {
            client.delete_certificate(id.as_deref()).await?;
            println!("✅ Certificate deleted");
        }
    }

    Ok(())
}

async fn read_pem(path: &std::path::Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}
