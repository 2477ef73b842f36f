use std::sync::Arc;

use reportdesk_app::config::ClientConfig;
use reportdesk_app::router::View;
use reportdesk_app::shell::Shell;
use reportdesk_client::client::HubClient;
use reportdesk_client::{ReportApi, ReportService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // Logs go to stderr so the job table on stdout stays readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reportdesk_app=info,reportdesk_client=info,reportdesk_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = ClientConfig::from_env()?;
    tracing::info!(
        api_base_url = %config.api_base_url,
        hub_path = %config.hub_path,
        poll_interval_secs = config.poll_interval.as_secs(),
        "Loaded client configuration",
    );

    // --- Services ---
    let service: Arc<dyn ReportService> = Arc::new(ReportApi::new(config.api_base_url.clone()));
    let hub = HubClient::new(&config.api_base_url, &config.hub_path)?;

    let shell = Shell::new(service, Some(hub), config.feed_settings());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    shell.run(stdin, std::io::stdout(), View::default()).await?;

    tracing::info!("Goodbye");
    Ok(())
}
