use clap::Parser;
use plantfix_chat::relay::{self, RelayConfig};
use plantfix_chat::utils::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,tower_http=info");

    // Must run before parsing so `.env` values feed the env-backed flags.
    if dotenv::dotenv().is_ok() {
        tracing::info!("Loaded .env file");
    }

    let config = RelayConfig::parse();
    relay::serve(config).await
}
