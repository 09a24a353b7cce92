use tracing_subscriber::EnvFilter;

use javelin::{cli, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    let code = cli::run(config).await;
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
