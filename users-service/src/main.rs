use anyhow::Context as _;
use users_service::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    users_service::service::run(config)
        .await
        .context("users-service terminated with an error")
}
