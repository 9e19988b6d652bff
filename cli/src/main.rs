use clap::Parser;
use cobuy_cli::CobuyCli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    CobuyCli::parse().run().await
}
