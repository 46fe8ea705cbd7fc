use anyhow::Result;
use rolechat::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
