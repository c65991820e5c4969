use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    bioslide_cli::run_cli().await
}
