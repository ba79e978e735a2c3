use std::path::PathBuf;

use clap::Parser;
use markethub::run;

#[derive(Debug, Parser)]
#[command(name = "markethub", version, about = "Tenant API for the marketing-automation platform")]
struct Cli {
    /// Path to the service configuration file
    #[arg(short, long, default_value = "marketing.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    run(cli.config).await
}
