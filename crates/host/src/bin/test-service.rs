use clap::Parser;
use lingo_host::config::HostArgs;
use lingo_host::services;
use lingo_host::types::ServiceKind;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "test-service")]
#[command(about = "SiriusLingo test service", long_about = None)]
struct Cli {
    #[command(flatten)]
    host: HostArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lingo_host::trace_init()?;

    let cli = Cli::parse();
    debug!("CLI is {:#?}", cli);

    services::run(ServiceKind::Test, cli.host).await
}
