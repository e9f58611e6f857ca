use clap::{Parser, Subcommand};
use lingo_client::LingoClient;
use lingo_client::endpoint::EndpointConfig;
use lingo_host::types::ServiceKind;
use std::time;
use tokio::time::interval;
use tracing::{debug, info};

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "lingo-cli")]
#[command(about = "Talk to SiriusLingo service hosts", long_about = None)]
struct Cli {
    #[arg(long, env = "LINGO_ADDR", default_value = "127.0.0.1")]
    addr: String,

    /// Defaults to well-known port of addressed service
    #[arg(long, env = "LINGO_PORT", value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    #[arg(long, default_value_t = 300)]
    connect_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send single ping and print reply
    Ping {
        service: ServiceKind,
        #[arg(default_value = "")]
        message: String,
    },
    /// Wait until service answers pings (useful in startup scripts)
    Ensure {
        service: ServiceKind,
        #[arg(long, default_value_t = 10)]
        retry: u32,
    },
}

impl Commands {
    fn service(&self) -> ServiceKind {
        match self {
            Commands::Ping { service, .. } | Commands::Ensure { service, .. } => *service,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lingo_host::trace_init()?;

    let cli = Cli::parse();
    debug!("CLI is {:#?}", cli);

    let port = cli.port.unwrap_or_else(|| cli.command.service().default_port());
    let endpoint = EndpointConfig::new(cli.addr, port)
        .with_connect_timeout(time::Duration::from_millis(cli.connect_timeout_ms));
    let client = LingoClient::from_endpoint(endpoint);

    match cli.command {
        Commands::Ping { service, message } => {
            let reply = client.ping(service, message).await?;
            println!("{}: {}", reply.service, reply.message);
        }
        Commands::Ensure { service, retry } => {
            let mut ival = interval(time::Duration::from_secs(1));
            let mut last_err = None;
            for attempt in 0..retry {
                ival.tick().await;
                match client.ping(service, String::new()).await {
                    Ok(reply) => {
                        info!("{} is up (attempt {attempt})", reply.service);
                        return Ok(());
                    }
                    Err(err) => {
                        debug!("{service} not ready: {err:#}");
                        last_err = Some(err);
                    }
                }
            }
            match last_err {
                Some(err) => return Err(err.context(format!("{service} never answered"))),
                None => anyhow::bail!("no attempts made, --retry must be positive"),
            }
        }
    }
    Ok(())
}
