//! Ambari provider: command-line host for the cluster and privilege
//! reconcilers.

use ambari_core::{Error, ProviderConfig};
use ambari_reconcile::{schemas, Observed, Provider};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Action, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the state document
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match cli::parse(&args) {
        Ok(invocation) => invocation,
        Err(msg) => {
            eprintln!("{}. Use 'ambari-provider help' for usage.", msg);
            std::process::exit(1);
        }
    };

    match invocation.command {
        Command::Help => println!("{}", cli::USAGE),
        Command::Kinds => {
            for schema in schemas() {
                println!("{}", schema.kind);
            }
        }
        Command::Schema(kind) => {
            let all = schemas();
            let rendered = match kind {
                None => serde_json::to_string_pretty(&all)?,
                Some(kind) => {
                    let schema = all
                        .iter()
                        .find(|s| s.kind == kind)
                        .ok_or(Error::UnknownResourceKind(kind))?;
                    serde_json::to_string_pretty(schema)?
                }
            };
            println!("{}", rendered);
        }
        Command::Run {
            action,
            kind,
            state,
            import_id,
        } => {
            let mut data = cli::load_state(&state)?;

            let config = ProviderConfig::resolve(invocation.overrides)?;
            info!("Config: {:?}", config);
            let provider = Provider::from_config(&config)?;

            match action {
                Action::Create => provider.create(&kind, &mut data).await?,
                Action::Read => {
                    if provider.read(&kind, &mut data).await? == Observed::Missing {
                        warn!("{} no longer exists", kind);
                    }
                }
                Action::Update => provider.update(&kind, &mut data).await?,
                Action::Delete => provider.delete(&kind, &mut data).await?,
                Action::Import => {
                    let import_id = import_id.unwrap_or_default();
                    provider.import(&kind, &mut data, &import_id).await?
                }
            }

            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }

    Ok(())
}
