//! Command-line parsing and state-document I/O.

use std::io::Read;
use std::path::{Path, PathBuf};

use ambari_core::ConfigOverrides;
use ambari_reconcile::ResourceData;
use anyhow::Context;

pub const USAGE: &str = "\
Ambari provider: reconcile Ambari clusters and privileges

Usage: ambari-provider [options] <command>

Commands:
  create <kind> <state.json>               Create the declared resource
  read <kind> <state.json>                 Refresh state from Ambari
  update <kind> <state.json>               Push declared changes
  delete <kind> <state.json>               Delete the resource
  import <kind> <state.json> <import-id>   Adopt an existing resource
  schema [kind]                            Print resource schemas
  kinds                                    List resource kinds
  help                                     Show this help message

Options:
  --config <path>   YAML or JSON config file (url, login, password)
  --url <url>       Ambari API base URL, e.g. http://ambari:8080/api/v1
  --login <login>   Ambari user

Use `-` as state.json to read from stdin. The password comes from
AMBARI_PASSWORD or the config file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run {
        action: Action,
        kind: String,
        state: PathBuf,
        import_id: Option<String>,
    },
    Schema(Option<String>),
    Kinds,
    Help,
}

#[derive(Debug)]
pub struct Invocation {
    pub overrides: ConfigOverrides,
    pub command: Command,
}

/// Parse arguments (program name excluded).
pub fn parse(args: &[String]) -> Result<Invocation, String> {
    let mut overrides = ConfigOverrides::default();
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("Missing value for {}", flag))
        };
        match arg.as_str() {
            "--config" => overrides.config_file = Some(PathBuf::from(value("--config")?)),
            "--url" => overrides.api_url = Some(value("--url")?),
            "--login" => overrides.login = Some(value("--login")?),
            "--help" | "-h" => return Ok(Invocation { overrides, command: Command::Help }),
            flag if flag.starts_with("--") => return Err(format!("Unknown option: {}", flag)),
            _ => positional.push(arg.as_str()),
        }
    }

    let command = match positional.as_slice() {
        [] | ["help"] => Command::Help,
        ["kinds"] => Command::Kinds,
        ["schema"] => Command::Schema(None),
        ["schema", kind] => Command::Schema(Some(kind.to_string())),
        ["import", kind, state, import_id] => Command::Run {
            action: Action::Import,
            kind: kind.to_string(),
            state: PathBuf::from(state),
            import_id: Some(import_id.to_string()),
        },
        ["import", ..] => {
            return Err("Usage: ambari-provider import <kind> <state.json> <import-id>".into())
        }
        [verb, kind, state] => {
            let action = match *verb {
                "create" => Action::Create,
                "read" => Action::Read,
                "update" => Action::Update,
                "delete" => Action::Delete,
                other => return Err(format!("Unknown command: {}", other)),
            };
            Command::Run {
                action,
                kind: kind.to_string(),
                state: PathBuf::from(state),
                import_id: None,
            }
        }
        [verb, ..] => return Err(format!("Unknown command or wrong arguments: {}", verb)),
    };

    Ok(Invocation { overrides, command })
}

/// Load a state document from a file, or stdin for `-`.
pub fn load_state(path: &Path) -> anyhow::Result<ResourceData> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read state from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?
    };

    if raw.trim().is_empty() {
        return Ok(ResourceData::new());
    }
    serde_json::from_str(&raw).with_context(|| format!("Invalid state document {}", path.display()))
}
