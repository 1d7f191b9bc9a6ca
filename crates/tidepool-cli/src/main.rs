//! Tidepool CLI - one facade operation per invocation
//!
//! Usage:
//!   tp get <key>                        Print stored text
//!   tp set <key> <value> [--ttl N]      Store text
//!   tp set <key> <json> --json          Store a JSON value ("123n" strings become big integers)
//!   tp get-json <key>                   Print a stored JSON value
//!   tp mget <key>...                    Print several keys
//!   tp del <key>...                     Delete keys
//!   tp exists <key>                     Exit code 0 if present, 1 if not
//!   tp del-pattern <glob>               Delete every key matching a glob
//!   tp expire <key>... --ttl N          Set a TTL on several keys
//!
//! Connection settings default to TIDEPOOL_REDIS_URL / TIDEPOOL_REDIS_DB.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tidepool_kv::{KvConfig, KvFacade};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "tp")]
#[command(about = "Tidepool key-value CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Redis URL (overrides TIDEPOOL_REDIS_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Database index (overrides TIDEPOOL_REDIS_DB)
    #[arg(long, global = true)]
    db: Option<i64>,

    /// Send keys exactly as given instead of lower-casing them
    #[arg(long, global = true)]
    case_sensitive: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the text stored at a key
    Get { key: String },
    /// Store a value at a key
    Set {
        key: String,
        value: String,
        /// Expire after this many seconds
        #[arg(long)]
        ttl: Option<u64>,
        /// Parse the value as JSON and store it in wire form
        #[arg(long)]
        json: bool,
    },
    /// Print the JSON value stored at a key
    GetJson { key: String },
    /// Print several keys at once
    Mget {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Delete keys
    Del {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Check whether a key exists
    Exists { key: String },
    /// Delete every key matching a glob pattern
    DelPattern {
        pattern: String,
        /// SCAN COUNT hint per page
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Set a TTL on several keys
    Expire {
        #[arg(required = true)]
        keys: Vec<String>,
        /// Seconds until expiry
        #[arg(long)]
        ttl: u64,
    },
}

impl Cli {
    fn config(&self) -> Result<KvConfig> {
        let mut config = KvConfig::from_env().context("Failed to read configuration")?;
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(db) = self.db {
            config.db_index = db;
        }
        if self.case_sensitive {
            config.ignore_key_case = false;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.config()?;
    debug!(url = %config.url, db = config.db_index, "Using configuration");

    let mut kv = KvFacade::redis(config)?;
    kv.connect().await.context("Failed to connect")?;

    let outcome = run(&kv, cli.command).await;
    kv.disconnect().await.context("Failed to disconnect")?;

    let found = outcome?;
    if !found {
        std::process::exit(1);
    }
    Ok(())
}

/// Execute one command; returns false when the requested key was absent
async fn run(kv: &KvFacade, command: Command) -> Result<bool> {
    match command {
        Command::Get { key } => Ok(print_optional(kv.get_text(key).await?)),
        Command::Set { key, value, ttl, json } => {
            let ttl = ttl.map(Duration::from_secs);
            if json {
                let value = tidepool_codec::decode(&value).context("Value is not valid JSON")?;
                kv.set_object(key, &value, ttl).await?;
            } else {
                kv.set_text(key, &value, ttl).await?;
            }
            println!("OK");
            Ok(true)
        }
        Command::GetJson { key } => {
            let value = kv.get_object(key).await?;
            let text = value.as_ref().map(tidepool_codec::encode).transpose()?;
            Ok(print_optional(text))
        }
        Command::Mget { keys } => {
            for (key, value) in kv.batch_get_text(keys).await? {
                match value {
                    Some(value) => println!("{}\t{}", key, value),
                    None => println!("{}\t(nil)", key),
                }
            }
            Ok(true)
        }
        Command::Del { keys } => {
            println!("{}", kv.delete_keys(keys).await?);
            Ok(true)
        }
        Command::Exists { key } => {
            let exists = kv.exists(key).await?;
            println!("{}", exists);
            Ok(exists)
        }
        Command::DelPattern { pattern, page_size } => {
            let removed = match page_size {
                Some(size) => kv.delete_by_pattern_paged(&pattern, size).await?,
                None => kv.delete_by_pattern(&pattern).await?,
            };
            println!("{}", removed);
            Ok(true)
        }
        Command::Expire { keys, ttl } => {
            kv.batch_update_ttl(keys, Duration::from_secs(ttl)).await?;
            println!("OK");
            Ok(true)
        }
    }
}

fn print_optional(value: Option<String>) -> bool {
    match value {
        Some(value) => {
            println!("{}", value);
            true
        }
        None => {
            println!("(nil)");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_with_ttl() {
        let cli = Cli::try_parse_from(["tp", "set", "k", "v", "--ttl", "30", "--db", "2"]).unwrap();
        assert_eq!(cli.db, Some(2));
        match cli.command {
            Command::Set { key, value, ttl, json } => {
                assert_eq!(key, "k");
                assert_eq!(value, "v");
                assert_eq!(ttl, Some(30));
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "tp",
            "--url",
            "redis://elsewhere:6379",
            "--case-sensitive",
            "get",
            "k",
        ])
        .unwrap();
        let config = cli.config().unwrap();
        assert_eq!(config.url, "redis://elsewhere:6379");
        assert!(!config.ignore_key_case);
    }

    #[test]
    fn test_mget_requires_keys() {
        assert!(Cli::try_parse_from(["tp", "mget"]).is_err());
    }
}
