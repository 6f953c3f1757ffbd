//! `mailacct` - resolve mail account credentials from the command line.
//!
//! ```text
//! mailacct [--config PATH] [--batch] url <location>
//! mailacct [--config PATH] [--batch] resolve <location>
//! mailacct [--config PATH] [--batch] bearer <location>
//! mailacct [--config PATH] [--batch] match <location> <location>
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod prompt;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mailacct_core::{Account, CredentialConfig, Resolver};
use mailacct_oauth::ShellRunner;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prompt::TerminalPrompter;

#[derive(Debug, Parser)]
#[command(name = "mailacct")]
#[command(version)]
#[command(about = "Resolve mail account credentials")]
struct Cli {
    /// Path to the credential settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never prompt; fail when a credential is missing
    #[arg(long, global = true)]
    batch: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Print the parsed location
    Url {
        /// Account location, e.g. imaps://alice@imap.example.com
        location: String,
    },
    /// Resolve login and password
    Resolve {
        /// Account location
        location: String,
    },
    /// Print an OAUTHBEARER initial response
    Bearer {
        /// Account location
        location: String,
    },
    /// Report whether two locations share a connection
    Match {
        /// First account location
        first: String,
        /// Second account location
        second: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<CredentialConfig> {
    let config = match &cli.config {
        Some(path) => CredentialConfig::load(path)?,
        None => CredentialConfig::load_default()?,
    };
    Ok(if cli.batch {
        config.with_interactive(false)
    } else {
        config
    })
}

fn parse_location(location: &str) -> anyhow::Result<Account> {
    Account::parse(location).with_context(|| format!("invalid location {location:?}"))
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    debug!(interactive = config.interactive, "Loaded settings");
    let mut resolver = Resolver::new(&config, TerminalPrompter);

    match &cli.command {
        Command::Url { location } => {
            let account = parse_location(location)?;
            println!("{}", account.to_url().redacted());
        }
        Command::Resolve { location } => {
            let mut account = parse_location(location)?;
            resolver
                .credentials(&mut account)
                .context("could not resolve credentials")?;
            info!("Resolved credentials for {}", account.host());
            println!("{}", account.to_url().redacted());
            println!("login: {}", account.login().unwrap_or_default());
        }
        Command::Bearer { location } => {
            let mut account = parse_location(location)?;
            let token = resolver
                .oauth_bearer(&mut account, &mut ShellRunner)
                .context("could not build OAUTHBEARER token")?;
            println!("{token}");
        }
        Command::Match { first, second } => {
            let a1 = parse_location(first)?;
            let a2 = parse_location(second)?;
            println!("{}", if a1.matches(&a2, &config) { "match" } else { "no match" });
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mailacct=info,mailacct_core=info,mailacct_oauth=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(&cli)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("mailacct").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        assert_eq!(
            parse(&["url", "imap://h"]).unwrap().command,
            Command::Url {
                location: "imap://h".to_string()
            }
        );
        assert_eq!(
            parse(&["bearer", "smtps://h"]).unwrap().command,
            Command::Bearer {
                location: "smtps://h".to_string()
            }
        );
        assert_eq!(
            parse(&["match", "imap://a", "imap://b"]).unwrap().command,
            Command::Match {
                first: "imap://a".to_string(),
                second: "imap://b".to_string()
            }
        );
    }

    #[test]
    fn test_parse_options_anywhere() {
        let cli = parse(&["resolve", "--batch", "pop://h", "--config", "/tmp/c.json"]).unwrap();
        assert!(cli.batch);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        assert_eq!(
            cli.command,
            Command::Resolve {
                location: "pop://h".to_string()
            }
        );

        let cli = parse(&["--batch", "url", "imap://h"]).unwrap();
        assert!(cli.batch);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_parse_errors() {
        use clap::error::ErrorKind;

        let kind = |args: &[&str]| parse(args).unwrap_err().kind();
        assert!(matches!(
            kind(&[]),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand | ErrorKind::MissingSubcommand
        ));
        assert_eq!(kind(&["url"]), ErrorKind::MissingRequiredArgument);
        assert_eq!(kind(&["match", "imap://a"]), ErrorKind::MissingRequiredArgument);
        assert_eq!(kind(&["frobnicate", "imap://a"]), ErrorKind::InvalidSubcommand);
        assert_eq!(kind(&["url", "imap://a", "extra"]), ErrorKind::UnknownArgument);
        assert_eq!(kind(&["url", "imap://a", "--config"]), ErrorKind::InvalidValue);
        assert_eq!(kind(&["--verbose", "url", "imap://a"]), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_batch_disables_prompts() {
        let path = std::env::temp_dir().join(format!("mailacct-cli-test-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "interactive": true }"#).unwrap();
        let cli = parse(&["--batch", "--config", path.to_str().unwrap(), "url", "imap://h"]).unwrap();
        let config = load_config(&cli).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(!config.interactive);
    }
}
