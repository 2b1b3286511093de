//! Command-line access to a New Focus 8742/8743 controller.
//!
//! ```bash
//! nf8743 --host 192.168.1.101 identify
//! nf8743 --host 192.168.1.101 ask AE? --axis 1
//! nf8743 --host 192.168.1.101 do MM --axis 1 --value 1
//! nf8743 list
//! ```

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use newfocus8743::config::DriverConfig;
use newfocus8743::protocol::codec::CommandValue;
use newfocus8743::protocol::command::Shape;
use newfocus8743::protocol::vocabulary;
use newfocus8743::{tracing_init, NewFocus8743};

#[derive(Parser, Debug)]
#[command(name = "nf8743", version, about = "New Focus 8742/8743 Picomotor controller CLI")]
struct Cli {
    /// TOML configuration file (default: newfocus8743.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Controller hostname or IP (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Controller TCP port (overrides configuration)
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the identification string
    Identify,
    /// Send an action command (no reply expected)
    Do {
        /// Wire mnemonic, e.g. MM
        mnemonic: String,
        #[arg(long)]
        axis: Option<u8>,
        #[arg(long, allow_hyphen_values = true)]
        value: Option<String>,
    },
    /// Send a query and print the converted reply
    Ask {
        /// Wire mnemonic including '?', e.g. AE?
        mnemonic: String,
        #[arg(long)]
        axis: Option<u8>,
    },
    /// List the command vocabulary
    List,
}

/// Integers stay integers, numbers with a fraction become floats,
/// comma lists become integer tuples, anything else is sent verbatim.
fn parse_value(raw: &str) -> CommandValue {
    if let Ok(v) = raw.parse::<i64>() {
        return CommandValue::Int(v);
    }
    if raw.contains(',') {
        let parts: Result<Vec<i64>, _> = raw.split(',').map(|p| p.trim().parse()).collect();
        if let Ok(values) = parts {
            return CommandValue::Ints(values);
        }
    }
    if let Ok(v) = raw.parse::<f64>() {
        return CommandValue::Float(v);
    }
    CommandValue::Text(raw.to_string())
}

fn load_config(cli: &Cli) -> Result<DriverConfig> {
    // Host may come from the command line only, so validate after overrides.
    let mut config = DriverConfig::load_unvalidated(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(host) = &cli.host {
        config.connection.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.connection.port = port;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::List = cli.command {
        for entry in vocabulary::all() {
            let d = entry.descriptor();
            let shape = match d.shape {
                Shape::Do => "do",
                Shape::Ask => "ask",
            };
            println!("{:<6} {:<4} {:?}\t{}", d.mnemonic, shape, d.arity, d.summary);
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    tracing_init::init_from_config(&config.logging);

    let driver = NewFocus8743::connect_with(&config.connection)
        .await
        .with_context(|| format!("Failed to connect to {}", config.connection.target()))?;

    let outcome = run(&driver, cli.command).await;
    driver.close().await.context("Failed to close connection")?;
    outcome
}

async fn run(driver: &NewFocus8743, command: Command) -> Result<()> {
    match command {
        Command::Identify => {
            println!("{}", driver.identify().await?);
        }
        Command::Do {
            mnemonic,
            axis,
            value,
        } => {
            let entry = vocabulary::lookup(&mnemonic)
                .ok_or_else(|| anyhow!("Unknown command '{}'", mnemonic))?;
            if entry.descriptor().shape != Shape::Do {
                bail!("'{}' is a query; use `ask`", mnemonic);
            }
            let value = value.as_deref().map(parse_value);
            debug!(mnemonic = %mnemonic, ?axis, ?value, "Executing");
            entry
                .run(driver, axis, value)
                .await
                .with_context(|| format!("{} failed", mnemonic))?;
        }
        Command::Ask { mnemonic, axis } => {
            let entry = vocabulary::lookup(&mnemonic)
                .ok_or_else(|| anyhow!("Unknown command '{}'", mnemonic))?;
            if entry.descriptor().shape != Shape::Ask {
                bail!("'{}' is not a query; use `do`", mnemonic);
            }
            let reply = entry
                .run(driver, axis, None)
                .await
                .with_context(|| format!("{} failed", mnemonic))?;
            println!("{}", reply);
        }
        Command::List => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("0"), CommandValue::Int(0));
        assert_eq!(parse_value("-200"), CommandValue::Int(-200));
        assert_eq!(parse_value("0.1"), CommandValue::Float(0.1));
        assert_eq!(
            parse_value("570,8190,10,25"),
            CommandValue::Ints(vec![570, 8190, 10, 25])
        );
        assert_eq!(parse_value("+"), CommandValue::Text("+".to_string()));
    }

    #[test]
    fn test_cli_parses_do_with_negative_value() {
        let cli = Cli::try_parse_from([
            "nf8743", "--host", "10.0.0.2", "do", "PR", "--axis", "1", "--value", "-50",
        ])
        .unwrap();
        match cli.command {
            Command::Do { mnemonic, axis, value } => {
                assert_eq!(mnemonic, "PR");
                assert_eq!(axis, Some(1));
                assert_eq!(value.as_deref(), Some("-50"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
