use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use pca_core::config::{parse_flag, ENV_INSECURE_TLS};
use pca_core::{ClientConfig, PanelError, PanelSession, ZoneSet, ZoneStates};
use tracing::debug;

#[derive(Parser)]
#[command(name = "pca-cli")]
#[command(about = "Start and stop irrigation zones on a PCA panel")]
struct Cli {
    /// Panel address, e.g. 192.168.1.20:8888 or https://panel.lan
    #[arg(long, env = "PCA_URL")]
    url: String,

    /// Accept any TLS certificate (self-signed panels only)
    #[arg(long, env = ENV_INSECURE_TLS, value_parser = parse_insecure)]
    insecure: bool,

    /// Connect and read timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List zone names
    Zones,
    /// Print the control page
    Control {
        #[arg(long, env = "PCA_PASSWORD")]
        password: String,
    },
    /// Start the PCA system; zones not listed are switched off
    Start {
        #[arg(long, env = "PCA_PASSWORD")]
        password: String,
        /// NAME=on|off, repeatable
        #[arg(long = "zone", value_parser = parse_zone_arg)]
        zones: Vec<(String, bool)>,
    },
    /// Stop the PCA system
    Stop {
        #[arg(long, env = "PCA_PASSWORD")]
        password: String,
    },
}

/// Same spellings the library accepts for `PCA_INSECURE_TLS`.
fn parse_insecure(raw: &str) -> Result<bool, PanelError> {
    parse_flag(ENV_INSECURE_TLS, raw)
}

fn parse_zone_arg(raw: &str) -> Result<(String, bool), String> {
    let (name, state) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=on|off, got {raw:?}"))?;
    let on = match state.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => true,
        "off" | "false" | "0" => false,
        other => return Err(format!("unknown state {other:?} for zone {name:?}")),
    };
    Ok((name.to_string(), on))
}

/// Pair requested flags with the panel's zones by name; unlisted zones are
/// off.
fn zone_states(available: &ZoneSet, requested: &[(String, bool)]) -> anyhow::Result<ZoneStates> {
    let mut states = available.to_states(false);
    for (name, on) in requested {
        if !available.contains(name) {
            let known: Vec<_> = available.iter().collect();
            bail!("unknown zone {name:?}; the panel reports: {}", known.join(", "));
        }
        states.set(name.as_str(), *on);
    }
    Ok(states)
}

async fn login(session: &PanelSession, password: &str) -> anyhow::Result<()> {
    session.fetch_home().await.context("fetching landing page")?;
    session.login(password).await.context("logging in")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout_secs);
    let config = ClientConfig::builder()
        .base_url(cli.url)
        .insecure_tls(cli.insecure)
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()?;
    debug!(base_url = %config.base_url, "using panel");
    let session = PanelSession::new(&config);

    match cli.command {
        Command::Zones => {
            session.fetch_home().await.context("fetching landing page")?;
            session.fetch_zones().await.context("fetching zones")?;
            for name in session.zone_names().await?.iter() {
                println!("{name}");
            }
        }
        Command::Control { password } => {
            login(&session, &password).await?;
            println!("{}", session.fetch_control_page().await?);
        }
        Command::Start { password, zones } => {
            session.fetch_home().await.context("fetching landing page")?;
            session.fetch_zones().await.context("fetching zones")?;
            let states = zone_states(&session.zone_names().await?, &zones)?;
            session.login(&password).await.context("logging in")?;
            println!("{}", session.start_zones(&states).await?);
        }
        Command::Stop { password } => {
            login(&session, &password).await?;
            println!("{}", session.stop_zones().await?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_arg_accepts_names_with_spaces() {
        assert_eq!(parse_zone_arg("back yard=on").unwrap(), ("back yard".to_string(), true));
        assert_eq!(parse_zone_arg("front=OFF").unwrap(), ("front".to_string(), false));
    }

    #[test]
    fn zone_arg_rejects_bad_state() {
        assert!(parse_zone_arg("front=maybe").is_err());
        assert!(parse_zone_arg("front").is_err());
    }

    #[test]
    fn unlisted_zones_default_off() {
        let available: ZoneSet = ["front", "back yard", "greenhouse"].into_iter().collect();
        let states = zone_states(&available, &[("greenhouse".to_string(), true)]).unwrap();
        assert_eq!(states.len(), 3);
        assert_eq!(states.get("greenhouse"), Some(true));
        assert_eq!(states.get("front"), Some(false));
    }

    #[test]
    fn unknown_zone_is_rejected() {
        let available: ZoneSet = ["front"].into_iter().collect();
        let err = zone_states(&available, &[("orchard".to_string(), true)]).unwrap_err();
        assert!(err.to_string().contains("orchard"));
    }

    #[test]
    fn insecure_flag_accepts_library_spellings() {
        assert!(parse_insecure("1").unwrap());
        assert!(parse_insecure("Yes").unwrap());
        assert!(!parse_insecure("off").unwrap());
        assert!(parse_insecure("maybe").is_err());
    }

    #[test]
    fn insecure_flag_reads_numeric_env_value() {
        std::env::set_var(ENV_INSECURE_TLS, "1");
        let parsed = Cli::try_parse_from(["pca-cli", "--url", "panel", "stop", "--password", "x"]);
        std::env::remove_var(ENV_INSECURE_TLS);
        assert!(parsed.unwrap().insecure);
    }

    #[test]
    fn insecure_switch_without_env() {
        let cli = Cli::try_parse_from(["pca-cli", "--url", "panel", "--insecure", "zones"]).unwrap();
        assert!(cli.insecure);
    }

    #[test]
    fn cli_parses_start_command() {
        let cli = Cli::try_parse_from([
            "pca-cli", "--url", "panel.lan", "start", "--password", "pw", "--zone", "front=on",
        ])
        .unwrap();
        match cli.command {
            Command::Start { zones, .. } => assert_eq!(zones, vec![("front".to_string(), true)]),
            _ => panic!("expected start"),
        }
    }
}
