//! `repu` - terminal shell over the reputation dashboard API.

mod config;
mod shell;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use config::AppConfig;
use repu_client::Params;
use repu_error::RepuError;
use shell::{parse_param, Shell};

#[derive(Parser)]
#[command(name = "repu")]
#[command(about = "Reputation dashboard console")]
#[command(version)]
struct Cli {
    /// YAML config file (defaults to configs/default.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        username: String,
        password: String,

        /// View to return to after login
        #[arg(long)]
        redirect: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored role and its home view
    Whoami,

    /// Navigate to a view through the route guard
    Open { path: String },

    /// GET an API endpoint and print its data
    Get {
        path: String,

        /// Query parameters as key=value
        params: Vec<String>,

        /// View the request is made from
        #[arg(long)]
        view: Option<String>,
    },

    /// Print text with the given terms marked
    Highlight {
        text: String,
        terms: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    dotenv().ok();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            eprintln!("{}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

/// Envelope and transport errors are shown the way the dashboard shows them.
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<RepuError>() {
        Some(e) => e.user_message(),
        None => format!("{err:#}"),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Highlight { text, terms } = &cli.command {
        println!("{}", repu_core::highlight_html(text, terms));
        return Ok(());
    }

    let cfg = AppConfig::load(cli.config.as_deref())?;
    let mut shell = Shell::open(&cfg)?;

    match cli.command {
        Commands::Login {
            username,
            password,
            redirect,
        } => {
            let location = shell
                .login(&username, &password, redirect.as_deref())
                .await?;
            println!("{location}");
        }
        Commands::Logout => println!("{}", shell.logout()?),
        Commands::Whoami => println!("{}", serde_json::to_string_pretty(&shell.whoami())?),
        Commands::Open { path } => println!("{}", shell.open_view(&path)?),
        Commands::Get { path, params, view } => {
            let params = params
                .iter()
                .map(|p| parse_param(p))
                .collect::<anyhow::Result<Params>>()?;
            let data = shell.get(&path, params, view.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Commands::Highlight { .. } => {}
    }
    Ok(())
}

fn init_tracing() {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_uses_friendly_messages() {
        let business = anyhow::Error::from(RepuError::Business {
            code: 400,
            message: "invalid username or password".to_string(),
        });
        assert_eq!(describe(&business), "invalid username or password");

        let timeout = anyhow::Error::from(RepuError::Timeout {
            operation: "GET /api/reviews".to_string(),
            timeout_ms: 15_000,
        });
        assert_eq!(describe(&timeout), "请求超时，请重试");

        let other = anyhow::anyhow!("expected key=value");
        assert_eq!(describe(&other), "expected key=value");
    }

    #[test]
    fn test_cli_parses_get_with_params() {
        let cli = Cli::try_parse_from(["repu", "get", "/api/reviews", "productId=1", "--view", "/reviews"])
            .unwrap();
        match cli.command {
            Commands::Get { path, params, view } => {
                assert_eq!(path, "/api/reviews");
                assert_eq!(params, vec!["productId=1".to_string()]);
                assert_eq!(view.as_deref(), Some("/reviews"));
            }
            _ => panic!("expected get"),
        }
    }
}
