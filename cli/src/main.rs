//! CLI for pro, the pull/merge request opener.
//!
//! Finds the pull request (GitHub) or merge request (GitLab) for the
//! current git branch and opens, prints or copies its URL.

mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use output::Delivery;
use pro::{Config, ProviderKind, Runner, RunnerConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pull Request opener - open the pull/merge request for the current branch.
#[derive(Parser, Debug)]
#[command(name = "pro", author, version, about, long_about = None)]
struct Args {
    /// Path to the token file (defaults to ~/.config/pro/config.yml).
    #[arg(long, global = true, env = "PRO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the pull/merge request for the current branch (default).
    Open(OutputArgs),

    /// Pick one of the open pull/merge requests.
    List(OutputArgs),

    /// Store a personal access token for GitHub or GitLab.
    Auth {
        /// Provider to authenticate with.
        provider: AuthProvider,
    },
}

/// How to deliver the selected URL.
#[derive(clap::Args, Debug, Default)]
struct OutputArgs {
    /// Print the URL to stdout instead of opening it.
    #[arg(short, long, conflicts_with = "copy")]
    print: bool,

    /// Copy the URL to the clipboard instead of opening it.
    #[arg(short, long)]
    copy: bool,
}

impl OutputArgs {
    fn delivery(&self) -> Delivery {
        Delivery::from_flags(self.print, self.copy)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AuthProvider {
    Github,
    Gitlab,
}

impl From<AuthProvider> for ProviderKind {
    fn from(provider: AuthProvider) -> Self {
        match provider {
            AuthProvider::Github => Self::GitHub,
            AuthProvider::Gitlab => Self::GitLab,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Background clipboard owner spawned by `--copy`
    if let Some(code) = output::serve_clipboard() {
        return code;
    }

    // Initialize tracing
    init_tracing();

    // Process-wide rustls provider; Err means one is already installed
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    // Parse arguments
    let args = Args::parse();

    let config_path = match args.config.clone().map_or_else(Config::default_path, Ok) {
        Ok(path) => path,
        Err(e) => {
            error!(error = %e, "Unable to locate config file");
            output::error(&e.to_string(), None);
            return ExitCode::FAILURE;
        }
    };

    // Tokens are read once here and passed down
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            output::error(&e.to_string(), None);
            return ExitCode::FAILURE;
        }
    };

    match args.command.unwrap_or(Command::Open(OutputArgs::default())) {
        Command::Open(output_args) => {
            commands::open(&runner(config), output_args.delivery()).await
        }
        Command::List(output_args) => {
            commands::list(&runner(config), output_args.delivery()).await
        }
        Command::Auth { provider } => commands::auth(provider.into(), config, &config_path).await,
    }
}

/// Initializes tracing with environment filter support.
///
/// Logs go to stderr in compact form. The level comes from `RUST_LOG` and
/// defaults to "warn" so regular runs only show user-facing messages.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

/// Builds a runner that starts discovery in the current directory.
fn runner(config: Config) -> Runner {
    Runner::new(RunnerConfig::new(PathBuf::from("."), config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_open() {
        let args = Args::try_parse_from(["pro"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn parses_open_flags() {
        let args = Args::try_parse_from(["pro", "open", "-p"]).unwrap();
        match args.command {
            Some(Command::Open(output_args)) => {
                assert_eq!(output_args.delivery(), Delivery::Print)
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn print_and_copy_conflict() {
        assert!(Args::try_parse_from(["pro", "list", "--print", "--copy"]).is_err());
    }

    #[test]
    fn parses_auth_provider() {
        let args = Args::try_parse_from(["pro", "auth", "gitlab"]).unwrap();
        match args.command {
            Some(Command::Auth { provider }) => {
                assert_eq!(ProviderKind::from(provider), ProviderKind::GitLab)
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Args::try_parse_from(["pro", "auth", "bitbucket"]).is_err());
    }

    #[test]
    fn verifies_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
