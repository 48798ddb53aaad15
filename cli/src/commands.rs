//! `open`, `list` and `auth` command handlers.

use crate::output::{self, Delivery, OutputError, SUCCESS, URL};
use anstream::{eprintln, println};
use dialoguer::{FuzzySelect, Password};
use pro::{
    verify_token, Config, Lookup, OpenOutcome, ProviderError, ProviderKind, RepositoryError,
    Runner, RunnerError,
};
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;

/// Opens (or prints/copies) the request for the current branch.
pub async fn open(runner: &Runner, delivery: Delivery) -> ExitCode {
    let outcome = match runner.open().await {
        Ok(outcome) => outcome,
        Err(e) => return report(&e),
    };

    match outcome {
        OpenOutcome::Homepage { url } => {
            output::info("Looks like you are on the main branch. Opening home page.");
            finish(output::deliver(&url, delivery))
        }
        OpenOutcome::Request {
            provider,
            branch,
            lookup,
        } => {
            eprintln!("Current branch: {SUCCESS}{branch}{SUCCESS:#}");
            let noun = provider.request_noun();

            match lookup {
                Lookup::Existing { request } => finish(output::deliver(&request.web_url, delivery)),
                Lookup::Missing { create_url } => {
                    output::info(&format!("No open {noun} found for current branch"));
                    eprintln!("Create {noun} at {URL}{create_url}{URL:#}");
                    match delivery {
                        Delivery::Print => println!("{create_url}"),
                        Delivery::Copy => {
                            if let Err(e) = output::copy_to_clipboard(&create_url) {
                                output::error(&e.to_string(), None);
                                return ExitCode::FAILURE;
                            }
                            output::info("URL copied to clipboard.");
                        }
                        Delivery::Browser => {}
                    }
                    ExitCode::SUCCESS
                }
                Lookup::NotPushed { branch } => {
                    output::info(&format!(
                        "No open {noun} found and branch '{branch}' does not exist on the remote."
                    ));
                    output::info(&format!(
                        "Push it with `git push -u origin {branch}` and try again."
                    ));
                    ExitCode::SUCCESS
                }
            }
        }
    }
}

/// Lets the user pick among the homepage and open requests.
pub async fn list(runner: &Runner, delivery: Delivery) -> ExitCode {
    let entries = match runner.list().await {
        Ok(entries) => entries,
        Err(e) => return report(&e),
    };

    let labels: Vec<&str> = entries.iter().map(|entry| entry.label.as_str()).collect();
    let selection = FuzzySelect::new()
        .with_prompt("Select")
        .items(&labels)
        .default(0)
        .interact_opt();

    match selection {
        Ok(Some(index)) => finish(output::deliver(&entries[index].url, delivery)),
        // Aborted with Esc or q
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("Selection failed: {e}"), None);
            ExitCode::FAILURE
        }
    }
}

/// Prompts for a token, validates it and stores it in the config file.
pub async fn auth(provider: ProviderKind, mut config: Config, config_path: &Path) -> ExitCode {
    output::info(&format!(
        "Generate your token at {URL}{}{URL:#}",
        provider.token_page()
    ));
    output::info(&format!(
        "The only required scope is '{}'",
        provider.required_scope()
    ));

    let token = match Password::new()
        .with_prompt("Token")
        .allow_empty_password(true)
        .interact()
    {
        Ok(token) => token.trim().to_string(),
        Err(e) => {
            output::error(&format!("Unable to read token: {e}"), None);
            return ExitCode::FAILURE;
        }
    };

    if token.is_empty() {
        output::error("Token is empty. Try again", None);
        return ExitCode::FAILURE;
    }

    match verify_token(provider, &token).await {
        Ok(user_id) => debug!(user_id, "Token verified"),
        Err(ProviderError::Unauthorized | ProviderError::TokenExpired) => {
            output::error("Token is invalid. Try again", None);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            output::error(&format!("Unable to verify token: {e}"), None);
            return ExitCode::FAILURE;
        }
    }

    config.set_token(provider, token);
    if let Err(e) = config.save(config_path) {
        output::error(&e.to_string(), None);
        return ExitCode::FAILURE;
    }

    output::success("Saved.");
    ExitCode::SUCCESS
}

fn finish(result: Result<(), OutputError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string(), None);
            ExitCode::FAILURE
        }
    }
}

/// Prints guidance for a runner error and picks the exit code.
fn report(error: &RunnerError) -> ExitCode {
    debug!(error = ?error, "Command failed");

    match error {
        RunnerError::Repository(RepositoryError::NotFound { .. }) => {
            output::error(
                "Unable to find git repository in given directory or any of parent directories.",
                Some("Please make sure you are in the project directory."),
            );
        }
        RunnerError::Repository(RepositoryError::NoRemoteOrigin) => {
            output::error(
                "No remote named \"origin\" found.",
                Some("Please make sure you have a remote named \"origin\"."),
            );
        }
        RunnerError::Repository(RepositoryError::NoActiveBranch) => {
            output::error("No active branch found.", Some("Switch to a branch and try again."));
            return ExitCode::SUCCESS;
        }
        RunnerError::Repository(e) => output::error(&e.to_string(), None),
        RunnerError::Remote(e) => output::error(&format!("Unable to parse origin URL: {e}"), None),
        RunnerError::UnsupportedHost { host } => {
            output::error(
                &format!("Unknown remote type: {host}"),
                Some("Only github.com and gitlab.com remotes are supported."),
            );
        }
        RunnerError::Provider {
            provider,
            project,
            noun,
            source,
        } => report_provider(*provider, project, noun, source),
    }

    ExitCode::FAILURE
}

fn report_provider(provider: ProviderKind, project: &str, noun: &str, source: &ProviderError) {
    let name = provider.display_name();
    let command = provider.as_str();

    match source {
        ProviderError::MissingToken { .. } => output::error(
            &format!("{name} token is not set. Run `pro auth {command}` to set it."),
            None,
        ),
        ProviderError::NotFound { .. } => output::error(
            &format!("Project not found: {project}"),
            Some("Maybe it was renamed or deleted? Change remote URL and try again."),
        ),
        e if e.needs_reauth() => output::error(
            &format!("Unable to get {noun}s: {e}"),
            Some(&format!(
                "Token may be expired or deleted. Run `pro auth {command}` to connect {name} again."
            )),
        ),
        e => output::error(&format!("Unable to get {noun}s: {e}"), None),
    }
}
