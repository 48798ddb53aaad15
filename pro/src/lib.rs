#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod config;
pub mod providers;
pub mod remote;
pub mod repository;
pub mod resolver;
pub mod runner;

pub use config::{Config, ConfigError};
pub use providers::{
    create_provider, GitHubClient, GitLabClient, OpenRequest, ProviderError, ProviderKind,
    RequestProvider,
};
pub use remote::{RemoteError, RemoteRef};
pub use repository::{Repository, RepositoryError};
pub use resolver::{
    find_request_for_branch, is_main_branch, list_entries, select_request, ListEntry, Lookup,
    OpenOutcome,
};
pub use runner::{verify_token, Runner, RunnerConfig, RunnerError};
