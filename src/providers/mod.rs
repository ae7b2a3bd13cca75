pub mod github;

pub use github::{GhCli, GitHubProvider};
