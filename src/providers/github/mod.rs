mod client;
mod provider;
pub mod timings;
pub mod types;

pub use client::GhCli;
pub use provider::GitHubProvider;
