pub mod client;
pub mod types;

pub use client::{ApiClient, SentryClient};
pub use types::{Commit, Deploy, ReleaseSummary};
