//! Search a repository's GitHub Discussions.
//!
//! - `repository`: `[HOST/]OWNER/REPO` parsing and git remote resolution.
//! - `github_api`: the single bounded GraphQL discussions query.
//! - `search`: request model, output mode selection, and the match filter.
//! - `pipeline`: resolve → fetch → filter → dispatch over injectable collaborators.
//! - `table` / `json_pretty` / `jq` / `browser`: presentation backends.

pub mod browser;
pub mod config;
pub mod error;
pub mod github_api;
pub mod jq;
pub mod json_pretty;
pub mod pipeline;
pub mod repository;
pub mod search;
pub mod table;

pub use config::RuntimeConfig;
pub use error::{AppError, ErrorKind};
pub use github_api::{Discussion, DiscussionPage};
pub use pipeline::{Collaborators, Console, SystemCollaborators};
pub use repository::Repository;
pub use search::{OutputMode, SearchRequest, filter_matches};
