use std::process::Command;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::RuntimeConfig;
use crate::repository::Repository;

const USER_AGENT: &str = concat!("gh-ask/", env!("CARGO_PKG_VERSION"));

/// Discussions fetched per invocation; there is no pagination past this page.
pub const DISCUSSION_PAGE_SIZE: u32 = 100;

pub const DISCUSSIONS_QUERY: &str = r#"query RepositoryDiscussions($owner: String!, $name: String!, $first: Int!) {
  repository(owner: $owner, name: $name) {
    hasDiscussionsEnabled
    discussions(first: $first) {
      edges { node { title body url } }
    }
  }
}"#;

/// One discussion thread. Decoded from GraphQL's lowercase fields, serialized as
/// `Title`/`url`/`Body` so existing `--jq` expressions keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    #[serde(rename(serialize = "Title", deserialize = "title"))]
    pub title: String,
    pub url: String,
    #[serde(rename(serialize = "Body", deserialize = "body"))]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionPage {
    pub discussions_enabled: bool,
    pub discussions: Vec<Discussion>,
}

/// Authenticated GraphQL round trip. Returns the `data` member of a successful response.
pub trait GraphqlTransport {
    fn execute(&self, query: &str, variables: Value) -> Result<Value, GithubApiError>;
}

#[derive(Debug, Clone)]
pub struct GraphqlClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl GraphqlClient {
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GithubApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| GithubApiError::Transport { source })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self, GithubApiError> {
        let token = resolve_token(config)?;
        Self::new(
            config.graphql_url.clone(),
            token,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

impl GraphqlTransport for GraphqlClient {
    fn execute(&self, query: &str, variables: Value) -> Result<Value, GithubApiError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .map_err(|source| GithubApiError::Transport { source })?;

        let status_code = response.status().as_u16();
        let body = response
            .text()
            .map_err(|source| GithubApiError::Transport { source })?;

        parse_graphql_response(status_code, &body)
    }
}

/// Issues the single discussions query for `repository`.
pub fn fetch_discussions<T>(
    transport: &T,
    repository: &Repository,
) -> Result<DiscussionPage, GithubApiError>
where
    T: GraphqlTransport + ?Sized,
{
    let data = transport.execute(DISCUSSIONS_QUERY, build_variables(repository))?;
    decode_discussion_page(data)
}

pub fn build_variables(repository: &Repository) -> Value {
    json!({
        "owner": repository.owner,
        "name": repository.name,
        "first": DISCUSSION_PAGE_SIZE,
    })
}

pub fn parse_graphql_response(status_code: u16, body: &str) -> Result<Value, GithubApiError> {
    if !(200..=299).contains(&status_code) {
        let message = extract_error_message(body).unwrap_or_else(|| format!("HTTP {status_code}"));
        return Err(GithubApiError::Http {
            status: status_code,
            message,
        });
    }

    let mut payload: Value = serde_json::from_str(body).map_err(GithubApiError::InvalidResponse)?;

    let messages: Vec<String> = payload
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| error.get("message").and_then(Value::as_str))
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();
    if !messages.is_empty() {
        return Err(GithubApiError::Graphql(messages.join("; ")));
    }

    match payload.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(GithubApiError::MissingData),
    }
}

pub fn decode_discussion_page(data: Value) -> Result<DiscussionPage, GithubApiError> {
    let payload: DiscussionsData =
        serde_json::from_value(data).map_err(GithubApiError::InvalidResponse)?;
    let repository = payload
        .repository
        .ok_or(GithubApiError::RepositoryNotFound)?;

    if !repository.has_discussions_enabled {
        return Ok(DiscussionPage {
            discussions_enabled: false,
            discussions: Vec::new(),
        });
    }

    let discussions = repository
        .discussions
        .edges
        .into_iter()
        .filter_map(|edge| edge.node)
        .collect();

    Ok(DiscussionPage {
        discussions_enabled: true,
        discussions,
    })
}

/// Uses the configured token, falling back to `gh auth token` for the configured host.
pub fn resolve_token(config: &RuntimeConfig) -> Result<String, GithubApiError> {
    if let Some(token) = &config.token {
        return Ok(token.clone());
    }

    let output = Command::new("gh")
        .args(["auth", "token", "--hostname", &config.host])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if token.is_empty() {
                Err(GithubApiError::MissingToken(config.host.clone()))
            } else {
                tracing::debug!(host = %config.host, "using token from gh auth");
                Ok(token)
            }
        }
        Ok(output) => {
            tracing::debug!(
                host = %config.host,
                status = ?output.status.code(),
                "gh auth token returned no credentials"
            );
            Err(GithubApiError::MissingToken(config.host.clone()))
        }
        Err(error) => {
            tracing::debug!(%error, "gh executable unavailable for token lookup");
            Err(GithubApiError::MissingToken(config.host.clone()))
        }
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;

    first_non_empty_string(&[
        value.get("message").and_then(Value::as_str),
        value
            .get("errors")
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str),
    ])
}

fn first_non_empty_string(candidates: &[Option<&str>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

#[derive(Debug, Error)]
pub enum GithubApiError {
    #[error("request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("{0}")]
    Graphql(String),
    #[error("invalid response: {0}")]
    InvalidResponse(#[source] serde_json::Error),
    #[error("response did not include data")]
    MissingData,
    #[error("repository not found")]
    RepositoryNotFound,
    #[error("no authentication token for {0}; set GH_TOKEN or run `gh auth login`")]
    MissingToken(String),
}

#[derive(Debug, Deserialize)]
struct DiscussionsData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    #[serde(default)]
    has_discussions_enabled: bool,
    #[serde(default)]
    discussions: DiscussionConnection,
}

#[derive(Debug, Default, Deserialize)]
struct DiscussionConnection {
    #[serde(default)]
    edges: Vec<DiscussionEdge>,
}

#[derive(Debug, Deserialize)]
struct DiscussionEdge {
    node: Option<Discussion>,
}
