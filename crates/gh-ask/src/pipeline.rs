//! Resolve → fetch → filter → dispatch, with every outside effect behind [`Collaborators`].

use std::io::Write;
use std::path::PathBuf;

use crate::browser::{self, BrowserError};
use crate::config::RuntimeConfig;
use crate::error::{AppError, ErrorKind};
use crate::github_api::{self, Discussion, DiscussionPage, GithubApiError, GraphqlClient};
use crate::jq::{self, JqError};
use crate::json_pretty;
use crate::repository::{self, Repository, RepositoryError};
use crate::search::{self, OutputMode, SearchRequest};
use crate::table::TablePrinter;

pub const NO_MATCHES_NOTICE: &str = "No matching discussion threads found :(";

pub trait Collaborators {
    fn resolve_repository(&self, repo_override: Option<&str>)
    -> Result<Repository, RepositoryError>;

    fn fetch_discussions(&self, repository: &Repository)
    -> Result<DiscussionPage, GithubApiError>;

    fn evaluate_jq(&self, json: &[u8], expr: &str, out: &mut dyn Write) -> Result<(), JqError>;

    fn open_browser(&self, url: &str) -> Result<(), BrowserError>;
}

/// Real collaborators: git remotes in `cwd`, the GitHub GraphQL API, the jq executable and the
/// user's browser.
#[derive(Debug, Clone)]
pub struct SystemCollaborators {
    config: RuntimeConfig,
    cwd: PathBuf,
}

impl SystemCollaborators {
    pub fn new(config: RuntimeConfig, cwd: PathBuf) -> Self {
        Self { config, cwd }
    }
}

impl Collaborators for SystemCollaborators {
    fn resolve_repository(
        &self,
        repo_override: Option<&str>,
    ) -> Result<Repository, RepositoryError> {
        repository::resolve_repository(repo_override, &self.config, &self.cwd)
    }

    fn fetch_discussions(
        &self,
        repository: &Repository,
    ) -> Result<DiscussionPage, GithubApiError> {
        let client = GraphqlClient::from_config(&self.config)?;
        github_api::fetch_discussions(&client, repository)
    }

    fn evaluate_jq(&self, json: &[u8], expr: &str, out: &mut dyn Write) -> Result<(), JqError> {
        jq::evaluate(&self.config.jq_bin, json, expr, out)
    }

    fn open_browser(&self, url: &str) -> Result<(), BrowserError> {
        browser::open_url(self.config.browser.as_deref(), url)
    }
}

/// Output streams plus the terminal facts that shape rendering.
pub struct Console<'a> {
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
    pub is_terminal: bool,
    pub table_width: usize,
}

/// Validates the phrase before anything touches git or the network, then resolves the repository.
pub fn build_request<C>(
    collaborators: &C,
    repo_override: Option<&str>,
    terms: &[String],
    mode: OutputMode,
) -> Result<SearchRequest, AppError>
where
    C: Collaborators + ?Sized,
{
    let phrase =
        search::join_phrase(terms).ok_or_else(|| AppError::input("search term required"))?;
    let repository = collaborators.resolve_repository(repo_override)?;
    tracing::debug!(repository = %repository, host = %repository.host, "resolved repository");

    Ok(SearchRequest {
        repository,
        phrase,
        mode,
    })
}

pub fn execute<C>(
    request: &SearchRequest,
    collaborators: &C,
    console: &mut Console<'_>,
) -> Result<(), AppError>
where
    C: Collaborators + ?Sized,
{
    let page = collaborators.fetch_discussions(&request.repository)?;
    if !page.discussions_enabled {
        return Err(AppError::disabled(
            &request.repository.owner,
            &request.repository.name,
        ));
    }
    tracing::debug!(count = page.discussions.len(), "fetched discussions");

    let matches = search::filter_matches(page.discussions, &request.phrase);
    tracing::debug!(
        matches = matches.len(),
        mode = request.mode.as_str(),
        "filtered discussions"
    );

    dispatch(&matches, request, collaborators, console)
}

pub fn dispatch<C>(
    matches: &[Discussion],
    request: &SearchRequest,
    collaborators: &C,
    console: &mut Console<'_>,
) -> Result<(), AppError>
where
    C: Collaborators + ?Sized,
{
    match &request.mode {
        OutputMode::Browser => {
            let first = matches.first().ok_or_else(|| {
                AppError::new(
                    ErrorKind::Browser,
                    "no matching discussion threads found; nothing to open",
                )
            })?;
            collaborators.open_browser(&first.url)?;
            Ok(())
        }
        OutputMode::JsonJq(expr) => {
            let buffer = serde_json::to_vec(matches)?;
            collaborators.evaluate_jq(&buffer, expr, &mut *console.stdout)?;
            Ok(())
        }
        OutputMode::Json => {
            let buffer = serde_json::to_vec(matches)?;
            json_pretty::format(
                &mut *console.stdout,
                &buffer,
                json_pretty::INDENT,
                console.is_terminal,
            )?;
            Ok(())
        }
        OutputMode::Table => render_table(matches, request, console),
    }
}

fn render_table(
    matches: &[Discussion],
    request: &SearchRequest,
    console: &mut Console<'_>,
) -> Result<(), AppError> {
    if matches.is_empty() {
        writeln!(console.stderr, "{NO_MATCHES_NOTICE}").map_err(|error| {
            AppError::new(ErrorKind::Render, format!("failed to write output: {error}"))
        })?;
        return Ok(());
    }

    let mut printer = TablePrinter::new(console.is_terminal, console.table_width);
    for discussion in matches {
        printer.add_field(discussion.title.as_str());
        printer.add_field(discussion.url.as_str());
        printer.end_row();
    }

    let mut header = String::new();
    if console.is_terminal {
        header.push_str(&format!(
            "Searching discussions in '{}' for '{}'\n",
            request.repository.full_name(),
            request.phrase
        ));
    }
    header.push('\n');

    console.stdout.write_all(header.as_bytes()).map_err(|error| {
        AppError::new(ErrorKind::Render, format!("failed to write output: {error}"))
    })?;
    printer.render(&mut *console.stdout)?;
    Ok(())
}
