use crate::browser::BrowserError;
use crate::config::ConfigError;
use crate::github_api::GithubApiError;
use crate::jq::JqError;
use crate::json_pretty::PrettyError;
use crate::repository::RepositoryError;
use crate::table::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Resolution,
    Api,
    Disabled,
    Serialization,
    Jq,
    Render,
    Browser,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Input => 2,
            Self::Resolution => 3,
            Self::Api => 4,
            Self::Disabled => 5,
            Self::Serialization => 6,
            Self::Jq => 7,
            Self::Render => 8,
            Self::Browser => 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Input, message)
    }

    pub fn disabled(owner: &str, name: &str) -> Self {
        Self::new(
            ErrorKind::Disabled,
            format!("{owner}/{name} does not have discussions enabled"),
        )
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// The single diagnostic line printed before exiting.
    pub fn diagnostic(&self) -> String {
        format!("gh-ask failed: {}", redact_sensitive(&self.message))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::input(error.to_string())
    }
}

impl From<RepositoryError> for AppError {
    fn from(error: RepositoryError) -> Self {
        Self::new(
            ErrorKind::Resolution,
            format!("could not determine what repo to use: {error}"),
        )
    }
}

impl From<GithubApiError> for AppError {
    fn from(error: GithubApiError) -> Self {
        Self::new(
            ErrorKind::Api,
            format!("failed to talk to the GitHub API: {error}"),
        )
    }
}

impl From<JqError> for AppError {
    fn from(error: JqError) -> Self {
        Self::new(ErrorKind::Jq, error.to_string())
    }
}

impl From<RenderError> for AppError {
    fn from(error: RenderError) -> Self {
        Self::new(ErrorKind::Render, error.to_string())
    }
}

impl From<PrettyError> for AppError {
    fn from(error: PrettyError) -> Self {
        match error {
            PrettyError::Parse(_) => Self::new(ErrorKind::Serialization, error.to_string()),
            PrettyError::Write(_) => Self::new(ErrorKind::Render, error.to_string()),
        }
    }
}

impl From<BrowserError> for AppError {
    fn from(error: BrowserError) -> Self {
        Self::new(ErrorKind::Browser, error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(
            ErrorKind::Serialization,
            format!("could not serialize JSON: {error}"),
        )
    }
}

/// Masks token-like values so diagnostics never echo credentials.
pub fn redact_sensitive(input: &str) -> String {
    let mut output = input.to_string();

    for pattern in [
        "token=",
        "token:",
        "authorization:",
        "authorization=",
        "password=",
        "password:",
    ] {
        output = redact_after_pattern(&output, pattern);
    }

    for prefix in ["bearer ", "ghp_", "gho_", "ghs_", "github_pat_"] {
        output = redact_after_pattern(&output, prefix);
    }

    output
}

fn redact_after_pattern(input: &str, pattern: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find(pattern) {
        let value_start = skip_whitespace(input, cursor + found + pattern.len());
        let value_end = find_value_end(input, value_start);

        output.push_str(&input[cursor..value_start]);
        if value_start < value_end {
            output.push_str("[REDACTED]");
        }

        cursor = value_end;
    }

    output.push_str(&input[cursor..]);
    output
}

fn skip_whitespace(input: &str, mut index: usize) -> usize {
    let bytes = input.as_bytes();
    while index < bytes.len() && bytes[index].is_ascii_whitespace() {
        index += 1;
    }
    index
}

fn find_value_end(input: &str, mut index: usize) -> usize {
    let bytes = input.as_bytes();
    while index < bytes.len() {
        let byte = bytes[index];
        if byte.is_ascii_whitespace() || matches!(byte, b'&' | b',' | b';' | b')' | b']' | b'}') {
            break;
        }
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_have_distinct_exit_codes() {
        let kinds = [
            ErrorKind::Input,
            ErrorKind::Resolution,
            ErrorKind::Api,
            ErrorKind::Disabled,
            ErrorKind::Serialization,
            ErrorKind::Jq,
            ErrorKind::Render,
            ErrorKind::Browser,
        ];

        let mut codes: Vec<i32> = kinds.iter().map(|kind| kind.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
        assert!(codes.iter().all(|code| *code != 0));
    }

    #[test]
    fn error_disabled_message_names_repository() {
        let err = AppError::disabled("octo", "widgets");

        assert_eq!(err.kind, ErrorKind::Disabled);
        assert_eq!(err.exit_code(), 5);
        assert_eq!(
            err.diagnostic(),
            "gh-ask failed: octo/widgets does not have discussions enabled"
        );
    }

    #[test]
    fn error_api_failures_keep_underlying_message() {
        let err = AppError::from(GithubApiError::Http {
            status: 401,
            message: "Bad credentials".to_string(),
        });

        assert_eq!(err.kind, ErrorKind::Api);
        assert_eq!(err.exit_code(), 4);
        assert_eq!(
            err.message,
            "failed to talk to the GitHub API: HTTP 401: Bad credentials"
        );
    }

    #[test]
    fn error_pretty_failures_split_between_serialization_and_render() {
        let parse = serde_json::from_str::<serde_json::Value>("{")
            .expect_err("fixture must produce parse error");
        assert_eq!(
            AppError::from(PrettyError::Parse(parse)).kind,
            ErrorKind::Serialization
        );

        let write = std::io::Error::other("broken pipe");
        assert_eq!(
            AppError::from(PrettyError::Write(write)).kind,
            ErrorKind::Render
        );
    }

    #[test]
    fn error_diagnostic_redacts_tokens() {
        let err = AppError::new(
            ErrorKind::Api,
            "request failed: authorization: Bearer ghp_abc123 token=xyz",
        );
        let diagnostic = err.diagnostic();

        assert!(!diagnostic.contains("abc123"));
        assert!(!diagnostic.contains("xyz"));
        assert!(diagnostic.starts_with("gh-ask failed: request failed:"));
    }
}
