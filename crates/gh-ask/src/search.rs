use crate::github_api::Discussion;
use crate::repository::Repository;

/// How matches are presented. Computed once from the flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    Browser,
    JsonJq(String),
    Json,
    Table,
}

impl OutputMode {
    /// `--lucky` wins over `--json`; `--jq` only applies together with `--json`.
    pub fn from_flags(json: bool, jq: Option<&str>, lucky: bool) -> Self {
        if lucky {
            return Self::Browser;
        }

        match (json, jq.filter(|expr| !expr.is_empty())) {
            (true, Some(expr)) => Self::JsonJq(expr.to_string()),
            (true, None) => Self::Json,
            (false, _) => Self::Table,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::JsonJq(_) => "json-jq",
            Self::Json => "json",
            Self::Table => "table",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub repository: Repository,
    pub phrase: String,
    pub mode: OutputMode,
}

/// Joins free arguments with single spaces. Returns `None` when nothing was given.
pub fn join_phrase<S: AsRef<str>>(terms: &[S]) -> Option<String> {
    let phrase = terms
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ");

    if phrase.is_empty() { None } else { Some(phrase) }
}

/// Keeps discussions whose body followed by title contains `phrase` verbatim.
pub fn filter_matches(discussions: Vec<Discussion>, phrase: &str) -> Vec<Discussion> {
    discussions
        .into_iter()
        .filter(|discussion| matches_phrase(discussion, phrase))
        .collect()
}

fn matches_phrase(discussion: &Discussion, phrase: &str) -> bool {
    let mut haystack = String::with_capacity(discussion.body.len() + discussion.title.len());
    haystack.push_str(&discussion.body);
    haystack.push_str(&discussion.title);
    haystack.contains(phrase)
}
