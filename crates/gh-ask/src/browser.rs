use std::io;
use std::process::Command;

use thiserror::Error;

/// Opens `url` with the configured browser command, or the platform opener when none is set.
pub fn open_url(browser: Option<&str>, url: &str) -> Result<(), BrowserError> {
    match browser.map(str::trim).filter(|command| !command.is_empty()) {
        Some(command) => run_browser_command(command, url),
        None => open::that(url).map_err(|source| BrowserError::Open {
            url: url.to_string(),
            source,
        }),
    }
}

fn run_browser_command(command: &str, url: &str) -> Result<(), BrowserError> {
    let (program, args) = split_command(command)?;

    let status = Command::new(&program)
        .args(&args)
        .arg(url)
        .status()
        .map_err(|source| BrowserError::Spawn {
            program: program.clone(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(BrowserError::Exit {
            program,
            status: status.to_string(),
        })
    }
}

/// Splits a browser command with shell quoting rules, so quoted paths keep their spaces.
fn split_command(command: &str) -> Result<(String, Vec<String>), BrowserError> {
    let mut words = shlex::split(command)
        .ok_or_else(|| BrowserError::InvalidCommand(command.to_string()))?
        .into_iter();
    let program = words
        .next()
        .ok_or_else(|| BrowserError::EmptyCommand(command.to_string()))?;

    Ok((program, words.collect()))
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser command is empty: {0:?}")]
    EmptyCommand(String),
    #[error("browser command has unbalanced quotes: {0:?}")]
    InvalidCommand(String),
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },
    #[error("could not open {url}: {source}")]
    Open {
        url: String,
        #[source]
        source: io::Error,
    },
}
