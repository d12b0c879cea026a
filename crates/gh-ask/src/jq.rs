use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use thiserror::Error;

/// Runs `expr` over `json` with the jq executable and forwards its stdout verbatim.
///
/// Strings come out raw and every other value as compact JSON (`jq -r -c`).
/// Nothing is written to `out` unless jq exits successfully.
pub fn evaluate<W: Write + ?Sized>(
    jq_bin: &str,
    json: &[u8],
    expr: &str,
    out: &mut W,
) -> Result<(), JqError> {
    let mut child = Command::new(jq_bin)
        .args(["-r", "-c", expr])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| JqError::Spawn {
            program: jq_bin.to_string(),
            source,
        })?;

    let feeder = child.stdin.take().map(|mut stdin| {
        let input = json.to_vec();
        thread::spawn(move || stdin.write_all(&input))
    });

    let output = child
        .wait_with_output()
        .map_err(|source| JqError::Wait { source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(JqError::Evaluate {
            expr: expr.to_string(),
            message: if stderr.is_empty() {
                format!("jq exited with {}", output.status)
            } else {
                stderr
            },
        });
    }

    if let Some(handle) = feeder {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(source)) => return Err(JqError::Feed { source }),
            Err(_) => {
                return Err(JqError::Feed {
                    source: io::Error::other("stdin writer panicked"),
                });
            }
        }
    }

    out.write_all(&output.stdout)
        .and_then(|_| out.flush())
        .map_err(|source| JqError::Output { source })
}

#[derive(Debug, Error)]
pub enum JqError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to pass JSON to jq: {source}")]
    Feed {
        #[source]
        source: io::Error,
    },
    #[error("failed waiting for jq: {source}")]
    Wait {
        #[source]
        source: io::Error,
    },
    #[error("jq expression {expr:?} failed: {message}")]
    Evaluate { expr: String, message: String },
    #[error("failed to write jq output: {source}")]
    Output {
        #[source]
        source: io::Error,
    },
}
