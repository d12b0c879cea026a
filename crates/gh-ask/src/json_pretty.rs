use std::io::{self, Write};

use colored_json::ColoredFormatter;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use thiserror::Error;

pub const INDENT: &str = "  ";

/// Re-indents a serialized JSON document, keeping key order. `colorize` is meant for terminals.
pub fn format<W: Write + ?Sized>(
    out: &mut W,
    json: &[u8],
    indent: &str,
    colorize: bool,
) -> Result<(), PrettyError> {
    let value: Value = serde_json::from_slice(json).map_err(PrettyError::Parse)?;

    let pretty = PrettyFormatter::with_indent(indent.as_bytes());
    let mut rendered = if colorize {
        render(&value, ColoredFormatter::new(pretty))?
    } else {
        render(&value, pretty)?
    };
    rendered.push(b'\n');

    out.write_all(&rendered)
        .and_then(|_| out.flush())
        .map_err(PrettyError::Write)
}

fn render<F: Formatter>(value: &Value, formatter: F) -> Result<Vec<u8>, PrettyError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(PrettyError::Parse)?;
    Ok(buffer)
}

#[derive(Debug, Error)]
pub enum PrettyError {
    #[error("invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pretty(json: &str) -> String {
        let mut out = Vec::new();
        format(&mut out, json.as_bytes(), INDENT, false).expect("format should succeed");
        String::from_utf8(out).expect("utf8 output")
    }

    #[test]
    fn json_pretty_indents_with_two_spaces_and_keeps_key_order() {
        let output = pretty(r#"[{"Title":"T","url":"https://u","Body":"line\n\"q\""}]"#);

        assert_eq!(
            output,
            "[\n  {\n    \"Title\": \"T\",\n    \"url\": \"https://u\",\n    \"Body\": \"line\\n\\\"q\\\"\"\n  }\n]\n"
        );
    }

    #[test]
    fn json_pretty_plain_output_matches_serde_pretty_printer() {
        let input = r#"{"a":{},"b":[],"c":null,"d":true,"e":1.5}"#;
        let value: Value = serde_json::from_str(input).expect("fixture json");

        let expected = format!(
            "{}\n",
            serde_json::to_string_pretty(&value).expect("serde pretty")
        );
        assert_eq!(pretty(input), expected);
        assert_eq!(pretty("[]"), "[]\n");
    }

    #[test]
    fn json_pretty_rejects_malformed_input() {
        let mut out = Vec::new();
        let err = format(&mut out, b"{not json", INDENT, false).expect_err("must fail");

        assert!(matches!(err, PrettyError::Parse(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn json_pretty_colorized_output_adds_escapes_and_keeps_values() {
        let mut out = Vec::new();
        format(&mut out, br#"{"Title":"T"}"#, INDENT, true).expect("format should succeed");
        let output = String::from_utf8(out).expect("utf8 output");

        assert!(output.contains('\u{1b}'));
        assert!(output.contains("Title"));
        assert!(output.contains("\"T\""));
        assert!(output.ends_with('\n'));
    }
}
