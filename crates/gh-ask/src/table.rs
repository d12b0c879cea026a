use std::io::{self, Write};

use thiserror::Error;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const COLUMN_SEPARATOR: &str = "  ";
const ELLIPSIS: &str = "...";

/// Row accumulator. On a terminal, columns are aligned and fitted to `max_width`;
/// otherwise rows are emitted tab-separated and untruncated.
#[derive(Debug, Clone)]
pub struct TablePrinter {
    is_tty: bool,
    max_width: usize,
    rows: Vec<Vec<String>>,
    current: Vec<String>,
}

impl TablePrinter {
    pub fn new(is_tty: bool, max_width: usize) -> Self {
        Self {
            is_tty,
            max_width,
            rows: Vec::new(),
            current: Vec::new(),
        }
    }

    pub fn add_field(&mut self, text: impl Into<String>) {
        self.current.push(text.into());
    }

    pub fn end_row(&mut self) {
        if !self.current.is_empty() {
            self.rows.push(std::mem::take(&mut self.current));
        }
    }

    pub fn render<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), RenderError> {
        let written = if self.is_tty {
            self.render_aligned(out)
        } else {
            self.render_delimited(out)
        };
        written.map_err(RenderError::Write)
    }

    fn render_delimited<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        for row in &self.rows {
            writeln!(out, "{}", row.join("\t"))?;
        }
        out.flush()
    }

    fn render_aligned<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|field| single_line(field)).collect())
            .collect();
        let natural = natural_widths(&rows);
        let widths = fit_widths(&natural, self.max_width);

        for row in &rows {
            let last = row.len().saturating_sub(1);
            let mut line = String::new();
            for (index, field) in row.iter().enumerate() {
                let cell = truncate(field, widths[index]);
                if index < last {
                    let padding = widths[index].saturating_sub(cell.width());
                    line.push_str(&cell);
                    line.push_str(&" ".repeat(padding));
                    line.push_str(COLUMN_SEPARATOR);
                } else {
                    line.push_str(&cell);
                }
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        out.flush()
    }
}

fn single_line(field: &str) -> String {
    field
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}

fn natural_widths(rows: &[Vec<String>]) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|column| {
            rows.iter()
                .filter_map(|row| row.get(column))
                .map(|field| field.width())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

/// Narrow columns keep their natural width; the rest share what is left evenly.
pub fn fit_widths(natural: &[usize], max_width: usize) -> Vec<usize> {
    let separators = COLUMN_SEPARATOR.len() * natural.len().saturating_sub(1);
    let total: usize = natural.iter().sum::<usize>() + separators;
    if total <= max_width {
        return natural.to_vec();
    }

    let mut widths = vec![0; natural.len()];
    let mut available = max_width.saturating_sub(separators);
    let mut pending: Vec<usize> = (0..natural.len()).collect();
    pending.sort_by_key(|&index| natural[index]);

    while let Some(&narrowest) = pending.first() {
        let share = available / pending.len();
        if natural[narrowest] > share {
            break;
        }
        widths[narrowest] = natural[narrowest];
        available -= natural[narrowest];
        pending.remove(0);
    }

    if !pending.is_empty() {
        let share = available / pending.len();
        let mut remainder = available % pending.len();
        pending.sort_unstable();
        for index in pending {
            widths[index] = share + usize::from(remainder > 0);
            remainder = remainder.saturating_sub(1);
        }
    }

    widths
}

/// Cuts `text` to `width` display columns, marking the cut with an ellipsis.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }

    let (budget, suffix) = if width > ELLIPSIS.len() {
        (width - ELLIPSIS.len(), ELLIPSIS)
    } else {
        (width, "")
    };

    let mut used = 0;
    let mut cut = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > budget {
            break;
        }
        used += ch_width;
        cut.push(ch);
    }
    cut.push_str(suffix);
    cut
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(printer: &TablePrinter) -> String {
        let mut out = Vec::new();
        printer.render(&mut out).expect("render should succeed");
        String::from_utf8(out).expect("utf8 output")
    }

    #[test]
    fn table_non_tty_rows_are_tab_separated_and_untruncated() {
        let long_title = "x".repeat(300);
        let mut printer = TablePrinter::new(false, 40);
        printer.add_field(long_title.clone());
        printer.add_field("https://github.com/o/r/discussions/1");
        printer.end_row();

        assert_eq!(
            render_to_string(&printer),
            format!("{long_title}\thttps://github.com/o/r/discussions/1\n")
        );
    }

    #[test]
    fn table_tty_rows_align_columns_when_they_fit() {
        let mut printer = TablePrinter::new(true, 100);
        printer.add_field("Short");
        printer.add_field("https://a/1");
        printer.end_row();
        printer.add_field("A longer title");
        printer.add_field("https://a/2");
        printer.end_row();

        assert_eq!(
            render_to_string(&printer),
            "Short           https://a/1\nA longer title  https://a/2\n"
        );
    }

    #[test]
    fn table_tty_rows_truncate_wide_columns_to_max_width() {
        let mut printer = TablePrinter::new(true, 40);
        printer.add_field("t".repeat(60));
        printer.add_field("u".repeat(60));
        printer.end_row();

        let output = render_to_string(&printer);
        let line = output.lines().next().expect("one line");
        assert_eq!(line.width(), 40);
        assert!(line.contains("..."));
    }

    #[test]
    fn table_fit_widths_keeps_narrow_columns_whole() {
        assert_eq!(fit_widths(&[10, 200], 100), vec![10, 88]);
        assert_eq!(fit_widths(&[80, 80], 42), vec![20, 20]);
        assert_eq!(fit_widths(&[5, 6], 100), vec![5, 6]);
    }

    #[test]
    fn table_truncate_respects_display_width() {
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("short", 8), "short");
        assert_eq!(truncate("日本語のタイトル", 9), "日本語...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn table_tty_flattens_control_characters() {
        let mut printer = TablePrinter::new(true, 100);
        printer.add_field("line one\nline two");
        printer.add_field("https://a/1");
        printer.end_row();

        assert_eq!(
            render_to_string(&printer),
            "line one line two  https://a/1\n"
        );
    }
}
