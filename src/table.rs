use std::borrow::Cow;
use std::fmt::Write as _;

use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    render_aligned(headers, rows, &[])
}

/// Renders rows under `headers`; columns without an entry in `alignments`
/// are left-aligned.
pub fn render_aligned(headers: &[String], rows: &[Vec<String>], alignments: &[Align]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &[]));

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator_cells, &separator_widths, &[]));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, alignments));
    }

    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize], alignments: &[Align]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            match alignments.get(idx).copied().unwrap_or_default() {
                Align::Left => format!("{sanitized}{padding}"),
                Align::Right => format!("{padding}{sanitized}"),
            }
        })
        .join("  ");
    line.trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn pads_columns_to_widest_cell() {
        let rendered = render_table(
            &strings(&["Country", "Count"]),
            &[strings(&["Italy", "4"]), strings(&["United States", "12"])],
        );
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Country        Count");
        assert_eq!(lines[1], "-------------  -----");
        assert_eq!(lines[2], "Italy          4");
        assert_eq!(lines[3], "United States  12");
    }

    #[test]
    fn right_alignment_pads_on_the_left() {
        let rendered = render_aligned(
            &strings(&["Name", "Total"]),
            &[strings(&["a", "5"]), strings(&["b", "120"])],
            &[Align::Left, Align::Right],
        );
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[2], "a         5");
        assert_eq!(lines[3], "b       120");
    }

    #[test]
    fn control_characters_become_spaces() {
        let rendered = render_table(&strings(&["note"]), &[strings(&["a\tb"])]);
        assert!(rendered.lines().any(|line| line == "a b"));
    }
}
