//! Wrapping for plain strings and styled lines.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use super::width::visual_width;

/// Wrap a plain string to `width` columns. Explicit line breaks are kept,
/// and blank lines survive as empty strings.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.lines().map(String::from).collect();
    }
    let mut out = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            out.push(String::new());
            continue;
        }
        out.extend(
            textwrap::wrap(line, width)
                .into_iter()
                .map(std::borrow::Cow::into_owned),
        );
    }
    out
}

/// Wrap styled lines to `width` columns, keeping each span's style.
pub fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }
    lines
        .into_iter()
        .flat_map(|line| wrap_line(line, width))
        .collect()
}

fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let plain: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
    if visual_width(&plain) <= width {
        return vec![line];
    }

    let styled: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |ch| (ch, span.style)))
        .collect();

    // Continuation rows keep the line's leading indent (code blocks, nested
    // list items).
    let indent: String = plain.chars().take_while(|c| *c == ' ').collect();
    let indent = if visual_width(&indent) < width {
        indent
    } else {
        String::new()
    };
    let indent_style = styled.first().map_or_else(Style::default, |&(_, style)| style);
    let options = textwrap::Options::new(width).subsequent_indent(&indent);

    // textwrap only drops whitespace at break points, so walking the
    // original characters in step with its output recovers the styles.
    let mut pos = 0;
    let mut result = Vec::new();
    for (row, piece) in textwrap::wrap(&plain, options).into_iter().enumerate() {
        let body = if row == 0 {
            piece.as_ref()
        } else {
            piece.strip_prefix(indent.as_str()).unwrap_or(piece.as_ref())
        };
        while pos < styled.len() && styled[pos].0.is_whitespace() && !body.starts_with(styled[pos].0) {
            pos += 1;
        }
        let mut spans: Vec<Span<'static>> = Vec::new();
        if row > 0 && !indent.is_empty() {
            spans.push(Span::styled(indent.clone(), indent_style));
        }
        let mut run = String::new();
        let mut run_style = None;
        for expected in body.chars() {
            let (ch, style) = styled.get(pos).copied().unwrap_or((expected, Style::default()));
            pos += 1;
            if run_style.is_some_and(|s| s != style) {
                spans.push(Span::styled(std::mem::take(&mut run), run_style.unwrap_or_default()));
            }
            run_style = Some(style);
            run.push(ch);
        }
        if !run.is_empty() {
            spans.push(Span::styled(run, run_style.unwrap_or_default()));
        }
        result.push(Line::from(spans));
    }

    if result.is_empty() {
        result.push(Line::from(""));
    }
    result
}
