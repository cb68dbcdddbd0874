//! Markdown rendering using pulldown-cmark.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::Style,
    text::{Line, Span},
};

use super::styles::MarkdownStyles;

/// Render markdown to styled lines.
///
/// Lines are not wrapped; pass the result through
/// [`wrap_lines`](super::wrap_lines) for a fixed width. Blank lines separate
/// blocks but never trail the output.
pub fn render_markdown(input: &str, styles: &MarkdownStyles) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = MarkdownRenderer::new(styles.clone());
    renderer.run(Parser::new_ext(input, options));

    let mut lines = renderer.lines;
    while lines.last().is_some_and(|l| l.spans.is_empty()) {
        lines.pop();
    }
    lines
}

struct MarkdownRenderer {
    lines: Vec<Line<'static>>,
    styles: MarkdownStyles,
    /// Active inline styles, innermost last.
    style_stack: Vec<Style>,
    current_spans: Vec<Span<'static>>,
    /// One entry per open list: the next number for ordered lists.
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    blockquote_depth: usize,
    pending_list_marker: Option<String>,
    task_checkbox: Option<bool>,
}

impl MarkdownRenderer {
    fn new(styles: MarkdownStyles) -> Self {
        Self {
            lines: Vec::new(),
            styles,
            style_stack: Vec::new(),
            current_spans: Vec::new(),
            lists: Vec::new(),
            in_code_block: false,
            blockquote_depth: 0,
            pending_list_marker: None,
            task_checkbox: None,
        }
    }

    fn run<'a>(&mut self, parser: impl Iterator<Item = Event<'a>>) {
        for event in parser {
            self.handle_event(event);
        }
        self.flush_line();
    }

    #[allow(clippy::too_many_lines)]
    fn handle_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_line();
                let style = self.heading_style(level);
                self.style_stack.push(style);
            }
            Event::End(TagEnd::Heading(_)) => {
                self.flush_line();
                self.style_stack.pop();
                self.blank_line();
            }

            Event::Start(Tag::Emphasis) => self.style_stack.push(self.styles.emphasis),
            Event::Start(Tag::Strong) => self.style_stack.push(self.styles.strong),
            Event::Start(Tag::Strikethrough) => {
                self.style_stack.push(self.styles.strikethrough);
            }
            Event::Start(Tag::Link { .. }) => self.style_stack.push(self.styles.link),
            Event::End(
                TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link,
            ) => {
                self.style_stack.pop();
            }

            Event::Start(Tag::CodeBlock(_)) => {
                self.flush_line();
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.flush_line();
                self.in_code_block = false;
                self.blank_line();
            }

            Event::Start(Tag::List(start)) => {
                self.flush_line();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.flush_line();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }

            Event::Start(Tag::Item) => {
                self.flush_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.pending_list_marker = Some(marker);
            }
            Event::End(TagEnd::Item) => {
                self.flush_line();
                self.task_checkbox = None;
            }
            Event::TaskListMarker(checked) => {
                self.task_checkbox = Some(checked);
            }

            Event::Start(Tag::BlockQuote) => {
                self.flush_line();
                self.blockquote_depth += 1;
            }
            Event::End(TagEnd::BlockQuote) => {
                self.flush_line();
                self.blockquote_depth = self.blockquote_depth.saturating_sub(1);
            }

            Event::End(TagEnd::Paragraph) => {
                self.flush_line();
                // No gaps between loose list items.
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }

            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => {
                self.prefix_line();
                self.current_spans
                    .push(Span::styled(code.to_string(), self.styles.code));
            }
            Event::SoftBreak => self.add_text(" "),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(24), self.styles.rule)));
                self.blank_line();
            }

            Event::Start(
                Tag::Paragraph
                | Tag::Image { .. }
                | Tag::Table(_)
                | Tag::TableHead
                | Tag::TableRow
                | Tag::TableCell
                | Tag::FootnoteDefinition(_)
                | Tag::MetadataBlock(_)
                | Tag::HtmlBlock,
            )
            | Event::End(
                TagEnd::Image
                | TagEnd::Table
                | TagEnd::TableHead
                | TagEnd::TableRow
                | TagEnd::TableCell
                | TagEnd::FootnoteDefinition
                | TagEnd::MetadataBlock(_)
                | TagEnd::HtmlBlock,
            )
            | Event::Html(_)
            | Event::InlineHtml(_)
            | Event::FootnoteReference(_) => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                self.current_spans
                    .push(Span::styled(format!("  {line}"), self.styles.code_block));
                self.flush_line();
            }
            return;
        }

        self.prefix_line();
        let style = self.current_style();
        self.current_spans.push(Span::styled(text.to_string(), style));
    }

    /// Emit list markers and quote bars owed by the current line.
    fn prefix_line(&mut self) {
        if self.current_spans.is_empty() && self.blockquote_depth > 0 {
            self.current_spans.push(Span::styled(
                "│ ".repeat(self.blockquote_depth),
                self.styles.blockquote,
            ));
        }
        if let Some(marker) = self.pending_list_marker.take() {
            self.current_spans
                .push(Span::styled(marker, self.styles.list_marker));
            if let Some(checked) = self.task_checkbox.take() {
                let checkbox = if checked { "[x] " } else { "[ ] " };
                self.current_spans
                    .push(Span::styled(checkbox, self.styles.list_marker));
            }
        }
    }

    fn current_style(&self) -> Style {
        let base = if self.blockquote_depth > 0 {
            self.styles.blockquote
        } else {
            self.styles.text
        };
        self.style_stack.iter().fold(base, |acc, s| acc.patch(*s))
    }

    fn heading_style(&self, level: HeadingLevel) -> Style {
        match level {
            HeadingLevel::H1 => self.styles.h1,
            HeadingLevel::H2 => self.styles.h2,
            _ => self.styles.h3,
        }
    }

    fn flush_line(&mut self) {
        if !self.current_spans.is_empty() {
            let spans = std::mem::take(&mut self.current_spans);
            self.lines.push(Line::from(spans));
        }
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Modifier;

    fn render(md: &str) -> Vec<String> {
        render_markdown(md, &MarkdownStyles::default())
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_plain_paragraph() {
        assert_eq!(render("Hello, world!"), vec!["Hello, world!"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(render("").is_empty());
    }

    #[test]
    fn test_paragraphs_separated_by_blank_line() {
        assert_eq!(
            render("First paragraph.\n\nSecond paragraph."),
            vec!["First paragraph.", "", "Second paragraph."]
        );
    }

    #[test]
    fn test_heading_is_styled() {
        let lines = render_markdown("# Title\n\nBody", &MarkdownStyles::default());
        let heading = &lines[0].spans[0];
        assert_eq!(heading.content, "Title");
        assert!(heading.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_bold_and_italic_nest() {
        let lines = render_markdown("**bold and *both***", &MarkdownStyles::default());
        let both = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "both")
            .unwrap();
        assert!(both.style.add_modifier.contains(Modifier::BOLD));
        assert!(both.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(render("Use `cargo` here"), vec!["Use cargo here"]);
    }

    #[test]
    fn test_code_block_lines_indented() {
        assert_eq!(
            render("```rust\nfn main() {}\nlet x = 1;\n```"),
            vec!["  fn main() {}", "  let x = 1;"]
        );
    }

    #[test]
    fn test_bullet_list() {
        assert_eq!(render("- one\n- two"), vec!["• one", "• two"]);
    }

    #[test]
    fn test_ordered_list_numbers() {
        assert_eq!(
            render("3. three\n4. four\n5. five"),
            vec!["3. three", "4. four", "5. five"]
        );
    }

    #[test]
    fn test_nested_list_indents() {
        assert_eq!(
            render("- outer\n  - inner"),
            vec!["• outer", "  • inner"]
        );
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            render("- [ ] todo\n- [x] done"),
            vec!["• [ ] todo", "• [x] done"]
        );
    }

    #[test]
    fn test_blockquote_has_bar() {
        assert_eq!(render("> quoted"), vec!["│ quoted"]);
    }

    #[test]
    fn test_link_text_is_kept() {
        let lines = render_markdown("see [docs](https://example.com)", &MarkdownStyles::default());
        let link = lines[0].spans.iter().find(|s| s.content == "docs").unwrap();
        assert!(link.style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_list_then_paragraph() {
        assert_eq!(render("- a\n- b\n\nafter"), vec!["• a", "• b", "", "after"]);
    }
}
