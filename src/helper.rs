use chrono::{Local, NaiveDateTime};
use log::trace;
use pulldown_cmark::{html, Options, Parser};

/// Current local wall-clock time, used to stamp new records
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Renders Markdown typed in an editor into the rich markup stored in the
/// journal
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    trace!("Rendered {} bytes of markdown", markdown.len());
    out
}

/// Plain-text rendering of stored markup, wrapped at `width` columns.
///
/// Document head, styles and scripts are dropped along with blank lines.
pub fn strip_markup(markup: &str, width: usize) -> String {
    let text = html2text::from_read(markup.as_bytes(), width.max(20));

    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trims `text` to `max_chars`, marking the cut with an ellipsis
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
