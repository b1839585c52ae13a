//! `minijinja` implementation of the rendering port.

use chrono::{Datelike, NaiveDate};
use minijinja::{AutoEscape, Environment, Value, context};

use super::TemplateRegistry;
use crate::publication::ports::{DocumentRenderer, RenderError, RenderRequest, RenderedDocument};

const WEEKDAYS: [&str; 7] = [
    "maandag",
    "dinsdag",
    "woensdag",
    "donderdag",
    "vrijdag",
    "zaterdag",
    "zondag",
];

const MONTHS: [&str; 12] = [
    "januari",
    "februari",
    "maart",
    "april",
    "mei",
    "juni",
    "juli",
    "augustus",
    "september",
    "oktober",
    "november",
    "december",
];

const INLINE_TAGS: [&str; 45] = [
    "a", "abbr", "acronym", "b", "bdi", "bdo", "big", "button", "cite", "code", "del", "dfn",
    "em", "font", "i", "img", "input", "ins", "kbd", "label", "mark", "math", "nobr", "object",
    "q", "rp", "rt", "rtc", "ruby", "s", "samp", "select", "small", "span", "strike", "strong",
    "sub", "sup", "svg", "textarea", "time", "tt", "u", "var", "wbr",
];

/// Renders documents with the creator organization's template.
///
/// Templates see `title`, `content`, `creator_name`, `sources`, `date` and
/// `image_host`. Values are HTML-escaped except `content` and `image_host`,
/// which are trusted markup and configuration. Output is compacted before it
/// is returned.
#[derive(Debug, Clone)]
pub struct MinijinjaRenderer {
    registry: TemplateRegistry,
    image_host: String,
}

impl MinijinjaRenderer {
    /// Creates a renderer over `registry`.
    #[must_use]
    pub fn new(registry: TemplateRegistry, image_host: impl Into<String>) -> Self {
        Self {
            registry,
            image_host: image_host.into(),
        }
    }
}

impl DocumentRenderer for MinijinjaRenderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderedDocument, RenderError> {
        let template = self
            .registry
            .get(&request.creator)
            .ok_or_else(|| RenderError::TemplateNotFound(request.creator.clone()))?;
        let mut environment = Environment::new();
        environment.set_auto_escape_callback(|_| AutoEscape::Html);
        let rendered = environment
            .render_str(template, self.build_context(request))
            .map_err(|err| RenderError::Render {
                creator: request.creator.clone(),
                reason: err.to_string(),
            })?;
        Ok(RenderedDocument::new(compact_html(&rendered)))
    }
}

impl MinijinjaRenderer {
    fn build_context(&self, request: &RenderRequest) -> Value {
        context! {
            title => request.title,
            content => Value::from_safe_string(request.body.clone()),
            creator_name => request.creator_name,
            sources => request.sources,
            date => format_dutch_date(request.date),
            image_host => Value::from_safe_string(self.image_host.clone()),
        }
    }
}

/// Formats a date as a long Dutch date, e.g. `maandag 3 februari 2025`.
#[must_use]
pub fn format_dutch_date(date: NaiveDate) -> String {
    let weekday = usize::try_from(date.weekday().num_days_from_monday())
        .ok()
        .and_then(|index| WEEKDAYS.get(index))
        .copied()
        .unwrap_or_default();
    let month = usize::try_from(date.month0())
        .ok()
        .and_then(|index| MONTHS.get(index))
        .copied()
        .unwrap_or_default();
    format!("{weekday} {} {month} {}", date.day(), date.year())
}

/// Removes HTML comments and collapses whitespace.
///
/// Runs of whitespace become a single space. Whitespace between two tags is
/// dropped unless both are inline elements such as `<strong>` or `<a>`, where
/// the space is visible. Content of `<pre>` blocks is not treated
/// specially.
#[must_use]
pub fn compact_html(html: &str) -> String {
    let without_comments = strip_comments(html);
    let mut compacted = String::with_capacity(without_comments.len());
    for token in without_comments.split_whitespace() {
        if !compacted.is_empty() && keeps_space(&compacted, token) {
            compacted.push(' ');
        }
        compacted.push_str(token);
    }
    compacted
}

fn keeps_space(before: &str, next: &str) -> bool {
    if !(before.ends_with('>') && next.starts_with('<')) {
        return true;
    }
    let previous_tag = before.rsplit_once('<').map_or("", |(_, tag)| tag);
    is_inline(previous_tag) && is_inline(next)
}

fn is_inline(tag: &str) -> bool {
    let name: String = tag
        .trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect();
    INLINE_TAGS.contains(&name.as_str())
}

fn strip_comments(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find("<!--") {
        let (before, comment) = rest.split_at(start);
        output.push_str(before);
        match comment.find("-->") {
            Some(end) => {
                let (_, after) = comment.split_at(end + "-->".len());
                rest = after;
            }
            None => {
                rest = "";
            }
        }
    }
    output.push_str(rest);
    output
}
