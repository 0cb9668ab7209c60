use crate::text::char_to_byte;
use crate::ErrorDescriptor;
use lazy_static::lazy_static;
use regex::Regex;

pub const MARKER_CLASS: &str = "grammar-error";
pub const ATTR_ERROR: &str = "data-error";
pub const ATTR_SUGGESTIONS: &str = "data-suggestions";
pub const ATTR_MESSAGE: &str = "data-message";

lazy_static! {
    static ref MARKER_TAG: Regex = Regex::new(r#"<span class="grammar-error"[^>]*>|</span>"#).unwrap();
    static ref MARKER: Regex = Regex::new(
        r#"<span class="grammar-error" data-error="([^"]*)" data-suggestions="([^"]*)" data-message="([^"]*)">([^<]*)</span>"#
    )
    .unwrap();
}

/// A run of the checked text, either untouched or covered by an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Marked {
        text: &'a str,
        error: &'a ErrorDescriptor,
    },
}

/// Split `text` into plain and marked runs.
///
/// Errors are walked from the highest offset down, each one claiming the part
/// of its span that no higher error has claimed yet. Working backwards keeps
/// every lower offset valid while the runs are cut. Spans that end up empty
/// (stale, past the end, or fully overlapped) produce no marked run.
pub fn segments<'a>(text: &'a str, errors: &'a [ErrorDescriptor]) -> Vec<Segment<'a>> {
    let mut sorted: Vec<&ErrorDescriptor> = errors.iter().collect();
    sorted.sort_by(|a, b| b.offset.cmp(&a.offset));

    let mut out = Vec::with_capacity(errors.len() * 2 + 1);
    let mut cut = text.len();

    for error in sorted {
        let start = char_to_byte(text, error.offset).min(cut);
        let end = char_to_byte(text, error.end()).min(cut);
        if start == end {
            continue;
        }
        if end < cut {
            out.push(Segment::Plain(&text[end..cut]));
        }
        out.push(Segment::Marked {
            text: &text[start..end],
            error,
        });
        cut = start;
    }
    if cut > 0 {
        out.push(Segment::Plain(&text[..cut]));
    }

    out.reverse();
    out
}

/// Attributes carried by the marker element of `error`.
pub fn marker_attributes(error: &ErrorDescriptor) -> Vec<(String, String)> {
    vec![
        (ATTR_ERROR.to_string(), error.bad.clone()),
        (ATTR_SUGGESTIONS.to_string(), error.suggestions.join(",")),
        (ATTR_MESSAGE.to_string(), error.message.clone()),
    ]
}

/// Render `text` as HTML with every error span wrapped in a marker element.
pub fn render(text: &str, errors: &[ErrorDescriptor]) -> String {
    let mut html = String::with_capacity(text.len() + errors.len() * 96);

    for segment in segments(text, errors) {
        match segment {
            Segment::Plain(run) => html.push_str(&escape(run)),
            Segment::Marked { text: run, error } => {
                html.push_str(&format!("<span class=\"{}\"", MARKER_CLASS));
                for (name, value) in marker_attributes(error) {
                    html.push_str(&format!(" {}=\"{}\"", name, escape(&value)));
                }
                html.push('>');
                html.push_str(&escape(run));
                html.push_str("</span>");
            }
        }
    }

    html
}

/// Remove all markers from rendered markup, recovering the original text.
pub fn strip(markup: &str) -> String {
    unescape(&MARKER_TAG.replace_all(markup, ""))
}

/// A marker found in rendered markup.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMarker {
    pub bad: String,
    pub suggestions: String,
    pub message: String,
    pub inner: String,
}

pub fn markers(markup: &str) -> Vec<RenderedMarker> {
    MARKER
        .captures_iter(markup)
        .map(|caps| RenderedMarker {
            bad: unescape(&caps[1]),
            suggestions: unescape(&caps[2]),
            message: unescape(&caps[3]),
            inner: unescape(&caps[4]),
        })
        .collect()
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape(escaped: &str) -> String {
    // &amp; last so "&amp;lt;" decodes to "&lt;" rather than "<"
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
