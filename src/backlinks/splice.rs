//! Replacing the generated backlink section inside document text

use std::sync::OnceLock;

use regex_lite::Regex;

use super::ancestry::ReferenceToken;

pub const SECTION_START: &str = "<!-- folder-backlinks:start -->";
pub const SECTION_END: &str = "<!-- folder-backlinks:end -->";

/// Drop the text up to and including the next newline when it is only blanks
fn skip_line_tail(text: &str) -> &str {
    let tail = text.trim_start_matches([' ', '\t']);
    tail.strip_prefix("\r\n")
        .or_else(|| tail.strip_prefix('\n'))
        .unwrap_or(tail)
}

/// Remove comment-delimited blocks. A start marker with no end marker before
/// the next start is removed on its own, leaving the text after it in place.
fn strip_marker_sections(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(SECTION_START) {
        out.push_str(&rest[..start]);
        let after_start = start + SECTION_START.len();
        let next_start = rest[after_start..].find(SECTION_START);
        let cut = match rest[after_start..].find(SECTION_END) {
            Some(end) if next_start.map_or(true, |next| end < next) => {
                after_start + end + SECTION_END.len()
            }
            _ => after_start,
        };
        rest = skip_line_tail(&rest[cut..]);
    }
    out.push_str(rest);
    out
}

/// Older form: a `> [!backlinks]` callout and its quoted continuation lines
fn callout_section() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^>[ \t]*\[!(?i:backlinks)\][^\n]*(?:\n>[^\n]*)*\n?")
            .expect("callout pattern is valid")
    })
}

/// Oldest form: a `Backlinks` heading running to the next heading or end of text
fn heading_section() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^#{1,6}[ \t]+Backlinks[ \t]*\r?$(?:\n[^#\n][^\n]*|\n)*")
            .expect("heading pattern is valid")
    })
}

/// Remove every generated section in any recognized form
pub fn strip_sections(text: &str) -> String {
    let text = strip_marker_sections(text);
    let text = callout_section().replace_all(&text, "");
    heading_section().replace_all(&text, "").into_owned()
}

/// Render references as a delimited section, one per line
pub fn render_section(references: &[ReferenceToken]) -> String {
    let mut section = String::from(SECTION_START);
    for reference in references {
        section.push('\n');
        section.push_str(&reference.to_string());
    }
    section.push('\n');
    section.push_str(SECTION_END);
    section
}

/// Replace the generated section of `original` with one listing `references`.
/// Applying it twice with the same references gives the same text.
pub fn splice_backlinks(original: &str, references: &[ReferenceToken]) -> String {
    let stripped = strip_sections(original);
    let body = stripped.trim_end();

    match (body.is_empty(), references.is_empty()) {
        (true, true) => String::new(),
        (false, true) => format!("{body}\n"),
        (true, false) => format!("{}\n", render_section(references)),
        (false, false) => format!("{body}\n\n{}\n", render_section(references)),
    }
}

/// Drop every literal occurrence of `reference` from `text`
pub fn remove_reference(text: &str, reference: &ReferenceToken) -> String {
    text.replace(&reference.to_string(), "")
}
