//! Markdown normalization and output conversion
//!
//! Substituted letter text is markdown. It is normalized once, then turned
//! into HTML for display and into plain text for clipboard and email.

use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use regex::Regex;
use tracing::debug;

/// Spacer entity; a line holding only this is intentional vertical space
pub const NBSP_ENTITY: &str = "&nbsp;";

/// URL schemes a link or image may carry into the presentation output
const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

static BLANK_LINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n(\s*\n){2,}").expect("valid regex"));
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)\*[ \t]+").expect("valid regex"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+[ \t]*").expect("valid regex"));

/// Collapse runs of two or more blank lines into a single blank line
///
/// Whitespace-only lines count as blank. A `&nbsp;` line is content, so it
/// survives. Applying this twice gives the same result as applying it once.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_LINE_RUN.replace_all(text, "\n\n").into_owned()
}

/// Render markdown to HTML
///
/// Single newlines become `<br />`. Raw HTML in the source is escaped and
/// shown as text, and links or images with a scheme outside
/// [`SAFE_SCHEMES`] keep only their text, so field values cannot inject
/// markup or script URLs.
pub fn to_html(markdown: &str) -> String {
    debug!(len = markdown.len(), "to_html: called");
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    // One entry per open link/image: whether its tags were dropped
    let mut dropped = Vec::new();
    let events = Parser::new_ext(markdown, options).filter_map(|event| match event {
        Event::SoftBreak => Some(Event::HardBreak),
        Event::Html(raw) | Event::InlineHtml(raw) => Some(Event::Text(raw)),
        Event::Start(Tag::HtmlBlock) => Some(Event::Start(Tag::Paragraph)),
        Event::End(TagEnd::HtmlBlock) => Some(Event::End(TagEnd::Paragraph)),
        Event::Start(Tag::Link { ref dest_url, .. } | Tag::Image { ref dest_url, .. }) => {
            let safe = is_safe_url(dest_url);
            if !safe {
                debug!(url = %dest_url, "to_html: dropping link with unsafe scheme");
            }
            dropped.push(!safe);
            safe.then_some(event)
        }
        Event::End(TagEnd::Link | TagEnd::Image) => {
            if dropped.pop().unwrap_or(false) {
                None
            } else {
                Some(event)
            }
        }
        other => Some(other),
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// Relative URLs are safe; absolute ones must use a scheme in [`SAFE_SCHEMES`]
fn is_safe_url(url: &str) -> bool {
    // Browsers ignore whitespace and control characters inside a scheme
    let cleaned: String = url.chars().filter(|c| !c.is_whitespace() && !c.is_control()).collect();
    match cleaned.find([':', '/', '?', '#']) {
        Some(i) if cleaned[i..].starts_with(':') => {
            SAFE_SCHEMES.iter().any(|scheme| cleaned[..i].eq_ignore_ascii_case(scheme))
        }
        _ => true,
    }
}

/// Strip markdown down to plain text
///
/// Drops `&nbsp;` spacers, turns `* ` bullets into `- `, removes bold and
/// italic markers (keeping the text), removes leading `#` heading markers,
/// and trims the document.
pub fn to_plain_text(markdown: &str) -> String {
    debug!(len = markdown.len(), "to_plain_text: called");
    let text = markdown.replace(NBSP_ENTITY, "");
    // Bullets first, otherwise `* a *b*` reads as italic
    let text = BULLET.replace_all(&text, "${1}- ");
    let text = BOLD.replace_all(&text, "${1}");
    let text = ITALIC.replace_all(&text, "${1}");
    let text = HEADING.replace_all(&text, "");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n  \n\t\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\nb"), "a\nb");
    }

    #[test]
    fn test_collapse_keeps_nbsp_spacer() {
        let text = "Sincerely,\n\n&nbsp;\n\n&nbsp;\n\nAlex";
        assert_eq!(collapse_blank_lines(text), text);

        let text = "Sincerely,\n\n\n&nbsp;\n\n\n\nAlex";
        assert_eq!(collapse_blank_lines(text), "Sincerely,\n\n&nbsp;\n\nAlex");
    }

    #[test]
    fn test_to_html_line_breaks() {
        let html = to_html("123 Main St\nVancouver, BC");
        assert!(html.contains("123 Main St<br />"), "{}", html);
        assert!(html.contains("Vancouver, BC"));
    }

    #[test]
    fn test_to_html_markup() {
        let html = to_html("# Notice\n\n**Important** and *soon*\n\n* one\n* two");
        assert!(html.contains("<h1>Notice</h1>"));
        assert!(html.contains("<strong>Important</strong>"));
        assert!(html.contains("<em>soon</em>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn test_to_html_escapes_raw_html() {
        let html = to_html("Dear <script>alert(1)</script>,");
        assert!(!html.contains("<script>"), "{}", html);
        assert!(html.contains("&lt;script&gt;"));

        let html = to_html("<div onclick=\"x()\">hi</div>");
        assert!(!html.contains("<div"), "{}", html);
    }

    #[test]
    fn test_to_html_drops_script_links() {
        let html = to_html("Dear [x](javascript:alert(1))");
        assert!(!html.contains("href"), "{}", html);
        assert!(!html.contains("javascript:"), "{}", html);
        assert!(html.contains("Dear x"), "{}", html);

        let html = to_html("[a](JavaScript:void(0)) ![pic](data:image/png;base64,AAAA) <vbscript:run>");
        assert!(!html.contains("<a "), "{}", html);
        assert!(!html.contains("<img"), "{}", html);
        assert!(html.contains("pic"));
    }

    #[test]
    fn test_to_html_keeps_safe_links() {
        let html = to_html("See [the act](https://www.bclaws.gov.bc.ca/) or [email](mailto:rtb@gov.bc.ca) or [notes](notes.html)");
        assert!(html.contains(r#"<a href="https://www.bclaws.gov.bc.ca/">the act</a>"#), "{}", html);
        assert!(html.contains(r#"<a href="mailto:rtb@gov.bc.ca">email</a>"#), "{}", html);
        assert!(html.contains(r#"<a href="notes.html">notes</a>"#), "{}", html);
    }

    #[test]
    fn test_is_safe_url() {
        assert!(is_safe_url("https://example.com/a:b"));
        assert!(is_safe_url("/letters?id=1"));
        assert!(!is_safe_url("java\tscript:alert(1)"));
        assert!(!is_safe_url(" vbscript:msgbox"));
        assert!(!is_safe_url("data:text/html,hi"));
    }

    #[test]
    fn test_to_html_resolves_nbsp() {
        let html = to_html("a\n\n&nbsp;\n\nb");
        assert!(html.contains('\u{a0}') || html.contains("&nbsp;"), "{}", html);
    }

    #[test]
    fn test_to_plain_text() {
        let markdown = "# Notice to End Tenancy\n\n**To:** Landlord\n\nI am *writing* to say:\n\n* first\n* second\n\n&nbsp;\n\nThanks";
        let text = to_plain_text(markdown);
        assert_eq!(
            text,
            "Notice to End Tenancy\n\nTo: Landlord\n\nI am writing to say:\n\n- first\n- second\n\n\n\nThanks"
        );
    }

    #[test]
    fn test_to_plain_text_emphasis_inside_bullet() {
        assert_eq!(to_plain_text("* pay *now*"), "- pay now");
        assert_eq!(to_plain_text("  * nested **item**"), "- nested item");
    }

    #[test]
    fn test_to_plain_text_heading_keeps_next_line() {
        assert_eq!(to_plain_text("##\nBody"), "Body");
        assert_eq!(to_plain_text("### Title\nBody"), "Title\nBody");
    }

    proptest! {
        #[test]
        fn prop_collapse_idempotent(text in "[a-z \t\n]{0,64}") {
            let once = collapse_blank_lines(&text);
            let twice = collapse_blank_lines(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_collapse_idempotent_with_spacers(parts in proptest::collection::vec("(&nbsp;|x| |\t|\n)", 0..40)) {
            let text = parts.concat();
            let once = collapse_blank_lines(&text);
            prop_assert_eq!(collapse_blank_lines(&once), once.clone());
        }
    }
}
