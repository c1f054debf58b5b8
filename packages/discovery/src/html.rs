//! Readable-text extraction from crawled pages.
//!
//! Strips script/style/nav/footer/ad chrome, optionally narrows to a
//! configured content selector, and truncates to a character budget before
//! the text is handed to the extraction provider.

use scraper::{Html, Selector};

/// Character budget for extracted text sent to the provider.
pub const MAX_CONTENT_CHARS: usize = 12_000;

/// Elements that never carry event content.
const BOILERPLATE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "iframe",
    "svg",
    "nav",
    "header",
    "footer",
    "aside",
    ".nav",
    ".navbar",
    ".header",
    ".footer",
    ".sidebar",
    ".menu",
    ".advertisement",
    ".ads",
    "#nav",
    "#header",
    "#footer",
    "#sidebar",
];

/// Extract readable text from an HTML document.
///
/// When `content_selector` is set and matches, only that subtree is
/// considered; otherwise common main-content containers are tried before
/// falling back to `<body>`. The result is whitespace-collapsed and
/// truncated to [`MAX_CONTENT_CHARS`].
pub fn extract_readable_text(html: &str, content_selector: Option<&str>) -> String {
    let document = Html::parse_document(html);
    let scoped = scope_content(&document, content_selector);
    let cleaned = remove_boilerplate(&scoped);

    let fragment = Html::parse_fragment(&cleaned);
    let text = fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");

    truncate_chars(&collapse_whitespace(&text), MAX_CONTENT_CHARS)
}

/// Pick the HTML subtree to extract from.
fn scope_content(document: &Html, content_selector: Option<&str>) -> String {
    if let Some(selector_str) = content_selector {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(scoped) = document.select(&selector).next() {
                return scoped.html();
            }
            tracing::debug!(selector = %selector_str, "content selector matched nothing, using full page");
        } else {
            tracing::warn!(selector = %selector_str, "invalid content selector, using full page");
        }
    }

    let main_selectors = ["main", "article", "[role='main']", "#content", ".content"];
    for selector_str in main_selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(main) = document.select(&selector).next() {
                return main.html();
            }
        }
    }

    if let Ok(body_selector) = Selector::parse("body") {
        if let Some(body) = document.select(&body_selector).next() {
            return body.html();
        }
    }

    document.html()
}

/// Remove boilerplate elements from an HTML string.
fn remove_boilerplate(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut result = html.to_string();
    for selector_str in BOILERPLATE_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                let element_html = element.html();
                result = result.replace(&element_html, "");
            }
        }
    }
    result
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a character boundary, never mid-codepoint.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_script_and_nav() {
        let html = r#"
            <html><body>
                <nav><a href="/">Home</a> <a href="/about">About</a></nav>
                <main><h1>Sunset Yoga</h1><p>June 1 at City Park</p></main>
                <script>analytics();</script>
                <footer>Copyright</footer>
            </body></html>
        "#;
        let text = extract_readable_text(html, None);
        assert!(text.contains("Sunset Yoga"));
        assert!(text.contains("June 1 at City Park"));
        assert!(!text.contains("analytics"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_content_selector_scopes_extraction() {
        let html = r#"
            <html><body>
                <div class="promo">Subscribe to our newsletter</div>
                <div class="events-list"><p>Farmers Market, Saturday</p></div>
            </body></html>
        "#;
        let text = extract_readable_text(html, Some(".events-list"));
        assert!(text.contains("Farmers Market"));
        assert!(!text.contains("newsletter"));
    }

    #[test]
    fn test_unmatched_selector_falls_back_to_page() {
        let html = "<html><body><p>Concert tonight</p></body></html>";
        let text = extract_readable_text(html, Some(".does-not-exist"));
        assert!(text.contains("Concert tonight"));
    }

    #[test]
    fn test_truncates_to_budget() {
        let body = "word ".repeat(10_000);
        let html = format!("<html><body><p>{}</p></body></html>", body);
        let text = extract_readable_text(&html, None);
        assert!(text.chars().count() <= MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_collapses_whitespace() {
        let html = "<html><body><p>one</p>\n\n\t<p>two</p></body></html>";
        assert_eq!(extract_readable_text(html, None), "one two");
    }
}
