//! Extraction of chapter links and chapter bodies from parsed pages.

use crate::error::ExtractError;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// CSS selectors used for parsing.
struct Selectors {
    /// Chapter link selector on the listing page.
    chapter_link: Selector,
    /// Chapter body selector on a chapter page.
    content: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    chapter_link: Selector::parse(".list-group a").unwrap(),
    content: Selector::parse("#content").unwrap(),
});

/// Line breaks in both `<br>` and `<br/>` forms.
static LINE_BREAK_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br\s*/?>").unwrap());

/// One entry of the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterLink {
    /// Chapter title, used as the output file stem.
    pub title: String,

    /// Link target as written in the page, usually relative to the server origin.
    pub href: String,
}

/// Extracts the chapter links from a listing page in document order.
///
/// Links without a `title` attribute fall back to their text.
pub fn extract_links(doc: &Html) -> Vec<ChapterLink> {
    doc.select(&SELECTORS.chapter_link)
        .map(|elem| {
            let href = elem.value().attr("href").unwrap_or_default().to_string();
            let title = match elem.value().attr("title") {
                Some(title) => title.to_string(),
                None => elem.text().collect::<String>().trim().to_string(),
            };
            ChapterLink { title, href }
        })
        .collect()
}

/// Extracts the cleaned chapter body from a chapter page.
pub fn extract_content(doc: &Html) -> Result<String, ExtractError> {
    let content = doc
        .select(&SELECTORS.content)
        .next()
        .ok_or_else(|| ExtractError::ElementNotFound("content region".to_string()))?;

    Ok(cleanup(&content.inner_html()))
}

/// Removes `<br>` markup and turns `&nbsp;` into plain spaces.
///
/// Blank input is returned unchanged.
pub fn cleanup(html: &str) -> String {
    if html.trim().is_empty() {
        return html.to_string();
    }

    LINE_BREAK_REGEX.replace_all(html, "").replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <a href="/home">Home</a>
          <ul class="list-group">
            <li><a href="/read/1/1.html" title="Chapter 1">1</a></li>
            <li><a href="/read/1/2.html" title="Chapter 2">2</a></li>
            <li><a href="/read/1/3.html"> Chapter 3 </a></li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn test_cleanup_examples() {
        assert_eq!(cleanup(""), "");
        assert_eq!(cleanup("a<br/>b"), "ab");
        assert_eq!(cleanup("a<br>b"), "ab");
        assert_eq!(cleanup("a<br />b<br  >c"), "abc");
        assert_eq!(cleanup("a&nbsp;b"), "a b");
    }

    #[test]
    fn test_cleanup_blank_is_noop() {
        assert_eq!(cleanup("   "), "   ");
        assert_eq!(cleanup("\n\t"), "\n\t");
    }

    #[test]
    fn test_cleanup_idempotent() {
        let clean = "first line\nsecond line";
        assert_eq!(cleanup(clean), clean);

        let once = cleanup("x&nbsp;&nbsp;y<br/>\nz");
        assert_eq!(cleanup(&once), once);
    }

    #[test]
    fn test_extract_links_in_document_order() {
        let doc = Html::parse_document(LISTING);
        let links = extract_links(&doc);

        assert_eq!(links.len(), 3);
        assert_eq!(links[0].title, "Chapter 1");
        assert_eq!(links[0].href, "/read/1/1.html");
        assert_eq!(links[1].title, "Chapter 2");
        assert_eq!(links[2].title, "Chapter 3");
    }

    #[test]
    fn test_extract_links_empty_page() {
        let doc = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert!(extract_links(&doc).is_empty());
    }

    #[test]
    fn test_extract_content() {
        let doc = Html::parse_document(
            "<html><body><div id=\"content\">line one<br>line&nbsp;two<br/>end</div></body></html>",
        );
        assert_eq!(extract_content(&doc).unwrap(), "line oneline twoend");
    }

    #[test]
    fn test_extract_content_missing() {
        let doc = Html::parse_document("<html><body><div id=\"main\">text</div></body></html>");
        assert!(matches!(
            extract_content(&doc),
            Err(ExtractError::ElementNotFound(_))
        ));
    }
}
