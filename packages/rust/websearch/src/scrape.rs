//! Page fetching and text extraction.
//!
//! Scraped pages are flattened to whitespace-joined text for downstream
//! summarization. PDF responses are skipped with a warning; there is no
//! local PDF text extraction.

use scraper::{Html, Selector};
use tracing::{debug, warn};

use lectern_shared::{LecternError, Result};

/// A scraped search result: source URL plus extracted text.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub url: String,
    pub text: String,
}

/// Fetch a page and extract its visible text.
///
/// Returns an empty string for PDFs and other non-HTML content.
pub async fn scrape_page(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| LecternError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LecternError::Network(format!("{url}: HTTP {status}")));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.contains("application/pdf") {
        warn!(%url, "skipping PDF result");
        return Ok(String::new());
    }

    let body = response
        .text()
        .await
        .map_err(|e| LecternError::Network(format!("{url}: body read failed: {e}")))?;

    let text = extract_text(&body);
    debug!(%url, chars = text.len(), "scraped page");
    Ok(text)
}

/// Flatten an HTML document to whitespace-joined visible text.
///
/// Script, style, and noscript subtrees are dropped; all other text nodes
/// are joined with single spaces.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    let body_sel = Selector::parse("body").unwrap();
    let Some(body) = doc.select(&body_sel).next() else {
        return String::new();
    };

    let mut pieces = Vec::new();
    collect_text(*body, &mut pieces);
    pieces.join(" ")
}

/// Recursively collect trimmed text nodes, skipping non-content subtrees.
fn collect_text(node: ego_tree::NodeRef<'_, scraper::Node>, out: &mut Vec<String>) {
    for child in node.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            scraper::Node::Element(el) => {
                if !matches!(el.name(), "script" | "style" | "noscript") {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn extract_text_joins_with_spaces() {
        let html = r#"<html><body>
            <h1>Binary Search Trees</h1>
            <p>A BST keeps keys in sorted order.</p>
            <p>Lookup is O(log n) when balanced.</p>
        </body></html>"#;

        let text = extract_text(html);
        assert_eq!(
            text,
            "Binary Search Trees A BST keeps keys in sorted order. Lookup is O(log n) when balanced."
        );
    }

    #[test]
    fn extract_text_drops_scripts_and_styles() {
        let html = r#"<html><body>
            <script>var tracker = "analytics";</script>
            <style>.hidden { display: none; }</style>
            <p>Visible content.</p>
        </body></html>"#;

        let text = extract_text(html);
        assert_eq!(text, "Visible content.");
    }

    #[test]
    fn extract_text_empty_document() {
        assert_eq!(extract_text(""), "");
        assert_eq!(extract_text("<html></html>"), "");
    }

    #[tokio::test]
    async fn scrape_page_extracts_html_text() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><body><h1>Heaps</h1><p>A heap is a tree.</p></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let text = scrape_page(&client, &format!("{}/article", server.uri()))
            .await
            .expect("scrape");
        assert_eq!(text, "Heaps A heap is a tree.");
    }

    #[tokio::test]
    async fn scrape_page_skips_pdfs() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/paper.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"%PDF-1.7 binary".to_vec(), "application/pdf"),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let text = scrape_page(&client, &format!("{}/paper.pdf", server.uri()))
            .await
            .expect("scrape");
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn scrape_page_errors_on_http_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = scrape_page(&client, &format!("{}/gone", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
