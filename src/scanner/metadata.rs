//! Best-effort page metadata enrichment.
//!
//! A separate unauthenticated fetch of the raw page markup. Failure here never
//! aborts a scan; callers get the defaults instead.

use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
}

impl Default for PageMetadata {
    fn default() -> Self {
        Self {
            title: "Unknown".to_string(),
            description: String::new(),
        }
    }
}

fn extract(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);
    let mut meta = PageMetadata::default();

    if let Ok(selector) = Selector::parse("title") {
        if let Some(el) = document.select(&selector).next() {
            let title = el.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                meta.title = title;
            }
        }
    }

    if let Ok(selector) = Selector::parse(r#"meta[name="description"]"#) {
        if let Some(el) = document.select(&selector).next() {
            if let Some(content) = el.value().attr("content") {
                meta.description = content.trim().to_string();
            }
        }
    }

    meta
}

pub async fn fetch_page_metadata(client: &reqwest::Client, url: &str) -> PageMetadata {
    let response = client.get(url).timeout(FETCH_TIMEOUT).send().await;
    match response {
        Ok(response) => match response.text().await {
            Ok(body) => extract(&body),
            Err(e) => {
                debug!("metadata body read failed for {}: {}", url, e);
                PageMetadata::default()
            }
        },
        Err(e) => {
            debug!("metadata fetch failed for {}: {}", url, e);
            PageMetadata::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_description() {
        let html = r#"<html><head>
            <title> Example Site </title>
            <meta name="description" content="A demo page">
        </head><body></body></html>"#;
        let meta = extract(html);
        assert_eq!(meta.title, "Example Site");
        assert_eq!(meta.description, "A demo page");
    }

    #[test]
    fn defaults_on_missing_tags() {
        let meta = extract("<html><body>no head</body></html>");
        assert_eq!(meta.title, "Unknown");
        assert_eq!(meta.description, "");
    }

    #[test]
    fn defaults_on_empty_title() {
        let meta = extract("<html><head><title>  </title></head></html>");
        assert_eq!(meta.title, "Unknown");
    }
}
