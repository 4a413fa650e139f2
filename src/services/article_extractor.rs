use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::news_summarizer::ArticleExtractor;

/// Downloads news articles and pulls their paragraph text.
pub struct HttpArticleExtractor {
    client: Client,
}

impl HttpArticleExtractor {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .read_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("Failed to build article http client")?;

        Ok(HttpArticleExtractor { client })
    }
}

#[async_trait]
impl ArticleExtractor for HttpArticleExtractor {
    async fn article_text(&self, url: &str) -> anyhow::Result<String> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid article url: {}", url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("Unsupported article url scheme: {}", parsed.scheme());
        }

        let html = self
            .client
            .get(parsed)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = article_body(&html);
        log::info!("Extracted {} chars from {}", text.len(), url);

        Ok(text)
    }
}

/// Paragraphs inside `<article>` when the page has one, otherwise every
/// paragraph on the page.
pub fn article_body(html: &str) -> String {
    let document = Html::parse_document(html);
    let article_selector = Selector::parse("article p").unwrap();
    let paragraph_selector = Selector::parse("p").unwrap();

    let paragraphs = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .map(|p| p.text().collect::<String>().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    };

    let mut body = paragraphs(&article_selector);
    if body.is_empty() {
        body = paragraphs(&paragraph_selector);
    }

    body.join("\n")
}
