use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use itertools::Itertools;

use crate::domain::company::NewsItem;

pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Fetches an article and returns its main body text.
#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    async fn article_text(&self, url: &str) -> anyhow::Result<String>;
}

/// Abstractive summarization of a single bounded chunk of text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl<T: Summarizer + ?Sized> Summarizer for Arc<T> {
    async fn summarize(&self, text: &str) -> anyhow::Result<String> {
        (**self).summarize(text).await
    }
}

pub struct NewsSummarizer<E, S> {
    extractor: E,
    summarizer: S,
    chunk_size: usize,
}

impl<E: ArticleExtractor, S: Summarizer> NewsSummarizer<E, S> {
    pub fn new(extractor: E, summarizer: S, chunk_size: usize) -> Self {
        NewsSummarizer {
            extractor,
            summarizer,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Digest of every article behind `items`. `None` when there is
    /// nothing to summarize.
    pub async fn summarize(&self, items: &[NewsItem]) -> anyhow::Result<Option<String>> {
        if items.is_empty() {
            log::info!("No news entries found");
            return Ok(None);
        }

        let bodies = join_all(items.iter().map(|item| self.item_text(item))).await;
        let full_text = bodies.iter().filter(|body| !body.is_empty()).join(" ");

        let mut summaries = vec![];
        for chunk in chunk_text(&full_text, self.chunk_size) {
            if chunk.trim().is_empty() {
                continue;
            }
            summaries.push(self.summarizer.summarize(chunk).await?);
        }

        log::info!(
            "Summarized {} of {} articles into {} chunk summaries",
            bodies.iter().filter(|body| !body.is_empty()).count(),
            items.len(),
            summaries.len()
        );

        Ok(Some(summaries.join(" ")))
    }

    async fn item_text(&self, item: &NewsItem) -> String {
        let Some(url) = item.article_url() else {
            log::warn!("News item '{}' has no article url", item.title);
            return String::new();
        };

        match self.extractor.article_text(url).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to extract article from {}: {:?}", url, e);
                String::new()
            }
        }
    }
}

/// Consecutive `[i, i + size)` character windows of `text`.
pub fn chunk_text(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = vec![];
    let mut start = 0;

    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            chunks.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}
