use std::path::PathBuf;

use crate::{
    dal::RecordStore,
    domain::{company::CompanyRecord, parse_outcome::Normalization},
};

use super::{
    extract_company_profile, normalize, page_text, ArticleExtractor, NewsSummarizer,
    OpenaiClient, Summarizer,
};

/// Scrape a profile page and attach a digest of its recent news.
pub async fn enrich_company<E, S>(
    html: &str,
    news_summarizer: &NewsSummarizer<E, S>,
) -> CompanyRecord
where
    E: ArticleExtractor,
    S: Summarizer,
{
    let record = extract_company_profile(html);
    attach_news_summary(record, news_summarizer).await
}

/// News enrichment is best effort: a failure leaves `news_summary` unset.
pub async fn attach_news_summary<E, S>(
    mut record: CompanyRecord,
    news_summarizer: &NewsSummarizer<E, S>,
) -> CompanyRecord
where
    E: ArticleExtractor,
    S: Summarizer,
{
    match news_summarizer.summarize(&record.news).await {
        Ok(summary) => record.news_summary = summary,
        Err(e) => log::warn!(
            "News scraping failed (some data may be missing): {:?}",
            e
        ),
    }

    record
}

/// Model-assisted scrape of one saved page: visible text goes to the model,
/// the answer is normalized and persisted under `name`.
pub async fn assisted_scrape(
    openai_client: &OpenaiClient,
    store: &RecordStore,
    name: &str,
    html: &str,
    page_text_limit: usize,
) -> anyhow::Result<(Normalization, PathBuf)> {
    log::info!("Parsing {}...", name);

    let text = page_text(html, page_text_limit);
    let response = openai_client.extract_company(&text).await?;
    let normalization = normalize(&response);
    let path = store.save(name, &normalization)?;

    Ok((normalization, path))
}
