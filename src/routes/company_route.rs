use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;

use crate::{
    configuration::LlmSettings,
    dal::{RecordStore, StoredRecord},
    domain::{
        company::CompanyRecord,
        display::for_display,
        parse_outcome::{ModelPayload, ParseOutcome},
    },
    services::{assisted_scrape, extract_company_profile, normalize, OpenaiClient},
    startup::AppNewsSummarizer,
};

#[derive(Serialize)]
struct NormalizeResponse {
    outcome: ParseOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<CompanyRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<String>,
}

#[derive(Serialize)]
struct AssistedResponse {
    outcome: ParseOutcome,
    path: String,
}

#[post("/extract")]
pub async fn extract_profile(html: String) -> HttpResponse {
    HttpResponse::Ok().json(extract_company_profile(&html))
}

#[post("/normalize")]
pub async fn normalize_response(body: String) -> HttpResponse {
    let normalization = normalize(&body);

    let (record, raw) = match normalization.payload {
        ModelPayload::Record(record) => (Some(*record), None),
        ModelPayload::Raw(text) => (None, Some(text)),
    };

    HttpResponse::Ok().json(NormalizeResponse {
        outcome: normalization.outcome,
        record,
        raw,
    })
}

#[post("/assisted/{name}")]
pub async fn assisted(
    name: web::Path<String>,
    html: String,
    openai_client: web::Data<OpenaiClient>,
    store: web::Data<RecordStore>,
    llm_settings: web::Data<LlmSettings>,
) -> HttpResponse {
    match assisted_scrape(
        &openai_client,
        &store,
        &name,
        &html,
        llm_settings.page_text_limit,
    )
    .await
    {
        Ok((normalization, path)) => HttpResponse::Ok().json(AssistedResponse {
            outcome: normalization.outcome,
            path: path.display().to_string(),
        }),
        Err(e) => {
            log::error!("Failed to parse {}: {:?}", name, e);
            HttpResponse::BadGateway().body(format!("Failed to parse {}: {}", name, e))
        }
    }
}

#[post("/summary")]
pub async fn news_summary(
    record: web::Json<CompanyRecord>,
    news_summarizer: web::Data<AppNewsSummarizer>,
) -> HttpResponse {
    let mut record = record.into_inner();

    match news_summarizer.summarize(&record.news).await {
        Ok(summary) => {
            record.news_summary = summary;
            HttpResponse::Ok().json(record)
        }
        Err(e) => {
            log::error!("News summary failed: {:?}", e);
            HttpResponse::BadGateway().body(format!("News summary failed: {}", e))
        }
    }
}

#[get("/records")]
pub async fn records(store: web::Data<RecordStore>) -> HttpResponse {
    match store.load_all() {
        Ok(stored) => {
            let shown: Vec<StoredRecord> = stored
                .into_iter()
                .map(|stored| StoredRecord {
                    record: for_display(stored.record),
                    ..stored
                })
                .collect();
            HttpResponse::Ok().json(shown)
        }
        Err(e) => {
            log::error!("Failed to load records: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
