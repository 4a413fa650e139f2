use actix_web::{post, web, HttpResponse};
use serde::Deserialize;

use crate::services::OpenaiClient;

#[derive(Deserialize)]
pub struct OutreachEmailBody {
    company_name: String,
    #[serde(default)]
    news_summary: Option<String>,
}

#[post("/email")]
pub async fn outreach_email(
    body: web::Json<OutreachEmailBody>,
    openai_client: web::Data<OpenaiClient>,
) -> HttpResponse {
    let summary = body.news_summary.as_deref().unwrap_or_default();

    match openai_client
        .draft_outreach_email(&body.company_name, summary)
        .await
    {
        Ok(email) if !email.is_empty() => HttpResponse::Ok().body(email),
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(e) => {
            log::error!("Could not generate email for {}: {:?}", body.company_name, e);
            HttpResponse::BadGateway().body(format!("Could not generate email: {}", e))
        }
    }
}
