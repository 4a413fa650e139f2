use std::{net::TcpListener, sync::Arc};

use actix_web::{
    dev::Server,
    middleware::Logger,
    web::{self, Data},
    App, HttpServer,
};

use crate::{
    configuration::LlmSettings,
    dal::RecordStore,
    routes::{company_route, default_route, email_route},
    services::{HttpArticleExtractor, NewsSummarizer, OpenaiClient},
};

// Saved profile pages are routinely several megabytes.
const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

pub type AppNewsSummarizer = NewsSummarizer<HttpArticleExtractor, Arc<OpenaiClient>>;

pub fn run(
    listener: TcpListener,
    openai_client: Arc<OpenaiClient>,
    news_summarizer: AppNewsSummarizer,
    store: RecordStore,
    llm_settings: LlmSettings,
) -> Result<Server, std::io::Error> {
    let openai_client = Data::from(openai_client);
    let news_summarizer = web::Data::new(news_summarizer);
    let store = web::Data::new(store);
    let llm_settings = web::Data::new(llm_settings);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .app_data(web::JsonConfig::default().limit(MAX_PAYLOAD_BYTES))
            .service(default_route::default)
            .service(
                web::scope("/company")
                    .service(company_route::extract_profile)
                    .service(company_route::normalize_response)
                    .service(company_route::assisted)
                    .service(company_route::news_summary)
                    .service(company_route::records)
                    .service(email_route::outreach_email),
            )
            .app_data(openai_client.clone())
            .app_data(news_summarizer.clone())
            .app_data(store.clone())
            .app_data(llm_settings.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
