use std::{net::TcpListener, sync::Arc};

use dossier::{
    configuration::get_configuration,
    dal::RecordStore,
    services::{HttpArticleExtractor, NewsSummarizer, OpenaiClient},
    startup::run,
};
use env_logger::Env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration()?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    log::info!("Listening on {}", address);

    let openai_client = Arc::new(OpenaiClient::new(
        configuration.api_keys.openai,
        &configuration.llm,
    ));
    let article_extractor = HttpArticleExtractor::new(configuration.summarizer.article_timeout())?;
    let news_summarizer = NewsSummarizer::new(
        article_extractor,
        openai_client.clone(),
        configuration.summarizer.chunk_size,
    );
    let store = RecordStore::new(&configuration.storage.parsed_dir)?;

    run(
        listener,
        openai_client,
        news_summarizer,
        store,
        configuration.llm,
    )?
    .await?;

    Ok(())
}
