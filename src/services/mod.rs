pub mod article_extractor;
pub mod company_pipeline;
pub mod news_summarizer;
pub mod openai_client;
pub mod profile_extractor;
pub mod response_normalizer;

pub use article_extractor::*;
pub use company_pipeline::*;
pub use news_summarizer::*;
pub use openai_client::*;
pub use profile_extractor::*;
pub use response_normalizer::*;
