use std::time::Duration;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::services::DEFAULT_CHUNK_SIZE;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub api_keys: ApiKeys,
    pub llm: LlmSettings,
    pub summarizer: SummarizerSettings,
    pub storage: StorageSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct ApiKeys {
    pub openai: String,
}

/// Any OpenAI-compatible chat completion endpoint.
#[derive(Deserialize, Clone)]
pub struct LlmSettings {
    pub api_base: String,
    pub model: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub temperature: f32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_tokens: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_text_limit: usize,
}

#[derive(Deserialize, Clone)]
pub struct SummarizerSettings {
    #[serde(
        default = "default_chunk_size",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub chunk_size: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub article_timeout_secs: u64,
}

impl SummarizerSettings {
    pub fn article_timeout(&self) -> Duration {
        Duration::from_secs(self.article_timeout_secs)
    }
}

#[derive(Deserialize, Clone)]
pub struct StorageSettings {
    pub parsed_dir: String,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
