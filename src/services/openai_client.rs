use anyhow::Context;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use crate::configuration::LlmSettings;

use super::news_summarizer::Summarizer;

const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a helpful AI that extracts structured company data from HTML.";
const EMAIL_SYSTEM_PROMPT: &str =
    "You are a helpful assistant who drafts professional business outreach emails.";
const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a news editor who writes short, factual summaries of company news.";

const EMAIL_TEMPERATURE: f32 = 0.4;
const EMAIL_MAX_TOKENS: u32 = 300;
const SUMMARY_MAX_TOKENS: u32 = 200;

pub struct OpenaiClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenaiClient {
    pub fn new(api_key: String, settings: &LlmSettings) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(settings.api_base.clone());

        OpenaiClient {
            client: Client::with_config(config),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    pub async fn complete(
        &self,
        system: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> anyhow::Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Chat completion request failed")?;
        log::debug!("Response: {:?}", response);

        let first_choice = response
            .choices
            .first()
            .context("No choices in model response")?
            .message
            .content
            .clone()
            .context("No content in model response")?;

        Ok(first_choice)
    }

    /// Raw model answer for the structured company fields of `page_text`.
    /// The answer is meant for `response_normalizer::normalize`.
    pub async fn extract_company(&self, page_text: &str) -> anyhow::Result<String> {
        let prompt = extraction_prompt(page_text);
        self.complete(
            EXTRACTION_SYSTEM_PROMPT,
            &prompt,
            self.temperature,
            self.max_tokens,
        )
        .await
    }

    pub async fn draft_outreach_email(
        &self,
        company_name: &str,
        news_summary: &str,
    ) -> anyhow::Result<String> {
        let prompt = format!(
            r#"You are a sales outreach assistant.

Write only the subject line and outreach email body (no extra commentary) to the team at {}, based on this company update summary:

"""{}"""

Make it concise, human, professional, and proactive. Keep it under 150 words. Return only the subject and the body."#,
            company_name, news_summary
        );

        let email = self
            .complete(EMAIL_SYSTEM_PROMPT, &prompt, EMAIL_TEMPERATURE, EMAIL_MAX_TOKENS)
            .await?;

        Ok(email.trim().to_string())
    }
}

#[async_trait]
impl Summarizer for OpenaiClient {
    async fn summarize(&self, text: &str) -> anyhow::Result<String> {
        let prompt = format!(
            "Summarize the following news text in two or three sentences. Return only the summary.\n\n{}",
            text
        );
        let summary = self
            .complete(SUMMARY_SYSTEM_PROMPT, &prompt, self.temperature, SUMMARY_MAX_TOKENS)
            .await?;

        Ok(summary.trim().to_string())
    }
}

pub fn extraction_prompt(page_text: &str) -> String {
    format!(
        r#"
Extract structured company information from the following Crunchbase HTML.
Respond only with a valid JSON object (no preamble or explanation).

Required fields:
- name (string)
- description (string)
- website (string)
- location (string)
- founded_year (integer)
- employee_count (string)
- total_funding (string)
- last_funding_type (string)
- last_funding_date (string)
- investors (array of strings)
- key_people (array of strings with titles)
- tech_stack (array of strings)
- industry (string)

---HTML START---
{}
---HTML END---

Respond ONLY with a valid JSON object.
"#,
        page_text
    )
}
