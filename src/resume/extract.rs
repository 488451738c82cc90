//! Clients for the two collaborators behind resume parsing: a PDF text
//! extraction service and a chat-completions model that pulls ATS keywords.

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::ResumeConfig;

const EXTRACT_ENDPOINT: &str = "/extract";
const CHAT_ENDPOINT: &str = "/chat/completions";

const KEYWORD_SYSTEM_PROMPT: &str = "You are an ATS (Applicant Tracking System) keyword expert. \
Extract relevant keywords from resumes including skills, technologies, job titles, certifications, \
and important industry terms. Return them as a comma-separated list.";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extractor is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Request(String),
    #[error("service returned status {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    pub text: String,
    pub num_pages: u32,
}

#[async_trait]
pub trait ResumeTextExtractor: Send + Sync {
    async fn extract(&self, file_name: &str, pdf: Bytes) -> Result<ExtractedText, ExtractError>;
}

#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    /// Comma-separated keywords; empty when the model returns nothing.
    async fn keywords(&self, resume_text: &str) -> Result<String, ExtractError>;
}

/// Posts the PDF as multipart field `file` and expects `{text, numPages}` back.
pub struct HttpTextExtractor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTextExtractor {
    pub fn new(cfg: &ResumeConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: cfg.extractor_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ResumeTextExtractor for HttpTextExtractor {
    async fn extract(&self, file_name: &str, pdf: Bytes) -> Result<ExtractedText, ExtractError> {
        let url = format!("{}{}", self.base_url, EXTRACT_ENDPOINT);
        let part = Part::bytes(pdf.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ExtractError::Request(e.to_string()))?;
        let form = Form::new().part("file", part);

        debug!(%url, "calling text extraction service");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtractError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "text extraction service error");
            return Err(ExtractError::Status(status.as_u16()));
        }

        let extracted: ExtractedText = response
            .json()
            .await
            .map_err(|e| ExtractError::Decode(e.to_string()))?;
        info!(pages = extracted.num_pages, chars = extracted.text.len(), "resume text extracted");
        Ok(extracted)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client (Groq by default).
pub struct ChatKeywordExtractor {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl ChatKeywordExtractor {
    pub fn new(cfg: &ResumeConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            api_key: cfg.groq_api_key.clone(),
            base_url: cfg.groq_base_url.trim_end_matches('/').to_string(),
            model: cfg.groq_model.clone(),
        })
    }
}

#[async_trait]
impl KeywordExtractor for ChatKeywordExtractor {
    async fn keywords(&self, resume_text: &str) -> Result<String, ExtractError> {
        let api_key = self.api_key.as_deref().ok_or(ExtractError::NotConfigured)?;
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: KEYWORD_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Extract ATS keywords from this resume.:\n\n{resume_text}"),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, CHAT_ENDPOINT))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status(status.as_u16()));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Decode(e.to_string()))?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;

    /// Returns a fixed result, or fails when `text` is `None`.
    pub struct FakeTextExtractor {
        pub text: Option<ExtractedText>,
    }

    #[async_trait]
    impl ResumeTextExtractor for FakeTextExtractor {
        async fn extract(&self, _file_name: &str, _pdf: Bytes) -> Result<ExtractedText, ExtractError> {
            self.text
                .clone()
                .ok_or_else(|| ExtractError::Decode("Invalid PDF structure".into()))
        }
    }

    pub struct FakeKeywordExtractor {
        pub keywords: Option<String>,
    }

    #[async_trait]
    impl KeywordExtractor for FakeKeywordExtractor {
        async fn keywords(&self, _resume_text: &str) -> Result<String, ExtractError> {
            self.keywords.clone().ok_or(ExtractError::Status(503))
        }
    }
}
