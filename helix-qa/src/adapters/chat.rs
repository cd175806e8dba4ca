use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{HelixQaError, Result};
use crate::ports::AnswerGenerator;

pub const DEFAULT_CHAT_URL: &str = "https://api.groq.com/openai/v1";

/// Generation through an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// The grounding prompt sent to the model.
pub fn render_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based only on the following context:\n{context}\nQuestion: {question}\n"
    )
}

impl ChatCompletionsGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    fn failure(&self, detail: impl std::fmt::Display) -> HelixQaError {
        HelixQaError::GenerationFailure(format!("{}: {detail}", self.model))
    }

    fn first_answer(&self, response: ChatResponse) -> Result<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| self.failure("response contained no answer"))
    }
}

#[async_trait]
impl AnswerGenerator for ChatCompletionsGenerator {
    async fn generate(&self, context: &str, question: &str) -> Result<String> {
        let prompt = render_prompt(context, question);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: 0.0,
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(model = %self.model, prompt_bytes = prompt.len(), "Calling generation model");
        let response = request.send().await.map_err(|e| self.failure(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(self.failure(format!("{status}: {detail}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| self.failure(e))?;
        self.first_answer(parsed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
