//! AI adapter: optional LLM summary + relevance score for accepted articles.
//!
//! Strictly best-effort. Every failure mode (disabled, missing key, HTTP error,
//! unparsable reply, daily budget spent) returns `None`, and the caller keeps the
//! heuristic result.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ai::AiConfig;

/// What the model returns for one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAssessment {
    pub summary: String,
    /// Already clamped to [1,10].
    pub relevance_score: u8,
}

#[async_trait]
pub trait AiEnhancer: Send + Sync {
    async fn assess(&self, title: &str, description: &str) -> Option<AiAssessment>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynAiEnhancer = Arc<dyn AiEnhancer>;

/// Factory: `None` unless the config is enabled, names a known provider, and has a key.
pub fn build_enhancer(config: &AiConfig) -> Option<DynAiEnhancer> {
    if !config.enabled || config.api_key.trim().is_empty() {
        return None;
    }
    match config.provider.as_str() {
        "openai" => {
            let provider =
                OpenAiEnhancer::new(&config.api_key, &config.model, &config.endpoint).ok()?;
            Some(Arc::new(DailyLimited::new(provider, config.daily_limit)))
        }
        _ => None,
    }
}

// ------------------------------------------------------------
// OpenAI
// ------------------------------------------------------------

/// Chat Completions provider.
pub struct OpenAiEnhancer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiEnhancer {
    pub fn new(api_key: &str, model: &str, endpoint: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("crc-news-pipeline/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: endpoint.to_string(),
        })
    }
}

const SYSTEM_PROMPT: &str = "You rate news for a colorectal cancer screening advocacy site. \
Reply with a JSON object {\"summary\": string, \"relevance_score\": integer}. \
summary: one or two plain sentences, at most 240 characters. \
relevance_score: 1 (off-topic) to 10 (major screening guideline or policy news).";

#[async_trait]
impl AiEnhancer for OpenAiEnhancer {
    async fn assess(&self, title: &str, description: &str) -> Option<AiAssessment> {
        if self.api_key.is_empty() {
            return None;
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
            response_format: ResponseFormat,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let user = format!("Title: {title}\n\nDescription: {description}");
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.2,
            max_tokens: 200,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            tracing::debug!(status = %resp.status(), "ai assess non-success");
            return None;
        }
        let body: Resp = resp.json().await.ok()?;
        let content = body.choices.first().map(|c| c.message.content.as_str())?;
        parse_assessment(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Parse the model reply. Tolerates ```json fences and fractional scores.
pub fn parse_assessment(content: &str) -> Option<AiAssessment> {
    #[derive(Deserialize)]
    struct Raw {
        #[serde(default)]
        summary: String,
        relevance_score: f64,
    }

    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let raw: Raw = serde_json::from_str(trimmed).ok()?;
    if !raw.relevance_score.is_finite() {
        return None;
    }
    let score = raw.relevance_score.round().clamp(1.0, 10.0) as u8;
    Some(AiAssessment {
        summary: raw.summary.trim().to_string(),
        relevance_score: score,
    })
}

// ------------------------------------------------------------
// Disabled + daily budget wrapper
// ------------------------------------------------------------

/// Returns `None` always.
pub struct DisabledEnhancer;

#[async_trait]
impl AiEnhancer for DisabledEnhancer {
    async fn assess(&self, _title: &str, _description: &str) -> Option<AiAssessment> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

#[derive(Debug)]
struct DailyCounter {
    date: NaiveDate,
    count: u32,
}

/// Caps real provider calls per UTC day. Failed calls still count.
pub struct DailyLimited<E> {
    inner: E,
    limit: u32,
    counter: Mutex<DailyCounter>,
}

impl<E: AiEnhancer> DailyLimited<E> {
    pub fn new(inner: E, limit: u32) -> Self {
        Self {
            inner,
            limit,
            counter: Mutex::new(DailyCounter {
                date: Utc::now().date_naive(),
                count: 0,
            }),
        }
    }

    /// Reserve one call for today; false once the budget is spent.
    fn try_reserve(&self) -> bool {
        let Ok(mut g) = self.counter.lock() else {
            return false;
        };
        let today = Utc::now().date_naive();
        if g.date != today {
            g.date = today;
            g.count = 0;
        }
        if g.count >= self.limit {
            return false;
        }
        g.count += 1;
        true
    }
}

#[async_trait]
impl<E: AiEnhancer> AiEnhancer for DailyLimited<E> {
    async fn assess(&self, title: &str, description: &str) -> Option<AiAssessment> {
        if !self.try_reserve() {
            tracing::debug!(provider = self.inner.provider_name(), "ai daily limit reached");
            return None;
        }
        self.inner.assess(title, description).await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
