//! Model-fallback extraction stage.
//!
//! Sends recognized text to an external language-model service and parses
//! the free-text reply into the receipt field schema. The reply is treated
//! as untrusted: any parse ambiguity degrades to a zero-field step, never to
//! a document failure.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{KuittiError, LlmError};
use crate::models::config::LlmConfig;
use crate::models::record::{ExtractionStep, Field, ReceiptFields, StepFailure, StepName};

use super::rules::dates::parse_dmy_str;
use super::rules::parse_finnish_amount;

const SYSTEM_PROMPT: &str = r#"You are a receipt data extraction assistant.
Given raw OCR text from a Finnish car service receipt, extract structured data and return ONLY valid JSON.

The JSON must match this schema exactly:
{
  "date": "YYYY-MM-DD or null",
  "amount": number or null,
  "vat_amount": number or null,
  "invoice_number": "string or null",
  "odometer_km": integer or null,
  "company": "string or null",
  "work_description": ["strings"] or null
}

Notes:
- The text may be garbled OCR output. Do your best to reconstruct the data.
- Amounts use the comma as decimal separator on the receipt; emit plain numbers.
- Use null for fields you cannot determine.
- Return ONLY the JSON object, no markdown fences, no commentary."#;

/// Completion client for the model service collaborator.
///
/// The seam exists so the pipeline can run against a stub in tests; the
/// shipped implementation is [`HttpLlmClient`].
pub trait LlmClient {
    fn complete(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI-compatible chat completions client (Ollama, llama.cpp, remote).
#[derive(Debug, Clone)]
pub struct HttpLlmClient {
    client: Client,
    config: LlmConfig,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, KuittiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KuittiError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.config.temperature,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ServiceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ServiceUnavailable(format!("HTTP {status}: {body}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseFailure(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::ParseFailure("empty reply".to_string()))
    }
}

/// The fallback extraction stage.
pub struct FallbackExtractor<C> {
    client: C,
    max_prompt_chars: usize,
}

impl<C: LlmClient> FallbackExtractor<C> {
    pub fn new(client: C, config: &LlmConfig) -> Self {
        Self {
            client,
            max_prompt_chars: config.max_prompt_chars,
        }
    }

    /// Run the stage. Service and parse failures degrade to a zero-field
    /// step with an explicit failure marker; the document keeps processing.
    pub async fn run(&self, text: &str, wanted: &BTreeSet<Field>) -> ExtractionStep {
        let start = Instant::now();
        let prompt = build_prompt(text, wanted, self.max_prompt_chars);

        match self.client.complete(&prompt).await {
            Ok(reply) => {
                let elapsed = start.elapsed().as_millis() as u64;
                match parse_reply(&reply) {
                    Ok(fields) => {
                        info!(
                            extracted = fields.present().len(),
                            "model fallback extracted fields"
                        );
                        ExtractionStep::new(StepName::ModelFallback, fields, elapsed)
                    }
                    Err(e) => {
                        warn!(error = %e, "model reply did not parse");
                        ExtractionStep::failed(
                            StepName::ModelFallback,
                            StepFailure::ParseFailure(e.to_string()),
                            elapsed,
                        )
                    }
                }
            }
            Err(LlmError::ServiceUnavailable(msg)) => {
                warn!(error = %msg, "model service unavailable");
                ExtractionStep::failed(
                    StepName::ModelFallback,
                    StepFailure::ServiceUnavailable(msg),
                    start.elapsed().as_millis() as u64,
                )
            }
            Err(LlmError::ParseFailure(msg)) => {
                warn!(error = %msg, "model reply unusable");
                ExtractionStep::failed(
                    StepName::ModelFallback,
                    StepFailure::ParseFailure(msg),
                    start.elapsed().as_millis() as u64,
                )
            }
        }
    }
}

/// Build the user prompt: target fields plus the (truncated) raw text.
fn build_prompt(text: &str, wanted: &BTreeSet<Field>, max_chars: usize) -> String {
    let mut end = max_chars.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    let focus = if wanted.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = wanted.iter().map(|f| f.name()).collect();
        format!(
            "The deterministic parser could not find: {}. Pay particular attention to these.\n\n",
            names.join(", ")
        )
    };

    format!(
        "{focus}Extract receipt data from the following OCR text:\n\n{}",
        &text[..end]
    )
}

/// Nullable candidate fields as the model emits them, before type coercion.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateFields {
    date: Option<Value>,
    amount: Option<Value>,
    vat_amount: Option<Value>,
    invoice_number: Option<Value>,
    odometer_km: Option<Value>,
    company: Option<Value>,
    work_description: Option<Value>,
}

/// Parse the model's free-text reply into the field schema.
pub fn parse_reply(reply: &str) -> Result<ReceiptFields, LlmError> {
    let stripped = reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let json_str = extract_json_object(stripped)?;
    let candidate: CandidateFields = serde_json::from_str(json_str)
        .map_err(|e| LlmError::ParseFailure(format!("{e}")))?;

    let fields = ReceiptFields {
        date: candidate.date.as_ref().and_then(coerce_date),
        amount: candidate.amount.as_ref().and_then(coerce_amount),
        vat_amount: candidate.vat_amount.as_ref().and_then(coerce_amount),
        invoice_number: candidate.invoice_number.as_ref().and_then(coerce_text),
        odometer_km: candidate.odometer_km.as_ref().and_then(coerce_integer),
        company: candidate.company.as_ref().and_then(coerce_text),
        work_description: candidate.work_description.as_ref().and_then(coerce_list),
    };

    debug!(extracted = fields.present().len(), "coerced model reply");
    Ok(fields)
}

/// Locate the outermost `{...}` substring in a reply that may carry
/// surrounding prose or reasoning tokens.
fn extract_json_object(s: &str) -> Result<&str, LlmError> {
    let start = s
        .find('{')
        .ok_or_else(|| LlmError::ParseFailure("no JSON object in reply".to_string()))?;
    let end = s
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| LlmError::ParseFailure("unterminated JSON object in reply".to_string()))?;
    Ok(&s[start..=end])
}

fn coerce_date(value: &Value) -> Option<chrono::NaiveDate> {
    let s = value.as_str()?.trim();
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_dmy_str(s))
}

fn coerce_amount(value: &Value) -> Option<rust_decimal::Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => parse_finnish_amount(s),
        _ => None,
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => {
            let list: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect();
            (!list.is_empty()).then_some(list)
        }
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.trim().to_string()]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use super::*;

    struct StubClient(Result<String, LlmError>);

    impl LlmClient for StubClient {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(LlmError::ServiceUnavailable(m)) => {
                    Err(LlmError::ServiceUnavailable(m.clone()))
                }
                Err(LlmError::ParseFailure(m)) => Err(LlmError::ParseFailure(m.clone())),
            }
        }
    }

    #[test]
    fn reply_json_with_prose_parses() {
        let reply = "Sure! Here is the data:\n```json\n{\"amount\": 240.00, \"company\": \"Euromaster\"}\n```\nLet me know.";
        let fields = parse_reply(reply).unwrap();
        assert_eq!(fields.amount, Some(Decimal::from_str("240").unwrap()));
        assert_eq!(fields.company, Some("Euromaster".to_string()));
        assert!(fields.date.is_none());
    }

    #[test]
    fn string_amounts_with_comma_coerce() {
        let fields = parse_reply(r#"{"amount": "850,00", "odometer_km": "387551"}"#).unwrap();
        assert_eq!(fields.amount, Some(Decimal::from_str("850.00").unwrap()));
        assert_eq!(fields.odometer_km, Some(387551));
    }

    #[test]
    fn reply_without_json_is_parse_failure() {
        let err = parse_reply("I could not find any receipt data.").unwrap_err();
        assert!(matches!(err, LlmError::ParseFailure(_)));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let fields =
            parse_reply(r#"{"amount": 54.0, "currency": "EUR", "notes": "inspection"}"#).unwrap();
        assert_eq!(fields.amount, Some(Decimal::from_str("54").unwrap()));
    }

    #[tokio::test]
    async fn unreachable_service_degrades_to_failed_step() {
        let extractor = FallbackExtractor::new(
            StubClient(Err(LlmError::ServiceUnavailable("connection refused".into()))),
            &LlmConfig::default(),
        );
        let step = extractor.run("text", &BTreeSet::new()).await;

        assert_eq!(step.step, StepName::ModelFallback);
        assert!(step.fields.is_empty());
        assert!(matches!(
            step.failure,
            Some(StepFailure::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn garbage_reply_degrades_to_failed_step() {
        let extractor = FallbackExtractor::new(
            StubClient(Ok("no structured data here".into())),
            &LlmConfig::default(),
        );
        let step = extractor.run("text", &BTreeSet::new()).await;
        assert!(step.fields.is_empty());
        assert!(matches!(step.failure, Some(StepFailure::ParseFailure(_))));
    }

    #[tokio::test]
    async fn successful_reply_produces_fields() {
        let extractor = FallbackExtractor::new(
            StubClient(Ok(r#"{"amount": 240.00}"#.into())),
            &LlmConfig::default(),
        );
        let wanted = BTreeSet::from([Field::Amount]);
        let step = extractor.run("maksoimme 240 euroa", &wanted).await;

        assert_eq!(
            step.fields.amount,
            Some(Decimal::from_str("240").unwrap())
        );
        assert!(step.failure.is_none());
    }

    #[test]
    fn prompt_truncates_on_char_boundary() {
        let text = "ä".repeat(100);
        let prompt = build_prompt(&text, &BTreeSet::new(), 51);
        // must not panic and must stay within budget
        assert!(prompt.contains('ä'));
    }
}
