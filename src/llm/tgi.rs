// src/llm/tgi.rs
// text-generation-inference client (the server holding the quantized model and LoRA adapter)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{GenerationParams, GeneratorError, ModelDescriptor, RawCompletion, TextGenerator, Token};

/// Default connect timeout towards the generation server
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Normalize the base URL by stripping trailing slashes
fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Check if a URL points to a local address (localhost, 127.0.0.1, [::1])
fn is_local_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.host() {
            Some(url::Host::Domain(d)) => d == "localhost",
            Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
            Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
            None => true,
        },
        Err(_) => true,
    }
}

/// Id given to the token that carries the echoed prompt. It is not a
/// vocabulary id, so it can never collide with the end-of-sequence id.
pub const PROMPT_TOKEN_ID: u32 = u32::MAX;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters<'a>,
}

#[derive(Serialize)]
struct GenerateParameters<'a> {
    max_new_tokens: u32,
    do_sample: bool,
    temperature: f32,
    /// The server rejects top_p >= 1.0, which means "disabled" anyway
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    top_k: u32,
    details: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    adapter_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    details: Option<GenerateDetails>,
}

#[derive(Deserialize)]
struct GenerateDetails {
    finish_reason: String,
    #[serde(default)]
    tokens: Vec<Token>,
}

#[derive(Deserialize)]
struct InfoResponse {
    model_id: String,
}

/// Client for a text-generation-inference server
pub struct TgiClient {
    base_url: String,
    adapter_id: Option<String>,
    client: Client,
}

impl TgiClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, GeneratorError> {
        let normalized = normalize_base_url(base_url);

        if !is_local_url(&normalized) {
            warn!(
                "Generation server '{}' is not local; prompts will leave this host",
                normalized
            );
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: normalized,
            adapter_id: None,
            client,
        })
    }

    /// Route generations through a LoRA adapter registered on the server
    pub fn with_adapter(mut self, adapter_id: Option<String>) -> Self {
        self.adapter_id = adapter_id;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn adapter_id(&self) -> Option<&str> {
        self.adapter_id.as_deref()
    }

    fn build_request<'a>(&'a self, prompt: &'a str, params: &GenerationParams) -> GenerateRequest<'a> {
        GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens: params.max_new_tokens,
                do_sample: true,
                temperature: params.temperature,
                top_p: (params.top_p < 1.0).then_some(params.top_p),
                top_k: params.top_k,
                details: true,
                adapter_id: self.adapter_id.as_deref(),
            },
        }
    }

    /// The server's per-token prefill text loses sentencepiece word
    /// boundaries (`▁回答` comes back as `回答`), so the echoed half is the
    /// prompt exactly as sent, followed by the generated tokens.
    fn parse_generate_response(prompt: &str, body: &str) -> Result<RawCompletion, GeneratorError> {
        let response: GenerateResponse = serde_json::from_str(body)
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

        let details = response.details.ok_or_else(|| {
            GeneratorError::InvalidResponse("missing token details".to_string())
        })?;

        let mut tokens = Vec::with_capacity(details.tokens.len() + 1);
        tokens.push(Token {
            id: PROMPT_TOKEN_ID,
            text: prompt.to_string(),
        });
        tokens.extend(details.tokens);

        Ok(RawCompletion {
            tokens,
            finish_reason: Some(details.finish_reason),
        })
    }

    async fn read_body(response: reqwest::Response) -> Result<String, GeneratorError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl TextGenerator for TgiClient {
    fn name(&self) -> &'static str {
        "text-generation-inference"
    }

    async fn health(&self) -> Result<ModelDescriptor, GeneratorError> {
        let response = self
            .client
            .get(format!("{}/info", self.base_url))
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        let info: InfoResponse = serde_json::from_str(&body)
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

        Ok(ModelDescriptor { model_id: info.model_id })
    }

    #[instrument(skip(self, prompt), fields(adapter = ?self.adapter_id, prompt_len = prompt.len()))]
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<RawCompletion, GeneratorError> {
        let request = self.build_request(prompt, params);

        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .json(&request)
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        let completion = Self::parse_generate_response(prompt, &body)?;
        debug!(
            tokens = completion.tokens.len(),
            finish_reason = ?completion.finish_reason,
            "Generation finished"
        );
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{ANSWER_LABEL, DecodeFailure, decode, encode};

    const EOS: u32 = 3;

    fn client() -> TgiClient {
        TgiClient::new("http://localhost:8080", Duration::from_secs(5)).unwrap()
    }

    /// Shaped like a real response: the prefill is split the way rinna's
    /// tokenizer splits the prompt and has lost the word-initial spaces.
    const RESPONSE: &str = r####"{
        "generated_text": "こんにちは<NL>",
        "details": {
            "finish_reason": "eos_token",
            "generated_tokens": 3,
            "seed": null,
            "prefill": [
                {"id": 7, "text": "###", "logprob": null},
                {"id": 8, "text": "回答", "logprob": null},
                {"id": 9, "text": ":", "logprob": null},
                {"id": 10, "text": "<NL>", "logprob": null},
                {"id": 3, "text": "</s>", "logprob": null}
            ],
            "tokens": [
                {"id": 21, "text": "こんにちは", "logprob": -0.2, "special": false},
                {"id": 22, "text": "<NL>", "logprob": -0.1, "special": false},
                {"id": 3, "text": "</s>", "logprob": -0.01, "special": true}
            ]
        }
    }"####;

    #[test]
    fn test_url_normalization() {
        let client = TgiClient::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");

        let client = TgiClient::new("http://localhost:8080", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_is_local_url() {
        assert!(is_local_url("http://localhost:8080"));
        assert!(is_local_url("http://127.0.0.1:8080"));
        assert!(is_local_url("http://[::1]:8080"));
        assert!(!is_local_url("http://10.0.0.5:8080"));
        assert!(!is_local_url("https://tgi.example.com"));
    }

    #[test]
    fn test_adapter_is_optional() {
        assert_eq!(client().adapter_id(), None);
        let client = client().with_adapter(Some("lora-rinna-3.6b-optimized".into()));
        assert_eq!(client.adapter_id(), Some("lora-rinna-3.6b-optimized"));
    }

    #[test]
    fn test_request_body_shape() {
        let client = client().with_adapter(Some("lora".into()));
        let params = GenerationParams::default();
        let body = serde_json::to_value(client.build_request("### 指示:<NL>", &params)).unwrap();

        assert_eq!(body["inputs"], "### 指示:<NL>");
        let parameters = &body["parameters"];
        assert_eq!(parameters["max_new_tokens"], 256);
        assert_eq!(parameters["do_sample"], true);
        assert_eq!(parameters["top_k"], 40);
        assert_eq!(parameters["details"], true);
        assert_eq!(parameters["adapter_id"], "lora");
        assert!((parameters["top_p"].as_f64().unwrap() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_request_omits_disabled_fields() {
        let params = GenerationParams { top_p: 1.0, ..GenerationParams::default() };
        let body = serde_json::to_value(client().build_request("x", &params)).unwrap();
        assert!(body["parameters"].get("top_p").is_none());
        assert!(body["parameters"].get("adapter_id").is_none());
    }

    #[test]
    fn test_prompt_is_echoed_as_sent() {
        let prompt = encode("日本語で挨拶してください", None);
        let completion = TgiClient::parse_generate_response(&prompt, RESPONSE).unwrap();

        assert_eq!(completion.tokens[0].text, prompt);
        assert_eq!(completion.tokens[0].id, PROMPT_TOKEN_ID);
        let ids: Vec<u32> = completion.tokens[1..].iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![21, 22, EOS]);
        assert_eq!(completion.finish_reason.as_deref(), Some("eos_token"));
    }

    #[test]
    fn test_split_prefill_still_decodes() {
        let prompt = encode("日本語で挨拶してください", None);
        let completion = TgiClient::parse_generate_response(&prompt, RESPONSE).unwrap();

        assert_eq!(
            decode(&completion.tokens, EOS, ANSWER_LABEL),
            Ok("こんにちは".to_string())
        );
    }

    #[test]
    fn test_truncated_generation_is_incomplete() {
        let body = r####"{"details": {"finish_reason": "length", "tokens": [
            {"id": 21, "text": "こんにちは", "logprob": -0.2, "special": false}
        ]}}"####;
        let prompt = encode("長い話をして", None);
        let completion = TgiClient::parse_generate_response(&prompt, body).unwrap();

        assert_eq!(
            decode(&completion.tokens, EOS, ANSWER_LABEL),
            Err(DecodeFailure::Incomplete)
        );
    }

    #[test]
    fn test_parse_response_without_details() {
        let err = TgiClient::parse_generate_response("x", r#"{"generated_text": "x"}"#).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_response_invalid_json() {
        let err = TgiClient::parse_generate_response("x", "not json").unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_health_connection_refused() {
        let client = TgiClient::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let result = client.health().await;
        assert!(matches!(result, Err(GeneratorError::Http(_))));
    }
}
