//! HTTP implementation of the engine's [`TransformService`] trait.
//!
//! Speaks a small JSON protocol: POST the instruction, the selected text
//! and the article context; get `{ "result": "..." }` back on success or
//! `{ "error": "..." }` on failure.

use std::time::Duration;

use prose_pilot_config::Config;
use prose_pilot_engine::{TransformError, TransformRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed editorial ground rules sent with every request, ahead of the
/// per-invocation instruction.
const STYLE_RULES: &str = "You are an editorial writing assistant for a blog post editor. \
Rewrite only the selected text. Preserve the author's voice, tense and point of view. \
Keep the original language of the selection. \
Return only the rewritten text with no quotes, preamble or explanation.";

/// Transformation service reached over HTTP.
pub struct HttpTransformService {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: Option<String>,
}

/// Body as it goes over the wire. The instruction here is the fully
/// composed system + user instruction, not the raw user text.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    instruction: &'a str,
    selected_text: &'a str,
    article_context: &'a prose_pilot_engine::ArticleContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct WireResponse {
    result: Option<String>,
    error: Option<String>,
}

impl HttpTransformService {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: Option<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model,
        }
    }

    /// Build a service from the loaded config. A missing endpoint or API
    /// key means the user never set the service up.
    pub fn from_config(config: &Config) -> Result<Self, TransformError> {
        let endpoint = config
            .service
            .endpoint
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(TransformError::NotConfigured)?;
        let api_key = config
            .service
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(TransformError::NotConfigured)?;
        Ok(Self::new(endpoint, api_key, config.service.model.clone()))
    }

    /// Compose the full instruction sent to the service: fixed style rules,
    /// then the article framing, then what the user actually asked for.
    fn compose_instruction(request: &TransformRequest) -> String {
        let context = &request.article_context;
        let mut parts = vec![STYLE_RULES.to_string()];
        if !context.title.is_empty() {
            parts.push(format!("The article is titled \"{}\".", context.title));
        }
        if !context.subtitle.is_empty() {
            parts.push(format!("Its subtitle is \"{}\".", context.subtitle));
        }
        if !context.category.is_empty() {
            parts.push(format!("It is filed under \"{}\".", context.category));
        }
        parts.push(format!("Task: {}", request.instruction));
        parts.join(" ")
    }

    fn wire_body<'a>(&'a self, request: &'a TransformRequest, instruction: &'a str) -> WireRequest<'a> {
        WireRequest {
            instruction,
            selected_text: &request.selected_text,
            article_context: &request.article_context,
            model: self.model.as_deref(),
        }
    }
}

/// Turn an HTTP status plus response body into the transformation result.
/// Split out from the async path so the decoding rules are testable
/// without a live server.
fn decode_response(status: u16, body: &str) -> Result<String, TransformError> {
    if (200..300).contains(&status) {
        let parsed: WireResponse = serde_json::from_str(body)
            .map_err(|e| TransformError::Service(format!("malformed response: {e}")))?;
        let result = parsed.result.unwrap_or_default();
        if result.trim().is_empty() {
            return Err(TransformError::EmptyResult);
        }
        return Ok(result);
    }

    if status == 401 || status == 403 {
        return Err(TransformError::Service(format!(
            "authentication rejected by service (HTTP {status})"
        )));
    }

    let message = serde_json::from_str::<WireResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .unwrap_or_else(|| format!("service returned HTTP {status}"));
    Err(TransformError::Service(message))
}

#[async_trait::async_trait]
impl prose_pilot_engine::TransformService for HttpTransformService {
    async fn transform(&self, request: &TransformRequest) -> Result<String, TransformError> {
        let instruction = Self::compose_instruction(request);
        let body = self.wire_body(request, &instruction);

        debug!(
            endpoint = %self.endpoint,
            selected_chars = request.selected_text.chars().count(),
            "sending transformation request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransformError::Service("request timed out".to_string())
                } else {
                    TransformError::Service(format!("request failed: {e}"))
                }
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransformError::Service(format!("failed to read response: {e}")))?;

        decode_response(status, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prose_pilot_config::ServiceConfig;
    use prose_pilot_engine::ArticleContext;

    fn sample_request() -> TransformRequest {
        TransformRequest {
            instruction: "Fix grammar and spelling errors".to_string(),
            selected_text: "helo wrld".to_string(),
            article_context: ArticleContext {
                title: "Launch notes".to_string(),
                subtitle: "What shipped".to_string(),
                category: "Product".to_string(),
                full_content_excerpt: "helo wrld and more".to_string(),
            },
        }
    }

    // ============ Instruction composition tests ============

    #[test]
    fn test_composed_instruction_carries_rules_context_and_task() {
        let instruction = HttpTransformService::compose_instruction(&sample_request());

        assert!(instruction.starts_with("You are an editorial writing assistant"));
        assert!(instruction.contains("\"Launch notes\""));
        assert!(instruction.contains("\"What shipped\""));
        assert!(instruction.contains("\"Product\""));
        assert!(instruction.ends_with("Task: Fix grammar and spelling errors"));
    }

    #[test]
    fn test_composed_instruction_skips_empty_context_fields() {
        let mut request = sample_request();
        request.article_context.subtitle = String::new();
        request.article_context.category = String::new();

        let instruction = HttpTransformService::compose_instruction(&request);

        assert!(instruction.contains("\"Launch notes\""));
        assert!(!instruction.contains("subtitle"));
        assert!(!instruction.contains("filed under"));
    }

    // ============ Wire shape tests ============

    #[test]
    fn test_wire_body_is_camel_case_and_omits_unset_model() {
        let service = HttpTransformService::new("https://example.test", "sk-test", None);
        let request = sample_request();
        let body = service.wire_body(&request, "composed");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["instruction"], "composed");
        assert_eq!(json["selectedText"], "helo wrld");
        assert_eq!(json["articleContext"]["title"], "Launch notes");
        assert_eq!(
            json["articleContext"]["fullContentExcerpt"],
            "helo wrld and more"
        );
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_wire_body_includes_model_when_configured() {
        let service = HttpTransformService::new(
            "https://example.test",
            "sk-test",
            Some("editorial-small".to_string()),
        );
        let request = sample_request();
        let body = service.wire_body(&request, "composed");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "editorial-small");
    }

    // ============ Response decoding tests ============

    #[test]
    fn test_decode_success() {
        let result = decode_response(200, r#"{"result": "hello world"}"#).unwrap();
        assert_eq!(result, "hello world");
    }

    #[test]
    fn test_decode_whitespace_result_is_empty() {
        let err = decode_response(200, r#"{"result": "  \n "}"#).unwrap_err();
        assert_eq!(err, TransformError::EmptyResult);
    }

    #[test]
    fn test_decode_missing_result_is_empty() {
        let err = decode_response(200, r#"{}"#).unwrap_err();
        assert_eq!(err, TransformError::EmptyResult);
    }

    #[test]
    fn test_decode_unauthorized_maps_to_service_error() {
        let err = decode_response(401, "").unwrap_err();
        match err {
            TransformError::Service(message) => assert!(message.contains("401")),
            other => panic!("expected Service, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_server_error_uses_error_field() {
        let err = decode_response(500, r#"{"error": "model overloaded"}"#).unwrap_err();
        assert_eq!(err, TransformError::Service("model overloaded".to_string()));
    }

    #[test]
    fn test_decode_server_error_without_body_reports_status() {
        let err = decode_response(503, "").unwrap_err();
        match err {
            TransformError::Service(message) => assert!(message.contains("503")),
            other => panic!("expected Service, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_malformed_success_body_is_service_error() {
        let err = decode_response(200, "not json").unwrap_err();
        assert!(matches!(err, TransformError::Service(_)));
    }

    // ============ Configuration tests ============

    #[test]
    fn test_from_config_requires_endpoint_and_key() {
        let mut config = Config::default();
        assert!(matches!(
            HttpTransformService::from_config(&config),
            Err(TransformError::NotConfigured)
        ));

        config.service = ServiceConfig {
            endpoint: Some("https://example.test".to_string()),
            api_key: None,
            model: None,
        };
        assert!(matches!(
            HttpTransformService::from_config(&config),
            Err(TransformError::NotConfigured)
        ));

        config.service.api_key = Some("sk-test".to_string());
        assert!(HttpTransformService::from_config(&config).is_ok());
    }

    #[test]
    fn test_from_config_rejects_blank_values() {
        let config = Config {
            service: ServiceConfig {
                endpoint: Some("  ".to_string()),
                api_key: Some("sk-test".to_string()),
                model: None,
            },
            ..Config::default()
        };
        assert!(matches!(
            HttpTransformService::from_config(&config),
            Err(TransformError::NotConfigured)
        ));
    }
}
