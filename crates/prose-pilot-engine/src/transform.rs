//! Transformation request/response boundary.
//!
//! A transformation sends the selected text plus surrounding article context
//! to an external service and gets replacement text back. The engine only
//! knows the [`TransformService`] trait; the HTTP implementation lives in
//! the client crate, and tests substitute mocks.

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Upper bound on the article excerpt attached to a request, in chars.
/// Long documents are truncated, never sent in full.
pub const CONTEXT_EXCERPT_CHARS: usize = 3000;

/// Article-level context sent alongside the selected text so the service
/// can disambiguate tone and subject matter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleContext {
    pub title: String,
    pub subtitle: String,
    pub category: String,
    /// Bounded plain-text excerpt of the full document.
    pub full_content_excerpt: String,
}

impl ArticleContext {
    pub fn new(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        category: impl Into<String>,
        doc: &Document,
        excerpt_chars: usize,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            category: category.into(),
            full_content_excerpt: truncate_chars(&doc.text(), excerpt_chars),
        }
    }
}

/// One transformation request. Stateless: constructed fresh per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    pub instruction: String,
    pub selected_text: String,
    pub article_context: ArticleContext,
}

/// Failures of a transformation invocation. All are terminal for that
/// invocation; there is no automatic retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// The service returned nothing usable; treated as a no-op.
    #[error("the service returned an empty result")]
    EmptyResult,
    /// Network or service failure, including responses the host rejected.
    #[error("transformation service error: {0}")]
    Service(String),
    /// No service endpoint or credentials are configured.
    #[error("the transformation service is not configured")]
    NotConfigured,
}

/// The request/response seam to the external transformation service.
///
/// Implementations must not mutate shared state: this is a pure boundary.
#[async_trait::async_trait]
pub trait TransformService: Send + Sync {
    async fn transform(&self, request: &TransformRequest) -> Result<String, TransformError>;
}

/// Truncate `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
