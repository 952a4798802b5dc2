//! Inline assist orchestrator.
//!
//! [`InlineAssist`] wires the selection tracker, the toolbar state machine,
//! and the transformation service into the editor's invoke flow:
//!
//! 1. selection-change events open and position the toolbar;
//! 2. invoking an action captures an immutable [`SelectionSnapshot`] and
//!    builds the [`TransformRequest`] (`begin_*`);
//! 3. the async result is delivered back into the machine as an event
//!    ([`InlineAssist::complete`]), which replaces the **snapshot's** range
//!    atomically — never the live selection, which is not trustworthy after
//!    the await.
//!
//! The model is single-threaded and cooperative: at most one snapshot is
//! live, `begin_*` refuses while a request is in flight, and selection
//! events during `Transforming` are ignored, so the snapshot used for apply
//! is always the one captured at invocation time.
//!
//! Closing the toolbar does not abort the network call; it invalidates the
//! pending request id, so a result arriving afterwards is discarded without
//! touching the document. A result whose snapshot no longer matches the
//! document (it was edited by another path in the meantime) is rejected,
//! never clamped to nearby offsets.

use tracing::{debug, warn};

use crate::document::{Document, Edit, Patch};
use crate::selection::{self, MIN_SELECTION_CHARS, SelectionUpdate};
use crate::toolbar::{ToolbarMode, ToolbarState, preset_action};
use crate::transform::{
    ArticleContext, CONTEXT_EXCERPT_CHARS, TransformError, TransformRequest, TransformService,
};

/// Identifies one transformation invocation; results carrying a stale id
/// are discarded.
pub type RequestId = u64;

/// Post metadata the host provides for the article context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleMeta {
    pub title: String,
    pub subtitle: String,
    pub category: String,
}

/// Tunables, normally fed from the config crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssistOptions {
    pub min_selection_chars: usize,
    pub context_excerpt_chars: usize,
}

impl Default for AssistOptions {
    fn default() -> Self {
        Self {
            min_selection_chars: MIN_SELECTION_CHARS,
            context_excerpt_chars: CONTEXT_EXCERPT_CHARS,
        }
    }
}

/// Immutable copy of the selection at action-invocation time. Owned by the
/// pending transformation; it does not track later document mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub text: String,
    pub from: usize,
    pub to: usize,
    /// Document version at capture time, used to re-validate before apply.
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TrackedSelection {
    text: String,
    from: usize,
    to: usize,
}

/// Handle returned by `begin_*`: the request to send, plus the id to hand
/// back to [`InlineAssist::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransform {
    pub id: RequestId,
    pub request: TransformRequest,
}

/// Rejections raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BeginError {
    #[error("select text first")]
    NoSelection,
    #[error("instruction must not be empty")]
    EmptyInstruction,
    #[error("a transformation is already in flight")]
    Busy,
    #[error("unknown action `{0}`")]
    UnknownAction(String),
}

/// Why a completed transformation was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Service,
    NotConfigured,
    /// The document was edited while the request was in flight and the
    /// snapshot no longer matches it.
    StaleSelection,
}

/// Result of delivering a transformation outcome into the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The replacement was applied as one atomic edit; the patch doubles as
    /// the host's document-changed notification.
    Applied(Patch),
    /// The service returned nothing usable; the document is unchanged and
    /// the toolbar closed silently.
    Empty,
    /// The result belonged to a request that was superseded or closed.
    Discarded,
    /// A user-visible failure; the document is completely unmodified.
    Failed { kind: FailureKind, message: String },
}

/// How the user invoked the transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// A preset action id from the toolbar menu.
    Preset(String),
    /// A free-form instruction from the custom prompt.
    Custom(String),
}

/// The engine-owned state for one editor: toolbar, tracked selection, and
/// the pending snapshot. The document itself stays owned by the host and is
/// only borrowed for reads (`begin_*`) or for the single atomic apply
/// (`complete`).
#[derive(Debug)]
pub struct InlineAssist {
    toolbar: ToolbarState,
    selection: Option<TrackedSelection>,
    pending: Option<(RequestId, SelectionSnapshot)>,
    next_request_id: RequestId,
    article: ArticleMeta,
    options: AssistOptions,
}

impl InlineAssist {
    pub fn new(article: ArticleMeta) -> Self {
        Self::with_options(article, AssistOptions::default())
    }

    pub fn with_options(article: ArticleMeta, options: AssistOptions) -> Self {
        Self {
            toolbar: ToolbarState::new(),
            selection: None,
            pending: None,
            next_request_id: 1,
            article,
            options,
        }
    }

    pub fn toolbar(&self) -> &ToolbarState {
        &self.toolbar
    }

    pub fn is_transforming(&self) -> bool {
        self.toolbar.is_transforming()
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    /// Handle a selection-change event from the document view.
    ///
    /// Events are ignored while the user is interacting with the toolbar or
    /// a request is in flight: selection changes caused by programmatic
    /// focus restoration must not reopen or reposition the toolbar.
    pub fn on_selection_change(&mut self, doc: &Document, update: SelectionUpdate) {
        if self.toolbar.interacting() || self.toolbar.is_transforming() {
            debug!("selection change ignored (interacting or in flight)");
            return;
        }
        let range = update.range();
        let text = doc.text_in(range.as_range());
        if !selection::qualifies(&text, self.options.min_selection_chars) {
            if self.toolbar.mode() != ToolbarMode::CustomPrompt {
                self.toolbar.hide();
                self.selection = None;
            }
            return;
        }
        self.selection = Some(TrackedSelection {
            text,
            from: range.from,
            to: range.to,
        });
        self.toolbar.show_menu(selection::anchor_point(&update));
    }

    /// Pointer or keyboard focus entered/left the toolbar.
    pub fn set_interacting(&mut self, interacting: bool) {
        self.toolbar.set_interacting(interacting);
    }

    /// Switch the menu to the free-form instruction input.
    pub fn open_custom_prompt(&mut self) -> bool {
        self.toolbar.open_custom_prompt()
    }

    /// Explicit close. If a request is in flight its id is invalidated, so
    /// the eventual result is discarded rather than applied.
    pub fn close(&mut self) {
        if let Some((id, _)) = self.pending.take() {
            warn!(id, "toolbar closed with a request in flight; its result will be discarded");
        }
        self.toolbar.hide();
        self.selection = None;
    }

    /// Invoke a preset action from the menu.
    pub fn begin_preset(
        &mut self,
        doc: &Document,
        action_id: &str,
    ) -> Result<PendingTransform, BeginError> {
        let action = preset_action(action_id)
            .ok_or_else(|| BeginError::UnknownAction(action_id.to_string()))?;
        self.begin(doc, action.instruction.to_string())
    }

    /// Submit a free-form instruction from the custom prompt.
    pub fn begin_custom(
        &mut self,
        doc: &Document,
        instruction: &str,
    ) -> Result<PendingTransform, BeginError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(BeginError::EmptyInstruction);
        }
        self.begin(doc, instruction.to_string())
    }

    fn begin(
        &mut self,
        doc: &Document,
        instruction: String,
    ) -> Result<PendingTransform, BeginError> {
        if self.toolbar.is_transforming() {
            return Err(BeginError::Busy);
        }
        let selection = self
            .selection
            .as_ref()
            .filter(|s| !s.text.trim().is_empty())
            .ok_or(BeginError::NoSelection)?;

        let snapshot = SelectionSnapshot {
            text: selection.text.clone(),
            from: selection.from,
            to: selection.to,
            version: doc.version(),
        };
        let request = TransformRequest {
            instruction,
            selected_text: snapshot.text.clone(),
            article_context: ArticleContext::new(
                self.article.title.clone(),
                self.article.subtitle.clone(),
                self.article.category.clone(),
                doc,
                self.options.context_excerpt_chars,
            ),
        };

        if !self.toolbar.begin_transforming() {
            // The toolbar was never opened for this selection.
            return Err(BeginError::NoSelection);
        }

        let id = self.next_request_id;
        self.next_request_id += 1;
        self.pending = Some((id, snapshot));
        debug!(id, "transformation started");
        Ok(PendingTransform { id, request })
    }

    /// Deliver the service's result back into the machine.
    ///
    /// On success this performs the atomic delete-and-insert against the
    /// snapshot's offsets as one undoable edit, re-focuses the document at
    /// the end of the inserted text, and hides the toolbar. On any failure
    /// the document is left completely unmodified.
    pub fn complete(
        &mut self,
        doc: &mut Document,
        id: RequestId,
        result: Result<String, TransformError>,
    ) -> Outcome {
        let (_, snapshot) = match self.pending.take() {
            Some(pending) if pending.0 == id => pending,
            other => {
                self.pending = other;
                warn!(id, "discarding result for a superseded request");
                return Outcome::Discarded;
            }
        };

        self.selection = None;
        self.toolbar.hide();

        let text = match result {
            Ok(text) => text,
            Err(TransformError::EmptyResult) => return Outcome::Empty,
            Err(err) => {
                let kind = match err {
                    TransformError::NotConfigured => FailureKind::NotConfigured,
                    _ => FailureKind::Service,
                };
                warn!(error = %err, "transformation failed");
                return Outcome::Failed {
                    kind,
                    message: err.to_string(),
                };
            }
        };
        if text.trim().is_empty() {
            debug!(id, "empty result; nothing applied");
            return Outcome::Empty;
        }

        if !snapshot_still_valid(doc, &snapshot) {
            warn!(id, "document changed under the snapshot; result not applied");
            return Outcome::Failed {
                kind: FailureKind::StaleSelection,
                message: "the text changed while the transformation was running".to_string(),
            };
        }

        let inserted_chars = text.chars().count();
        let patch = doc.apply(Edit::ReplaceRange {
            range: snapshot.from..snapshot.to,
            text,
        });
        // Re-focus at the end of the inserted text.
        let caret = snapshot.from + inserted_chars;
        doc.set_selection(caret..caret);
        debug!(id, version = patch.version, "transformation applied");
        Outcome::Applied(patch)
    }

    /// Convenience driver: begin, await the service, deliver the result.
    pub async fn transform<S>(
        &mut self,
        doc: &mut Document,
        service: &S,
        invocation: Invocation,
    ) -> Result<Outcome, BeginError>
    where
        S: TransformService + ?Sized,
    {
        let pending = match invocation {
            Invocation::Preset(action_id) => self.begin_preset(doc, &action_id)?,
            Invocation::Custom(instruction) => self.begin_custom(doc, &instruction)?,
        };
        let result = service.transform(&pending.request).await;
        Ok(self.complete(doc, pending.id, result))
    }
}

/// The snapshot may be applied when the document is unchanged since capture,
/// or when its range still holds exactly the captured text.
fn snapshot_still_valid(doc: &Document, snapshot: &SelectionSnapshot) -> bool {
    if snapshot.version == doc.version() {
        return true;
    }
    snapshot.to <= doc.len() && doc.text_in(snapshot.from..snapshot.to) == snapshot.text
}
