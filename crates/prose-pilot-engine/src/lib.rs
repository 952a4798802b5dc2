pub mod assist;
pub mod document;
pub mod selection;
pub mod toolbar;
pub mod transform;

// Re-export key types for easier usage
pub use assist::{
    ArticleMeta, AssistOptions, BeginError, FailureKind, InlineAssist, Invocation, Outcome,
    PendingTransform, SelectionSnapshot,
};
pub use document::{Block, BlockKind, Document, Edit, Marks, Patch, TextRun};
pub use selection::{AnchorPoint, SelectionRange, SelectionUpdate, ViewRect};
pub use toolbar::{PRESET_ACTIONS, PresetAction, ToolbarMode, ToolbarState};
pub use transform::{ArticleContext, TransformError, TransformRequest, TransformService};
