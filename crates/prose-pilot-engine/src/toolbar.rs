//! Floating toolbar state machine.
//!
//! The toolbar is the contextual action UI anchored to the current
//! selection. It is always in exactly one of four modes, and every
//! transition goes through a method on [`ToolbarState`] so the lifecycle is
//! centralized and testable:
//!
//! ```text
//! Hidden -> Menu            qualifying selection reported
//! Menu -> CustomPrompt      user asks for a free-form instruction
//! Menu | CustomPrompt -> Transforming   action invoked (snapshot captured)
//! Transforming -> Hidden    result applied or reported
//! any -> Hidden             explicit close
//! ```
//!
//! The `interacting` guard is an explicit field on the state: it is set
//! while the user's pointer or keyboard focus is inside the toolbar and
//! suppresses the selection tracker's hide/reposition logic, so the toolbar
//! does not vanish mid-click when the host editor briefly reports a
//! collapsed selection.

use tracing::debug;

use crate::selection::AnchorPoint;

/// The toolbar's visible mode. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolbarMode {
    #[default]
    Hidden,
    /// Preset actions plus the custom-prompt entry.
    Menu,
    /// Free-text instruction input.
    CustomPrompt,
    /// Request in flight; no further action triggers until it settles.
    Transforming,
}

/// Full toolbar state: mode, screen anchor, and the interaction guard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolbarState {
    mode: ToolbarMode,
    anchor: Option<AnchorPoint>,
    interacting: bool,
}

impl ToolbarState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ToolbarMode {
        self.mode
    }

    pub fn anchor(&self) -> Option<AnchorPoint> {
        self.anchor
    }

    pub fn is_hidden(&self) -> bool {
        self.mode == ToolbarMode::Hidden
    }

    pub fn is_transforming(&self) -> bool {
        self.mode == ToolbarMode::Transforming
    }

    /// Whether the user's pointer or focus is currently inside the toolbar.
    pub fn interacting(&self) -> bool {
        self.interacting
    }

    /// Set or clear the interaction guard (pointer hover, prompt input
    /// focus, button mousedown).
    pub fn set_interacting(&mut self, interacting: bool) {
        self.interacting = interacting;
    }

    /// Show the menu at `anchor`, or reposition it if already visible.
    /// Ignored while a custom prompt is open or a request is in flight.
    pub fn show_menu(&mut self, anchor: AnchorPoint) {
        match self.mode {
            ToolbarMode::Hidden | ToolbarMode::Menu => {
                if self.mode == ToolbarMode::Hidden {
                    debug!("toolbar: hidden -> menu");
                }
                self.mode = ToolbarMode::Menu;
                self.anchor = Some(anchor);
            }
            ToolbarMode::CustomPrompt => {
                // A superseding selection keeps the prompt open but moves it.
                self.anchor = Some(anchor);
            }
            ToolbarMode::Transforming => {}
        }
    }

    /// Switch from the menu to the free-form instruction input.
    pub fn open_custom_prompt(&mut self) -> bool {
        if self.mode == ToolbarMode::Menu {
            debug!("toolbar: menu -> custom prompt");
            self.mode = ToolbarMode::CustomPrompt;
            true
        } else {
            false
        }
    }

    /// Lock the toolbar for an in-flight request. Only valid from `Menu` or
    /// `CustomPrompt`; returns whether the transition happened.
    pub fn begin_transforming(&mut self) -> bool {
        match self.mode {
            ToolbarMode::Menu | ToolbarMode::CustomPrompt => {
                debug!("toolbar: -> transforming");
                self.mode = ToolbarMode::Transforming;
                true
            }
            _ => false,
        }
    }

    /// Hide the toolbar and clear the anchor and interaction guard.
    /// Idempotent: hiding an already-hidden toolbar is a no-op.
    pub fn hide(&mut self) {
        if self.mode != ToolbarMode::Hidden {
            debug!(from = ?self.mode, "toolbar: -> hidden");
        }
        self.mode = ToolbarMode::Hidden;
        self.anchor = None;
        self.interacting = false;
    }
}

/// A preset transformation action offered in the toolbar menu. The presets
/// are a data table, not distinct code paths: invoking one just substitutes
/// its instruction text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetAction {
    pub id: &'static str,
    pub label: &'static str,
    pub instruction: &'static str,
}

/// The actions shown in the toolbar menu, in display order.
pub const PRESET_ACTIONS: &[PresetAction] = &[
    PresetAction {
        id: "improve",
        label: "Improve writing",
        instruction: "Improve the writing of this text while keeping its meaning.",
    },
    PresetAction {
        id: "shorten",
        label: "Make shorter",
        instruction: "Rewrite this text to be more concise without losing key information.",
    },
    PresetAction {
        id: "expand",
        label: "Make longer",
        instruction: "Expand this text with more detail while keeping the same tone.",
    },
    PresetAction {
        id: "fix",
        label: "Fix grammar",
        instruction: "Fix any spelling and grammar mistakes in this text.",
    },
];

/// Look up a preset action by id.
pub fn preset_action(id: &str) -> Option<&'static PresetAction> {
    PRESET_ACTIONS.iter().find(|a| a.id == id)
}
