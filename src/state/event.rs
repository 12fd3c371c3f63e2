use super::model::ToolState;
use crate::editor::tools::ToolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEvent {
    Activate(ToolKind),
    Commit,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: ToolState,
    pub event: ToolEvent,
    pub to: ToolState,
}

impl StateTransition {
    pub const fn new(from: ToolState, event: ToolEvent, to: ToolState) -> Self {
        Self { from, event, to }
    }
}
