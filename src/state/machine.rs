use super::error::{StateError, StateResult};
use super::{StateTransition, ToolEvent, ToolState};

#[derive(Debug)]
pub struct StateMachine {
    state: ToolState,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: ToolState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn can_transition(&self, event: ToolEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: ToolEvent) -> Option<ToolState> {
        match (self.state, event) {
            (_, ToolEvent::Activate(tool)) => Some(ToolState::for_tool(tool)),
            (ToolState::Cropping | ToolState::Resizing, ToolEvent::Commit) => Some(ToolState::None),
            (ToolState::None, ToolEvent::Cancel) => None,
            (_, ToolEvent::Cancel) => Some(ToolState::None),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: ToolEvent) -> StateResult<ToolState> {
        tracing::debug!(from = ?self.state, event = ?event, "request tool transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid tool transition requested");
            StateError::InvalidTransition { from, event }
        })?;

        let record = StateTransition::new(self.state, event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
