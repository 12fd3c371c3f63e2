use super::event::ToolEvent;
use super::model::ToolState;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid tool transition: from {from:?} using event {event:?}")]
    InvalidTransition { from: ToolState, event: ToolEvent },
}
