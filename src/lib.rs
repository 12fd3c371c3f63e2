pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod logging;
pub mod render;
pub mod source;
pub mod state;
pub mod storage;

pub use editor::{EditorError, EditorResult, EditorSession, ImageCaption, SavedImage};
pub use error::{AppError, AppResult};
