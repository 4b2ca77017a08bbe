use thiserror::Error;

/// Errors surfaced to the UI shell as a notification. Every variant leaves
/// the scene untouched.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Select at least 2 objects to create a group")]
    GroupNeedsTwoObjects,
    #[error("Cannot remove the last frame")]
    LastFrame,
    #[error("Frame {0} does not exist")]
    FrameOutOfRange(usize),
    #[error("Object {0} not found")]
    ObjectNotFound(u32),
    #[error("Nothing is selected")]
    NoSelection,
    #[error("Error loading project: {0}")]
    MalformedProject(#[from] serde_json::Error),
    #[error("Error loading project: {0}")]
    InvalidProject(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// JSON error payload in the shape the JS shell expects.
    pub fn to_json(&self) -> String {
        serde_json::json!({ "error": self.to_string() }).to_string()
    }
}
