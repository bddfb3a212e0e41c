//! Template rendering collaborator interface.
//!
//! The core never renders templates itself; a response holds a
//! borrowed engine and asks it for a body string. Implementations
//! live outside this crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("render failed: {0}")]
    Failed(String),
}

/// A template engine capable of producing a response body from a
/// template path and a JSON context.
pub trait RenderEngine: Send + Sync {
    fn render(&self, view: &str, context: &serde_json::Value) -> Result<String, RenderError>;
}
