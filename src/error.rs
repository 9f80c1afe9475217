use crate::node::Key;
use thiserror::Error;

/// Raised while constructing [`Node`](`crate::Node`)s, never during rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
	#[error("Invalid element tag name: {0:?}")]
	InvalidTagName(String),
	#[error("Invalid attribute name: {0:?}")]
	InvalidAttributeName(String),
	#[error("Duplicate explicit key among siblings: {0:?}")]
	DuplicateKey(Key),
}

/// Raised while rendering, building a blueprint or patching.
///
/// Shape mismatches between a blueprint and a new tree are *not* errors; they fall back to a fresh render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
	#[error("Depth limit of {limit} reached. Is a component rendering itself?")]
	DepthLimitExceeded { limit: usize },
}
