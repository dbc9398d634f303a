use thiserror::Error;

/// Errors raised while building a tree or starting an instance.
///
/// Runtime failures are reported as [`crate::UpdateResult::Failed`], never as errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BehaviorError {
    #[error("behavior has no tree assigned")]
    EmptyTree,

    #[error("node '{node}' is not a compound node but declares {children} children")]
    LeafWithChildren { node: String, children: usize },

    #[error("blackboard of type '{actual}' is not assignable to '{expected}'")]
    BlackboardTypeMismatch { expected: String, actual: String },

    #[error("behavior is not running")]
    NotStarted,

    #[error("maximum call depth of {limit} exceeded")]
    CallDepthExceeded { limit: usize },
}

pub type Result<T> = std::result::Result<T, BehaviorError>;
