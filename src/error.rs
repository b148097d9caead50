use std::fmt;

/// Result type for DQN operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// The stage of the training pipeline an error surfaced from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sampling,
    ForwardPass,
    Optimization,
    Synchronization,
    Checkpoint,
    Interaction,
    Evaluation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Sampling => "sampling",
            Stage::ForwardPass => "forward pass",
            Stage::Optimization => "optimization",
            Stage::Synchronization => "target synchronization",
            Stage::Checkpoint => "checkpoint",
            Stage::Interaction => "environment interaction",
            Stage::Evaluation => "evaluation",
        };
        f.write_str(name)
    }
}

/// Main error type for the DQN training core
#[derive(Debug, Clone)]
pub enum DqnError {
    /// Mini-batch requested before the replay buffer holds enough transitions
    InsufficientData {
        requested: usize,
        available: usize,
    },

    /// Configuration value or environment shape that cannot be trained with
    InvalidConfiguration {
        name: String,
        reason: String,
    },

    /// Invalid dimensions for tensor operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Numerical failure inside the network (NaN/Inf, broken shapes)
    Backend {
        stage: Stage,
        message: String,
    },

    /// Action index outside the action space
    InvalidAction {
        action: usize,
        num_actions: usize,
    },

    /// Requested capability exists as a flag but has no implementation
    NotImplemented(String),

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// An error annotated with the stage and counters at which it happened
    Training {
        stage: Stage,
        episode: Option<usize>,
        update: usize,
        source: Box<DqnError>,
    },
}

impl fmt::Display for DqnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqnError::InsufficientData { requested, available } => {
                write!(
                    f,
                    "Insufficient data: batch of {} requested but replay buffer holds {}",
                    requested, available
                )
            }
            DqnError::InvalidConfiguration { name, reason } => {
                write!(f, "Invalid configuration '{}': {}", name, reason)
            }
            DqnError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            DqnError::Backend { stage, message } => {
                write!(f, "Backend computation failed during {}: {}", stage, message)
            }
            DqnError::InvalidAction { action, num_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, num_actions)
            }
            DqnError::NotImplemented(what) => write!(f, "Not implemented: {}", what),
            DqnError::IoError(msg) => write!(f, "IO error: {}", msg),
            DqnError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            DqnError::Training { stage, episode, update, source } => {
                match episode {
                    Some(episode) => write!(
                        f,
                        "{} failed at episode {} (update {}): {}",
                        stage, episode, update, source
                    ),
                    None => write!(f, "{} failed at update {}: {}", stage, update, source),
                }
            }
        }
    }
}

impl std::error::Error for DqnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DqnError::Training { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DqnError {
    fn from(err: std::io::Error) -> Self {
        DqnError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for DqnError {
    fn from(err: bincode::Error) -> Self {
        DqnError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for DqnError {
    fn from(err: serde_json::Error) -> Self {
        DqnError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl DqnError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DqnError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_configuration<S: Into<String>>(name: S, reason: S) -> Self {
        DqnError::InvalidConfiguration {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn backend<S: Into<String>>(stage: Stage, message: S) -> Self {
        DqnError::Backend {
            stage,
            message: message.into(),
        }
    }

    /// Wrap the error with the stage and update counter it surfaced at.
    /// An existing context is kept and only gains the episode index.
    pub fn at(self, stage: Stage, update: usize) -> Self {
        match self {
            DqnError::Training { .. } => self,
            other => DqnError::Training {
                stage,
                episode: None,
                update,
                source: Box::new(other),
            },
        }
    }

    /// Attach the episode index to a training context
    pub fn in_episode(self, index: usize) -> Self {
        match self {
            DqnError::Training { stage, update, source, .. } => DqnError::Training {
                stage,
                episode: Some(index),
                update,
                source,
            },
            other => other,
        }
    }

    /// The underlying error, with every context layer stripped
    pub fn root(&self) -> &DqnError {
        match self {
            DqnError::Training { source, .. } => source.root(),
            other => other,
        }
    }

    /// The stage recorded by the outermost context, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DqnError::Training { stage, .. } => Some(*stage),
            DqnError::Backend { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
