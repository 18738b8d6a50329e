use std::fmt;

/// A script dependency could not be injected.
///
/// `Clone` because one failed load is reported to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyLoadError {
    pub dependency: String,
    pub message: String,
}

impl DependencyLoadError {
    pub fn new(dependency: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            dependency: dependency.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DependencyLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load {}: {}", self.dependency, self.message)
    }
}

impl std::error::Error for DependencyLoadError {}

/// A call into the rendering engine threw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub operation: &'static str,
    pub message: String,
}

impl EngineError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.message)
    }
}

impl std::error::Error for EngineError {}

/// Why a build sequence ended without a rendered scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    DependencyLoad(DependencyLoadError),
    Render(EngineError),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::DependencyLoad(err) => write!(f, "{err}"),
            ViewerError::Render(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::DependencyLoad(err) => Some(err),
            ViewerError::Render(err) => Some(err),
        }
    }
}

impl From<DependencyLoadError> for ViewerError {
    fn from(err: DependencyLoadError) -> Self {
        ViewerError::DependencyLoad(err)
    }
}

impl From<EngineError> for ViewerError {
    fn from(err: EngineError) -> Self {
        ViewerError::Render(err)
    }
}

/// The proxy refused or failed a structure request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub message: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ClientError {}
