pub mod batch;
pub mod classify;
pub mod cli;
pub mod config;
pub mod model;
pub mod policy;
pub mod text;
pub mod vectorize;

#[derive(Debug)]
pub enum BrainFilterError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Fetch(String),
    InvalidModel(String),
    NotReady,
    Config(String),
}

impl BrainFilterError {
    /// True for every failure that can come out of loading a model artifact.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            BrainFilterError::Io(_)
                | BrainFilterError::Json(_)
                | BrainFilterError::Fetch(_)
                | BrainFilterError::InvalidModel(_)
        )
    }
}

impl std::fmt::Display for BrainFilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrainFilterError::Io(e) => write!(f, "io: {e}"),
            BrainFilterError::Json(e) => write!(f, "json: {e}"),
            BrainFilterError::Fetch(msg) => write!(f, "fetch: {msg}"),
            BrainFilterError::InvalidModel(msg) => write!(f, "invalid model: {msg}"),
            BrainFilterError::NotReady => write!(f, "classifier not ready: no model loaded"),
            BrainFilterError::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for BrainFilterError {}

impl From<std::io::Error> for BrainFilterError {
    fn from(e: std::io::Error) -> Self {
        BrainFilterError::Io(e)
    }
}

impl From<serde_json::Error> for BrainFilterError {
    fn from(e: serde_json::Error) -> Self {
        BrainFilterError::Json(e)
    }
}

impl From<ureq::Error> for BrainFilterError {
    fn from(e: ureq::Error) -> Self {
        BrainFilterError::Fetch(e.to_string())
    }
}
