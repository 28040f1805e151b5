use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum NormalizerError {
    #[error("Invalid path strip pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
