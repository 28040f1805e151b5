use super::error::NormalizerError;
use crate::collector::DataCallback;
use crate::domain::Event;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Application-sandbox prefix of a mobile bundle, including the separator after `<name>.app`.
pub const DEFAULT_PATH_STRIP: &str =
    r"^/var/mobile/Containers/Bundle/Application/[^/]+/[^.]+\.app/?";

/// Local-file URI scheme removed ahead of the pattern.
pub const FILE_SCHEME: &str = "file://";

fn default_pattern() -> &'static Regex {
    static DEFAULT: OnceLock<Regex> = OnceLock::new();
    DEFAULT.get_or_init(|| {
        Regex::new(DEFAULT_PATH_STRIP).expect("default path strip pattern is a valid regex")
    })
}

/// Strips sandbox-specific path prefixes from culprits and frame filenames.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    pattern: Regex,
}

impl PathNormalizer {
    pub fn new() -> Self {
        Self {
            pattern: default_pattern().clone(),
        }
    }

    pub fn with_pattern(pattern: &str) -> Result<Self, NormalizerError> {
        let pattern = Regex::new(pattern).map_err(|source| NormalizerError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern })
    }

    pub fn from_regex(pattern: Regex) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Drops a leading `file://`, then the first match of the pattern.
    pub fn strip(&self, value: &str) -> String {
        let without_scheme = value.strip_prefix(FILE_SCHEME).unwrap_or(value);
        self.pattern.replace(without_scheme, "").into_owned()
    }

    /// Rewrites the culprit and the first exception's frame filenames in place.
    pub fn normalize(&self, event: &mut Event) {
        if let Some(culprit) = event.culprit.as_mut() {
            let stripped = self.strip(culprit);
            *culprit = stripped;
        }

        if event.exception.is_none() {
            return;
        }
        let Some(frames) = event.first_frames_mut() else {
            debug!("exception has no stack frames to normalize");
            return;
        };
        for frame in frames.iter_mut() {
            if let Some(filename) = frame.filename.as_mut() {
                let stripped = self.strip(filename);
                *filename = stripped;
            }
        }
    }

    /// Wraps the normalizer as a pre-send hook for [`MonitorHost::set_data_callback`](crate::collector::MonitorHost::set_data_callback).
    pub fn into_callback(self) -> DataCallback {
        Box::new(move |event: &mut Event| self.normalize(event))
    }
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
