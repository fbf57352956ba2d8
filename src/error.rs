use thiserror::Error;

/// Engine errors using thiserror for structured error handling.
///
/// Every failure inside the sound engine is expressed as one of these types.
/// The fire-and-forget entry points log them and carry on; the `try_*`
/// variants hand them to the caller.

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio for sound {id}")]
    LoadFailed {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("No audio asset available for sound {0}")]
    NoAsset(String),

    #[error("Failed to decode audio format")]
    DecodeFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Decoded audio is empty")]
    EmptyClip,

    #[error("Failed to initialize audio output stream")]
    StreamInitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Audio output thread has stopped")]
    OutputClosed,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("No bearer token configured for the sound catalog")]
    MissingCredential,

    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("Sound catalog returned status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Sound catalog response is not valid JSON")]
    InvalidJson(#[source] std::io::Error),

    #[error("Sound catalog response is not an array")]
    NotAnArray,

    #[error("Sound entry {index} rejected: {reason}")]
    InvalidEntry { index: usize, reason: String },

    #[error("Sound catalog contained {rejected} entries and none were valid")]
    NoValidEntries { rejected: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the platform config directory")]
    NoConfigDir,
}

/// Why a playback request did not result in audible output.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Sound system is disabled")]
    Disabled,

    #[error("Sound catalog is not loaded")]
    CatalogNotLoaded,

    #[error("No enabled sound for trigger '{trigger}' (game type {game_type})")]
    NoCandidate { trigger: String, game_type: String },

    #[error("'{requested}' (priority {requested_priority}) blocked by '{current}' (priority {current_priority})")]
    Preempted {
        requested: String,
        requested_priority: i32,
        current: String,
        current_priority: i32,
    },

    #[error("'{0}' is already playing and cannot repeat")]
    RepeatSuppressed(String),

    #[error("'{0}' was replaced before it reached the output")]
    Superseded(String),

    #[error("Failed to render '{trigger}'")]
    Render {
        trigger: String,
        #[source]
        source: AudioError,
    },
}

impl PlaybackError {
    /// True for the arbitration outcomes that drop a request on purpose
    pub fn is_drop(&self) -> bool {
        matches!(
            self,
            PlaybackError::Preempted { .. }
                | PlaybackError::RepeatSuppressed(_)
                | PlaybackError::Superseded(_)
        )
    }
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = CatalogError::Status {
            url: "http://localhost/api/admin/sounds".to_string(),
            status: 401,
        };
        assert_eq!(
            err.to_string(),
            "Sound catalog returned status 401 from http://localhost/api/admin/sounds"
        );

        let err = PlaybackError::RepeatSuppressed("victory".to_string());
        assert_eq!(err.to_string(), "'victory' is already playing and cannot repeat");
    }

    #[test]
    fn test_error_source_chain() {
        let err = PlaybackError::Render {
            trigger: "click".to_string(),
            source: AudioError::EmptyClip,
        };
        assert!(err.source().is_some());
        assert!(!err.is_drop());
    }

    #[test]
    fn test_drop_classification() {
        let err = PlaybackError::Preempted {
            requested: "click".to_string(),
            requested_priority: 2,
            current: "victory".to_string(),
            current_priority: 9,
        };
        assert!(err.is_drop());
        assert!(PlaybackError::Superseded("click".to_string()).is_drop());
        assert!(!PlaybackError::Disabled.is_drop());
    }
}
