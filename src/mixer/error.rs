// Error taxonomy shared by every stage of a mixing request.
use super::*;
use serde::ser::SerializeStruct;

pub type Result<T, E = MixerError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    /// A path could not be read, written or created.
    #[error("{context}: {source}")]
    Filesystem {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("None of the selected folders contain a supported video file.")]
    NoEligibleMedia,
    /// The external concatenation job failed; `message` carries FFmpeg's diagnostics.
    #[error("Mixing job failed: {message}")]
    MixingJob { message: String },
    #[error("{tool} was not found. Install it or configure its path in settings.")]
    ToolNotFound { tool: String },
    #[error("Invalid settings: {message}")]
    Settings { message: String },
}

impl MixerError {
    pub fn filesystem(context: impl Into<String>, source: io::Error) -> Self {
        Self::Filesystem {
            context: context.into(),
            source,
        }
    }

    pub fn mixing_job(message: impl Into<String>) -> Self {
        Self::MixingJob {
            message: message.into(),
        }
    }

    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    /// Stable machine-readable name used by frontends to branch on the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Filesystem { .. } => "filesystem",
            Self::NoEligibleMedia => "noEligibleMedia",
            Self::MixingJob { .. } => "mixingJob",
            Self::ToolNotFound { .. } => "toolNotFound",
            Self::Settings { .. } => "settings",
        }
    }
}

impl Serialize for MixerError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("MixerError", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
