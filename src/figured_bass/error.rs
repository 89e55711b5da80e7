use thiserror::Error;
use super::notation::NotationError;
use super::scale::ScaleError;
use super::voice::VoiceError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RealizerError {
    #[error("Invalid notation `{notation}` at step {step}")]
    InvalidNotation {
        step: usize,
        notation: String,
        #[source]
        source: NotationError,
    },

    #[error("No realization reaches step {step}")]
    NoSolution { step: usize },

    #[error("More than {limit} possibilities at step {step}")]
    SearchSpaceExceeded { step: usize, limit: usize },

    #[error("The bass line is empty")]
    EmptyBassLine,

    #[error("Couldn't resolve figures at step {step}")]
    Scale {
        step: usize,
        #[source]
        source: ScaleError,
    },

    #[error("Invalid voices")]
    Voice(#[from] VoiceError),
}
