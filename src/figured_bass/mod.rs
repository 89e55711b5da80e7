mod notation;
mod scale;
mod voice;
mod rules;
mod possibility;
mod resolution;
mod segment;
mod error;
mod realizer;
mod line;

pub use notation::{Figure, Modifier, Notation, NotationError};
pub use scale::{PitchScale, ScaleError};
pub use voice::{Voice, VoiceError, VoiceId, VoiceSet};
pub use rules::RuleConfig;
pub use possibility::{Possibility, VoiceLeadingQuartet};
pub use resolution::{Resolution, ResolutionKind};
pub use segment::{Movements, Segment};
pub use error::RealizerError;
pub use realizer::{Realization, Realizations, Realizer};
pub use line::{BassNote, BassNoteParseError, RealizationRequest};
