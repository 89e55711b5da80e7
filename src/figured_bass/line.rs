use serde::{de, Deserialize, Deserializer};
use std::{fmt, io::Read, str::FromStr};
use thiserror::Error;
use crate::core::{Key, Pitch, PitchParseError};
use super::error::RealizerError;
use super::realizer::Realizer;
use super::rules::RuleConfig;
use super::voice::{Voice, VoiceSet};

#[derive(Error, Debug)]
pub enum BassNoteParseError {
    #[error("Empty bass note")]
    Empty,

    #[error("Couldn't parse bass pitch")]
    Pitch(#[from] PitchParseError),
}

/// One bass note and its figures, written "D3 6,4,3".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BassNote {
    pub pitch: Pitch,
    pub notation: String,
}

impl FromStr for BassNote {
    type Err = BassNoteParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (pitch, notation) = match s.split_once(char::is_whitespace) {
            Some((pitch, notation)) => (pitch, notation.trim()),
            None => (s, ""),
        };
        if pitch.is_empty() {
            return Err(BassNoteParseError::Empty);
        }
        Ok(BassNote {
            pitch: pitch.parse()?,
            notation: notation.to_string(),
        })
    }
}

impl TryFrom<&str> for BassNote {
    type Error = BassNoteParseError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Ok(Self::from_str(s)?)
    }
}

impl fmt::Display for BassNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.notation.is_empty() {
            write!(f, "{}", self.pitch)
        } else {
            write!(f, "{} {}", self.pitch, self.notation)
        }
    }
}

/// A figured bass line to realize, as read from YAML.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RealizationRequest {
    pub key: Key,

    /// Defaults to SATB.
    #[serde(default)]
    pub voices: Option<Vec<Voice>>,

    #[serde(default)]
    pub rules: RuleConfig,

    #[serde(deserialize_with = "from_bass_line")]
    pub bass_line: Vec<BassNote>,
}

impl RealizationRequest {
    pub fn from_reader<R: Read>(reader: R) -> Result<RealizationRequest, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    pub fn realizer(&self) -> Result<Realizer, RealizerError> {
        let voices = match &self.voices {
            Some(voices) => VoiceSet::new(voices.clone())?,
            None => VoiceSet::satb(),
        };
        let mut realizer = Realizer::new(self.key, voices, self.rules.clone());
        for note in &self.bass_line {
            realizer.add_element(note.pitch, &note.notation);
        }
        Ok(realizer)
    }
}

/// Lets us write bass notes as strings in yaml,
/// e.g. "D3 6,4,3" instead of "{pitch: D3, notation: '6,4,3'}"
fn from_bass_line<'de, D>(deserializer: D) -> Result<Vec<BassNote>, D::Error>
where
    D: Deserializer<'de>,
{
    let notes: Vec<String> = Deserialize::deserialize(deserializer)?;
    notes.iter()
        .map(|s| s.parse().map_err(|err| <D::Error as de::Error>::custom(format!("`{}`: {}", s, err))))
        .collect()
}
