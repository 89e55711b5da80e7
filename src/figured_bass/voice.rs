use thiserror::Error;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use crate::core::{Letter, Pitch, PitchName};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("No pitch in range for voice `{0}`")]
    EmptyRange(String),

    #[error("Voice `{label}` has its low pitch {low} above its high pitch {high}")]
    InvertedRange { label: String, low: Pitch, high: Pitch },

    #[error("Voice label `{0}` is used twice")]
    DuplicateLabel(String),

    #[error("At least one voice is required")]
    NoVoices,
}

/// A named part with an inclusive pitch range.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Voice {
    pub label: String,
    pub low: Pitch,
    pub high: Pitch,

    /// Largest allowed move between consecutive chords, in semitones.
    #[serde(default)]
    pub max_leap: Option<usize>,
}

impl Voice {
    pub fn new(label: &str, low: Pitch, high: Pitch) -> Result<Voice, VoiceError> {
        let voice = Voice {
            label: label.to_string(),
            low,
            high,
            max_leap: None,
        };
        voice.validate()?;
        Ok(voice)
    }

    /// Limit how far this voice may move between chords.
    pub fn max_leap(mut self, semitones: usize) -> Voice {
        self.max_leap = Some(semitones);
        self
    }

    fn validate(&self) -> Result<(), VoiceError> {
        if self.low.midi() > self.high.midi() {
            return Err(VoiceError::InvertedRange {
                label: self.label.clone(),
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    pub fn contains(&self, pitch: &Pitch) -> bool {
        pitch.midi() >= self.low.midi() && pitch.midi() <= self.high.midi()
    }

    /// The candidates this voice can sing.
    pub fn pitches_in_range(&self, candidates: &[Pitch]) -> Result<Vec<Pitch>, VoiceError> {
        let pitches: Vec<Pitch> = candidates.iter()
            .filter(|p| self.contains(p))
            .copied()
            .collect();
        if pitches.is_empty() {
            Err(VoiceError::EmptyRange(self.label.clone()))
        } else {
            Ok(pitches)
        }
    }
}

/// Voices are ordered by range, lowest first, so that
/// "the voice below" never depends on declaration order.
impl Ord for Voice {
    fn cmp(&self, other: &Self) -> Ordering {
        self.low.cmp(&other.low)
            .then_with(|| self.high.cmp(&other.high))
            .then_with(|| self.label.cmp(&other.label))
            .then_with(|| self.max_leap.cmp(&other.max_leap))
    }
}

impl PartialOrd for Voice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.label, self.low, self.high)
    }
}

/// Position of a voice in its `VoiceSet`, 0 being the bass.
/// Only a `VoiceSet` hands these out.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct VoiceId(usize);

impl VoiceId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The fixed, ordered set of voices for one realization.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VoiceSet {
    voices: Vec<Voice>,
}

impl VoiceSet {
    pub fn new(mut voices: Vec<Voice>) -> Result<VoiceSet, VoiceError> {
        if voices.is_empty() {
            return Err(VoiceError::NoVoices);
        }
        let mut labels = HashSet::new();
        for voice in &voices {
            voice.validate()?;
            if !labels.insert(voice.label.as_str()) {
                return Err(VoiceError::DuplicateLabel(voice.label.clone()));
            }
        }
        voices.sort();
        Ok(VoiceSet { voices })
    }

    /// Bass, tenor, alto and soprano in their usual ranges.
    pub fn satb() -> VoiceSet {
        let pitch = |letter, octave| Pitch::new(PitchName::natural(letter), octave);
        let voice = |label: &str, low, high| Voice {
            label: label.to_string(),
            low,
            high,
            max_leap: None,
        };
        VoiceSet {
            voices: vec![
                voice("Bass", pitch(Letter::E, 2), pitch(Letter::E, 4)),
                voice("Tenor", pitch(Letter::C, 3), pitch(Letter::A, 4)),
                voice("Alto", pitch(Letter::F, 3), pitch(Letter::G, 5)),
                voice("Soprano", pitch(Letter::C, 4), pitch(Letter::A, 5)),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = VoiceId> {
        (0..self.voices.len()).map(VoiceId)
    }

    pub fn id(&self, label: &str) -> Option<VoiceId> {
        self.voices.iter().position(|v| v.label == label).map(VoiceId)
    }

    pub fn get(&self, id: VoiceId) -> &Voice {
        &self.voices[id.0]
    }

    pub fn bass(&self) -> &Voice {
        &self.voices[0]
    }

    pub fn highest(&self) -> &Voice {
        &self.voices[self.voices.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.voices.iter().map(|v| v.label.as_str()).collect()
    }
}

impl Default for VoiceSet {
    fn default() -> Self {
        VoiceSet::satb()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn voice(label: &str, low: &str, high: &str) -> Voice {
        Voice::new(label, low.try_into().unwrap(), high.try_into().unwrap()).unwrap()
    }

    #[test]
    fn test_pitches_in_range() {
        let tenor = voice("Tenor", "C3", "A4");
        let candidates: Vec<Pitch> = ["G2", "C3", "E3", "A4", "C5"].iter()
            .map(|p| (*p).try_into().unwrap())
            .collect();
        let in_range: Vec<String> = tenor.pitches_in_range(&candidates).unwrap()
            .iter().map(|p| p.to_string()).collect();
        assert_eq!(in_range, vec!["C3", "E3", "A4"]);

        let high: Vec<Pitch> = vec!["C6".try_into().unwrap()];
        assert_eq!(tenor.pitches_in_range(&high), Err(VoiceError::EmptyRange("Tenor".to_string())));
    }

    #[test]
    fn test_voice_order() {
        let voices = VoiceSet::new(vec![
            voice("Soprano", "C4", "A5"),
            voice("Bass", "E2", "E4"),
            voice("Alto", "F3", "G5"),
            voice("Tenor", "C3", "A4"),
        ]).unwrap();
        assert_eq!(voices.labels(), vec!["Bass", "Tenor", "Alto", "Soprano"]);
        assert_eq!(voices.id("Alto").map(|id| id.index()), Some(2));
        assert_eq!(voices.id("Countertenor"), None);
        assert_eq!(voices, VoiceSet::satb());

        // Equal ranges fall back on the label
        let voices = VoiceSet::new(vec![
            voice("B", "C3", "C5"),
            voice("A", "C3", "C5"),
        ]).unwrap();
        assert_eq!(voices.labels(), vec!["A", "B"]);
    }

    #[test]
    fn test_invalid_voices() {
        assert_eq!(VoiceSet::new(vec![]), Err(VoiceError::NoVoices));

        let dup = VoiceSet::new(vec![voice("Alto", "F3", "G5"), voice("Alto", "C4", "A5")]);
        assert_eq!(dup, Err(VoiceError::DuplicateLabel("Alto".to_string())));

        let low: Pitch = "C5".try_into().unwrap();
        let high: Pitch = "C4".try_into().unwrap();
        assert!(matches!(Voice::new("Tenor", low, high), Err(VoiceError::InvertedRange { .. })));
    }

    #[test]
    fn test_max_leap() {
        let voice = voice("Soprano", "C4", "A5").max_leap(5);
        assert_eq!(voice.max_leap, Some(5));
    }
}
