use thiserror::Error;
use std::collections::BTreeSet;
use crate::core::{Key, Pitch, PitchName, MAX_ACCIDENTAL};
use super::notation::{Modifier, Notation, NotationError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScaleError {
    #[error("`{pitch}` is not in {key}")]
    NotInScale { pitch: PitchName, key: Key },

    #[error("Can't apply `{modifier}` to `{pitch}`")]
    AccidentalRange { pitch: PitchName, modifier: String },

    #[error("Couldn't parse notation")]
    Notation(#[from] NotationError),
}

/// Resolves figures over a bass note into the pitch names
/// they call for, in a given key.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PitchScale {
    key: Key,
}

impl PitchScale {
    pub fn new(key: Key) -> PitchScale {
        PitchScale { key }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Scale degree (1-7) of a pitch that is a member of the scale.
    pub fn scale_degree(&self, pitch: &Pitch) -> Result<usize, ScaleError> {
        self.key.degree_of(&pitch.name)
            .ok_or(ScaleError::NotInScale { pitch: pitch.name, key: self.key })
    }

    /// Scale degree of the member sharing the pitch's letter,
    /// so chromatic basses (F# in C major) still resolve (to 4).
    pub fn pseudo_scale_degree(&self, pitch: &Pitch) -> usize {
        self.scale_degree(pitch)
            .unwrap_or_else(|_| self.key.degree_of_letter(pitch.name.letter))
    }

    /// The octave-free pitch names sounding over `bass`, bass included.
    pub fn pitch_names(&self, bass: &Pitch, notation: &Notation) -> Result<BTreeSet<PitchName>, ScaleError> {
        let bass_degree = self.pseudo_scale_degree(bass);
        let mut names = BTreeSet::new();
        names.insert(bass.name);
        for figure in notation.figures() {
            let name = match figure.modifier {
                // Octaves double the bass as written, even off the scale
                None if (figure.number - 1) % 7 == 0 => bass.name,
                None => self.key.pitch_name(bass_degree + figure.number - 1),
                Some(modifier) => modify(self.key.pitch_name(bass_degree + figure.number - 1), modifier)?,
            };
            names.insert(name);
        }
        Ok(names)
    }

    /// Parse `notation` and resolve it over `bass`.
    pub fn pitch_names_from_notation(&self, bass: &Pitch, notation: &str) -> Result<BTreeSet<PitchName>, ScaleError> {
        let notation: Notation = notation.parse()?;
        self.pitch_names(bass, &notation)
    }

    /// Every pitch spelled by the notation from the bass
    /// up to `octave_limit` octaves above it, lowest first.
    pub fn pitches_above_bass(&self, bass: &Pitch, notation: &Notation, octave_limit: usize) -> Result<Vec<Pitch>, ScaleError> {
        let names = self.pitch_names(bass, notation)?;
        Ok(pitches_between(&names, bass, octave_limit))
    }

    pub fn pitches_above_bass_from_notation(&self, bass: &Pitch, notation: &str, octave_limit: usize) -> Result<Vec<Pitch>, ScaleError> {
        let notation: Notation = notation.parse()?;
        self.pitches_above_bass(bass, &notation, octave_limit)
    }
}

pub(crate) fn pitches_between(names: &BTreeSet<PitchName>, bass: &Pitch, octave_limit: usize) -> Vec<Pitch> {
    let low = bass.midi();
    let high = low + 12 * octave_limit as isize;
    let mut pitches: Vec<Pitch> = names.iter()
        .flat_map(|name| {
            (bass.octave - 1..=bass.octave + octave_limit as isize + 1)
                .map(move |octave| Pitch::new(*name, octave))
        })
        .filter(|p| p.midi() >= low && p.midi() <= high)
        .collect();
    pitches.sort();
    pitches
}

fn modify(name: PitchName, modifier: Modifier) -> Result<PitchName, ScaleError> {
    let accidental = match modifier {
        Modifier::Natural => 0,
        Modifier::Alter(n) => name.accidental + n,
    };
    if accidental.abs() > MAX_ACCIDENTAL {
        return Err(ScaleError::AccidentalRange {
            pitch: name,
            modifier: modifier.to_string(),
        });
    }
    Ok(PitchName::new(name.letter, accidental))
}
