use regex::Regex;
use thiserror::Error;
use serde::Deserialize;
use std::{cmp::Ordering, fmt, str::FromStr};
use std::ops::{Add, Sub};
use lazy_static::lazy_static;
use super::interval::Interval;

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^([A-G])([#b]*)$").unwrap();
    static ref PITCH_RE: Regex = Regex::new(r"^([A-G])([#b]*)(-?\d+)$").unwrap();
}

/// Semitones above C for each natural letter.
const NATURALS: [isize; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Largest accidental we spell, i.e. double sharp/flat.
pub const MAX_ACCIDENTAL: isize = 2;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Letter {
    C, D, E, F, G, A, B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C, Letter::D, Letter::E, Letter::F,
        Letter::G, Letter::A, Letter::B];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Letter for a diatonic step count, wrapping in both directions.
    pub fn from_index(i: isize) -> Letter {
        Letter::ALL[i.rem_euclid(7) as usize]
    }

    pub fn natural_semitones(&self) -> isize {
        NATURALS[self.index()]
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Error, Debug)]
pub enum PitchParseError {
    #[error("Invalid pitch name `{0}`")]
    InvalidName(String),

    #[error("Invalid pitch `{0}`")]
    InvalidPitch(String),

    #[error("Accidental out of range in `{0}`")]
    AccidentalRange(String),

    #[error("Couldn't parse octave")]
    ParseIntError(#[from] std::num::ParseIntError),
}

fn parse_accidental(s: &str) -> isize {
    s.matches('#').count() as isize - s.matches('b').count() as isize
}

/// An octave-free, spelled pitch name, e.g. "F#" or "Bb".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PitchName {
    pub letter: Letter,
    pub accidental: isize,
}

impl PitchName {
    pub fn new(letter: Letter, accidental: isize) -> PitchName {
        PitchName { letter, accidental }
    }

    pub fn natural(letter: Letter) -> PitchName {
        PitchName { letter, accidental: 0 }
    }

    /// Pitch class, 0 = C.
    pub fn semitone_class(&self) -> isize {
        (self.letter.natural_semitones() + self.accidental).rem_euclid(12)
    }

    /// The ascending simple interval from this name up to `other`.
    pub fn interval_to(&self, other: &PitchName) -> Interval {
        let steps = (other.letter.index() as isize - self.letter.index() as isize).rem_euclid(7);
        let semitones = (other.semitone_class() - self.semitone_class()).rem_euclid(12);
        Interval { steps, semitones }
    }
}

impl FromStr for PitchName {
    type Err = PitchParseError;

    /// Parses a pitch name, e.g. "C", "F#", "Bbb"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = NAME_RE.captures(s).ok_or(PitchParseError::InvalidName(s.to_string()))?;
        let letter = letter_from(&caps[1]).ok_or(PitchParseError::InvalidName(s.to_string()))?;
        let accidental = parse_accidental(&caps[2]);
        if accidental.abs() > MAX_ACCIDENTAL {
            return Err(PitchParseError::AccidentalRange(s.to_string()));
        }
        Ok(PitchName { letter, accidental })
    }
}

impl TryFrom<&str> for PitchName {
    type Error = PitchParseError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Ok(Self::from_str(s)?)
    }
}

impl TryFrom<String> for PitchName {
    type Error = PitchParseError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Self::from_str(&s)?)
    }
}

impl fmt::Display for PitchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.accidental.unsigned_abs();
        let symbol = if self.accidental < 0 { "b" } else { "#" };
        write!(f, "{}{}", self.letter, symbol.repeat(count))
    }
}

/// Add an interval to a pitch name, keeping the spelling correct.
impl Add<Interval> for PitchName {
    type Output = Self;

    fn add(self, intv: Interval) -> Self {
        (Pitch::new(self, 4) + intv).name
    }
}

fn letter_from(s: &str) -> Option<Letter> {
    Letter::ALL.iter().find(|l| l.to_string() == s).copied()
}

/// A spelled pitch with an octave, e.g. "C#4".
/// Octaves follow scientific pitch notation, so C4 is MIDI note 60.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Pitch {
    pub name: PitchName,
    pub octave: isize,
}

impl Pitch {
    pub fn new(name: PitchName, octave: isize) -> Pitch {
        Pitch { name, octave }
    }

    /// MIDI note number (may fall outside 0..=127 for extreme pitches).
    pub fn midi(&self) -> isize {
        (self.octave + 1) * 12 + self.name.letter.natural_semitones() + self.name.accidental
    }

    /// Number of diatonic steps above C0.
    pub fn diatonic_index(&self) -> isize {
        self.octave * 7 + self.name.letter.index() as isize
    }

    /// Signed distance in semitones from this pitch to `other`.
    pub fn semitones_to(&self, other: &Pitch) -> isize {
        other.midi() - self.midi()
    }
}

/// Pitches are ordered by sounding height; enharmonic
/// pairs (B#3/C4) are ordered by their written step.
impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.midi().cmp(&other.midi())
            .then(self.diatonic_index().cmp(&other.diatonic_index()))
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Try to parse a pitch from a string, e.g. "C3".
impl FromStr for Pitch {
    type Err = PitchParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = PITCH_RE.captures(s).ok_or(PitchParseError::InvalidPitch(s.to_string()))?;
        let name: PitchName = format!("{}{}", &caps[1], &caps[2]).parse()?;
        let octave = caps[3].parse::<isize>()?;
        Ok(Pitch { name, octave })
    }
}

impl TryFrom<&str> for Pitch {
    type Error = PitchParseError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Ok(Self::from_str(s)?)
    }
}

impl TryFrom<String> for Pitch {
    type Error = PitchParseError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Self::from_str(&s)?)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

/// Transpose by a spelled interval.
impl Add<Interval> for Pitch {
    type Output = Self;

    fn add(self, intv: Interval) -> Self {
        let diatonic = self.diatonic_index() + intv.steps;
        let letter = Letter::from_index(diatonic);
        let octave = diatonic.div_euclid(7);
        let natural = (octave + 1) * 12 + letter.natural_semitones();
        let accidental = self.midi() + intv.semitones - natural;
        Pitch {
            name: PitchName { letter, accidental },
            octave,
        }
    }
}

impl Sub<Interval> for Pitch {
    type Output = Self;

    fn sub(self, intv: Interval) -> Self {
        self + (-intv)
    }
}
