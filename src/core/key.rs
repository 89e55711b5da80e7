use regex::Regex;
use thiserror::Error;
use serde::Deserialize;
use std::{fmt, str::FromStr};
use lazy_static::lazy_static;
use super::pitch::{Letter, PitchName, PitchParseError};

pub const MAJOR: [isize; 7] = [0, 2, 4, 5, 7, 9, 11];
pub const MINOR: [isize; 7] = [0, 2, 3, 5, 7, 8, 10];
pub const DORIAN: [isize; 7] = [0, 2, 3, 5, 7, 9, 10];
pub const PHRYGIAN: [isize; 7] = [0, 1, 3, 5, 7, 8, 10];
pub const LYDIAN: [isize; 7] = [0, 2, 4, 6, 7, 9, 11];
pub const MIXOLYDIAN: [isize; 7] = [0, 2, 4, 5, 7, 9, 10];
pub const LOCRIAN: [isize; 7] = [0, 1, 3, 5, 6, 8, 10];

lazy_static! {
    static ref KEY_RE: Regex = Regex::new(r"^\s*([A-G][#b]*)(?:\s+([A-Za-z]+))?\s*$").unwrap();
}

/// Minor is the natural minor; raised leading tones
/// come from the figures, as in a written continuo part.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Mode {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
}

impl Mode {
    pub fn steps(&self) -> &'static [isize; 7] {
        match self {
            Mode::Major => &MAJOR,
            Mode::Minor => &MINOR,
            Mode::Dorian => &DORIAN,
            Mode::Phrygian => &PHRYGIAN,
            Mode::Lydian => &LYDIAN,
            Mode::Mixolydian => &MIXOLYDIAN,
            Mode::Locrian => &LOCRIAN,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Major => "Major",
            Mode::Minor => "Minor",
            Mode::Dorian => "Dorian",
            Mode::Phrygian => "Phrygian",
            Mode::Lydian => "Lydian",
            Mode::Mixolydian => "Mixolydian",
            Mode::Locrian => "Locrian",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug)]
pub enum KeyParseError {
    #[error("Invalid key `{0}`")]
    InvalidKey(String),

    #[error("Invalid mode `{0}`")]
    InvalidMode(String),

    #[error("Couldn't parse tonic")]
    InvalidTonic(#[from] PitchParseError),
}

impl FromStr for Mode {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" | "ionian" => Ok(Mode::Major),
            "minor" | "aeolian" => Ok(Mode::Minor),
            "dorian" => Ok(Mode::Dorian),
            "phrygian" => Ok(Mode::Phrygian),
            "lydian" => Ok(Mode::Lydian),
            "mixolydian" => Ok(Mode::Mixolydian),
            "locrian" => Ok(Mode::Locrian),
            _ => Err(KeyParseError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Key {
    pub tonic: PitchName,
    pub mode: Mode,
}

impl Key {
    pub fn new(tonic: PitchName, mode: Mode) -> Key {
        Key { tonic, mode }
    }

    /// Compute the pitch name at the specified scale degree.
    /// Note that by convention scale degrees are 1-indexed;
    /// i.e. degree 1 is the tonic, and degrees past 7
    /// wrap around into the next octave.
    pub fn pitch_name(&self, degree: usize) -> PitchName {
        let deg = degree.saturating_sub(1) % 7;
        let letter = Letter::from_index(self.tonic.letter.index() as isize + deg as isize);
        let target = self.tonic.semitone_class() + self.mode.steps()[deg];
        let mut accidental = (target - letter.natural_semitones()).rem_euclid(12);
        if accidental > 6 {
            accidental -= 12;
        }
        PitchName::new(letter, accidental)
    }

    /// The seven scale members, tonic first.
    pub fn pitch_names(&self) -> Vec<PitchName> {
        (1..=7).map(|d| self.pitch_name(d)).collect()
    }

    /// Scale degree of a pitch name, if it is a scale member.
    pub fn degree_of(&self, name: &PitchName) -> Option<usize> {
        self.pitch_names().iter().position(|n| n == name).map(|i| i + 1)
    }

    /// Scale degree of the scale member sharing this letter.
    /// Every letter occurs exactly once in a heptatonic scale,
    /// so this always resolves, even for chromatic pitches.
    pub fn degree_of_letter(&self, letter: Letter) -> usize {
        (letter.index() as isize - self.tonic.letter.index() as isize).rem_euclid(7) as usize + 1
    }
}

impl FromStr for Key {
    type Err = KeyParseError;

    /// Parses a key, e.g. "C major", "F# minor", "D dorian".
    /// A bare tonic is read as major.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = KEY_RE.captures(s).ok_or(KeyParseError::InvalidKey(s.to_string()))?;
        let tonic: PitchName = caps[1].parse()?;
        let mode = match caps.get(2) {
            Some(m) => m.as_str().parse()?,
            None => Mode::Major,
        };
        Ok(Key { tonic, mode })
    }
}

impl TryFrom<&str> for Key {
    type Error = KeyParseError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Ok(Self::from_str(s)?)
    }
}

impl TryFrom<String> for Key {
    type Error = KeyParseError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Self::from_str(&s)?)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic, self.mode)
    }
}

impl Default for Key {
    fn default() -> Self {
        Key {
            tonic: PitchName::natural(Letter::C),
            mode: Mode::Major,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn names(key: &Key) -> Vec<String> {
        key.pitch_names().iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_pitch_names_major() {
        let key: Key = "C major".try_into().unwrap();
        assert_eq!(names(&key), vec!["C", "D", "E", "F", "G", "A", "B"]);

        let key: Key = "D major".try_into().unwrap();
        assert_eq!(names(&key), vec!["D", "E", "F#", "G", "A", "B", "C#"]);

        let key: Key = "Bb".try_into().unwrap();
        assert_eq!(key.mode, Mode::Major);
        assert_eq!(names(&key), vec!["Bb", "C", "D", "Eb", "F", "G", "A"]);
    }

    #[test]
    fn test_pitch_names_minor() {
        let key: Key = "A minor".try_into().unwrap();
        assert_eq!(names(&key), vec!["A", "B", "C", "D", "E", "F", "G"]);

        let key: Key = "C minor".try_into().unwrap();
        assert_eq!(names(&key), vec!["C", "D", "Eb", "F", "G", "Ab", "Bb"]);

        let key: Key = "F# minor".try_into().unwrap();
        assert_eq!(names(&key), vec!["F#", "G#", "A", "B", "C#", "D", "E"]);
    }

    #[test]
    fn test_church_modes() {
        let key: Key = "D dorian".try_into().unwrap();
        assert_eq!(names(&key), vec!["D", "E", "F", "G", "A", "B", "C"]);

        let key: Key = "E Phrygian".try_into().unwrap();
        assert_eq!(names(&key), vec!["E", "F", "G", "A", "B", "C", "D"]);

        assert!(Key::from_str("C bebop").is_err());
    }

    #[test]
    fn test_degrees() {
        let key: Key = "C major".try_into().unwrap();
        assert_eq!(key.pitch_name(1).to_string(), "C");
        assert_eq!(key.pitch_name(8).to_string(), "C");
        assert_eq!(key.pitch_name(9).to_string(), "D");

        let g: PitchName = "G".try_into().unwrap();
        assert_eq!(key.degree_of(&g), Some(5));

        let fs: PitchName = "F#".try_into().unwrap();
        assert_eq!(key.degree_of(&fs), None);
        assert_eq!(key.degree_of_letter(fs.letter), 4);
    }
}
