use regex::Regex;
use thiserror::Error;
use std::{fmt, str::FromStr};
use std::ops::Neg;
use lazy_static::lazy_static;
use super::pitch::Pitch;

lazy_static! {
    static ref INTERVAL_RE: Regex = Regex::new(r"^(-?)([PMmAd])(\d+)$").unwrap();
}

/// Semitones of the major/perfect interval for each simple step count.
const MAJOR_OR_PERFECT: [isize; 7] = [0, 2, 4, 5, 7, 9, 11];

fn is_perfect_step(steps: isize) -> bool {
    matches!(steps.rem_euclid(7), 0 | 3 | 4)
}

/// A spelled interval: diatonic steps (0 = unison, 4 = fifth)
/// and the semitones they span. Both are negative for
/// descending intervals.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Interval {
    pub steps: isize,
    pub semitones: isize,
}

impl Interval {
    pub fn new(steps: isize, semitones: isize) -> Interval {
        Interval { steps, semitones }
    }

    /// The interval from `a` up (or down) to `b`.
    pub fn between(a: &Pitch, b: &Pitch) -> Interval {
        Interval {
            steps: b.diatonic_index() - a.diatonic_index(),
            semitones: b.midi() - a.midi(),
        }
    }

    /// Fifths of any octave displacement, e.g. P5 or P12.
    pub fn is_perfect_fifth(&self) -> bool {
        self.steps.abs() % 7 == 4 && self.semitones.abs() % 12 == 7
    }

    /// Unisons and octaves of any displacement.
    pub fn is_perfect_octave(&self) -> bool {
        self.steps.abs() % 7 == 0 && self.semitones.abs() % 12 == 0
    }

    fn major_or_perfect(&self) -> isize {
        let steps = self.steps.abs();
        MAJOR_OR_PERFECT[(steps % 7) as usize] + (steps / 7) * 12
    }
}

impl Neg for Interval {
    type Output = Self;

    fn neg(self) -> Self {
        Interval {
            steps: -self.steps,
            semitones: -self.semitones,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.steps < 0 || (self.steps == 0 && self.semitones < 0) { "-" } else { "" };
        let diff = self.semitones.abs() - self.major_or_perfect();
        let quality = if is_perfect_step(self.steps) {
            match diff {
                0 => "P".to_string(),
                d if d > 0 => "A".repeat(d as usize),
                d => "d".repeat(d.unsigned_abs()),
            }
        } else {
            match diff {
                0 => "M".to_string(),
                -1 => "m".to_string(),
                d if d > 0 => "A".repeat(d as usize),
                d => "d".repeat((d.abs() - 1) as usize),
            }
        };
        write!(f, "{}{}{}", sign, quality, self.steps.abs() + 1)
    }
}

#[derive(Error, Debug)]
pub enum IntervalParseError {
    #[error("Invalid interval `{0}`")]
    InvalidInterval(String),

    #[error("Couldn't parse interval number")]
    ParseIntError(#[from] std::num::ParseIntError),
}

impl FromStr for Interval {
    type Err = IntervalParseError;

    /// Parses an interval, e.g. "M3", "m3", "P5", "A6", "-d5"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = INTERVAL_RE.captures(s).ok_or(IntervalParseError::InvalidInterval(s.to_string()))?;
        let number = caps[3].parse::<isize>()?;
        if number < 1 {
            return Err(IntervalParseError::InvalidInterval(s.to_string()));
        }
        let steps = number - 1;
        let base = Interval { steps, semitones: 0 }.major_or_perfect();
        let semitones = match (&caps[2], is_perfect_step(steps)) {
            ("P", true) => base,
            ("M", false) => base,
            ("m", false) => base - 1,
            ("A", _) => base + 1,
            ("d", true) => base - 1,
            ("d", false) => base - 2,
            _ => return Err(IntervalParseError::InvalidInterval(s.to_string())),
        };
        let intv = Interval { steps, semitones };
        if &caps[1] == "-" {
            Ok(-intv)
        } else {
            Ok(intv)
        }
    }
}

impl TryFrom<&str> for Interval {
    type Error = IntervalParseError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Ok(Self::from_str(s)?)
    }
}
