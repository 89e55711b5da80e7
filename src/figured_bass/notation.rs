use regex::Regex;
use thiserror::Error;
use std::{fmt, str::FromStr};
use std::collections::HashMap;
use lazy_static::lazy_static;

/// Largest figure accepted, two octaves above the bass.
const MAX_FIGURE: usize = 15;

lazy_static! {
    static ref FIGURE_RE: Regex = Regex::new(r"^([#b+\-n]*)(\d*)([#b+\-n]*)$").unwrap();

    /// Figures that imply others, e.g. "6" is short for "6,3".
    static ref SHORTHAND: HashMap<Vec<usize>, Vec<usize>> = {
        let table: Vec<(Vec<usize>, Vec<usize>)> = vec![
            (vec![], vec![5, 3]),
            (vec![3], vec![5, 3]),
            (vec![5], vec![5, 3]),
            (vec![6], vec![6, 3]),
            (vec![7], vec![7, 5, 3]),
            (vec![7, 3], vec![7, 5, 3]),
            (vec![9], vec![9, 7, 5, 3]),
            (vec![11], vec![11, 9, 7, 5, 3]),
            (vec![13], vec![13, 11, 9, 7, 5, 3]),
            (vec![6, 5], vec![6, 5, 3]),
            (vec![4, 3], vec![6, 4, 3]),
            (vec![4, 2], vec![6, 4, 2]),
            (vec![2], vec![6, 4, 2]),
        ];
        table.into_iter().collect()
    };
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("Invalid figure `{0}`")]
    InvalidFigure(String),

    #[error("Empty figure in `{0}`")]
    EmptyFigure(String),
}

/// Accidental attached to a figure.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Modifier {
    Natural,
    /// Raise (positive) or lower (negative) by this many semitones.
    Alter(isize),
}

impl Modifier {
    fn parse(s: &str) -> Result<Option<Modifier>, ()> {
        if s.is_empty() {
            return Ok(None);
        }
        if s.contains('n') {
            return if s == "n" { Ok(Some(Modifier::Natural)) } else { Err(()) };
        }
        let up = s.matches(|c: char| c == '#' || c == '+').count() as isize;
        let down = s.matches(|c: char| c == 'b' || c == '-').count() as isize;
        if up > 0 && down > 0 {
            return Err(());
        }
        Ok(Some(Modifier::Alter(up - down)))
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Natural => write!(f, "n"),
            Modifier::Alter(n) if *n < 0 => write!(f, "{}", "b".repeat(n.unsigned_abs())),
            Modifier::Alter(n) => write!(f, "{}", "#".repeat(*n as usize)),
        }
    }
}

/// One figure: an interval number above the bass
/// (as a count of scale steps, 3 = third) and an optional accidental.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Figure {
    pub number: usize,
    pub modifier: Option<Modifier>,
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            Some(m) => write!(f, "{}{}", m, self.number),
            None => write!(f, "{}", self.number),
        }
    }
}

/// A parsed figured-bass notation with shorthand expanded,
/// e.g. "6" becomes 6,3 and "4,3" becomes 6,4,3.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Notation {
    raw: String,
    figures: Vec<Figure>,
}

impl Notation {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Figures in descending order.
    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    pub fn numbers(&self) -> Vec<usize> {
        self.figures.iter().map(|f| f.number).collect()
    }
}

impl FromStr for Notation {
    type Err = NotationError;

    /// Parses comma-separated figures, e.g. "", "6", "#6,4", "7-", "b".
    /// An accidental on its own applies to the third.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut given: Vec<Figure> = vec![];
        if !trimmed.is_empty() {
            for part in trimmed.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    return Err(NotationError::EmptyFigure(s.to_string()));
                }
                given.push(parse_figure(part)?);
            }
        }

        let mut numbers: Vec<usize> = given.iter().map(|f| f.number).collect();
        numbers.sort_unstable_by(|a, b| b.cmp(a));
        numbers.dedup();
        let full = SHORTHAND.get(&numbers).cloned().unwrap_or(numbers);

        let figures = full.into_iter().map(|number| {
            let modifier = given.iter()
                .filter(|f| f.number == number)
                .find_map(|f| f.modifier);
            Figure { number, modifier }
        }).collect();

        Ok(Notation {
            raw: trimmed.to_string(),
            figures,
        })
    }
}

fn parse_figure(part: &str) -> Result<Figure, NotationError> {
    let invalid = || NotationError::InvalidFigure(part.to_string());
    let caps = FIGURE_RE.captures(part).ok_or_else(invalid)?;
    let prefix = Modifier::parse(&caps[1]).map_err(|_| invalid())?;
    let suffix = Modifier::parse(&caps[3]).map_err(|_| invalid())?;
    let modifier = match (prefix, suffix) {
        (Some(_), Some(_)) => return Err(invalid()),
        (m, None) | (None, m) => m,
    };
    let number = if caps[2].is_empty() {
        // A lone accidental alters the third
        modifier.ok_or_else(invalid)?;
        3
    } else {
        caps[2].parse::<usize>().map_err(|_| invalid())?
    };
    if !(2..=MAX_FIGURE).contains(&number) {
        return Err(invalid());
    }
    Ok(Figure { number, modifier })
}

impl TryFrom<&str> for Notation {
    type Error = NotationError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Ok(Self::from_str(s)?)
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let figures: Vec<String> = self.figures.iter().map(|f| f.to_string()).collect();
        write!(f, "{}", figures.join(","))
    }
}
