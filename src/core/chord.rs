use std::collections::BTreeSet;
use std::fmt;
use super::interval::Interval;
use super::pitch::PitchName;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Triad {
    Major,
    Minor,
    Diminished,
    Augmented,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AugmentedSixth {
    Italian,
    French,
    German,
}

/// Role of a pitch name within a tertian chord.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Member {
    Root,
    Third,
    Fifth,
    Seventh,
}

/// The harmonic reading of an octave-free set of pitch names.
/// Only the chord types that matter for voice leading
/// (the special resolutions in particular) are recognized.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Chord {
    Triad { root: PitchName, triad: Triad },
    DominantSeventh { root: PitchName },
    DiminishedSeventh { root: PitchName },
    AugmentedSixth {
        kind: AugmentedSixth,
        /// Lower note of the augmented sixth, e.g. Ab in Ab-C-F#.
        lower: PitchName,
        /// Upper note of the augmented sixth, e.g. F#.
        upper: PitchName,
    },
}

impl Chord {
    /// Identify the chord spelled by `names`, if it is one we know.
    pub fn analyze(names: &BTreeSet<PitchName>) -> Option<Chord> {
        augmented_sixth(names).or_else(|| tertian(names))
    }

    pub fn root(&self) -> Option<PitchName> {
        match self {
            Chord::Triad { root, .. } => Some(*root),
            Chord::DominantSeventh { root } => Some(*root),
            Chord::DiminishedSeventh { root } => Some(*root),
            Chord::AugmentedSixth { .. } => None,
        }
    }

    /// Role of `name` in the chord, counted in thirds above the root.
    pub fn member(&self, name: &PitchName) -> Option<Member> {
        let root = self.root()?;
        match root.interval_to(name).steps {
            0 => Some(Member::Root),
            2 => Some(Member::Third),
            4 => Some(Member::Fifth),
            6 => Some(Member::Seventh),
            _ => None,
        }
    }

    pub fn is_triad(&self, triad: Triad) -> bool {
        matches!(self, Chord::Triad { triad: t, .. } if *t == triad)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chord::Triad { root, triad } => write!(f, "{} {:?} triad", root, triad),
            Chord::DominantSeventh { root } => write!(f, "{} dominant seventh", root),
            Chord::DiminishedSeventh { root } => write!(f, "{} diminished seventh", root),
            Chord::AugmentedSixth { kind, lower, upper } => write!(f, "{:?} sixth {}-{}", kind, lower, upper),
        }
    }
}

fn tertian(names: &BTreeSet<PitchName>) -> Option<Chord> {
    for root in names {
        let mut third = None;
        let mut fifth = None;
        let mut seventh = None;
        let stacked = names.iter().filter(|n| *n != root).all(|n| {
            let intv = root.interval_to(n);
            match intv.steps {
                2 if third.is_none() => third = Some(intv.semitones),
                4 if fifth.is_none() => fifth = Some(intv.semitones),
                6 if seventh.is_none() => seventh = Some(intv.semitones),
                _ => return false,
            }
            true
        });
        if !stacked {
            continue;
        }
        let root = *root;
        return match (third, fifth, seventh) {
            (Some(4), Some(7), None) => Some(Chord::Triad { root, triad: Triad::Major }),
            (Some(3), Some(7), None) => Some(Chord::Triad { root, triad: Triad::Minor }),
            (Some(3), Some(6), None) => Some(Chord::Triad { root, triad: Triad::Diminished }),
            (Some(4), Some(8), None) => Some(Chord::Triad { root, triad: Triad::Augmented }),
            (Some(4), Some(7), Some(10)) => Some(Chord::DominantSeventh { root }),
            (Some(3), Some(6), Some(9)) => Some(Chord::DiminishedSeventh { root }),
            _ => None,
        };
    }
    None
}

fn augmented_sixth(names: &BTreeSet<PitchName>) -> Option<Chord> {
    let aug6 = Interval::new(5, 10);
    let (lower, upper) = names.iter()
        .flat_map(|a| names.iter().map(move |b| (*a, *b)))
        .find(|(a, b)| a.interval_to(b) == aug6)?;

    let mut tonic = false;
    let mut fourth = false;
    let mut fifth = false;
    for n in names.iter().filter(|n| **n != lower && **n != upper) {
        let intv = lower.interval_to(n);
        match (intv.steps, intv.semitones) {
            (2, 4) => tonic = true,
            (3, 6) => fourth = true,
            (4, 7) => fifth = true,
            _ => return None,
        }
    }
    let kind = match (tonic, fourth, fifth) {
        (true, false, false) => AugmentedSixth::Italian,
        (true, true, false) => AugmentedSixth::French,
        (true, false, true) => AugmentedSixth::German,
        _ => return None,
    };
    Some(Chord::AugmentedSixth { kind, lower, upper })
}

#[cfg(test)]
mod test {
    use super::*;

    fn names(ns: &[&str]) -> BTreeSet<PitchName> {
        ns.iter().map(|n| (*n).try_into().unwrap()).collect()
    }

    fn name(n: &str) -> PitchName {
        n.try_into().unwrap()
    }

    #[test]
    fn test_triads() {
        let chord = Chord::analyze(&names(&["E", "G", "C"])).unwrap();
        assert_eq!(chord, Chord::Triad { root: name("C"), triad: Triad::Major });

        let chord = Chord::analyze(&names(&["A", "C", "E"])).unwrap();
        assert!(chord.is_triad(Triad::Minor));
        assert_eq!(chord.root(), Some(name("A")));

        let chord = Chord::analyze(&names(&["B", "D", "F"])).unwrap();
        assert!(chord.is_triad(Triad::Diminished));

        let chord = Chord::analyze(&names(&["C", "E", "G#"])).unwrap();
        assert!(chord.is_triad(Triad::Augmented));
    }

    #[test]
    fn test_sevenths() {
        let chord = Chord::analyze(&names(&["G", "B", "D", "F"])).unwrap();
        assert_eq!(chord, Chord::DominantSeventh { root: name("G") });
        assert_eq!(chord.member(&name("B")), Some(Member::Third));
        assert_eq!(chord.member(&name("F")), Some(Member::Seventh));

        let chord = Chord::analyze(&names(&["B", "D", "F", "Ab"])).unwrap();
        assert_eq!(chord, Chord::DiminishedSeventh { root: name("B") });

        // Major seventh chords are not special
        assert_eq!(Chord::analyze(&names(&["C", "E", "G", "B"])), None);
        assert_eq!(Chord::analyze(&names(&["C", "D", "E"])), None);
        assert_eq!(Chord::analyze(&names(&["C", "Eb", "E", "G"])), None);
    }

    #[test]
    fn test_augmented_sixths() {
        let chord = Chord::analyze(&names(&["Ab", "C", "F#"])).unwrap();
        assert_eq!(chord, Chord::AugmentedSixth {
            kind: AugmentedSixth::Italian,
            lower: name("Ab"),
            upper: name("F#"),
        });

        let chord = Chord::analyze(&names(&["Ab", "C", "D", "F#"])).unwrap();
        assert!(matches!(chord, Chord::AugmentedSixth { kind: AugmentedSixth::French, .. }));

        let chord = Chord::analyze(&names(&["Ab", "C", "Eb", "F#"])).unwrap();
        assert!(matches!(chord, Chord::AugmentedSixth { kind: AugmentedSixth::German, .. }));

        // Same pitch classes, spelled as a dominant seventh
        let chord = Chord::analyze(&names(&["Ab", "C", "Eb", "Gb"])).unwrap();
        assert_eq!(chord, Chord::DominantSeventh { root: name("Ab") });
    }
}
