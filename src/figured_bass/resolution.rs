use std::collections::{BTreeSet, HashMap};
use std::fmt;
use crate::core::{AugmentedSixth, Chord, Interval, Member, Pitch, PitchName, Triad};
use super::possibility::Possibility;
use super::rules::RuleConfig;

const UNISON: Interval = Interval { steps: 0, semitones: 0 };
const UP_HALF: Interval = Interval { steps: 1, semitones: 1 };
const UP_WHOLE: Interval = Interval { steps: 1, semitones: 2 };
const DOWN_HALF: Interval = Interval { steps: -1, semitones: -1 };
const DOWN_WHOLE: Interval = Interval { steps: -1, semitones: -2 };
const UP_FOURTH: Interval = Interval { steps: 3, semitones: 5 };
const AUG_FOURTH: Interval = Interval { steps: 3, semitones: 6 };
const MAJ_THIRD: Interval = Interval { steps: 2, semitones: 4 };
const FIFTH: Interval = Interval { steps: 4, semitones: 7 };

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResolutionKind {
    DominantSeventhToTonic,
    DominantSeventhToSubmediant,
    DiminishedSeventhToTonic,
    AugmentedSixth(AugmentedSixth),
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionKind::DominantSeventhToTonic => write!(f, "V7 to I"),
            ResolutionKind::DominantSeventhToSubmediant => write!(f, "V7 to VI"),
            ResolutionKind::DiminishedSeventhToTonic => write!(f, "viio7 to I"),
            ResolutionKind::AugmentedSixth(kind) => write!(f, "{:?} sixth to V", kind),
        }
    }
}

/// How one pitch name of the dissonant chord moves.
#[derive(Debug, Clone)]
struct Move {
    from: PitchName,

    /// Move when this name is in the bass.
    bass: Interval,

    /// Moves for upper voices holding this name, lowest voice
    /// first; the last one repeats for any further doublings.
    upper: Vec<Interval>,
}

impl Move {
    fn new(from: PitchName, interval: Interval) -> Move {
        Move { from, bass: interval, upper: vec![interval] }
    }
}

/// A fixed voice-by-voice resolution of a dissonant chord
/// into the chord that follows it.
#[derive(Debug, Clone)]
pub struct Resolution {
    kind: ResolutionKind,
    moves: Vec<Move>,
}

impl Resolution {
    /// The resolution that applies between two chords, if the
    /// rules ask for one and the bass moves the way it requires.
    pub fn find(
        prev_names: &BTreeSet<PitchName>,
        next_names: &BTreeSet<PitchName>,
        prev_bass: &PitchName,
        next_bass: &PitchName,
        rules: &RuleConfig,
    ) -> Option<Resolution> {
        let prev = Chord::analyze(prev_names)?;
        let next = Chord::analyze(next_names)?;
        let resolution = match prev {
            Chord::DominantSeventh { root } if rules.resolve_dominant_seventh_properly => {
                dominant_seventh(prev_names, &prev, root, &next)?
            }
            Chord::DiminishedSeventh { root } if rules.resolve_diminished_seventh_properly => {
                diminished_seventh(prev_names, &prev, root, &next, rules.doubled_root_in_diminished_seventh)?
            }
            Chord::AugmentedSixth { kind, lower, upper } if rules.resolve_augmented_sixth_properly => {
                augmented_sixth(kind, lower, upper, prev_names, &next)?
            }
            _ => return None,
        };

        let bass_move = resolution.moves.iter().find(|m| m.from == *prev_bass)?;
        if *prev_bass + bass_move.bass != *next_bass {
            return None;
        }
        Some(resolution)
    }

    pub fn kind(&self) -> ResolutionKind {
        self.kind
    }

    /// Move every upper voice of `from` by its table entry and put
    /// `bass` underneath. `None` if a voice holds a name with no entry.
    pub fn resolve(&self, from: &Possibility, bass: Pitch) -> Option<Possibility> {
        let mut seen: HashMap<PitchName, usize> = HashMap::new();
        let mut pitches = Vec::with_capacity(from.len());
        pitches.push(bass);
        for pitch in from.pitches().iter().skip(1) {
            let entry = self.moves.iter().find(|m| m.from == pitch.name)?;
            let count = seen.entry(pitch.name).or_insert(0);
            let interval = entry.upper[(*count).min(entry.upper.len() - 1)];
            *count += 1;
            pitches.push(*pitch + interval);
        }
        Some(Possibility::new(pitches))
    }
}

/// Table entries for every name of a seventh chord, by chord member.
fn member_moves(prev_names: &BTreeSet<PitchName>, prev: &Chord, table: [(Member, Interval); 4]) -> Vec<Move> {
    prev_names.iter()
        .filter_map(|name| {
            let member = prev.member(name)?;
            table.iter()
                .find(|(m, _)| *m == member)
                .map(|(_, interval)| Move::new(*name, *interval))
        })
        .collect()
}

fn dominant_seventh(prev_names: &BTreeSet<PitchName>, prev: &Chord, root: PitchName, next: &Chord) -> Option<Resolution> {
    let (next_root, triad) = match next {
        Chord::Triad { root, triad } => (*root, *triad),
        _ => return None,
    };

    if next_root == root + UP_FOURTH && (triad == Triad::Major || triad == Triad::Minor) {
        let seventh = if triad == Triad::Major { DOWN_HALF } else { DOWN_WHOLE };
        let mut moves = member_moves(prev_names, prev, [
            (Member::Root, UNISON),
            (Member::Third, UP_HALF),
            (Member::Fifth, DOWN_WHOLE),
            (Member::Seventh, seventh),
        ]);
        // The bass leaps to the new root while upper voices hold it
        for m in moves.iter_mut().filter(|m| m.from == root) {
            m.bass = UP_FOURTH;
        }
        return Some(Resolution { kind: ResolutionKind::DominantSeventhToTonic, moves });
    }

    // Deceptive resolution, in major (vi) or minor (VI)
    let (root_move, seventh) = if next_root == root + UP_WHOLE && triad == Triad::Minor {
        (UP_WHOLE, DOWN_HALF)
    } else if next_root == root + UP_HALF && triad == Triad::Major {
        (UP_HALF, DOWN_WHOLE)
    } else {
        return None;
    };
    let moves = member_moves(prev_names, prev, [
        (Member::Root, root_move),
        (Member::Third, UP_HALF),
        (Member::Fifth, DOWN_WHOLE),
        (Member::Seventh, seventh),
    ]);
    Some(Resolution { kind: ResolutionKind::DominantSeventhToSubmediant, moves })
}

fn diminished_seventh(prev_names: &BTreeSet<PitchName>, prev: &Chord, root: PitchName, next: &Chord, doubled_root: bool) -> Option<Resolution> {
    let triad = match next {
        Chord::Triad { root: next_root, triad } if *next_root == root + UP_HALF => *triad,
        _ => return None,
    };
    let (third, fifth) = match (triad, doubled_root) {
        (Triad::Major, true) => (DOWN_WHOLE, DOWN_HALF),
        (Triad::Minor, true) => (DOWN_WHOLE, DOWN_WHOLE),
        (Triad::Major, false) => (UP_WHOLE, DOWN_HALF),
        (Triad::Minor, false) => (UP_HALF, DOWN_WHOLE),
        _ => return None,
    };
    let moves = member_moves(prev_names, prev, [
        (Member::Root, UP_HALF),
        (Member::Third, third),
        (Member::Fifth, fifth),
        (Member::Seventh, DOWN_HALF),
    ]);
    Some(Resolution { kind: ResolutionKind::DiminishedSeventhToTonic, moves })
}

fn augmented_sixth(kind: AugmentedSixth, lower: PitchName, upper: PitchName, names: &BTreeSet<PitchName>, next: &Chord) -> Option<Resolution> {
    let dominant = lower + DOWN_HALF;
    if *next != (Chord::Triad { root: dominant, triad: Triad::Major }) {
        return None;
    }
    let tonic = lower + MAJ_THIRD;
    let mut moves = vec![
        Move::new(lower, DOWN_HALF),
        Move::new(upper, UP_HALF),
    ];
    match kind {
        AugmentedSixth::Italian => {
            // The doubled tonic splits to the third and fifth of V
            moves.push(Move { from: tonic, bass: DOWN_HALF, upper: vec![DOWN_HALF, UP_WHOLE] });
        }
        AugmentedSixth::French => {
            moves.push(Move::new(tonic, DOWN_HALF));
            moves.push(Move::new(lower + AUG_FOURTH, UNISON));
        }
        AugmentedSixth::German => {
            moves.push(Move::new(tonic, DOWN_HALF));
            moves.push(Move::new(lower + FIFTH, DOWN_HALF));
        }
    }
    if moves.iter().any(|m| !names.contains(&m.from)) {
        return None;
    }
    Some(Resolution { kind: ResolutionKind::AugmentedSixth(kind), moves })
}
