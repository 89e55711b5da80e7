use log::debug;
use std::collections::{BTreeSet, HashMap};
use crate::core::{Pitch, PitchName};
use super::error::RealizerError;
use super::notation::Notation;
use super::possibility::{outer_voices_allow, voice_leading_allows, Possibility};
use super::resolution::Resolution;
use super::rules::RuleConfig;
use super::scale::{pitches_between, PitchScale, ScaleError};
use super::voice::VoiceSet;

/// For each possibility of the previous segment (by index),
/// the indices of the possibilities in this segment it may move to.
pub type Movements = Vec<Vec<usize>>;

/// The voicings available over one bass note and, past the
/// first note, how the previous note's voicings lead into them.
#[derive(Debug, Clone)]
pub struct Segment {
    pub step: usize,
    pub bass: Pitch,
    pub notation: Notation,
    pub pitch_names: BTreeSet<PitchName>,
    pub possibilities: Vec<Possibility>,

    /// `None` for the first segment of a bass line.
    pub movements: Option<Movements>,
}

impl Segment {
    /// The first segment, enumerated without a predecessor.
    pub fn antecedent(
        step: usize,
        bass: Pitch,
        notation: &Notation,
        scale: &PitchScale,
        voices: &VoiceSet,
        rules: &RuleConfig,
    ) -> Result<Segment, RealizerError> {
        let pitch_names = resolve_names(step, &bass, notation, scale)?;
        let mut segment = Segment {
            step,
            bass,
            notation: notation.clone(),
            pitch_names,
            possibilities: vec![],
            movements: None,
        };
        let candidates = match voice_candidates(step, &bass, &segment.pitch_names, voices) {
            Some(candidates) => candidates,
            None => return Ok(segment),
        };

        segment.possibilities = enumerate(step, &candidates, rules, |_, _| true)?
            .into_iter()
            .map(Possibility::new)
            .filter(|p| p.is_correctly_formed(&segment.pitch_names, rules))
            .collect();
        debug!("Step {} ({} {}): {} possibilities",
            step, bass, notation, segment.possibilities.len());
        Ok(segment)
    }

    /// A segment following `prev`, keeping only voicings some
    /// possibility of `prev` can move to.
    pub fn consequent(
        prev: &Segment,
        bass: Pitch,
        notation: &Notation,
        scale: &PitchScale,
        voices: &VoiceSet,
        rules: &RuleConfig,
    ) -> Result<Segment, RealizerError> {
        let step = prev.step + 1;
        let pitch_names = resolve_names(step, &bass, notation, scale)?;
        let mut possibilities: Vec<Possibility> = vec![];
        let mut movements: Movements = Vec::with_capacity(prev.possibilities.len());

        let candidates = voice_candidates(step, &bass, &pitch_names, voices);
        let resolution = Resolution::find(
            &prev.pitch_names, &pitch_names,
            &prev.bass.name, &bass.name, rules);
        if let Some(resolution) = &resolution {
            debug!("Step {}: resolving {}", step, resolution.kind());
        }

        let mut index: HashMap<Possibility, usize> = HashMap::new();
        for from in &prev.possibilities {
            let nexts: Vec<Possibility> = match (&candidates, &resolution) {
                (None, _) => vec![],
                (Some(_), Some(resolution)) => {
                    resolve(resolution, from, bass, &pitch_names, voices, rules)
                        .into_iter()
                        .collect()
                }
                (Some(candidates), None) => {
                    enumerate(step, candidates, rules, |partial, candidate| {
                        voice_leading_allows(from, partial, candidate, voices, rules)
                    })?
                    .into_iter()
                    .map(Possibility::new)
                    .filter(|p| p.is_correctly_formed(&pitch_names, rules) && outer_voices_allow(from, p, rules))
                    .collect()
                }
            };

            let mut row = Vec::with_capacity(nexts.len());
            for next in nexts {
                let i = match index.get(&next) {
                    Some(i) => *i,
                    None => {
                        index.insert(next.clone(), possibilities.len());
                        possibilities.push(next);
                        possibilities.len() - 1
                    }
                };
                row.push(i);
            }
            if possibilities.len() > rules.max_possibilities_per_segment {
                return Err(RealizerError::SearchSpaceExceeded {
                    step,
                    limit: rules.max_possibilities_per_segment,
                });
            }
            movements.push(row);
        }

        let segment = Segment {
            step,
            bass,
            notation: notation.clone(),
            pitch_names,
            possibilities,
            movements: Some(movements),
        };
        debug!("Step {} ({} {}): {} possibilities, {} movements",
            step, bass, notation, segment.possibilities.len(), segment.edge_count());
        Ok(segment)
    }

    /// No voicing survives here, so nothing can pass through.
    pub fn is_dead(&self) -> bool {
        self.possibilities.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.movements.as_ref()
            .map(|m| m.iter().map(|row| row.len()).sum())
            .unwrap_or(0)
    }
}

fn resolve_names(step: usize, bass: &Pitch, notation: &Notation, scale: &PitchScale) -> Result<BTreeSet<PitchName>, RealizerError> {
    scale.pitch_names(bass, notation).map_err(|err| match err {
        ScaleError::Notation(source) => RealizerError::InvalidNotation {
            step,
            notation: notation.raw().to_string(),
            source,
        },
        source => RealizerError::Scale { step, source },
    })
}

/// Pitches each voice may sing over `bass`, bass voice first.
/// `None` if some voice has nothing to sing.
fn voice_candidates(step: usize, bass: &Pitch, names: &BTreeSet<PitchName>, voices: &VoiceSet) -> Option<Vec<Vec<Pitch>>> {
    if !voices.bass().contains(bass) {
        debug!("Step {}: {} is outside the range of {}", step, bass, voices.bass());
        return None;
    }
    let span = voices.highest().high.midi() - bass.midi();
    let octave_limit = if span > 0 { ((span + 11) / 12) as usize } else { 0 };
    let pitches = pitches_between(names, bass, octave_limit);

    let mut candidates = vec![vec![*bass]];
    for voice in voices.iter().skip(1) {
        match voice.pitches_in_range(&pitches) {
            Ok(in_range) => candidates.push(in_range),
            Err(err) => {
                debug!("Step {}: {}", step, err);
                return None;
            }
        }
    }
    Some(candidates)
}

/// Build voicings one voice at a time, lowest first. A candidate
/// extends a partial voicing only if `allows` accepts it (and it
/// doesn't cross below the voice beneath, when crossing is forbidden).
fn enumerate<F>(step: usize, candidates: &[Vec<Pitch>], rules: &RuleConfig, allows: F) -> Result<Vec<Vec<Pitch>>, RealizerError>
    where F: Fn(&[Pitch], Pitch) -> bool
{
    let mut partials: Vec<Vec<Pitch>> = vec![vec![]];
    for voice_candidates in candidates {
        let mut extended = vec![];
        for partial in &partials {
            for candidate in voice_candidates {
                if rules.forbid_voice_crossing {
                    if let Some(below) = partial.last() {
                        if candidate.midi() < below.midi() {
                            continue;
                        }
                    }
                }
                if !allows(partial, *candidate) {
                    continue;
                }
                let mut next = partial.clone();
                next.push(*candidate);
                extended.push(next);
            }
            if extended.len() > rules.max_possibilities_per_segment {
                return Err(RealizerError::SearchSpaceExceeded {
                    step,
                    limit: rules.max_possibilities_per_segment,
                });
            }
        }
        partials = extended;
    }
    Ok(partials)
}

fn resolve(
    resolution: &Resolution,
    from: &Possibility,
    bass: Pitch,
    names: &BTreeSet<PitchName>,
    voices: &VoiceSet,
    rules: &RuleConfig,
) -> Option<Possibility> {
    let next = resolution.resolve(from, bass)?;
    if !next.in_range(voices) || !next.pitch_names().is_subset(names) {
        return None;
    }
    if rules.apply_single_possibility_rules_to_resolution && !next.is_correctly_formed(names, rules) {
        return None;
    }
    if rules.apply_consecutive_possibility_rules_to_resolution && !from.has_correct_voice_leading(&next, voices, rules) {
        return None;
    }
    Some(next)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::figured_bass::voice::Voice;

    fn possib(ps: &[&str]) -> Possibility {
        Possibility::new(ps.iter().map(|p| (*p).try_into().unwrap()).collect())
    }

    fn antecedent(bass: &str, notation: &str, rules: &RuleConfig) -> Segment {
        let scale = PitchScale::new("C major".try_into().unwrap());
        let notation: Notation = notation.try_into().unwrap();
        Segment::antecedent(0, bass.try_into().unwrap(), &notation, &scale, &VoiceSet::satb(), rules).unwrap()
    }

    fn consequent(prev: &Segment, bass: &str, notation: &str, rules: &RuleConfig) -> Segment {
        let scale = PitchScale::new("C major".try_into().unwrap());
        let notation: Notation = notation.try_into().unwrap();
        Segment::consequent(prev, bass.try_into().unwrap(), &notation, &scale, &VoiceSet::satb(), rules).unwrap()
    }

    fn has_edge(prev: &Segment, next: &Segment, from: &Possibility, to: &Possibility) -> bool {
        let i = match prev.possibilities.iter().position(|p| p == from) {
            Some(i) => i,
            None => return false,
        };
        next.movements.as_ref().unwrap()[i].iter()
            .any(|j| next.possibilities[*j] == *to)
    }

    #[test]
    fn test_antecedent() {
        let rules = RuleConfig::default();
        let voices = VoiceSet::satb();
        let segment = antecedent("C3", "", &rules);
        assert!(!segment.is_dead());
        assert!(segment.movements.is_none());
        for p in &segment.possibilities {
            assert_eq!(p.bass(), Pitch::try_from("C3").unwrap());
            assert!(p.in_range(&voices));
            assert!(!p.is_incomplete(&segment.pitch_names));
            assert!(!p.has_voice_crossing());
            assert!(p.upper_voices_within_limit(Some(12)));
        }
        assert!(segment.possibilities.contains(&possib(&["C3", "G3", "E4", "C5"])));

        // Doubling is allowed, omitting a chord member is not
        assert!(!segment.possibilities.contains(&possib(&["C3", "C4", "E4", "C5"])));
    }

    #[test]
    fn test_incomplete_allowed() {
        let rules = RuleConfig {
            forbid_incomplete_possibilities: false,
            ..RuleConfig::default()
        };
        let segment = antecedent("C3", "", &rules);
        assert!(segment.possibilities.contains(&possib(&["C3", "C4", "E4", "C5"])));
        assert!(segment.possibilities.len() > antecedent("C3", "", &RuleConfig::default()).possibilities.len());
    }

    #[test]
    fn test_consequent_movements() {
        let rules = RuleConfig::default();
        let voices = VoiceSet::satb();
        let first = antecedent("C3", "", &rules);
        let second = consequent(&first, "D3", "6", &rules);
        let movements = second.movements.as_ref().unwrap();

        // Every predecessor gets a row, even an empty one
        assert_eq!(movements.len(), first.possibilities.len());
        assert!(second.edge_count() > 0);

        for (i, row) in movements.iter().enumerate() {
            for j in row {
                let from = &first.possibilities[i];
                let to = &second.possibilities[*j];
                assert!(from.has_correct_voice_leading(to, &voices, &rules));
                assert!(to.is_correctly_formed(&second.pitch_names, &rules));
            }
        }

        // Possibilities are shared between predecessors
        let distinct: std::collections::HashSet<&Possibility> = second.possibilities.iter().collect();
        assert_eq!(distinct.len(), second.possibilities.len());
    }

    #[test]
    fn test_parallel_fifth_edge() {
        let before = possib(&["C3", "E3", "G3", "C4"]);
        let after = possib(&["D3", "F3", "A3", "F4"]);

        let rules = RuleConfig::default();
        let first = antecedent("C3", "", &rules);
        let second = consequent(&first, "D3", "", &rules);
        assert!(first.possibilities.contains(&before));
        assert!(!has_edge(&first, &second, &before, &after));

        let rules = RuleConfig {
            forbid_parallel_fifths: false,
            ..RuleConfig::default()
        };
        let first = antecedent("C3", "", &rules);
        let second = consequent(&first, "D3", "", &rules);
        assert!(has_edge(&first, &second, &before, &after));
    }

    #[test]
    fn test_dominant_seventh_resolution() {
        let rules = RuleConfig::default();
        let first = antecedent("G2", "7", &rules);
        let second = consequent(&first, "C3", "", &rules);
        let movements = second.movements.as_ref().unwrap();
        assert!(movements.iter().all(|row| row.len() <= 1));
        assert!(!second.is_dead());

        let from = possib(&["G2", "B3", "D4", "F4"]);
        assert!(has_edge(&first, &second, &from, &possib(&["C3", "C4", "C4", "E4"])));

        // With the resolution off, the ordinary rules apply
        let rules = RuleConfig {
            resolve_dominant_seventh_properly: false,
            ..RuleConfig::default()
        };
        let first = antecedent("G2", "7", &rules);
        let second = consequent(&first, "C3", "", &rules);
        assert!(!has_edge(&first, &second, &from, &possib(&["C3", "C4", "C4", "E4"])));
        assert!(second.movements.as_ref().unwrap().iter().any(|row| row.len() > 1));
    }

    #[test]
    fn test_dead_segment() {
        let voices = VoiceSet::new(vec![
            Voice::new("Bass", "C3".try_into().unwrap(), "C4".try_into().unwrap()).unwrap(),
            Voice::new("Soprano", "D3".try_into().unwrap(), "D3".try_into().unwrap()).unwrap(),
        ]).unwrap();
        let scale = PitchScale::new("C major".try_into().unwrap());
        let notation: Notation = "".try_into().unwrap();
        let rules = RuleConfig::default();

        // The soprano can only sing D, which C major lacks
        let segment = Segment::antecedent(0, "C3".try_into().unwrap(), &notation, &scale, &voices, &rules).unwrap();
        assert!(segment.is_dead());

        // A bass outside the bass range
        let segment = Segment::antecedent(0, "C5".try_into().unwrap(), &notation, &scale, &voices, &rules).unwrap();
        assert!(segment.is_dead());
    }

    #[test]
    fn test_search_space_exceeded() {
        let rules = RuleConfig {
            max_possibilities_per_segment: 10,
            ..RuleConfig::default()
        };
        let scale = PitchScale::new("C major".try_into().unwrap());
        let notation: Notation = "".try_into().unwrap();
        let result = Segment::antecedent(0, "C3".try_into().unwrap(), &notation, &scale, &VoiceSet::satb(), &rules);
        assert_eq!(result.unwrap_err(), RealizerError::SearchSpaceExceeded { step: 0, limit: 10 });
    }

    #[test]
    fn test_search_space_exceeded_consequent() {
        let first = antecedent("C3", "", &RuleConfig::default());
        let rules = RuleConfig {
            max_possibilities_per_segment: 1,
            ..RuleConfig::default()
        };
        let scale = PitchScale::new("C major".try_into().unwrap());
        let notation: Notation = "".try_into().unwrap();
        let result = Segment::consequent(&first, "D3".try_into().unwrap(), &notation, &scale, &VoiceSet::satb(), &rules);
        assert_eq!(result.unwrap_err(), RealizerError::SearchSpaceExceeded { step: 1, limit: 1 });
    }
}
