use std::collections::BTreeSet;
use std::fmt;
use crate::core::{Interval, Pitch, PitchName};
use super::rules::RuleConfig;
use super::voice::{VoiceId, VoiceSet};

/// One complete voicing: a pitch for every voice of a `VoiceSet`,
/// stored in voice order (bass first).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Possibility {
    pitches: Vec<Pitch>,
}

impl Possibility {
    pub fn new(pitches: Vec<Pitch>) -> Possibility {
        Possibility { pitches }
    }

    pub fn pitches(&self) -> &[Pitch] {
        &self.pitches
    }

    pub fn pitch(&self, voice: VoiceId) -> Pitch {
        self.pitches[voice.index()]
    }

    pub fn pitch_for(&self, voices: &VoiceSet, label: &str) -> Option<Pitch> {
        voices.id(label).map(|id| self.pitch(id))
    }

    pub fn bass(&self) -> Pitch {
        self.pitches[0]
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn pitch_names(&self) -> BTreeSet<PitchName> {
        self.pitches.iter().map(|p| p.name).collect()
    }

    /// True unless the voicing sounds exactly the required names.
    pub fn is_incomplete(&self, required: &BTreeSet<PitchName>) -> bool {
        self.pitch_names() != *required
    }

    /// Whether the voices above the bass span at most `limit` semitones.
    pub fn upper_voices_within_limit(&self, limit: Option<usize>) -> bool {
        let limit = match limit {
            Some(limit) => limit as isize,
            None => return true,
        };
        let upper = self.pitches.iter().skip(1).map(|p| p.midi());
        match (upper.clone().min(), upper.max()) {
            (Some(low), Some(high)) => high - low <= limit,
            _ => true,
        }
    }

    /// Some voice sits below the voice beneath it.
    pub fn has_voice_crossing(&self) -> bool {
        self.pitches.windows(2).any(|w| w[1].midi() < w[0].midi())
    }

    pub fn in_range(&self, voices: &VoiceSet) -> bool {
        self.pitches.len() == voices.len()
            && voices.ids().all(|id| voices.get(id).contains(&self.pitch(id)))
    }

    /// Checks that only concern this voicing.
    pub fn is_correctly_formed(&self, required: &BTreeSet<PitchName>, rules: &RuleConfig) -> bool {
        !(rules.forbid_incomplete_possibilities && self.is_incomplete(required))
            && self.upper_voices_within_limit(rules.upper_voices_max_semitone_separation)
            && !(rules.forbid_voice_crossing && self.has_voice_crossing())
    }

    /// Checks for moving from this voicing to `next`.
    pub fn has_correct_voice_leading(&self, next: &Possibility, voices: &VoiceSet, rules: &RuleConfig) -> bool {
        self.len() == next.len()
            && (0..next.len()).all(|v| voice_leading_allows(self, &next.pitches[..v], next.pitches[v], voices, rules))
            && outer_voices_allow(self, next, rules)
    }
}

impl fmt::Display for Possibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pitches: Vec<String> = self.pitches.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", pitches.join(" "))
    }
}

/// The four pitches two voices sing across one chord change.
#[derive(Debug, Copy, Clone)]
pub struct VoiceLeadingQuartet {
    pub lower: (Pitch, Pitch),
    pub upper: (Pitch, Pitch),
}

impl VoiceLeadingQuartet {
    pub fn new(lower: (Pitch, Pitch), upper: (Pitch, Pitch)) -> VoiceLeadingQuartet {
        VoiceLeadingQuartet { lower, upper }
    }

    fn before(&self) -> Interval {
        Interval::between(&self.lower.0, &self.upper.0)
    }

    fn after(&self) -> Interval {
        Interval::between(&self.lower.1, &self.upper.1)
    }

    /// Both voices move, in the same direction.
    pub fn similar_motion(&self) -> bool {
        let lower = self.lower.0.semitones_to(&self.lower.1).signum();
        let upper = self.upper.0.semitones_to(&self.upper.1).signum();
        lower != 0 && lower == upper
    }

    pub fn parallel_fifth(&self) -> bool {
        self.similar_motion() && self.before().is_perfect_fifth() && self.after().is_perfect_fifth()
    }

    pub fn parallel_octave(&self) -> bool {
        self.similar_motion() && self.before().is_perfect_octave() && self.after().is_perfect_octave()
    }

    pub fn hidden_fifth(&self) -> bool {
        self.similar_motion() && !self.before().is_perfect_fifth() && self.after().is_perfect_fifth()
    }

    pub fn hidden_octave(&self) -> bool {
        self.similar_motion() && !self.before().is_perfect_octave() && self.after().is_perfect_octave()
    }
}

/// Whether voice `partial.len()` may move from `prev` to `candidate`,
/// given the pitches already chosen for the voices below it.
///
/// Only rules between this voice and lower ones are checked, so
/// a voicing can be validated one voice at a time while it is built.
pub(crate) fn voice_leading_allows(prev: &Possibility, partial: &[Pitch], candidate: Pitch, voices: &VoiceSet, rules: &RuleConfig) -> bool {
    let v = partial.len();
    let id = match voices.ids().nth(v) {
        Some(id) => id,
        None => return false,
    };
    let from = prev.pitches[v];

    if let Some(limit) = rules.leap_limit(voices, id) {
        if from.semitones_to(&candidate).unsigned_abs() > limit {
            return false;
        }
    }

    if rules.forbid_parallel_fifths || rules.forbid_parallel_octaves {
        for (u, lower) in partial.iter().enumerate() {
            let vlq = VoiceLeadingQuartet::new((prev.pitches[u], *lower), (from, candidate));
            if rules.forbid_parallel_fifths && vlq.parallel_fifth() {
                return false;
            }
            if rules.forbid_parallel_octaves && vlq.parallel_octave() {
                return false;
            }
        }
    }

    if rules.forbid_voice_overlap && v > 0 {
        let below_before = prev.pitches[v - 1];
        let below_after = partial[v - 1];
        if below_after.midi() > from.midi() || candidate.midi() < below_before.midi() {
            return false;
        }
    }
    true
}

/// Hidden fifths and octaves, between the bass and the top voice only.
pub(crate) fn outer_voices_allow(prev: &Possibility, next: &Possibility, rules: &RuleConfig) -> bool {
    let n = next.len();
    if n < 2 || prev.len() != n {
        return true;
    }
    let vlq = VoiceLeadingQuartet::new(
        (prev.pitches[0], next.pitches[0]),
        (prev.pitches[n - 1], next.pitches[n - 1]));
    !(rules.forbid_hidden_fifths && vlq.hidden_fifth())
        && !(rules.forbid_hidden_octaves && vlq.hidden_octave())
}

#[cfg(test)]
mod test {
    use super::*;

    fn possib(ps: &[&str]) -> Possibility {
        Possibility::new(ps.iter().map(|p| (*p).try_into().unwrap()).collect())
    }

    fn names(ns: &[&str]) -> BTreeSet<PitchName> {
        ns.iter().map(|n| (*n).try_into().unwrap()).collect()
    }

    fn no_rules() -> RuleConfig {
        RuleConfig {
            forbid_incomplete_possibilities: false,
            upper_voices_max_semitone_separation: None,
            forbid_voice_crossing: false,
            forbid_parallel_fifths: false,
            forbid_parallel_octaves: false,
            forbid_hidden_fifths: false,
            forbid_hidden_octaves: false,
            forbid_voice_overlap: false,
            ..RuleConfig::default()
        }
    }

    #[test]
    fn test_incomplete() {
        let c_major = names(&["C", "E", "G"]);
        assert!(!possib(&["C3", "G3", "E4", "C5"]).is_incomplete(&c_major));
        assert!(possib(&["C3", "C4", "E4", "C5"]).is_incomplete(&c_major));

        let rules = RuleConfig::default();
        assert!(possib(&["C3", "G3", "E4", "C5"]).is_correctly_formed(&c_major, &rules));
        assert!(!possib(&["C3", "C4", "E4", "C5"]).is_correctly_formed(&c_major, &rules));
        assert!(possib(&["C3", "C4", "E4", "C5"]).is_correctly_formed(&c_major, &no_rules()));
    }

    #[test]
    fn test_upper_voices_within_limit() {
        let p = possib(&["C2", "G3", "E4", "C5"]);
        assert!(!p.upper_voices_within_limit(Some(12)));
        assert!(p.upper_voices_within_limit(Some(17)));
        assert!(p.upper_voices_within_limit(None));

        // The bass may be far from the upper voices
        assert!(possib(&["C2", "G4", "C5", "E5"]).upper_voices_within_limit(Some(12)));
    }

    #[test]
    fn test_voice_crossing() {
        assert!(!possib(&["C3", "G3", "G3", "C5"]).has_voice_crossing());
        assert!(possib(&["C3", "E4", "G3", "C5"]).has_voice_crossing());

        let c_major = names(&["C", "E", "G"]);
        let crossed = possib(&["C3", "E4", "G3", "C5"]);
        assert!(!crossed.is_correctly_formed(&c_major, &RuleConfig::default()));
        assert!(crossed.is_correctly_formed(&c_major, &no_rules()));
    }

    #[test]
    fn test_parallel_fifths() {
        let voices = VoiceSet::satb();
        let rules = RuleConfig {
            forbid_parallel_fifths: true,
            ..no_rules()
        };
        // Bass and soprano both rise a step, a twelfth apart
        let a = possib(&["C3", "E3", "C4", "G4"]);
        let b = possib(&["D3", "F3", "D4", "A4"]);
        assert!(!a.has_correct_voice_leading(&b, &voices, &rules));
        assert!(a.has_correct_voice_leading(&b, &voices, &no_rules()));

        // Contrary motion between fifths is allowed
        let c = possib(&["C3", "E3", "C4", "G4"]);
        let d = possib(&["G2", "E3", "C4", "D5"]);
        assert!(c.has_correct_voice_leading(&d, &voices, &rules));
    }

    #[test]
    fn test_parallel_octaves() {
        let voices = VoiceSet::satb();
        let rules = RuleConfig {
            forbid_parallel_octaves: true,
            ..no_rules()
        };
        let a = possib(&["C3", "G3", "E4", "C5"]);
        let b = possib(&["D3", "A3", "F4", "D5"]);
        assert!(!a.has_correct_voice_leading(&b, &voices, &rules));

        // Repeated notes are oblique, not parallel
        let c = possib(&["C3", "G3", "E4", "C5"]);
        assert!(c.has_correct_voice_leading(&c, &voices, &rules));
    }

    #[test]
    fn test_hidden_intervals() {
        let voices = VoiceSet::satb();
        let rules = RuleConfig {
            forbid_hidden_fifths: true,
            forbid_hidden_octaves: true,
            ..no_rules()
        };
        // Outer voices rise into an octave
        let a = possib(&["F3", "A3", "C4", "A4"]);
        let b = possib(&["G3", "B3", "D4", "G4"]);
        assert!(a.has_correct_voice_leading(&b, &voices, &rules));
        let c = possib(&["G3", "B3", "D4", "G5"]);
        assert!(!a.has_correct_voice_leading(&c, &voices, &rules));

        let vlq = VoiceLeadingQuartet::new(
            ("C3".try_into().unwrap(), "D3".try_into().unwrap()),
            ("E4".try_into().unwrap(), "A4".try_into().unwrap()));
        assert!(vlq.hidden_fifth());
        assert!(!vlq.parallel_fifth());

        // Inner voices are not checked for hidden motion
        let d = possib(&["C3", "C4", "E4", "G4"]);
        let e = possib(&["C3", "D4", "A4", "A4"]);
        assert!(d.has_correct_voice_leading(&e, &voices, &rules));
    }

    #[test]
    fn test_voice_overlap() {
        let voices = VoiceSet::satb();
        let rules = RuleConfig {
            forbid_voice_overlap: true,
            ..no_rules()
        };
        // The tenor moves above where the alto just was
        let a = possib(&["C3", "G3", "C4", "E4"]);
        let b = possib(&["C3", "D4", "F4", "A4"]);
        assert!(!a.has_correct_voice_leading(&b, &voices, &rules));

        let c = possib(&["C3", "A3", "C4", "F4"]);
        assert!(a.has_correct_voice_leading(&c, &voices, &rules));
    }

    #[test]
    fn test_leap_limits() {
        let voices = VoiceSet::satb();
        let mut rules = no_rules();
        rules.per_voice_max_leap_semitones.insert(3, 2);
        let a = possib(&["C3", "G3", "E4", "C5"]);
        let step = possib(&["C3", "G3", "E4", "D5"]);
        let leap = possib(&["C3", "G3", "E4", "G5"]);
        assert!(a.has_correct_voice_leading(&step, &voices, &rules));
        assert!(!a.has_correct_voice_leading(&leap, &voices, &rules));
    }

    #[test]
    fn test_pitch_for() {
        let voices = VoiceSet::satb();
        let p = possib(&["C3", "G3", "E4", "C5"]);
        assert_eq!(p.pitch_for(&voices, "Alto"), Some(Pitch::try_from("E4").unwrap()));
        assert_eq!(p.pitch_for(&voices, "Baritone"), None);
        assert!(p.in_range(&voices));
        assert!(!possib(&["C2", "G3", "E4", "C5"]).in_range(&voices));
        assert_eq!(p.to_string(), "C3 G3 E4 C5");
    }
}
