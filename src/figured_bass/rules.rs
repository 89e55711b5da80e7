use serde::Deserialize;
use std::collections::BTreeMap;
use super::voice::{VoiceId, VoiceSet};

/// Which voice-leading rules a realization enforces.
///
/// Built once before solving and only read afterwards; every
/// field can be set from YAML, and missing fields take the
/// defaults below.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleConfig {
    // Single possibility rules
    pub forbid_incomplete_possibilities: bool,
    pub upper_voices_max_semitone_separation: Option<usize>,
    pub forbid_voice_crossing: bool,

    // Consecutive possibility rules
    pub forbid_parallel_fifths: bool,
    pub forbid_parallel_octaves: bool,
    pub forbid_hidden_fifths: bool,
    pub forbid_hidden_octaves: bool,
    pub forbid_voice_overlap: bool,

    /// Leap limits by voice index (0 = bass). These take
    /// precedence over a voice's own `max_leap`.
    pub per_voice_max_leap_semitones: BTreeMap<usize, usize>,

    // Special resolutions
    pub resolve_dominant_seventh_properly: bool,
    pub resolve_diminished_seventh_properly: bool,
    pub resolve_augmented_sixth_properly: bool,
    pub doubled_root_in_diminished_seventh: bool,
    pub apply_single_possibility_rules_to_resolution: bool,
    pub apply_consecutive_possibility_rules_to_resolution: bool,

    /// Upper bound on the voicings enumerated for a single bass note.
    pub max_possibilities_per_segment: usize,
}

impl RuleConfig {
    /// The leap limit in force for a voice, if any.
    pub fn leap_limit(&self, voices: &VoiceSet, id: VoiceId) -> Option<usize> {
        self.per_voice_max_leap_semitones.get(&id.index())
            .copied()
            .or(voices.get(id).max_leap)
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig {
            forbid_incomplete_possibilities: true,
            upper_voices_max_semitone_separation: Some(12),
            forbid_voice_crossing: true,

            forbid_parallel_fifths: true,
            forbid_parallel_octaves: true,
            forbid_hidden_fifths: true,
            forbid_hidden_octaves: true,
            forbid_voice_overlap: true,
            per_voice_max_leap_semitones: BTreeMap::new(),

            resolve_dominant_seventh_properly: true,
            resolve_diminished_seventh_properly: true,
            resolve_augmented_sixth_properly: true,
            doubled_root_in_diminished_seventh: false,
            apply_single_possibility_rules_to_resolution: false,
            apply_consecutive_possibility_rules_to_resolution: false,

            max_possibilities_per_segment: 100_000,
        }
    }
}
