use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use crate::core::{Key, Pitch};
use super::error::RealizerError;
use super::notation::Notation;
use super::possibility::Possibility;
use super::rules::RuleConfig;
use super::scale::PitchScale;
use super::segment::Segment;
use super::voice::VoiceSet;

/// Realizes a figured bass line: a key, voices, rules,
/// and the bass notes with their figures, in order.
#[derive(Debug, Clone)]
pub struct Realizer {
    pub key: Key,
    pub voices: VoiceSet,
    pub rules: RuleConfig,
    bass_line: Vec<(Pitch, String)>,
}

impl Realizer {
    pub fn new(key: Key, voices: VoiceSet, rules: RuleConfig) -> Realizer {
        Realizer {
            key,
            voices,
            rules,
            bass_line: vec![],
        }
    }

    /// Append a bass note and its figures to the line.
    pub fn add_element(&mut self, bass: Pitch, notation: &str) {
        self.bass_line.push((bass, notation.to_string()));
    }

    pub fn bass_line(&self) -> &[(Pitch, String)] {
        &self.bass_line
    }

    /// Build every segment, link them, and trim the possibilities
    /// that can't be part of a complete realization.
    pub fn solve(&self) -> Result<Realization, RealizerError> {
        if self.bass_line.is_empty() {
            return Err(RealizerError::EmptyBassLine);
        }
        let notations = self.bass_line.iter()
            .enumerate()
            .map(|(step, (_, raw))| {
                raw.parse::<Notation>().map_err(|source| RealizerError::InvalidNotation {
                    step,
                    notation: raw.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let scale = PitchScale::new(self.key);
        let mut segments: Vec<Segment> = Vec::with_capacity(self.bass_line.len());
        for (step, ((bass, _), notation)) in self.bass_line.iter().zip(&notations).enumerate() {
            let segment = match segments.last() {
                None => Segment::antecedent(step, *bass, notation, &scale, &self.voices, &self.rules)?,
                Some(prev) => Segment::consequent(prev, *bass, notation, &scale, &self.voices, &self.rules)?,
            };
            if segment.is_dead() {
                warn!("No possibilities for {} {} at step {}", bass, notation, step);
                return Err(RealizerError::NoSolution { step });
            }
            segments.push(segment);
        }

        let removed = trim_dead_ends(&mut segments);
        debug!("Trimmed {} possibilities", removed);
        if segments[0].is_dead() {
            warn!("Every path through the bass line runs into a dead end");
            return Err(RealizerError::NoSolution { step: 0 });
        }

        let realization = Realization {
            voices: self.voices.clone(),
            segments,
        };
        info!("Realized {} steps in {}: {} solutions",
            self.bass_line.len(), self.key, realization.num_solutions());
        Ok(realization)
    }
}

/// Keep only the possibilities of segment `s` where `keep` is set,
/// renumbering the movements into and out of it.
fn compact(segments: &mut [Segment], s: usize, keep: &[bool]) -> usize {
    let mut new_index: Vec<Option<usize>> = Vec::with_capacity(keep.len());
    let mut next = 0;
    for k in keep {
        if *k {
            new_index.push(Some(next));
            next += 1;
        } else {
            new_index.push(None);
        }
    }
    let removed = keep.len() - next;
    if removed == 0 {
        return 0;
    }

    let segment = &mut segments[s];
    let mut i = 0;
    segment.possibilities.retain(|_| {
        i += 1;
        keep[i - 1]
    });

    // Edges into this segment
    if let Some(movements) = segment.movements.as_mut() {
        for row in movements.iter_mut() {
            *row = row.iter().filter_map(|j| new_index[*j]).collect();
        }
    }

    // Edges out of this segment, one row per possibility
    if let Some(Some(movements)) = segments.get_mut(s + 1).map(|n| n.movements.as_mut()) {
        let mut i = 0;
        movements.retain(|_| {
            i += 1;
            keep[i - 1]
        });
    }
    removed
}

/// Remove possibilities that lie on no complete path: first those
/// with nowhere to go (sweeping back from the end), then those
/// nothing leads to (sweeping forward). Returns how many were removed.
///
/// Each removal only affects the neighbouring segment in the
/// direction of the sweep, so one pass each way reaches the fixed point.
pub(crate) fn trim_dead_ends(segments: &mut [Segment]) -> usize {
    let mut removed = 0;
    let last = segments.len().saturating_sub(1);
    for s in (0..last).rev() {
        let keep: Vec<bool> = match &segments[s + 1].movements {
            Some(movements) => movements.iter().map(|row| !row.is_empty()).collect(),
            None => continue,
        };
        removed += compact(segments, s, &keep);
    }

    for s in 1..segments.len() {
        let mut keep = vec![false; segments[s].possibilities.len()];
        if let Some(movements) = &segments[s].movements {
            for j in movements.iter().flatten() {
                keep[*j] = true;
            }
        }
        removed += compact(segments, s, &keep);
    }
    removed
}

/// The trimmed segments of a solved bass line. Every possibility
/// here belongs to at least one complete realization.
#[derive(Debug, Clone)]
pub struct Realization {
    voices: VoiceSet,
    segments: Vec<Segment>,
}

impl Realization {
    pub fn voices(&self) -> &VoiceSet {
        &self.voices
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of complete paths through the segments.
    pub fn num_solutions(&self) -> u128 {
        let mut counts: Vec<u128> = vec![1; self.segments[0].possibilities.len()];
        for segment in &self.segments[1..] {
            let mut next = vec![0u128; segment.possibilities.len()];
            if let Some(movements) = &segment.movements {
                for (i, row) in movements.iter().enumerate() {
                    for j in row {
                        next[*j] = next[*j].saturating_add(counts[i]);
                    }
                }
            }
            counts = next;
        }
        counts.iter().fold(0u128, |acc, c| acc.saturating_add(*c))
    }

    /// The realization that always takes the first choice.
    pub fn first_realization(&self) -> Vec<Possibility> {
        self.walk(|options| options.first().copied())
    }

    pub fn random_realization<R: Rng>(&self, rng: &mut R) -> Vec<Possibility> {
        self.walk(|options| options.choose(rng).copied())
    }

    pub fn random_realizations<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<Vec<Possibility>> {
        (0..n).map(|_| self.random_realization(rng)).collect()
    }

    /// Every realization, lazily, in the order of `first_realization`.
    pub fn all_realizations(&self) -> Realizations<'_> {
        Realizations::new(self)
    }

    fn walk<F>(&self, mut pick: F) -> Vec<Possibility>
        where F: FnMut(&[usize]) -> Option<usize>
    {
        let mut path = Vec::with_capacity(self.segments.len());
        let first: Vec<usize> = (0..self.segments[0].possibilities.len()).collect();
        let mut current = match pick(&first) {
            Some(i) => i,
            None => return path,
        };
        path.push(self.segments[0].possibilities[current].clone());
        for segment in &self.segments[1..] {
            let options = match &segment.movements {
                Some(movements) => &movements[current],
                None => break,
            };
            current = match pick(options) {
                Some(j) => j,
                None => break,
            };
            path.push(segment.possibilities[current].clone());
        }
        path
    }
}

/// Iterator over every path through a `Realization`,
/// advancing the last step first.
pub struct Realizations<'a> {
    realization: &'a Realization,

    /// Position within the choices at each step;
    /// `None` once exhausted.
    choices: Option<Vec<usize>>,
}

impl<'a> Realizations<'a> {
    fn new(realization: &'a Realization) -> Realizations<'a> {
        let mut iter = Realizations {
            realization,
            choices: Some(vec![]),
        };
        if !iter.descend(0) {
            iter.choices = None;
        }
        iter
    }

    fn options(&self, choices: &[usize], s: usize) -> &'a [usize] {
        let realization: &'a Realization = self.realization;
        let segments = &realization.segments;
        match (s, &segments[s].movements) {
            (0, _) | (_, None) => &[],
            (_, Some(movements)) => {
                let prev = self.index(choices, s - 1);
                &movements[prev]
            }
        }
    }

    fn index(&self, choices: &[usize], s: usize) -> usize {
        if s == 0 {
            choices[0]
        } else {
            self.options(choices, s)[choices[s]]
        }
    }

    fn len_at(&self, choices: &[usize], s: usize) -> usize {
        if s == 0 {
            self.realization.segments[0].possibilities.len()
        } else {
            self.options(choices, s).len()
        }
    }

    /// Fill in first choices from step `from` to the end.
    fn descend(&mut self, from: usize) -> bool {
        let mut choices = match self.choices.take() {
            Some(choices) => choices,
            None => return false,
        };
        choices.truncate(from);
        for s in from..self.realization.segments.len() {
            if self.len_at(&choices, s) == 0 {
                return false;
            }
            choices.push(0);
        }
        self.choices = Some(choices);
        true
    }

    fn current(&self, choices: &[usize]) -> Vec<Possibility> {
        self.realization.segments.iter()
            .enumerate()
            .map(|(s, segment)| segment.possibilities[self.index(choices, s)].clone())
            .collect()
    }
}

impl<'a> Iterator for Realizations<'a> {
    type Item = Vec<Possibility>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut choices = self.choices.take()?;
        let item = self.current(&choices);

        // Advance the deepest step that has another choice left
        let mut s = choices.len();
        while s > 0 {
            s -= 1;
            if choices[s] + 1 < self.len_at(&choices, s) {
                choices[s] += 1;
                self.choices = Some(choices);
                if !self.descend(s + 1) {
                    // Trimmed segments always continue
                    self.choices = None;
                }
                return Some(item);
            }
        }
        Some(item)
    }
}
