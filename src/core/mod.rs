mod pitch;
mod interval;
mod key;
mod chord;

pub use pitch::{Letter, Pitch, PitchName, PitchParseError, MAX_ACCIDENTAL};
pub use interval::{Interval, IntervalParseError};
pub use key::{Key, KeyParseError, Mode};
pub use chord::{AugmentedSixth, Chord, Member, Triad};
