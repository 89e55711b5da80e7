use midly::{
    Smf, Header, Format, Timing,
    TrackEvent, TrackEventKind,
    MidiMessage, MetaMessage};
use midly::num::{u4, u7, u15, u24, u28};
use std::path::Path;
use anyhow::{bail, Result};
use crate::figured_bass::Possibility;

// Largest value a u24 holds
const MAX_US_PER_BEAT: usize = 0xFF_FFFF;

/// Convert bpm to microseconds/beat (per quarter note)
/// Reference point: 60bpm is 1,000,000us/beat
fn bpm_to_us_per_beat(bpm: usize) -> Result<u24> {
    if bpm == 0 {
        bail!("Tempo must be above 0 bpm");
    }
    let us = 60_000_000/bpm;
    if us > MAX_US_PER_BEAT {
        bail!("Tempo of {} bpm is too slow for a MIDI file", bpm);
    }
    Ok(u24::from(us as u32))
}

fn midi_keys(possibility: &Possibility) -> Result<Vec<u7>> {
    possibility.pitches().iter().map(|pitch| {
        let midi = pitch.midi();
        if !(0..=127).contains(&midi) {
            bail!("{} is outside the MIDI range", pitch);
        }
        Ok(u7::from(midi as u8))
    }).collect()
}

/// Write a realization as a single track, one chord per beat,
/// every voice on the same channel.
pub fn save_to_midi_file<P: AsRef<Path>>(tempo: usize, ticks_per_beat: usize, realization: &[Possibility], path: P) -> Result<()> {
    let channel = u4::new(0);
    let velocity = u7::from(64);
    let mut track: Vec<TrackEvent> = vec![];

    // Delta times are in ticks
    let start = u28::from(0);
    let same_time = u28::from(0);
    let beat = u28::from(ticks_per_beat as u32);

    let tempo = bpm_to_us_per_beat(tempo)?;
    let ticks_per_beat = u15::from(ticks_per_beat as u16);

    // Default MIDI time is 4/4 so we exclude that MetaMessage
    track.push(TrackEvent {
        delta: start,
        kind: TrackEventKind::Meta(MetaMessage::Tempo(tempo))
    });
    track.push(TrackEvent {
        delta: start,
        kind: TrackEventKind::Meta(MetaMessage::TrackName(b"Continuo"))
    });

    for possibility in realization {
        let keys = midi_keys(possibility)?;
        for key in &keys {
            track.push(TrackEvent {
                delta: same_time,
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn { key: *key, vel: velocity }
                }
            });
        }
        for (i, key) in keys.iter().enumerate() {
            let delta = if i == 0 { beat } else { same_time };
            track.push(TrackEvent {
                delta,
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff { key: *key, vel: velocity }
                }
            });
        }
    }

    track.push(TrackEvent {
        delta: start,
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack)
    });
    let smf = Smf {
        header: Header {
            format: Format::SingleTrack,
            timing: Timing::Metrical(ticks_per_beat)
        },
        tracks: vec![track],
    };
    smf.save(path)?;
    Ok(())
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::core::Pitch;

    #[test]
    fn test_bpm_to_us_per_beat() {
        assert_eq!(bpm_to_us_per_beat(60).unwrap().as_int(), 1_000_000);
        assert_eq!(bpm_to_us_per_beat(120).unwrap().as_int(), 500_000);
        assert_eq!(bpm_to_us_per_beat(150).unwrap().as_int(), 400_000);
        assert_eq!(bpm_to_us_per_beat(4).unwrap().as_int(), 15_000_000);

        assert!(bpm_to_us_per_beat(0).is_err());
        assert!(bpm_to_us_per_beat(3).is_err());
    }

    #[test]
    fn test_midi_keys() {
        let pitches: Vec<Pitch> = ["C3", "G3", "E4", "C5"].iter()
            .map(|p| (*p).try_into().unwrap())
            .collect();
        let keys = midi_keys(&Possibility::new(pitches)).unwrap();
        let keys: Vec<u8> = keys.iter().map(|k| k.as_int()).collect();
        assert_eq!(keys, vec![48, 55, 64, 72]);

        let low: Pitch = "C-2".try_into().unwrap();
        assert!(midi_keys(&Possibility::new(vec![low])).is_err());
    }
}
