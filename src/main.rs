use clap::{Parser, ValueHint};
use std::{fs::File, io::BufReader, path::PathBuf};
use anyhow::{Context, Result};
use log::info;
use rand::{SeedableRng, rngs::StdRng};
use continuo::figured_bass::{Possibility, RealizationRequest, VoiceSet};
use continuo::file::save_to_midi_file;

const TICKS_PER_BEAT: usize = 480;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// YAML file with the key, voices, rules and bass line
    #[clap(value_hint = ValueHint::FilePath)]
    request: PathBuf,

    /// Pick realizations at random instead of the first ones
    #[clap(short, long)]
    random: bool,

    /// Seed for --random
    #[clap(long)]
    seed: Option<u64>,

    /// How many realizations to print
    #[clap(short, long, default_value = "1")]
    count: usize,

    /// Write the first printed realization to this MIDI file
    #[clap(short, long, value_hint = ValueHint::FilePath)]
    midi: Option<PathBuf>,

    #[clap(short, long, default_value = "80")]
    tempo: usize,
}

fn print_realization(voices: &VoiceSet, realization: &[Possibility]) {
    println!("{}", voices.labels().join(" "));
    for possibility in realization {
        println!("{}", possibility);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.request)
        .with_context(|| format!("could not open {}", args.request.display()))?;
    let reader = BufReader::new(file);
    let request = RealizationRequest::from_reader(reader)
        .context("error while reading yaml")?;
    let realizer = request.realizer()?;
    info!("Realizing {} notes in {}", realizer.bass_line().len(), realizer.key);

    let realization = realizer.solve()?;
    println!("{} solutions", realization.num_solutions());

    let realizations = if args.random {
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        realization.random_realizations(args.count, &mut rng)
    } else {
        realization.all_realizations().take(args.count).collect()
    };

    for (i, r) in realizations.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_realization(realization.voices(), r);
    }

    if let (Some(path), Some(first)) = (&args.midi, realizations.first()) {
        save_to_midi_file(args.tempo, TICKS_PER_BEAT, first, path)?;
        info!("Saved to {}", path.display());
    }
    Ok(())
}
