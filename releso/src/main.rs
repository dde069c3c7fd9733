// src/main.rs
//
// CLI entrypoint for exercising a geometry config.
//
// - Loads a YAML/JSON geometry config and builds the shape.
// - Prints a run header (shape, action space, cfg hash, steps, seed).
// - Applies --steps seeded random agent actions, optionally exporting a
//   JSONL snapshot per step.
// - Resets and checks that the original shape is restored.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use releso::config::GeometryConfig;
use releso::export::{GeometrySnapshot, SnapshotWriter};
use releso::rl::action_encoding::{ActionSpaceSpec, CONTINUOUS_HIGH, CONTINUOUS_LOW};
use releso::rl::geometry::GeometryAction;

#[derive(Debug, Parser)]
#[command(
    name = "releso",
    about = "Parametric shape action-space harness (B-spline / NURBS / cube)",
    version
)]
struct Args {
    /// Geometry config (.yaml/.yml or .json).
    #[arg(long)]
    config: PathBuf,

    /// Number of random agent actions to apply.
    #[arg(long, default_value_t = 10)]
    steps: u64,

    /// Seed for the action sequence (overrides the config seed).
    #[arg(long)]
    seed: Option<u64>,

    /// Force continuous actions regardless of the config.
    #[arg(long)]
    continuous: bool,

    /// Write one JSONL snapshot per step to this file.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Verbosity: -v, -vv
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn fnv1a64(s: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut h = FNV_OFFSET;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = GeometryConfig::from_file(&args.config)
        .with_context(|| format!("failed to load geometry config {}", args.config.display()))?;
    if args.continuous {
        config.discrete_actions = false;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let cfg_hash = fnv1a64(&format!("{config:?}"));

    let mut geometry = config.build().context("failed to build shape definition")?;
    geometry.setup(args.config.display().to_string());

    let space = geometry.action_space();
    println!(
        "releso | shape={} | action_space={} | cfg_hash=0x{:016x} | steps={} | seed={}",
        geometry.shape_definition().kind(),
        serde_json::to_string(&space)?,
        cfg_hash,
        args.steps,
        config.seed
    );

    let original = geometry.control_points();
    let mut writer = match &args.export {
        Some(path) => {
            let mut writer = SnapshotWriter::create(path, false)
                .with_context(|| format!("failed to open export file {}", path.display()))?;
            writer.write(&GeometrySnapshot::capture(&geometry, 0))?;
            Some(writer)
        }
        None => None,
    };

    let k = geometry.action_count();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut applied = 0u64;
    if k == 0 {
        warn!("Shape has no action variables; skipping the action loop.");
    } else {
        for step in 1..=args.steps {
            let action = match space {
                ActionSpaceSpec::Discrete { n } => GeometryAction::Discrete(rng.gen_range(0..n)),
                ActionSpaceSpec::Box { .. } => GeometryAction::Continuous(
                    (0..k)
                        .map(|_| rng.gen_range(CONTINUOUS_LOW..=CONTINUOUS_HIGH))
                        .collect(),
                ),
            };
            geometry.apply_action(&action)?;
            applied += 1;
            if let Some(writer) = writer.as_mut() {
                writer.write(&GeometrySnapshot::capture(&geometry, step))?;
            }
        }
    }

    let snapshots = match writer.as_mut() {
        Some(writer) => {
            writer.flush()?;
            info!("Wrote {} snapshots to {}.", writer.written(), writer.path().display());
            writer.written()
        }
        None => 0,
    };

    let changed = geometry.is_geometry_changed();
    let reset = geometry.reset(Some(config.seed));
    let restored = if config.reset_with_random_action_values {
        // Random resets move away from the original shape on purpose.
        "randomised"
    } else if reset == original {
        "ok"
    } else {
        bail!("reset did not restore the original control points");
    };

    println!(
        "done | actions={} | changed={} | reset={} | snapshots={}",
        applied, changed, restored, snapshots
    );
    Ok(())
}
