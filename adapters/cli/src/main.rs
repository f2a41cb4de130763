#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Gridfire sessions.
//!
//! The shell loads a level map, spawn manifest and optional archetype tuning,
//! then drives the fixed-step loop and prints a closing telemetry report.
//! Sessions can be recorded to and replayed from single-line scripts, which
//! pin the seed and the per-tick input frames.

mod level_format;
mod replay_transfer;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context as _};
use clap::Parser;
use gridfire_core::{archetype::ArchetypeCatalog, Command, Event};
use gridfire_system_behavior::{Behavior, Config as BehaviorConfig};
use gridfire_system_bootstrap::Bootstrap;
use gridfire_system_control::{released_frame, Config as ControlConfig, Control};
use gridfire_system_telemetry::{SessionReport, Telemetry};
use gridfire_world::{apply, query, World};
use rand::{RngCore as _, SeedableRng as _};
use rand_chacha::ChaCha8Rng;

use crate::replay_transfer::ReplayScript;

/// Command-line arguments accepted by the Gridfire shell.
#[derive(Debug, Parser)]
#[command(name = "gridfire", version, about = "Headless Gridfire session runner")]
struct Args {
    /// Level tile map: one row per line, one hex digit per tile.
    level: PathBuf,

    /// Spawn manifest: line-oriented key=value text.
    manifest: PathBuf,

    /// Archetype tuning TOML; the builtin catalog applies when omitted.
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Session seed; a fresh one is drawn when neither this nor a replay supplies one.
    #[arg(long, conflicts_with = "replay")]
    seed: Option<u64>,

    /// Fixed steps to simulate; a replay script overrides this with its frame count.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Replay script to drive the session from.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// File the session's input script is written to after the run.
    #[arg(long)]
    record: Option<PathBuf>,

    /// Print every event the world emits.
    #[arg(long)]
    transcript: bool,
}

/// Entry point for the Gridfire command-line shell.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level_text = fs::read_to_string(&args.level)
        .with_context(|| format!("reading level map {}", args.level.display()))?;
    let rows = level_format::parse_level(&level_text)
        .with_context(|| format!("parsing level map {}", args.level.display()))?;

    let manifest_text = fs::read_to_string(&args.manifest)
        .with_context(|| format!("reading spawn manifest {}", args.manifest.display()))?;
    let manifest = level_format::parse_manifest(&manifest_text)
        .with_context(|| format!("parsing spawn manifest {}", args.manifest.display()))?;
    if let Some(entry) = manifest
        .spawns
        .iter()
        .find(|entry| entry.tile.row() >= rows.len() as i32)
    {
        bail!(
            "spawn '{}' sits at row {}, below the level's {} rows",
            entry.archetype,
            entry.tile.row(),
            rows.len()
        );
    }

    let catalog = match &args.tuning {
        Some(path) => {
            let tuning_text = fs::read_to_string(path)
                .with_context(|| format!("reading archetype tuning {}", path.display()))?;
            level_format::parse_tuning(&tuning_text)
                .with_context(|| format!("parsing archetype tuning {}", path.display()))?
        }
        None => ArchetypeCatalog::builtin(),
    };

    let script = match &args.replay {
        Some(path) => {
            let script_text = fs::read_to_string(path)
                .with_context(|| format!("reading replay script {}", path.display()))?;
            let script = ReplayScript::decode(&script_text)
                .with_context(|| format!("decoding replay script {}", path.display()))?;
            Some(script)
        }
        None => None,
    };

    let seed = match (&script, args.seed) {
        (Some(script), _) => script.seed,
        (None, Some(seed)) => seed,
        (None, None) => rand::random(),
    };
    // One master seed fans out into the per-system streams.
    let mut streams = ChaCha8Rng::seed_from_u64(seed);
    let world_seed = streams.next_u64();
    let behavior_seed = streams.next_u64();

    let ticks = script
        .as_ref()
        .map_or(args.ticks as usize, |script| script.frames.len());

    let mut world = World::new();
    let bootstrap = Bootstrap::default();
    println!("{}", bootstrap.welcome_banner(&world));

    let mut events = Vec::new();
    apply(&mut world, Command::ConfigureArchetypes { catalog }, &mut events);
    apply(
        &mut world,
        Command::LoadTerrain {
            rows,
            classifier: manifest.classifier.clone(),
        },
        &mut events,
    );
    apply(&mut world, Command::SeedSession { seed: world_seed }, &mut events);
    for entry in &manifest.spawns {
        apply(
            &mut world,
            Command::SpawnActor {
                archetype: entry.archetype.clone(),
                tile: entry.tile,
            },
            &mut events,
        );
    }

    let summary = bootstrap.boot_summary(&world);
    println!(
        "seed {seed}: {} rows, {} actors, scroll begins at {:.0}",
        summary.terrain_rows,
        summary.actors,
        summary.scroll.get()
    );

    let mut behavior = Behavior::new(BehaviorConfig::new(behavior_seed));
    let mut control = Control::new(ControlConfig::default());
    let mut telemetry = Telemetry::new();
    let mut commands = Vec::new();
    let mut recorded = Vec::with_capacity(ticks);

    telemetry.handle(&events);
    if args.transcript {
        print_transcript(&events);
    }

    for tick in 0..ticks {
        let frame = script
            .as_ref()
            .and_then(|script| script.frames.get(tick).copied())
            .unwrap_or_else(released_frame);

        commands.clear();
        let player = query::player(&world);
        let actors = query::actors(&world);
        let scroll = query::scroll_offset(&world);
        control.handle(&events, frame, &player, scroll, &mut commands);
        behavior.handle(
            &events,
            &actors,
            &player,
            query::terrain(&world),
            scroll,
            query::archetypes(&world),
            &mut commands,
        );

        events.clear();
        for command in commands.drain(..) {
            apply(&mut world, command, &mut events);
        }
        apply(&mut world, Command::Tick, &mut events);

        telemetry.handle(&events);
        if args.transcript {
            print_transcript(&events);
        }
        recorded.push(frame);
    }

    print_report(telemetry.report());

    if let Some(path) = &args.record {
        let script = ReplayScript {
            seed,
            frames: recorded,
        };
        fs::write(path, script.encode())
            .with_context(|| format!("writing replay script {}", path.display()))?;
        println!("recorded {ticks} frames to {}", path.display());
    }

    Ok(())
}

fn print_transcript(events: &[Event]) {
    for event in events {
        println!("  {event:?}");
    }
}

fn print_report(report: &SessionReport) {
    println!(
        "{} ticks: {} spawned, {} died, {} removed, {} arrivals",
        report.ticks,
        report.actors_spawned,
        report.actors_died,
        report.actors_removed,
        report.arrivals
    );
    println!(
        "steps {} committed / {} stuck, shots {} player / {} actor, {} strikes, {} pickups",
        report.steps_committed,
        report.steps_stuck,
        report.player_shots,
        report.actor_shots,
        report.strikes,
        report.pickups
    );
    println!(
        "scrolled {:.1} units, fingerprint {:016x}",
        report.scroll_distance, report.fingerprint
    );
}
