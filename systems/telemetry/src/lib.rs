#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Event-stream telemetry observer for shells and replay verification.

use std::fmt::Write as _;

use gridfire_core::{Event, ProjectileSource};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Session-wide counters accumulated from the world's event stream.
///
/// The fingerprint folds every observed event, so two sessions that report
/// the same value ran the same simulation tick for tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionReport {
    /// Ticks the simulation has advanced.
    pub ticks: u64,
    /// Actors admitted to the roster.
    pub actors_spawned: u64,
    /// Actors whose health reached zero.
    pub actors_died: u64,
    /// Actors removed from the roster for any reason.
    pub actors_removed: u64,
    /// Step requests the world committed.
    pub steps_committed: u64,
    /// Step requests that exhausted the fallback search.
    pub steps_stuck: u64,
    /// Steps that finished with an arrival.
    pub arrivals: u64,
    /// Projectiles fired by the player.
    pub player_shots: u64,
    /// Projectiles fired by actors.
    pub actor_shots: u64,
    /// Non-lethal hits on actors.
    pub strikes: u64,
    /// Items dropped into the level.
    pub pickups: u64,
    /// Total distance the view has scrolled, in world units.
    pub scroll_distance: f32,
    /// Order-sensitive digest of every observed event.
    pub fingerprint: u64,
}

impl Default for SessionReport {
    fn default() -> Self {
        Self {
            ticks: 0,
            actors_spawned: 0,
            actors_died: 0,
            actors_removed: 0,
            steps_committed: 0,
            steps_stuck: 0,
            arrivals: 0,
            player_shots: 0,
            actor_shots: 0,
            strikes: 0,
            pickups: 0,
            scroll_distance: 0.0,
            fingerprint: FNV_OFFSET,
        }
    }
}

/// Pure telemetry system that aggregates the event stream it is shown.
///
/// The system never emits commands; shells read the accumulated
/// [`SessionReport`] when they want to print or compare a session.
#[derive(Debug, Default)]
pub struct Telemetry {
    report: SessionReport,
    last_scroll: Option<f32>,
    scratch: String,
}

impl Telemetry {
    /// Creates a new telemetry system with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the report accumulated so far.
    #[must_use]
    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    /// Consumes one batch of world events.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            self.fold(event);
            match event {
                Event::TerrainLoaded { .. } => {
                    // The next ViewScrolled establishes the new baseline.
                    self.last_scroll = None;
                }
                Event::TimeAdvanced { .. } => self.report.ticks += 1,
                Event::ActorSpawned { .. } => self.report.actors_spawned += 1,
                Event::ActorDied { .. } => self.report.actors_died += 1,
                Event::ActorRemoved { .. } => self.report.actors_removed += 1,
                Event::ActorStepCommitted { .. } => self.report.steps_committed += 1,
                Event::ActorStepStuck { .. } => self.report.steps_stuck += 1,
                Event::ActorArrived { .. } => self.report.arrivals += 1,
                Event::ProjectileFired { source, .. } => match source {
                    ProjectileSource::Player => self.report.player_shots += 1,
                    ProjectileSource::Actor(_) => self.report.actor_shots += 1,
                },
                Event::ActorDamaged { .. } => self.report.strikes += 1,
                Event::PickupSpawned { .. } => self.report.pickups += 1,
                Event::ViewScrolled { offset } => {
                    let next = offset.get();
                    if let Some(last) = self.last_scroll {
                        self.report.scroll_distance += (last - next).max(0.0);
                    }
                    self.last_scroll = Some(next);
                }
                _ => {}
            }
        }
    }

    /// Folds one event into the order-sensitive FNV-1a fingerprint.
    fn fold(&mut self, event: &Event) {
        self.scratch.clear();
        let _ = write!(&mut self.scratch, "{event:?}");
        for byte in self.scratch.as_bytes() {
            self.report.fingerprint =
                (self.report.fingerprint ^ u64::from(*byte)).wrapping_mul(FNV_PRIME);
        }
    }
}
