#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic behavior system that turns actor state into movement and
//! fire intent.
//!
//! One generic state machine drives every archetype; the catalog's policy
//! records supply the thresholds, phase tables, and weapon tuning that make
//! the archetypes behave differently. The system is pure: it consumes world
//! events and immutable views and emits commands, never touching world state
//! directly.

pub mod line_of_sight;

use gridfire_core::{
    archetype::{ArchetypeCatalog, ArchetypePolicy, PhaseAction, PhaseSpec},
    ActorId, ActorSnapshot, ActorView, Command, Direction, Event, PlayerView, ScrollOffset,
    TerrainView, WorldPoint, TILE_LENGTH,
};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// Configuration parameters required to construct the behavior system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided jitter seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that reacts to world events and emits behavior commands.
#[derive(Debug)]
pub struct Behavior {
    rng: JitterRng,
    seats: Vec<Seat>,
}

impl Behavior {
    /// Creates a new behavior system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: JitterRng::new(config.rng_seed),
            seats: Vec::new(),
        }
    }

    /// Consumes world events and immutable views to emit behavior commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        actors: &ActorView,
        player: &PlayerView,
        terrain: TerrainView<'_>,
        scroll: ScrollOffset,
        catalog: &ArchetypeCatalog,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::ActorRemoved { actor } => {
                    self.seats.retain(|seat| seat.actor != *actor);
                }
                Event::TerrainLoaded { .. } | Event::ArchetypesConfigured { .. } => {
                    self.seats.clear();
                }
                _ => {}
            }
        }

        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        for snapshot in actors.iter() {
            if snapshot.dying {
                continue;
            }
            if snapshot.dormant {
                self.drive_reentry(snapshot, scroll, catalog, out);
                continue;
            }
            self.drive_actor(snapshot, player, terrain, catalog, out);
        }
    }

    /// Off-band actors stay frozen, except that a stuck one keeps retrying
    /// the step that brings it back toward the visible band.
    fn drive_reentry(
        &mut self,
        snapshot: &ActorSnapshot,
        scroll: ScrollOffset,
        catalog: &ArchetypeCatalog,
        out: &mut Vec<Command>,
    ) {
        if !snapshot.stuck || !snapshot.idle {
            return;
        }

        let direction = if snapshot.position.y() < scroll.get() {
            Direction::South
        } else {
            Direction::North
        };
        let policy = catalog.policy(snapshot.archetype);
        let index = self.seat_index(snapshot, policy);
        let pace = policy.phases[self.seats[index].phase].pace;
        out.push(Command::StepActor {
            actor: snapshot.id,
            direction,
            pace,
        });
    }

    fn drive_actor(
        &mut self,
        snapshot: &ActorSnapshot,
        player: &PlayerView,
        terrain: TerrainView<'_>,
        catalog: &ArchetypeCatalog,
        out: &mut Vec<Command>,
    ) {
        let policy = catalog.policy(snapshot.archetype);
        let index = self.seat_index(snapshot, policy);
        let seat = &mut self.seats[index];

        seat.fire_cooldown = seat.fire_cooldown.saturating_sub(1);

        let center = actor_center(snapshot);
        let target = player.center();

        if player.alive {
            match seat.locked {
                Some(LockedState::Retreat { remaining }) => {
                    if remaining > 0 {
                        seat.locked = Some(LockedState::Retreat {
                            remaining: remaining - 1,
                        });
                        push_retreat_step(snapshot, policy, center, target, out);
                        return;
                    }
                    seat.locked = None;
                    seat.phase_ticks =
                        sample_phase_ticks(&mut self.rng, &policy.phases[seat.phase]);
                }
                Some(LockedState::Aim(mut aim)) => {
                    match aim.stage {
                        AimStage::Windup => {
                            if aim.remaining > 0 {
                                aim.remaining -= 1;
                            } else if let Some(spec) = policy.aim {
                                aim.stage = AimStage::Track;
                                aim.remaining = spec.track.get();
                            }
                            seat.locked = Some(LockedState::Aim(aim));
                        }
                        AimStage::Track => {
                            // Solid cover mid-track abandons the shot.
                            if policy.fire.los_gated
                                && line_of_sight::check(center, target, &terrain)
                                    == line_of_sight::Obstruction::High
                            {
                                seat.locked = None;
                                seat.phase_ticks =
                                    sample_phase_ticks(&mut self.rng, &policy.phases[seat.phase]);
                                return;
                            }
                            if aim.remaining > 0 {
                                aim.remaining -= 1;
                                if let Some(spec) = policy.aim {
                                    aim.angle_degrees = rotate_toward(
                                        aim.angle_degrees,
                                        angle_to(center, target),
                                        spec.degrees_per_tick,
                                    );
                                }
                                seat.locked = Some(LockedState::Aim(aim));
                            } else {
                                seat.locked = None;
                                seat.phase_ticks =
                                    sample_phase_ticks(&mut self.rng, &policy.phases[seat.phase]);
                                if sight_permits(policy, center, target, player, terrain) {
                                    out.push(Command::FireActorGun {
                                        actor: snapshot.id,
                                        angle_degrees: aim.angle_degrees,
                                    });
                                    seat.fire_cooldown = policy.fire.cooldown.get();
                                }
                            }
                        }
                    }
                    return;
                }
                None => {}
            }

            // A close player may force the panic retreat regardless of where
            // the phase timer stands.
            if let Some(retreat) = policy.retreat {
                let distance = center.distance_to(target);
                if distance < retreat.trigger_distance
                    && self.rng.percent() < retreat.chance_percent
                {
                    seat.locked = Some(LockedState::Retreat {
                        remaining: retreat.duration.get(),
                    });
                    push_retreat_step(snapshot, policy, center, target, out);
                    return;
                }
            }
        } else {
            // A dead player ends any lock; the phase cycle keeps the actor
            // wandering around where the player last stood.
            seat.locked = None;
        }

        advance_phase_timer(seat, policy, &mut self.rng);

        let phase = &policy.phases[seat.phase];
        let distance = center.distance_to(target);
        match phase.action {
            PhaseAction::Advance => {
                if distance > policy.near_band && snapshot.idle {
                    if let Some(direction) = direction_toward(center, target) {
                        out.push(Command::StepActor {
                            actor: snapshot.id,
                            direction,
                            pace: phase.pace,
                        });
                    }
                }
            }
            PhaseAction::Withdraw => {
                if snapshot.idle {
                    if let Some(direction) = direction_toward(target, center) {
                        out.push(Command::StepActor {
                            actor: snapshot.id,
                            direction,
                            pace: phase.pace,
                        });
                    }
                }
            }
            PhaseAction::HoldGround => {}
            PhaseAction::Engage => {
                if distance > policy.far_band {
                    if snapshot.idle {
                        if let Some(direction) = direction_toward(center, target) {
                            out.push(Command::StepActor {
                                actor: snapshot.id,
                                direction,
                                pace: phase.pace,
                            });
                        }
                    }
                } else if player.alive
                    && seat.fire_cooldown == 0
                    && sight_permits(policy, center, target, player, terrain)
                {
                    match policy.aim {
                        Some(spec) => {
                            seat.locked = Some(LockedState::Aim(AimState {
                                stage: AimStage::Windup,
                                remaining: spec.windup.get(),
                                angle_degrees: angle_to(center, target)
                                    + self.rng.degrees(policy.fire.spread_degrees),
                            }));
                        }
                        None => {
                            out.push(Command::FireActorGun {
                                actor: snapshot.id,
                                angle_degrees: angle_to(center, target)
                                    + self.rng.degrees(policy.fire.spread_degrees),
                            });
                            seat.fire_cooldown = policy.fire.cooldown.get();
                        }
                    }
                }
            }
        }
    }

    fn seat_index(&mut self, snapshot: &ActorSnapshot, policy: &ArchetypePolicy) -> usize {
        if let Some(index) = self
            .seats
            .iter()
            .position(|seat| seat.actor == snapshot.id)
        {
            return index;
        }

        let phase_ticks = sample_phase_ticks(&mut self.rng, &policy.phases[0]);
        self.seats.push(Seat {
            actor: snapshot.id,
            phase: 0,
            phase_ticks,
            fire_cooldown: 0,
            locked: None,
        });
        self.seats.len() - 1
    }
}

fn sight_permits(
    policy: &ArchetypePolicy,
    origin: WorldPoint,
    target: WorldPoint,
    player: &PlayerView,
    terrain: TerrainView<'_>,
) -> bool {
    if !policy.fire.los_gated {
        return true;
    }
    line_of_sight::check(origin, target, &terrain)
        .permits_fire(player.posture.exposes_above_low_cover())
}

fn push_retreat_step(
    snapshot: &ActorSnapshot,
    policy: &ArchetypePolicy,
    center: WorldPoint,
    threat: WorldPoint,
    out: &mut Vec<Command>,
) {
    if !snapshot.idle {
        return;
    }
    let Some(retreat) = policy.retreat else {
        return;
    };
    if let Some(direction) = direction_toward(threat, center) {
        out.push(Command::StepActor {
            actor: snapshot.id,
            direction,
            pace: retreat.pace,
        });
    }
}

fn advance_phase_timer(seat: &mut Seat, policy: &ArchetypePolicy, rng: &mut JitterRng) {
    seat.phase_ticks = seat.phase_ticks.saturating_sub(1);
    if seat.phase_ticks == 0 {
        seat.phase = (seat.phase + 1) % policy.phases.len();
        seat.phase_ticks = sample_phase_ticks(rng, &policy.phases[seat.phase]);
    }
}

fn sample_phase_ticks(rng: &mut JitterRng, phase: &PhaseSpec) -> u32 {
    phase.base_ticks.get() + rng.ticks(phase.jitter_ticks.get())
}

fn actor_center(snapshot: &ActorSnapshot) -> WorldPoint {
    snapshot.position.offset(TILE_LENGTH / 2.0, TILE_LENGTH / 2.0)
}

/// Cardinal direction whose axis carries the larger share of the distance
/// from one point toward another; vertical wins ties. `None` when the points
/// coincide.
fn direction_toward(from: WorldPoint, to: WorldPoint) -> Option<Direction> {
    let dx = to.x() - from.x();
    let dy = to.y() - from.y();
    if dx == 0.0 && dy == 0.0 {
        return None;
    }

    if dx.abs() > dy.abs() {
        Some(if dx > 0.0 {
            Direction::East
        } else {
            Direction::West
        })
    } else {
        Some(if dy > 0.0 {
            Direction::South
        } else {
            Direction::North
        })
    }
}

/// Angle in degrees from origin to target; zero points east, ninety points
/// up the map.
fn angle_to(origin: WorldPoint, target: WorldPoint) -> f32 {
    let dx = target.x() - origin.x();
    let dy = origin.y() - target.y();
    dy.atan2(dx).to_degrees()
}

/// Rotates the current angle toward the target by at most `rate` degrees,
/// following the shorter arc.
fn rotate_toward(current: f32, target: f32, rate: f32) -> f32 {
    let mut delta = (target - current) % 360.0;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    current + delta.clamp(-rate, rate)
}

/// Per-actor behavior bookkeeping carried across ticks.
#[derive(Debug)]
struct Seat {
    actor: ActorId,
    phase: usize,
    phase_ticks: u32,
    fire_cooldown: u32,
    locked: Option<LockedState>,
}

/// Sub-states that park the cyclic phase timer until they resolve.
#[derive(Clone, Copy, Debug)]
enum LockedState {
    Retreat { remaining: u32 },
    Aim(AimState),
}

#[derive(Clone, Copy, Debug)]
struct AimState {
    stage: AimStage,
    remaining: u32,
    angle_degrees: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AimStage {
    Windup,
    Track,
}

/// Deterministic linear congruential source for behavior jitter.
#[derive(Debug)]
struct JitterRng {
    state: u64,
}

impl JitterRng {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.state
    }

    /// Uniform draw in `[0, 100)`.
    fn percent(&mut self) -> u8 {
        ((self.next() >> 33) % 100) as u8
    }

    /// Uniform draw in `[0, bound]`; zero bounds draw nothing.
    fn ticks(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        (self.next() >> 33) as u32 % (bound + 1)
    }

    /// Uniform draw in `[-half_width, half_width]`; zero widths draw nothing.
    fn degrees(&mut self, half_width: f32) -> f32 {
        if half_width == 0.0 {
            return 0.0;
        }
        let unit = (self.next() >> 40) as f32 / 16_777_216.0;
        (unit * 2.0 - 1.0) * half_width
    }
}
