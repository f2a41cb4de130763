#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Gridfire engine.
//!
//! The world owns terrain, the actor roster, tile claims, the player, and the
//! scroll offset. It mutates exclusively through [`apply`], which executes one
//! [`Command`] and appends the resulting [`Event`] values to the caller's
//! buffer. Read access happens through the [`query`] module, which captures
//! immutable snapshots for systems and adapters.

mod actors;
mod collision;
mod terrain;

use gridfire_core::{
    archetype::ArchetypeCatalog, ActorId, Command, Event, Facing, ObstacleClassifier, Posture,
    ProjectileSource, ScrollOffset, TerrainRow, Thrust, TileCoord, WorldPoint, WorldRect,
    WorldVec, PLAYER_MUZZLE_OFFSET, SECONDS_PER_TICK, TILE_LENGTH, VIEW_HEIGHT, VIEW_WIDTH,
    WELCOME_BANNER,
};

use crate::actors::{step_actor, Actor, ClaimGrid, RetryStack, StepFrame, StepRequest};
use crate::terrain::TerrainGrid;

/// Thrust added to the player's velocity each tick, in world units per second.
const PLAYER_ACCELERATION: f32 = 80.0;

/// Divisor applied to the player's velocity each tick after thrust.
const PLAYER_DRAG_DIVISOR: f32 = 2.0;

/// Speed below which a velocity component snaps to rest after drag.
const PLAYER_VELOCITY_DEADZONE: f32 = 0.1;

/// Ticks between consecutive player shots.
const PLAYER_FIRE_INTERVAL: u32 = 12;

/// Player shot angle in degrees when not aiming; ninety points straight up
/// the map, and the gun cursor starts there.
const PLAYER_GUN_ANGLE: f32 = 90.0;

/// Gun cursor turn rate in degrees per second before the ramp kicks in.
const PLAYER_AIM_BASE_RATE: f32 = 40.0;

/// Turn rate gained per ramp tick while the cursor keeps turning one way.
const PLAYER_AIM_RATE_STEP: f32 = 15.0;

/// Ramp ticks after which the cursor turn rate stops growing.
const PLAYER_AIM_RAMP_CAP: i32 = 30;

/// Player projectile speed in world units per second.
const PLAYER_GUN_SPEED: f32 = 320.0;

/// Damage carried by each player projectile.
const PLAYER_GUN_DAMAGE: u16 = 40;

/// Ticks a defeated actor lingers before leaving play.
const DEATH_SEQUENCE_TICKS: u32 = 30;

/// Distance past the view bottom at which a departed actor is culled.
const CULL_MARGIN: f32 = TILE_LENGTH;

/// Session seed used until the shell installs its own.
const DEFAULT_SESSION_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Authoritative simulation state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    terrain: TerrainGrid,
    catalog: ArchetypeCatalog,
    actors: Vec<Actor>,
    claims: ClaimGrid,
    pending_steps: StepFrame,
    player: PlayerState,
    scroll: f32,
    rng: SessionRng,
    next_actor: u32,
    tick_index: u64,
}

impl World {
    /// Creates an empty world with the builtin archetype catalog installed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            terrain: TerrainGrid::empty(),
            catalog: ArchetypeCatalog::builtin(),
            actors: Vec::new(),
            claims: ClaimGrid::new(0, 0),
            pending_steps: StepFrame::default(),
            player: PlayerState::at(WorldPoint::new(
                (VIEW_WIDTH - TILE_LENGTH) / 2.0,
                VIEW_HEIGHT - 2.0 * TILE_LENGTH,
            )),
            scroll: 0.0,
            rng: SessionRng::new(DEFAULT_SESSION_SEED),
            next_actor: 0,
            tick_index: 0,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Executes a command against the world, appending resulting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadTerrain { rows, classifier } => {
            load_terrain(world, &rows, &classifier, out_events);
        }
        Command::ConfigureArchetypes { catalog } => {
            configure_archetypes(world, catalog, out_events);
        }
        Command::SeedSession { seed } => {
            world.rng = SessionRng::new(seed);
        }
        Command::SpawnActor { archetype, tile } => {
            spawn_actor(world, archetype, tile, out_events);
        }
        Command::Tick => {
            advance_tick(world, out_events);
        }
        Command::StepActor {
            actor,
            direction,
            pace,
        } => {
            world.pending_steps.queue(StepRequest {
                actor,
                direction,
                pace: pace.get().max(1),
            });
        }
        Command::FireActorGun {
            actor,
            angle_degrees,
        } => {
            fire_actor_gun(world, actor, angle_degrees, out_events);
        }
        Command::StrikeActor { actor, damage } => {
            strike_actor(world, actor, damage, out_events);
        }
        Command::SteerPlayer { x, y } => {
            world.player.thrust = (x, y);
        }
        Command::SetPlayerPosture { posture } => {
            set_player_posture(world, posture, out_events);
        }
        Command::SetPlayerAiming { aiming } => {
            world.player.aiming = aiming;
        }
        Command::SetPlayerAlive { alive } => {
            world.player.alive = alive;
        }
        Command::TriggerPlayerFire => {
            trigger_player_fire(world, out_events);
        }
        Command::AdvanceScroll { distance } => {
            advance_scroll(world, distance, out_events);
        }
    }
}

fn load_terrain(
    world: &mut World,
    rows: &[TerrainRow],
    classifier: &ObstacleClassifier,
    out_events: &mut Vec<Event>,
) {
    world.terrain = TerrainGrid::from_rows(rows, classifier);
    world
        .claims
        .reset(world.terrain.columns(), world.terrain.rows());
    world.actors.clear();
    world.pending_steps.clear();
    world.next_actor = 0;
    world.tick_index = 0;
    world.scroll = world.terrain.initial_scroll();
    world.player = PlayerState::at(WorldPoint::new(
        (VIEW_WIDTH - TILE_LENGTH) / 2.0,
        world.scroll + VIEW_HEIGHT - 2.0 * TILE_LENGTH,
    ));
    out_events.push(Event::TerrainLoaded {
        rows: world.terrain.rows(),
    });
    out_events.push(Event::ViewScrolled {
        offset: ScrollOffset::new(world.scroll),
    });
}

/// Installs a new catalog. Actors hold indices into the active catalog, so
/// reconfiguration is only honored while the roster is empty.
fn configure_archetypes(world: &mut World, catalog: ArchetypeCatalog, out_events: &mut Vec<Event>) {
    if !world.actors.is_empty() {
        return;
    }
    let count = catalog.len() as u32;
    world.catalog = catalog;
    out_events.push(Event::ArchetypesConfigured { count });
}

/// Admits a new actor. Spawns onto unloaded terrain, blocked tiles, or tiles
/// already claimed by another actor are discarded; the loader validates
/// manifests before they reach the world.
fn spawn_actor(world: &mut World, archetype: String, tile: TileCoord, out_events: &mut Vec<Event>) {
    if !world.terrain.is_loaded()
        || world.terrain.blocks_motion(tile)
        || world.claims.claimant(tile).is_some()
    {
        return;
    }

    let (policy_id, defaulted) = world.catalog.resolve_or_fallback(&archetype);
    let policy = world.catalog.policy(policy_id);
    let id = ActorId::new(world.next_actor);
    world.next_actor += 1;

    let resolved_name = policy.name.clone();
    let max_health = policy.max_health;
    world.actors.push(Actor {
        id,
        archetype: policy_id,
        tile,
        intended: None,
        ticks_remaining: 0,
        ticks_total: 0,
        facing: Facing::South,
        health: max_health,
        doom: None,
        retry: RetryStack::default(),
        stuck: false,
    });
    world.claims.claim(tile, id);

    out_events.push(Event::ActorSpawned {
        actor: id,
        archetype: resolved_name,
        tile,
    });
    if defaulted {
        out_events.push(Event::ArchetypeDefaulted {
            actor: id,
            requested: archetype,
        });
    }
}

fn advance_tick(world: &mut World, out_events: &mut Vec<Event>) {
    let tick = world.tick_index;
    resolve_pending_steps(world, out_events);
    advance_movement(world, out_events);
    advance_death_sequences(world, out_events);
    cull_departed(world, out_events);
    integrate_player(world, out_events);
    world.tick_index += 1;
    out_events.push(Event::TimeAdvanced { tick });
}

/// Resolves queued step requests in ascending actor-id order so contention
/// for a tile settles the same way every run.
fn resolve_pending_steps(world: &mut World, out_events: &mut Vec<Event>) {
    for request in world.pending_steps.drain_sorted() {
        let Some(index) = world
            .actors
            .iter()
            .position(|actor| actor.id == request.actor)
        else {
            continue;
        };
        step_actor(
            &world.terrain,
            &mut world.claims,
            &mut world.actors[index],
            request,
            out_events,
        );
    }
}

fn advance_movement(world: &mut World, out_events: &mut Vec<Event>) {
    for index in 0..world.actors.len() {
        let actor = &mut world.actors[index];
        if actor.doom.is_some() || actor.intended.is_none() {
            continue;
        }
        actor.ticks_remaining = actor.ticks_remaining.saturating_sub(1);
        if actor.ticks_remaining > 0 {
            continue;
        }
        if let Some(to) = actor.intended.take() {
            let id = actor.id;
            let from = actor.tile;
            actor.tile = to;
            actor.ticks_total = 0;
            world.claims.release(from, id);
            out_events.push(Event::ActorArrived { actor: id, tile: to });
        }
    }
}

fn advance_death_sequences(world: &mut World, out_events: &mut Vec<Event>) {
    for actor in &mut world.actors {
        if let Some(remaining) = actor.doom {
            actor.doom = Some(remaining.saturating_sub(1));
        }
    }
    let finished: Vec<ActorId> = world
        .actors
        .iter()
        .filter(|actor| actor.doom == Some(0))
        .map(|actor| actor.id)
        .collect();
    for id in finished {
        remove_actor(world, id, true, out_events);
    }
}

fn cull_departed(world: &mut World, out_events: &mut Vec<Event>) {
    let cull_line = world.scroll + VIEW_HEIGHT + CULL_MARGIN;
    let departed: Vec<ActorId> = world
        .actors
        .iter()
        .filter(|actor| actor.position().y() > cull_line)
        .map(|actor| actor.id)
        .collect();
    for id in departed {
        remove_actor(world, id, false, out_events);
    }
}

fn remove_actor(world: &mut World, id: ActorId, roll_drops: bool, out_events: &mut Vec<Event>) {
    let Some(index) = world.actors.iter().position(|actor| actor.id == id) else {
        return;
    };
    let actor = world.actors.remove(index);
    world.claims.release(actor.tile, actor.id);
    if let Some(to) = actor.intended {
        world.claims.release(to, actor.id);
    }

    if roll_drops {
        let policy = world.catalog.policy(actor.archetype);
        for drop in &policy.drops {
            if world.rng.roll_percent() < drop.chance_percent {
                out_events.push(Event::PickupSpawned {
                    item: drop.item,
                    tile: actor.tile,
                });
            }
        }
    }
    out_events.push(Event::ActorRemoved { actor: actor.id });
}

fn integrate_player(world: &mut World, out_events: &mut Vec<Event>) {
    if !world.player.alive {
        return;
    }

    rotate_player_aim(&mut world.player);

    // Aiming hands the steering keys to the gun cursor; the body coasts.
    let acceleration = if world.player.aiming {
        0.0
    } else {
        PLAYER_ACCELERATION
    };
    let (thrust_x, thrust_y) = world.player.thrust;
    let velocity = world.player.velocity;
    world.player.velocity = WorldVec::new(
        snap_to_rest((velocity.x() + thrust_x.signum() * acceleration) / PLAYER_DRAG_DIVISOR),
        snap_to_rest((velocity.y() + thrust_y.signum() * acceleration) / PLAYER_DRAG_DIVISOR),
    );
    if let Some(facing) =
        Facing::from_components(world.player.velocity.x(), world.player.velocity.y())
    {
        world.player.facing = facing;
    }
    world.player.fire_cooldown = world.player.fire_cooldown.saturating_sub(1);

    let delta = world.player.velocity.scaled(SECONDS_PER_TICK);
    if delta.is_zero() {
        return;
    }

    let moved_origin = world.player.position.offset(delta.x(), delta.y());
    let moved = WorldRect::new(moved_origin.x(), moved_origin.y(), TILE_LENGTH, TILE_LENGTH);
    let correction = collision::resolve(&world.terrain, moved, delta);
    world.player.position =
        WorldPoint::new(moved.left() + correction.x(), moved.top() + correction.y());
    out_events.push(Event::PlayerMoved {
        position: world.player.position,
        correction,
    });
}

fn snap_to_rest(component: f32) -> f32 {
    if component.abs() < PLAYER_VELOCITY_DEADZONE {
        0.0
    } else {
        component
    }
}

/// Turns the gun cursor from held horizontal thrust while aiming. The turn
/// rate ramps every tick the cursor keeps turning the same way, up to the
/// ramp cap; reversing or releasing resets the ramp.
fn rotate_player_aim(player: &mut PlayerState) {
    if !player.aiming {
        return;
    }
    match player.thrust.0 {
        Thrust::Negative => {
            if player.aim_ramp > 0 {
                player.aim_ramp = 0;
            }
            player.aim_angle += (PLAYER_AIM_BASE_RATE
                - player.aim_ramp as f32 * PLAYER_AIM_RATE_STEP)
                * SECONDS_PER_TICK;
            if player.aim_ramp >= -PLAYER_AIM_RAMP_CAP {
                player.aim_ramp -= 1;
            }
        }
        Thrust::Positive => {
            if player.aim_ramp < 0 {
                player.aim_ramp = 0;
            }
            player.aim_angle += (-PLAYER_AIM_BASE_RATE
                - player.aim_ramp as f32 * PLAYER_AIM_RATE_STEP)
                * SECONDS_PER_TICK;
            if player.aim_ramp <= PLAYER_AIM_RAMP_CAP {
                player.aim_ramp += 1;
            }
        }
        Thrust::Neutral => {
            player.aim_ramp = 0;
        }
    }
}

fn trigger_player_fire(world: &mut World, out_events: &mut Vec<Event>) {
    if !world.player.alive || world.player.fire_cooldown > 0 {
        return;
    }
    world.player.fire_cooldown = PLAYER_FIRE_INTERVAL;
    let origin = world
        .player
        .position
        .offset(PLAYER_MUZZLE_OFFSET.x(), PLAYER_MUZZLE_OFFSET.y());
    let angle_degrees = if world.player.aiming {
        world.player.aim_angle
    } else {
        PLAYER_GUN_ANGLE
    };
    out_events.push(Event::ProjectileFired {
        source: ProjectileSource::Player,
        origin,
        angle_degrees,
        speed: PLAYER_GUN_SPEED,
        damage: PLAYER_GUN_DAMAGE,
    });
}

fn set_player_posture(world: &mut World, posture: Posture, out_events: &mut Vec<Event>) {
    if world.player.posture == posture {
        return;
    }
    world.player.posture = posture;
    out_events.push(Event::PlayerPostureChanged { posture });
}

fn advance_scroll(world: &mut World, distance: f32, out_events: &mut Vec<Event>) {
    if !world.terrain.is_loaded() || distance <= 0.0 {
        return;
    }
    let next = (world.scroll - distance).max(0.0);
    if next == world.scroll {
        return;
    }
    world.scroll = next;
    out_events.push(Event::ViewScrolled {
        offset: ScrollOffset::new(next),
    });
}

fn fire_actor_gun(world: &World, id: ActorId, angle_degrees: f32, out_events: &mut Vec<Event>) {
    let Some(actor) = world.actors.iter().find(|actor| actor.id == id) else {
        return;
    };
    if actor.doom.is_some() {
        return;
    }
    let policy = world.catalog.policy(actor.archetype);
    let origin = actor
        .position()
        .offset(TILE_LENGTH / 2.0, TILE_LENGTH / 2.0);
    out_events.push(Event::ProjectileFired {
        source: ProjectileSource::Actor(actor.id),
        origin,
        angle_degrees,
        speed: policy.fire.speed,
        damage: policy.fire.damage,
    });
}

/// Applies damage. Death releases the actor's tile claims immediately so the
/// corpse stops blocking navigation while it plays out the death sequence.
fn strike_actor(world: &mut World, id: ActorId, damage: u16, out_events: &mut Vec<Event>) {
    let Some(actor) = world.actors.iter_mut().find(|actor| actor.id == id) else {
        return;
    };
    if actor.doom.is_some() {
        return;
    }

    actor.health = actor.health.saturating_sub(damage);
    if actor.health > 0 {
        out_events.push(Event::ActorDamaged {
            actor: actor.id,
            remaining: actor.health,
        });
        return;
    }

    actor.doom = Some(DEATH_SEQUENCE_TICKS);
    actor.stuck = false;
    let tile = actor.tile;
    let intended = actor.intended;
    world.claims.release(tile, id);
    if let Some(to) = intended {
        world.claims.release(to, id);
    }
    out_events.push(Event::ActorDied { actor: id, tile });
}

fn is_dormant(scroll: f32, position: WorldPoint) -> bool {
    position.y() + TILE_LENGTH <= scroll || position.y() >= scroll + VIEW_HEIGHT
}

/// Read-only world queries used by systems and adapters.
pub mod query {
    use super::{is_dormant, World};
    use gridfire_core::{
        archetype::ArchetypeCatalog, ActorSnapshot, ActorView, OccupancyView, PlayerView,
        ScrollOffset, TerrainView, TileIndex,
    };

    /// Retrieves the welcome banner that shells may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Captures a sorted snapshot of the live actor roster.
    #[must_use]
    pub fn actors(world: &World) -> ActorView {
        let snapshots = world
            .actors
            .iter()
            .map(|actor| {
                let position = actor.position();
                ActorSnapshot {
                    id: actor.id,
                    archetype: actor.archetype,
                    tile: actor.tile,
                    intended: actor.intended,
                    position,
                    facing: actor.facing,
                    health: actor.health,
                    dying: actor.doom.is_some(),
                    dormant: is_dormant(world.scroll, position),
                    idle: actor.intended.is_none() && actor.doom.is_none(),
                    stuck: actor.stuck,
                }
            })
            .collect();
        ActorView::from_snapshots(snapshots)
    }

    /// Captures a view of the current tile claim table.
    #[must_use]
    pub fn occupancy(world: &World) -> OccupancyView<'_> {
        OccupancyView::new(
            world.claims.cells(),
            world.terrain.columns(),
            world.terrain.rows(),
        )
    }

    /// Captures a view of the terrain's obstacle classes.
    #[must_use]
    pub fn terrain(world: &World) -> TerrainView<'_> {
        TerrainView::new(
            world.terrain.classes(),
            world.terrain.columns(),
            world.terrain.rows(),
        )
    }

    /// Row-major tile indices for presentation.
    #[must_use]
    pub fn tiles(world: &World) -> &[TileIndex] {
        world.terrain.tiles()
    }

    /// Whether a level is currently loaded.
    #[must_use]
    pub fn is_terrain_loaded(world: &World) -> bool {
        world.terrain.is_loaded()
    }

    /// Captures the player's current state.
    #[must_use]
    pub fn player(world: &World) -> PlayerView {
        PlayerView {
            position: world.player.position,
            velocity: world.player.velocity,
            posture: world.player.posture,
            facing: world.player.facing,
            aim: world.player.aiming.then_some(world.player.aim_angle),
            alive: world.player.alive,
        }
    }

    /// Current world-space offset of the view top.
    #[must_use]
    pub fn scroll_offset(world: &World) -> ScrollOffset {
        ScrollOffset::new(world.scroll)
    }

    /// Zero-based index of the next tick to run.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// The archetype catalog actors are resolved against.
    #[must_use]
    pub fn archetypes(world: &World) -> &ArchetypeCatalog {
        &world.catalog
    }
}

#[derive(Debug)]
struct PlayerState {
    position: WorldPoint,
    velocity: WorldVec,
    thrust: (Thrust, Thrust),
    posture: Posture,
    facing: Facing,
    alive: bool,
    fire_cooldown: u32,
    aiming: bool,
    aim_angle: f32,
    aim_ramp: i32,
}

impl PlayerState {
    fn at(position: WorldPoint) -> Self {
        Self {
            position,
            velocity: WorldVec::ZERO,
            thrust: (Thrust::Neutral, Thrust::Neutral),
            posture: Posture::Standing,
            facing: Facing::North,
            alive: true,
            fire_cooldown: 0,
            aiming: false,
            aim_angle: PLAYER_GUN_ANGLE,
            aim_ramp: 0,
        }
    }
}

/// Deterministic linear congruential source for the world's own rolls.
#[derive(Debug)]
struct SessionRng {
    state: u64,
}

impl SessionRng {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state
    }

    /// Uniform draw in `[0, 100)`.
    fn roll_percent(&mut self) -> u8 {
        ((self.next() >> 33) % 100) as u8
    }
}
