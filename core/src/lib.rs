#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridfire engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

pub mod archetype;

use serde::{Deserialize, Serialize};

use crate::archetype::ArchetypeCatalog;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Gridfire.";

/// Number of tile columns in every level row.
pub const GRID_COLUMNS: u32 = 16;

/// Side length of a square tile expressed in world units.
pub const TILE_LENGTH: f32 = 16.0;

/// Number of tile rows covered by the view window.
pub const VIEW_ROWS: u32 = 14;

/// Width of the view window in world units.
pub const VIEW_WIDTH: f32 = 256.0;

/// Height of the view window in world units.
pub const VIEW_HEIGHT: f32 = 224.0;

/// Simulated seconds covered by a single tick.
pub const SECONDS_PER_TICK: f32 = 1.0 / 60.0;

/// Muzzle offset from the player box origin, in world units.
pub const PLAYER_MUZZLE_OFFSET: WorldVec = WorldVec::new(12.0, 8.0);

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Installs the level's terrain rows and obstacle classification.
    LoadTerrain {
        /// Tile rows ordered top to bottom, each exactly one grid width wide.
        rows: Vec<TerrainRow>,
        /// Mapping from tile index to obstacle class.
        classifier: ObstacleClassifier,
    },
    /// Installs the archetype catalog used to resolve spawned actors.
    ConfigureArchetypes {
        /// Validated set of archetype policies.
        catalog: ArchetypeCatalog,
    },
    /// Seeds the world's deterministic random source for the session.
    SeedSession {
        /// Session seed shared by replayed runs.
        seed: u64,
    },
    /// Requests that a new actor join the roster at the provided tile.
    SpawnActor {
        /// Archetype name requested by the spawn manifest.
        archetype: String,
        /// Tile the actor occupies after spawning.
        tile: TileCoord,
    },
    /// Advances the simulation by exactly one fixed step.
    Tick,
    /// Requests that an actor advance one tile in the specified direction.
    StepActor {
        /// Identifier of the actor attempting to move.
        actor: ActorId,
        /// Base direction of travel for the attempted step.
        direction: Direction,
        /// Ticks the actor needs to cross one tile at its current pace.
        pace: TickCount,
    },
    /// Requests that an actor discharge its weapon at the provided angle.
    FireActorGun {
        /// Identifier of the firing actor.
        actor: ActorId,
        /// Shot angle in degrees, measured counter-clockwise from east.
        angle_degrees: f32,
    },
    /// Applies projectile or melee damage to an actor.
    StrikeActor {
        /// Identifier of the struck actor.
        actor: ActorId,
        /// Amount of health removed by the hit.
        damage: u16,
    },
    /// Updates the player's digital steering input for subsequent ticks.
    SteerPlayer {
        /// Thrust along the horizontal axis.
        x: Thrust,
        /// Thrust along the vertical axis.
        y: Thrust,
    },
    /// Updates the player's cover posture.
    SetPlayerPosture {
        /// Posture the player should assume.
        posture: Posture,
    },
    /// Updates whether the player is steering the gun cursor.
    SetPlayerAiming {
        /// Whether the aim control is held.
        aiming: bool,
    },
    /// Synchronizes the player's alive status from the owning collaborator.
    SetPlayerAlive {
        /// Whether the player can still be engaged.
        alive: bool,
    },
    /// Requests that the player discharge their weapon if the cooldown allows.
    TriggerPlayerFire,
    /// Scrolls the view window forward by the provided distance.
    AdvanceScroll {
        /// World units to advance; negative values are ignored.
        distance: f32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that terrain rows were installed.
    TerrainLoaded {
        /// Number of rows accepted into the grid.
        rows: u32,
    },
    /// Confirms that an archetype catalog became active.
    ArchetypesConfigured {
        /// Number of policies contained in the catalog.
        count: u32,
    },
    /// Confirms that a new actor joined the roster.
    ActorSpawned {
        /// Identifier assigned to the actor by the world.
        actor: ActorId,
        /// Resolved archetype name applied to the actor.
        archetype: String,
        /// Tile the actor occupies after spawning.
        tile: TileCoord,
    },
    /// Reports that a spawn named an unknown archetype and fell back.
    ArchetypeDefaulted {
        /// Identifier of the actor that received the fallback policy.
        actor: ActorId,
        /// Archetype name the manifest asked for.
        requested: String,
    },
    /// Indicates that the simulation advanced by one fixed step.
    TimeAdvanced {
        /// Zero-based index of the completed tick.
        tick: u64,
    },
    /// Confirms that an actor committed a step toward a neighboring tile.
    ActorStepCommitted {
        /// Identifier of the actor that started moving.
        actor: ActorId,
        /// Tile the actor moves away from.
        from: TileCoord,
        /// Tile the actor now heads toward.
        to: TileCoord,
    },
    /// Reports that an actor's fallback search exhausted every direction.
    ActorStepStuck {
        /// Identifier of the actor that failed to move.
        actor: ActorId,
        /// Base direction the exhausted search started from.
        direction: Direction,
    },
    /// Confirms that an actor finished traversing to its intended tile.
    ActorArrived {
        /// Identifier of the actor that arrived.
        actor: ActorId,
        /// Tile the actor now occupies.
        tile: TileCoord,
    },
    /// Announces a fired projectile for the external weapon collaborator.
    ProjectileFired {
        /// Origin of the shot.
        source: ProjectileSource,
        /// Muzzle position in world units.
        origin: WorldPoint,
        /// Shot angle in degrees, measured counter-clockwise from east.
        angle_degrees: f32,
        /// Projectile speed in world units per second.
        speed: f32,
        /// Damage carried by the projectile.
        damage: u16,
    },
    /// Reports that an actor absorbed damage and survived.
    ActorDamaged {
        /// Identifier of the struck actor.
        actor: ActorId,
        /// Health remaining after the hit.
        remaining: u16,
    },
    /// Reports that an actor's health was exhausted.
    ActorDied {
        /// Identifier of the dying actor.
        actor: ActorId,
        /// Tile the actor occupied when it died.
        tile: TileCoord,
    },
    /// Confirms that a dead actor finished its death sequence and left play.
    ActorRemoved {
        /// Identifier of the removed actor.
        actor: ActorId,
    },
    /// Announces an item spawned by a defeated actor's drop table.
    PickupSpawned {
        /// Kind of item dropped.
        item: ItemKind,
        /// Tile the item rests on.
        tile: TileCoord,
    },
    /// Reports the player's post-correction position for this tick.
    PlayerMoved {
        /// Player position after integration and collision correction.
        position: WorldPoint,
        /// Correction that was added to cancel tile penetration.
        correction: Correction,
    },
    /// Announces that the player changed cover posture.
    PlayerPostureChanged {
        /// Posture now held by the player.
        posture: Posture,
    },
    /// Reports that the view window scrolled forward.
    ViewScrolled {
        /// World-space offset of the view top after scrolling.
        offset: ScrollOffset,
    },
}

/// Unique identifier assigned to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single tile expressed as column and row indices.
///
/// Components are signed so that neighbor probes may name coordinates beyond
/// the grid edge; lookups treat those as the always-solid boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: i32,
    row: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Tile reached by moving one step in the provided direction.
    #[must_use]
    pub const fn stepped(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            column: self.column + dx,
            row: self.row + dy,
        }
    }

    /// World-space position of the tile's upper-left corner.
    #[must_use]
    pub fn origin(&self) -> WorldPoint {
        WorldPoint::new(self.column as f32 * TILE_LENGTH, self.row as f32 * TILE_LENGTH)
    }
}

/// Cardinal movement directions available to grid actors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Column and row deltas applied by one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Direction reached by rotating 90 degrees clockwise.
    #[must_use]
    pub const fn rotated_clockwise(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }
}

/// Eight-way facing derived from a velocity's sign pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Facing up the map, toward decreasing Y.
    North,
    /// Facing up and to the right.
    NorthEast,
    /// Facing toward increasing X.
    East,
    /// Facing down and to the right.
    SouthEast,
    /// Facing down the map, toward increasing Y.
    South,
    /// Facing down and to the left.
    SouthWest,
    /// Facing toward decreasing X.
    West,
    /// Facing up and to the left.
    NorthWest,
}

impl Facing {
    /// Derives a facing from velocity components, or `None` when both are zero.
    ///
    /// Y grows downward, so a negative vertical component faces north.
    #[must_use]
    pub fn from_components(dx: f32, dy: f32) -> Option<Self> {
        let horizontal = if dx > 0.0 {
            1
        } else if dx < 0.0 {
            -1
        } else {
            0
        };
        let vertical = if dy > 0.0 {
            1
        } else if dy < 0.0 {
            -1
        } else {
            0
        };

        match (horizontal, vertical) {
            (0, -1) => Some(Self::North),
            (1, -1) => Some(Self::NorthEast),
            (1, 0) => Some(Self::East),
            (1, 1) => Some(Self::SouthEast),
            (0, 1) => Some(Self::South),
            (-1, 1) => Some(Self::SouthWest),
            (-1, 0) => Some(Self::West),
            (-1, -1) => Some(Self::NorthWest),
            _ => None,
        }
    }

    /// Facing that looks along the provided cardinal direction.
    #[must_use]
    pub const fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::North => Self::North,
            Direction::East => Self::East,
            Direction::South => Self::South,
            Direction::West => Self::West,
        }
    }

    /// Sprite-sheet index of the facing, north first, clockwise.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::North => 0,
            Self::NorthEast => 1,
            Self::East => 2,
            Self::SouthEast => 3,
            Self::South => 4,
            Self::SouthWest => 5,
            Self::West => 6,
            Self::NorthWest => 7,
        }
    }
}

/// Digital thrust applied along one steering axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Thrust {
    /// Push toward decreasing coordinates.
    Negative,
    /// No push on this axis.
    #[default]
    Neutral,
    /// Push toward increasing coordinates.
    Positive,
}

impl Thrust {
    /// Sign multiplier contributed by the thrust.
    #[must_use]
    pub const fn signum(self) -> f32 {
        match self {
            Self::Negative => -1.0,
            Self::Neutral => 0.0,
            Self::Positive => 1.0,
        }
    }
}

/// Cover posture held by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Posture {
    /// Upright and exposed above low cover.
    #[default]
    Standing,
    /// Ducked behind low cover.
    Crouching,
}

impl Posture {
    /// Whether the posture leaves the body exposed above low cover.
    #[must_use]
    pub const fn exposes_above_low_cover(self) -> bool {
        matches!(self, Self::Standing)
    }
}

/// Physical classification of a tile type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObstacleClass {
    /// Open ground; neither motion nor ballistics are affected.
    #[default]
    Free,
    /// Waist-high cover; blocks motion, grazes ballistics.
    LowCover,
    /// Full-height cover; blocks motion and ballistics outright.
    HighCover,
    /// Overpass structure; blocks motion but is invisible to ballistics.
    Overpass,
}

impl ObstacleClass {
    /// Whether a tile of this class refuses actor and player motion.
    #[must_use]
    pub const fn obstructs_motion(self) -> bool {
        !matches!(self, Self::Free)
    }
}

/// Index of a tile graphic within the level's tile set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex(u8);

impl TileIndex {
    /// Number of distinct tile indices a level may use.
    pub const COUNT: usize = 16;

    /// Creates a tile index, or `None` when the value exceeds the tile set.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if (value as usize) < Self::COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Single terrain row holding exactly one grid width of tile indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainRow {
    tiles: [TileIndex; GRID_COLUMNS as usize],
}

impl TerrainRow {
    /// Builds a row from a slice, rejecting any width other than the grid's.
    pub fn from_tiles(tiles: &[TileIndex]) -> Result<Self, TerrainRowError> {
        match <[TileIndex; GRID_COLUMNS as usize]>::try_from(tiles) {
            Ok(tiles) => Ok(Self { tiles }),
            Err(_) => Err(TerrainRowError::UnexpectedWidth { found: tiles.len() }),
        }
    }

    /// Tile indices stored in the row, left to right.
    #[must_use]
    pub const fn tiles(&self) -> &[TileIndex; GRID_COLUMNS as usize] {
        &self.tiles
    }

    /// Tile index at the provided column, if the column is in bounds.
    #[must_use]
    pub fn tile(&self, column: u32) -> Option<TileIndex> {
        self.tiles.get(column as usize).copied()
    }
}

/// Rejection raised when a terrain row is not exactly one grid width wide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainRowError {
    /// The provided slice held the wrong number of tiles.
    UnexpectedWidth {
        /// Number of tiles actually supplied.
        found: usize,
    },
}

impl std::fmt::Display for TerrainRowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedWidth { found } => {
                write!(
                    f,
                    "terrain row must contain exactly {GRID_COLUMNS} tiles (received {found})"
                )
            }
        }
    }
}

impl std::error::Error for TerrainRowError {}

/// Lookup table mapping every tile index to its obstacle class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObstacleClassifier {
    classes: [ObstacleClass; TileIndex::COUNT],
}

impl ObstacleClassifier {
    /// Creates a classifier from an explicit class per tile index.
    #[must_use]
    pub const fn new(classes: [ObstacleClass; TileIndex::COUNT]) -> Self {
        Self { classes }
    }

    /// Classifier that treats every tile index as open ground.
    #[must_use]
    pub const fn all_free() -> Self {
        Self::new([ObstacleClass::Free; TileIndex::COUNT])
    }

    /// Obstacle class assigned to the provided tile index.
    #[must_use]
    pub const fn classify(&self, tile: TileIndex) -> ObstacleClass {
        self.classes[tile.get() as usize]
    }
}

/// Position expressed in continuous world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component in world units.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component in world units; Y grows downward.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Point displaced by the provided component offsets.
    #[must_use]
    pub const fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Displacement expressed in continuous world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldVec {
    x: f32,
    y: f32,
}

impl WorldVec {
    /// Vector with both components zero.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a new world-space vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component in world units.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component in world units; Y grows downward.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Vector with both components multiplied by the scalar.
    #[must_use]
    pub const fn scaled(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Whether both components are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Axis-aligned rectangle expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldRect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl WorldRect {
    /// Creates a rectangle from its upper-left corner and dimensions.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// X coordinate of the left edge.
    #[must_use]
    pub const fn left(&self) -> f32 {
        self.x
    }

    /// X coordinate of the right edge.
    #[must_use]
    pub const fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Y coordinate of the top edge.
    #[must_use]
    pub const fn top(&self) -> f32 {
        self.y
    }

    /// Y coordinate of the bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Width of the rectangle.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Height of the rectangle.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Center point of the rectangle.
    #[must_use]
    pub const fn center(&self) -> WorldPoint {
        WorldPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Rectangle displaced by the provided component offsets.
    #[must_use]
    pub const fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width,
            height: self.height,
        }
    }
}

/// Displacement added to a position to cancel tile penetration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Correction {
    x: f32,
    y: f32,
}

impl Correction {
    /// Correction that leaves the position untouched.
    pub const NONE: Self = Self::new(0.0, 0.0);

    /// Creates a correction from explicit components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the correction.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component of the correction.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Whether the correction moves the position at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// World-space Y coordinate of the view window's top edge.
///
/// The offset starts at the bottom of the map and only ever decreases as the
/// level progresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct ScrollOffset(f32);

impl ScrollOffset {
    /// Creates a scroll offset at the provided world-space Y.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// World-space Y coordinate of the view top.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }

    /// World-space Y coordinate of the view bottom.
    #[must_use]
    pub const fn band_bottom(&self) -> f32 {
        self.0 + VIEW_HEIGHT
    }
}

/// Whole number of simulation ticks.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TickCount(u32);

impl TickCount {
    /// Creates a tick count with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the count.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Whether the count has reached zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Count reduced by one tick, stopping at zero.
    #[must_use]
    pub const fn saturating_decremented(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

/// Items that defeated actors may leave behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Restores a portion of the player's health.
    Medkit,
    /// Replenishes the player's reserve ammunition.
    AmmoCache,
    /// Score trinket with no mechanical effect.
    Charm,
}

/// Origin of a fired projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectileSource {
    /// The player's weapon.
    Player,
    /// The weapon of the identified actor.
    Actor(ActorId),
}

/// Input snapshot gathered by a shell once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Thrust requested along the horizontal axis.
    pub horizontal: Thrust,
    /// Thrust requested along the vertical axis.
    pub vertical: Thrust,
    /// Whether the aim control is held.
    pub aim: bool,
    /// Whether the crouch control is held.
    pub crouch: bool,
    /// Whether the fire control is held.
    pub trigger: bool,
}

/// Immutable representation of a single actor's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorSnapshot {
    /// Unique identifier assigned to the actor.
    pub id: ActorId,
    /// Index of the actor's policy within the configured catalog.
    pub archetype: archetype::ArchetypeId,
    /// Tile the actor currently occupies.
    pub tile: TileCoord,
    /// Tile the actor is traversing toward, if any.
    pub intended: Option<TileCoord>,
    /// Interpolated world-space position of the actor's box origin.
    pub position: WorldPoint,
    /// Facing derived from the actor's last committed step.
    pub facing: Facing,
    /// Health remaining before the death sequence begins.
    pub health: u16,
    /// Whether the actor is playing out its death sequence.
    pub dying: bool,
    /// Whether the actor lies fully outside the visible band.
    pub dormant: bool,
    /// Whether the actor is free to accept a new step request.
    pub idle: bool,
    /// Whether the actor's most recent fallback search exhausted.
    pub stuck: bool,
}

/// Read-only snapshot describing the live actor roster.
#[derive(Clone, Debug, Default)]
pub struct ActorView {
    snapshots: Vec<ActorSnapshot>,
}

impl ActorView {
    /// Creates a new actor view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ActorSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in ascending id order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the identified actor, if it is still alive.
    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<&ActorSnapshot> {
        self.snapshots
            .binary_search_by_key(&actor, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Number of actors captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the view captured no actors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ActorSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the dense tile claim table.
///
/// A moving actor claims both its current tile and the tile it heads toward;
/// both claims resolve to the same identifier here.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    claims: &'a [Option<ActorId>],
    columns: u32,
    rows: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided claim slice.
    #[must_use]
    pub fn new(claims: &'a [Option<ActorId>], columns: u32, rows: u32) -> Self {
        Self {
            claims,
            columns,
            rows,
        }
    }

    /// Returns the actor claiming the provided tile, if any.
    #[must_use]
    pub fn claimant(&self, tile: TileCoord) -> Option<ActorId> {
        self.index(tile)
            .and_then(|index| self.claims.get(index).copied().flatten())
    }

    /// Whether the identified actor may enter the tile.
    ///
    /// Out-of-bounds tiles are never enterable; in-bounds tiles accept the
    /// actor when unclaimed or when the claim is its own.
    #[must_use]
    pub fn accepts(&self, tile: TileCoord, actor: ActorId) -> bool {
        match self.index(tile) {
            Some(index) => self
                .claims
                .get(index)
                .copied()
                .flatten()
                .map_or(true, |claimant| claimant == actor),
            None => false,
        }
    }

    /// Provides the dimensions of the underlying claim table.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        let column = u32::try_from(tile.column()).ok()?;
        let row = u32::try_from(tile.row()).ok()?;
        if column < self.columns && row < self.rows {
            let width = usize::try_from(self.columns).ok()?;
            Some(row as usize * width + column as usize)
        } else {
            None
        }
    }
}

/// Read-only view of the terrain's obstacle classes.
#[derive(Clone, Copy, Debug)]
pub struct TerrainView<'a> {
    classes: &'a [ObstacleClass],
    columns: u32,
    rows: u32,
}

impl<'a> TerrainView<'a> {
    /// Captures a terrain view backed by the provided row-major class slice.
    #[must_use]
    pub fn new(classes: &'a [ObstacleClass], columns: u32, rows: u32) -> Self {
        Self {
            classes,
            columns,
            rows,
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Obstacle class of the provided tile, or `None` beyond the grid.
    #[must_use]
    pub fn class_at(&self, tile: TileCoord) -> Option<ObstacleClass> {
        let column = u32::try_from(tile.column()).ok()?;
        let row = u32::try_from(tile.row()).ok()?;
        if column < self.columns && row < self.rows {
            let index = row as usize * self.columns as usize + column as usize;
            self.classes.get(index).copied()
        } else {
            None
        }
    }

    /// Obstacle class of the tile containing the provided world point.
    #[must_use]
    pub fn class_at_point(&self, point: WorldPoint) -> Option<ObstacleClass> {
        let column = (point.x() / TILE_LENGTH).floor() as i32;
        let row = (point.y() / TILE_LENGTH).floor() as i32;
        self.class_at(TileCoord::new(column, row))
    }

    /// Whether motion into the tile is refused.
    ///
    /// Tiles beyond the grid always refuse motion.
    #[must_use]
    pub fn blocks_motion(&self, tile: TileCoord) -> bool {
        self.class_at(tile)
            .map_or(true, ObstacleClass::obstructs_motion)
    }
}

/// Immutable snapshot of the player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerView {
    /// World-space position of the player box's upper-left corner.
    pub position: WorldPoint,
    /// Velocity in world units per second.
    pub velocity: WorldVec,
    /// Cover posture currently held.
    pub posture: Posture,
    /// Facing derived from the last non-zero velocity.
    pub facing: Facing,
    /// Gun cursor angle in degrees while aiming, absent otherwise.
    pub aim: Option<f32>,
    /// Whether the player can still be engaged.
    pub alive: bool,
}

impl PlayerView {
    /// Center of the player's bounding box.
    #[must_use]
    pub fn center(&self) -> WorldPoint {
        self.position
            .offset(TILE_LENGTH / 2.0, TILE_LENGTH / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Direction, Facing, ObstacleClass, ObstacleClassifier, TerrainRow, TerrainRowError,
        TileCoord, TileIndex,
    };
    use crate::archetype::ArchetypePolicy;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn clockwise_rotation_cycles_all_four_directions() {
        let mut direction = Direction::North;
        let expected = [
            Direction::East,
            Direction::South,
            Direction::West,
            Direction::North,
        ];
        for step in expected {
            direction = direction.rotated_clockwise();
            assert_eq!(direction, step);
        }
    }

    #[test]
    fn stepped_tile_applies_direction_delta() {
        let tile = TileCoord::new(3, 7);
        assert_eq!(tile.stepped(Direction::North), TileCoord::new(3, 6));
        assert_eq!(tile.stepped(Direction::East), TileCoord::new(4, 7));
        assert_eq!(tile.stepped(Direction::South), TileCoord::new(3, 8));
        assert_eq!(tile.stepped(Direction::West), TileCoord::new(2, 7));
    }

    #[test]
    fn facing_follows_velocity_sign_pattern() {
        assert_eq!(Facing::from_components(0.0, -1.0), Some(Facing::North));
        assert_eq!(Facing::from_components(2.0, -0.5), Some(Facing::NorthEast));
        assert_eq!(Facing::from_components(1.0, 0.0), Some(Facing::East));
        assert_eq!(Facing::from_components(-3.0, 4.0), Some(Facing::SouthWest));
        assert_eq!(Facing::from_components(0.0, 0.0), None);
    }

    #[test]
    fn facing_indices_run_clockwise_from_north() {
        assert_eq!(Facing::North.index(), 0);
        assert_eq!(Facing::SouthEast.index(), 3);
        assert_eq!(Facing::NorthWest.index(), 7);
    }

    #[test]
    fn terrain_row_rejects_wrong_width() {
        let narrow = vec![TileIndex::new(0).expect("tile index"); 15];
        let error = TerrainRow::from_tiles(&narrow).expect_err("width must be rejected");
        assert_eq!(error, TerrainRowError::UnexpectedWidth { found: 15 });
    }

    #[test]
    fn terrain_row_accepts_exact_width() {
        let tiles = vec![TileIndex::new(2).expect("tile index"); 16];
        let row = TerrainRow::from_tiles(&tiles).expect("width matches the grid");
        assert_eq!(row.tile(0), TileIndex::new(2));
        assert_eq!(row.tile(15), TileIndex::new(2));
        assert_eq!(row.tile(16), None);
    }

    #[test]
    fn tile_index_rejects_values_beyond_tile_set() {
        assert!(TileIndex::new(15).is_some());
        assert!(TileIndex::new(16).is_none());
    }

    #[test]
    fn classifier_reports_configured_classes() {
        let mut classes = [ObstacleClass::Free; TileIndex::COUNT];
        classes[9] = ObstacleClass::HighCover;
        let classifier = ObstacleClassifier::new(classes);

        let wall = TileIndex::new(9).expect("tile index");
        let floor = TileIndex::new(0).expect("tile index");
        assert_eq!(classifier.classify(wall), ObstacleClass::HighCover);
        assert_eq!(classifier.classify(floor), ObstacleClass::Free);
        assert!(classifier.classify(wall).obstructs_motion());
        assert!(!classifier.classify(floor).obstructs_motion());
    }

    #[test]
    fn archetype_policy_round_trips_through_bincode() {
        let catalog = crate::archetype::ArchetypeCatalog::builtin();
        let policies: Vec<ArchetypePolicy> = catalog.iter().cloned().collect();
        for policy in &policies {
            assert_round_trip(policy);
        }
    }

    #[test]
    fn input_frame_round_trips_through_bincode() {
        let frame = super::InputFrame {
            horizontal: super::Thrust::Positive,
            vertical: super::Thrust::Negative,
            aim: true,
            crouch: true,
            trigger: false,
        };
        assert_round_trip(&frame);
    }

    #[test]
    fn tile_coord_round_trips_through_bincode() {
        assert_round_trip(&TileCoord::new(-1, 42));
    }
}
