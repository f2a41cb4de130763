#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Gridfire shells.
//!
//! The crate turns world views into declarative scene descriptors a backend
//! can draw without knowing anything about the simulation. Backends implement
//! [`RenderingBackend`] and receive a fresh [`Scene`] each frame.

use std::{error::Error, fmt, ops::Range, time::Duration};

use anyhow::Result as AnyResult;
use glam::Vec2;
use gridfire_core::{
    ActorId, ActorView, InputFrame, PlayerView, Posture, ScrollOffset, TileIndex, WorldPoint,
    PLAYER_MUZZLE_OFFSET, TILE_LENGTH, VIEW_HEIGHT, VIEW_WIDTH,
};

/// Clear color behind the tile layer.
const BACKGROUND: Color = Color::from_rgb_u8(12, 12, 18);

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color darkened towards black by the provided amount.
    #[must_use]
    pub fn darken(self, amount: f32) -> Self {
        let keep = 1.0 - amount.clamp(0.0, 1.0);
        Self {
            red: self.red * keep,
            green: self.green * keep,
            blue: self.blue * keep,
            alpha: self.alpha,
        }
    }
}

/// Maps world-space coordinates onto the output surface.
///
/// The view window spans [`VIEW_WIDTH`] by [`VIEW_HEIGHT`] world units below
/// the scroll offset; `scale` converts world units to output pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scroll: f32,
    scale: f32,
}

impl Viewport {
    /// Creates a viewport for the given scroll offset.
    ///
    /// Returns an error when `scale` is zero, negative, or not a number.
    pub fn new(scroll: ScrollOffset, scale: f32) -> Result<Self, RenderingError> {
        if !(scale > 0.0) {
            return Err(RenderingError::InvalidScale { scale });
        }
        Ok(Self {
            scroll: scroll.get(),
            scale,
        })
    }

    /// Size of the output surface in pixels.
    #[must_use]
    pub fn surface_size(&self) -> Vec2 {
        Vec2::new(VIEW_WIDTH * self.scale, VIEW_HEIGHT * self.scale)
    }

    /// Projects a world-space point into output pixels.
    #[must_use]
    pub fn world_to_screen(&self, point: WorldPoint) -> Vec2 {
        Vec2::new(
            point.x() * self.scale,
            (point.y() - self.scroll) * self.scale,
        )
    }

    /// Tile rows that intersect the view, clamped to the level's row count.
    #[must_use]
    pub fn visible_rows(&self, level_rows: u32) -> Range<u32> {
        let first = (self.scroll / TILE_LENGTH).floor().max(0.0) as u32;
        let last = ((self.scroll + VIEW_HEIGHT) / TILE_LENGTH).ceil() as u32;
        first.min(level_rows)..last.min(level_rows)
    }
}

/// One terrain tile quad resolved for the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSprite {
    /// Sheet index of the tile art.
    pub index: TileIndex,
    /// Top-left corner of the quad in output pixels.
    pub screen: Vec2,
}

/// One visible actor, ready for the sprite pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorSprite {
    /// Identifier allocated to the actor by the world.
    pub id: ActorId,
    /// Sprite-sheet frame derived from the actor's facing.
    pub frame: u8,
    /// Top-left corner of the sprite in output pixels.
    pub screen: Vec2,
    /// Whether the actor is playing out its death sequence.
    pub fading: bool,
}

/// The player's sprite for the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSprite {
    /// Top-left corner of the sprite in output pixels.
    pub screen: Vec2,
    /// Sprite-sheet frame derived from the player's facing.
    pub frame: u8,
    /// Whether the crouching art should be used.
    pub crouched: bool,
}

/// Gun cursor guide anchored at the player's muzzle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimIndicator {
    /// Muzzle anchor of the guide in output pixels.
    pub muzzle: Vec2,
    /// Cursor angle in degrees; zero points east, ninety up the map.
    pub angle_degrees: f32,
}

/// Short-lived projectile streak injected by the shell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TracerLine {
    /// Start of the streak in output pixels.
    pub from: Vec2,
    /// End of the streak in output pixels.
    pub to: Vec2,
    /// Streak color.
    pub color: Color,
}

/// Scene description combining the tile layer and its inhabitants.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Viewport the scene was composed against.
    pub viewport: Viewport,
    /// Solid color behind the tile layer.
    pub background: Color,
    /// Terrain quads for every visible tile, row-major.
    pub tiles: Vec<TileSprite>,
    /// Actors inside the view band.
    pub actors: Vec<ActorSprite>,
    /// The player, absent once external damage reports a death.
    pub player: Option<PlayerSprite>,
    /// Gun cursor guide, present while a live player aims.
    pub aim: Option<AimIndicator>,
    /// Projectile streaks animated by the shell between frames.
    pub tracers: Vec<TracerLine>,
}

impl Scene {
    /// Builds a scene from the world's presentation views.
    ///
    /// Tile quads cover only the rows the viewport reports visible. Actors
    /// flagged dormant are skipped; dying actors are marked for the fade
    /// pass. The aim guide appears only while a live player steers the
    /// cursor. Tracers start empty and belong to the shell.
    #[must_use]
    pub fn compose(
        viewport: Viewport,
        tiles: &[TileIndex],
        columns: u32,
        actors: &ActorView,
        player: &PlayerView,
    ) -> Self {
        let level_rows = if columns == 0 {
            0
        } else {
            tiles.len() as u32 / columns
        };

        let mut tile_sprites = Vec::new();
        for row in viewport.visible_rows(level_rows) {
            for column in 0..columns {
                let index = tiles[(row * columns + column) as usize];
                let origin =
                    WorldPoint::new(column as f32 * TILE_LENGTH, row as f32 * TILE_LENGTH);
                tile_sprites.push(TileSprite {
                    index,
                    screen: viewport.world_to_screen(origin),
                });
            }
        }

        let actor_sprites = actors
            .iter()
            .filter(|snapshot| !snapshot.dormant)
            .map(|snapshot| ActorSprite {
                id: snapshot.id,
                frame: snapshot.facing.index(),
                screen: viewport.world_to_screen(snapshot.position),
                fading: snapshot.dying,
            })
            .collect();

        let player_sprite = player.alive.then(|| PlayerSprite {
            screen: viewport.world_to_screen(player.position),
            frame: player.facing.index(),
            crouched: player.posture == Posture::Crouching,
        });

        let aim_indicator = player
            .aim
            .filter(|_| player.alive)
            .map(|angle_degrees| AimIndicator {
                muzzle: viewport.world_to_screen(
                    player
                        .position
                        .offset(PLAYER_MUZZLE_OFFSET.x(), PLAYER_MUZZLE_OFFSET.y()),
                ),
                angle_degrees,
            });

        Self {
            viewport,
            background: BACKGROUND,
            tiles: tile_sprites,
            actors: actor_sprites,
            player: player_sprite,
            aim: aim_indicator,
            tracers: Vec::new(),
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Gridfire scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The `update_scene` closure receives the simulated frame delta and the
    /// input sample the backend gathered, and may replace the scene before it
    /// is drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, InputFrame, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Scale must be a positive number to avoid a degenerate surface.
    InvalidScale {
        /// Provided scale that failed validation.
        scale: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidScale { scale } => {
                write!(f, "scale must be positive (received {scale})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfire_core::{
        archetype::ArchetypeCatalog, ActorSnapshot, Facing, TileCoord, WorldVec, GRID_COLUMNS,
    };

    fn viewport(scroll: f32, scale: f32) -> Viewport {
        Viewport::new(ScrollOffset::new(scroll), scale).expect("valid viewport")
    }

    fn snapshot(id: u32, tile: TileCoord, dormant: bool, dying: bool) -> ActorSnapshot {
        let (archetype, _) = ArchetypeCatalog::builtin().resolve_or_fallback("normal");
        ActorSnapshot {
            id: ActorId::new(id),
            archetype,
            tile,
            intended: None,
            position: tile.origin(),
            facing: Facing::South,
            health: 10,
            dying,
            dormant,
            idle: true,
            stuck: false,
        }
    }

    fn player_at(x: f32, y: f32, alive: bool) -> PlayerView {
        PlayerView {
            position: WorldPoint::new(x, y),
            velocity: WorldVec::ZERO,
            posture: Posture::Standing,
            facing: Facing::North,
            aim: None,
            alive,
        }
    }

    #[test]
    fn viewports_reject_degenerate_scales() {
        for scale in [0.0, -2.0, f32::NAN] {
            let error = Viewport::new(ScrollOffset::new(0.0), scale)
                .expect_err("degenerate scale must be rejected");
            assert!(matches!(error, RenderingError::InvalidScale { .. }));
        }
    }

    #[test]
    fn projection_is_scroll_relative_and_scaled() {
        let viewport = viewport(96.0, 2.0);
        let screen = viewport.world_to_screen(WorldPoint::new(8.0, 100.0));
        assert_eq!(screen, Vec2::new(16.0, 8.0));
        assert_eq!(viewport.surface_size(), Vec2::new(512.0, 448.0));
    }

    #[test]
    fn visible_rows_clamp_to_the_level() {
        assert_eq!(viewport(96.0, 1.0).visible_rows(40), 6..20);
        assert_eq!(viewport(0.0, 1.0).visible_rows(40), 0..14);
        assert_eq!(viewport(416.0, 1.0).visible_rows(40), 26..40);
        assert_eq!(viewport(0.0, 1.0).visible_rows(8), 0..8);
    }

    #[test]
    fn composition_covers_visible_tile_rows() {
        let tiles = vec![TileIndex::new(0).expect("tile index"); GRID_COLUMNS as usize * 20];
        let view = ActorView::from_snapshots(Vec::new());
        let player = player_at(120.0, 200.0, true);
        let scene = Scene::compose(viewport(96.0, 1.0), &tiles, GRID_COLUMNS, &view, &player);

        assert_eq!(scene.tiles.len(), GRID_COLUMNS as usize * 14);
        assert_eq!(scene.tiles[0].screen, Vec2::new(0.0, 0.0));
        assert!(scene.tracers.is_empty());
    }

    #[test]
    fn composition_culls_dormant_actors_and_marks_the_dying() {
        let tiles = vec![TileIndex::new(0).expect("tile index"); GRID_COLUMNS as usize * 20];
        let view = ActorView::from_snapshots(vec![
            snapshot(0, TileCoord::new(2, 8), false, false),
            snapshot(1, TileCoord::new(3, 8), true, false),
            snapshot(2, TileCoord::new(4, 8), false, true),
        ]);
        let player = player_at(120.0, 200.0, true);
        let scene = Scene::compose(viewport(96.0, 1.0), &tiles, GRID_COLUMNS, &view, &player);

        assert_eq!(scene.actors.len(), 2);
        assert!(!scene.actors[0].fading);
        assert!(scene.actors[1].fading);
        assert_eq!(scene.actors[1].id, ActorId::new(2));
        assert!(scene.player.is_some());

        let fallen = player_at(120.0, 200.0, false);
        let scene = Scene::compose(viewport(96.0, 1.0), &tiles, GRID_COLUMNS, &view, &fallen);
        assert!(scene.player.is_none());
    }

    #[test]
    fn composition_anchors_the_aim_guide_at_the_muzzle() {
        let tiles = vec![TileIndex::new(0).expect("tile index"); GRID_COLUMNS as usize * 20];
        let view = ActorView::from_snapshots(Vec::new());
        let mut player = player_at(120.0, 200.0, true);
        player.aim = Some(135.0);
        let scene = Scene::compose(viewport(96.0, 1.0), &tiles, GRID_COLUMNS, &view, &player);

        let guide = scene.aim.expect("aim guide");
        assert_eq!(guide.muzzle, Vec2::new(132.0, 112.0));
        assert_eq!(guide.angle_degrees, 135.0);

        player.alive = false;
        let scene = Scene::compose(viewport(96.0, 1.0), &tiles, GRID_COLUMNS, &view, &player);
        assert!(scene.aim.is_none(), "a fallen player shows no guide");
    }

    #[test]
    fn darkening_clamps_to_black() {
        let color = Color::from_rgb_u8(200, 100, 50);
        let dimmed = color.darken(0.5);
        assert!(dimmed.red < color.red);
        let black = color.darken(2.0);
        assert_eq!(black.red, 0.0);
        assert_eq!(black.alpha, color.alpha);
    }
}
