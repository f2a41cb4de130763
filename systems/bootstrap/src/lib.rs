#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a Gridfire session for its shell.

use gridfire_core::ScrollOffset;
use gridfire_world::{query, World};

/// Produces data required to greet the player.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the session starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Summarizes the loaded session for a shell's boot printout.
    #[must_use]
    pub fn boot_summary(&self, world: &World) -> BootSummary {
        let terrain = query::terrain(world);
        BootSummary {
            terrain_loaded: query::is_terrain_loaded(world),
            terrain_rows: terrain.rows(),
            actors: query::actors(world).len(),
            scroll: query::scroll_offset(world),
        }
    }
}

/// Snapshot of session state a shell prints before the first frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BootSummary {
    /// Whether a level has been loaded into the world.
    pub terrain_loaded: bool,
    /// Number of terrain rows in the loaded level.
    pub terrain_rows: u32,
    /// Actors currently in the roster.
    pub actors: usize,
    /// World-space offset of the view top.
    pub scroll: ScrollOffset,
}
