//! Box-versus-tile collision resolution.
//!
//! The resolver inspects the eight tiles surrounding the tile under the
//! moved box's center. Cardinal neighbors are settled first and take
//! precedence; at most one diagonal neighbor is settled per call, and the
//! face it was struck on is disambiguated from the pre-motion box.

use gridfire_core::{Correction, TileCoord, WorldPoint, WorldRect, WorldVec, TILE_LENGTH};

use crate::terrain::TerrainGrid;

/// Diagonal neighbor offsets in resolution priority order: bottom-right,
/// bottom-left, top-left, top-right.
const DIAGONAL_ORDER: [(i32, i32); 4] = [(1, 1), (-1, 1), (-1, -1), (1, -1)];

/// Nudge distance applied when a diagonal contact is fully degenerate.
const DEGENERATE_NUDGE: f32 = 1.0;

/// Computes the correction that cancels tile penetration after a move.
///
/// `moved` is the box with the tick's displacement already applied and
/// `delta` is that displacement. The correction is returned for the
/// caller to add; the box itself is never mutated here.
pub(crate) fn resolve(grid: &TerrainGrid, moved: WorldRect, delta: WorldVec) -> Correction {
    let center_tile = tile_containing(moved.center());

    let cardinal = resolve_cardinals(grid, moved, center_tile);
    if !cardinal.is_zero() {
        return cardinal;
    }

    for (column_offset, row_offset) in DIAGONAL_ORDER {
        let tile = TileCoord::new(
            center_tile.column() + column_offset,
            center_tile.row() + row_offset,
        );
        if !grid.blocks_motion(tile) {
            continue;
        }
        let rect = tile_rect(tile);
        if !overlaps(moved, rect) {
            continue;
        }
        return resolve_diagonal(moved, delta, rect, column_offset, row_offset);
    }

    Correction::NONE
}

/// Settles contacts against the four edge-adjacent neighbor tiles.
///
/// A box only ever spans two columns and two rows, so at most one neighbor
/// per axis can be penetrated at a time.
fn resolve_cardinals(grid: &TerrainGrid, moved: WorldRect, center_tile: TileCoord) -> Correction {
    let mut x = 0.0;
    let mut y = 0.0;

    let east = tile_rect(TileCoord::new(center_tile.column() + 1, center_tile.row()));
    let west = tile_rect(TileCoord::new(center_tile.column() - 1, center_tile.row()));
    if grid.blocks_motion(TileCoord::new(center_tile.column() + 1, center_tile.row()))
        && moved.right() > east.left()
    {
        x = east.left() - moved.right();
    } else if grid.blocks_motion(TileCoord::new(center_tile.column() - 1, center_tile.row()))
        && moved.left() < west.right()
    {
        x = west.right() - moved.left();
    }

    let south = tile_rect(TileCoord::new(center_tile.column(), center_tile.row() + 1));
    let north = tile_rect(TileCoord::new(center_tile.column(), center_tile.row() - 1));
    if grid.blocks_motion(TileCoord::new(center_tile.column(), center_tile.row() + 1))
        && moved.bottom() > south.top()
    {
        y = south.top() - moved.bottom();
    } else if grid.blocks_motion(TileCoord::new(center_tile.column(), center_tile.row() - 1))
        && moved.top() < north.bottom()
    {
        y = north.bottom() - moved.top();
    }

    Correction::new(x, y)
}

/// Settles a single diagonal contact.
///
/// The struck face is inferred from the pre-motion box: an axis the box had
/// already crossed before moving cannot be the one the contact happened on.
fn resolve_diagonal(
    moved: WorldRect,
    delta: WorldVec,
    rect: WorldRect,
    column_offset: i32,
    row_offset: i32,
) -> Correction {
    let pre = moved.translated(-delta.x(), -delta.y());
    let x_crossed = pre.right() > rect.left() && pre.left() < rect.right();
    let y_crossed = pre.bottom() > rect.top() && pre.top() < rect.bottom();

    let flush_x = if column_offset > 0 {
        rect.left() - moved.right()
    } else {
        rect.right() - moved.left()
    };
    let flush_y = if row_offset > 0 {
        rect.top() - moved.bottom()
    } else {
        rect.bottom() - moved.top()
    };

    match (x_crossed, y_crossed) {
        // Approach was orthogonal: only the freshly crossed axis corrects.
        (true, false) => Correction::new(0.0, flush_y),
        (false, true) => Correction::new(flush_x, 0.0),
        // True corner contact corrects both axes.
        (false, false) => Correction::new(flush_x, flush_y),
        // The box already interpenetrated before moving. Break the tie on
        // the larger displacement; an exact tie gets a fixed nudge away
        // from the struck diagonal. Callers may rely on termination and on
        // the box ending non-penetrating, not on the exact offset.
        (true, true) => {
            if delta.x().abs() > delta.y().abs() {
                Correction::new(flush_x, 0.0)
            } else if delta.y().abs() > delta.x().abs() {
                Correction::new(0.0, flush_y)
            } else {
                Correction::new(
                    -(column_offset as f32) * DEGENERATE_NUDGE,
                    -(row_offset as f32) * DEGENERATE_NUDGE,
                )
            }
        }
    }
}

fn tile_containing(point: WorldPoint) -> TileCoord {
    TileCoord::new(
        (point.x() / TILE_LENGTH).floor() as i32,
        (point.y() / TILE_LENGTH).floor() as i32,
    )
}

fn tile_rect(tile: TileCoord) -> WorldRect {
    WorldRect::new(
        tile.column() as f32 * TILE_LENGTH,
        tile.row() as f32 * TILE_LENGTH,
        TILE_LENGTH,
        TILE_LENGTH,
    )
}

fn overlaps(a: WorldRect, b: WorldRect) -> bool {
    a.right() > b.left() && a.left() < b.right() && a.bottom() > b.top() && a.top() < b.bottom()
}
