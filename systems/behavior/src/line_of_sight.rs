//! Straight-line sight sampling over terrain obstruction classes.

use gridfire_core::{ObstacleClass, TerrainView, WorldPoint};

/// Distance between consecutive samples along a sight line, in world units.
const SAMPLE_SPACING: f32 = 8.0;

/// Severity of the worst obstruction found along a sight line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Obstruction {
    /// Nothing along the line interferes with a shot.
    Clear,
    /// Low cover shields the target unless its posture exposes it.
    Low,
    /// The line crosses terrain no shot can pass.
    High,
}

impl Obstruction {
    /// Whether a shot may be taken through this obstruction level.
    #[must_use]
    pub fn permits_fire(self, target_exposed: bool) -> bool {
        match self {
            Self::Clear => true,
            Self::Low => target_exposed,
            Self::High => false,
        }
    }
}

/// Reports the worst obstruction along the segment from origin to target.
///
/// Samples lie every eight world units strictly between the endpoints, so
/// neither combatant's own tile raises severity. Overpass tiles never raise
/// severity. Samples beyond the grid count as high cover, matching the solid
/// map boundary.
#[must_use]
pub fn check(origin: WorldPoint, target: WorldPoint, terrain: &TerrainView<'_>) -> Obstruction {
    let length = origin.distance_to(target);
    if length == 0.0 {
        return Obstruction::Clear;
    }

    let step_x = (target.x() - origin.x()) / length * SAMPLE_SPACING;
    let step_y = (target.y() - origin.y()) / length * SAMPLE_SPACING;
    let samples = (length / SAMPLE_SPACING).ceil() as u32;

    let mut worst = Obstruction::Clear;
    for index in 1..samples {
        let point = origin.offset(step_x * index as f32, step_y * index as f32);
        let severity = match terrain.class_at_point(point) {
            None | Some(ObstacleClass::HighCover) => Obstruction::High,
            Some(ObstacleClass::LowCover) => Obstruction::Low,
            Some(ObstacleClass::Free) | Some(ObstacleClass::Overpass) => Obstruction::Clear,
        };
        if severity == Obstruction::High {
            return Obstruction::High;
        }
        worst = worst.max(severity);
    }

    worst
}

#[cfg(test)]
mod tests {
    use super::{check, Obstruction};
    use gridfire_core::{ObstacleClass, TerrainView, TileCoord, WorldPoint, GRID_COLUMNS};

    const ROWS: u32 = 20;

    fn classes_with(overrides: &[(TileCoord, ObstacleClass)]) -> Vec<ObstacleClass> {
        let mut cells = vec![ObstacleClass::Free; GRID_COLUMNS as usize * ROWS as usize];
        for (tile, class) in overrides {
            let index = tile.row() as usize * GRID_COLUMNS as usize + tile.column() as usize;
            cells[index] = *class;
        }
        cells
    }

    #[test]
    fn open_ground_is_clear() {
        let cells = classes_with(&[]);
        let terrain = TerrainView::new(&cells, GRID_COLUMNS, ROWS);
        let severity = check(
            WorldPoint::new(8.0, 8.0),
            WorldPoint::new(8.0, 200.0),
            &terrain,
        );
        assert_eq!(severity, Obstruction::Clear);
    }

    #[test]
    fn high_cover_on_the_path_dominates() {
        let cells = classes_with(&[
            (TileCoord::new(0, 5), ObstacleClass::LowCover),
            (TileCoord::new(0, 7), ObstacleClass::HighCover),
        ]);
        let terrain = TerrainView::new(&cells, GRID_COLUMNS, ROWS);
        let severity = check(
            WorldPoint::new(8.0, 8.0),
            WorldPoint::new(8.0, 158.0),
            &terrain,
        );
        assert_eq!(severity, Obstruction::High);
    }

    #[test]
    fn low_cover_yields_a_posture_conditional_result() {
        let cells = classes_with(&[(TileCoord::new(0, 5), ObstacleClass::LowCover)]);
        let terrain = TerrainView::new(&cells, GRID_COLUMNS, ROWS);
        let severity = check(
            WorldPoint::new(8.0, 8.0),
            WorldPoint::new(8.0, 158.0),
            &terrain,
        );
        assert_eq!(severity, Obstruction::Low);
        assert!(severity.permits_fire(true));
        assert!(!severity.permits_fire(false));
    }

    #[test]
    fn overpass_tiles_never_raise_severity() {
        let cells = classes_with(&[
            (TileCoord::new(0, 4), ObstacleClass::Overpass),
            (TileCoord::new(0, 6), ObstacleClass::Overpass),
        ]);
        let terrain = TerrainView::new(&cells, GRID_COLUMNS, ROWS);
        let severity = check(
            WorldPoint::new(8.0, 8.0),
            WorldPoint::new(8.0, 158.0),
            &terrain,
        );
        assert_eq!(severity, Obstruction::Clear);
    }

    #[test]
    fn samples_beyond_the_grid_count_as_high_cover() {
        let cells = classes_with(&[]);
        let terrain = TerrainView::new(&cells, GRID_COLUMNS, ROWS);
        let severity = check(
            WorldPoint::new(8.0, 8.0),
            WorldPoint::new(-40.0, 8.0),
            &terrain,
        );
        assert_eq!(severity, Obstruction::High);
    }

    #[test]
    fn a_combatant_standing_in_cover_is_not_blocked_by_its_own_tile() {
        let cells = classes_with(&[(TileCoord::new(0, 8), ObstacleClass::HighCover)]);
        let terrain = TerrainView::new(&cells, GRID_COLUMNS, ROWS);
        let severity = check(
            WorldPoint::new(8.0, 140.0),
            WorldPoint::new(8.0, 240.0),
            &terrain,
        );
        assert_eq!(severity, Obstruction::Clear);
    }

    #[test]
    fn zero_length_segments_are_clear() {
        let cells = classes_with(&[(TileCoord::new(0, 0), ObstacleClass::HighCover)]);
        let terrain = TerrainView::new(&cells, GRID_COLUMNS, ROWS);
        let origin = WorldPoint::new(8.0, 8.0);
        assert_eq!(check(origin, origin, &terrain), Obstruction::Clear);
    }

    #[test]
    fn inserting_high_cover_never_lowers_severity() {
        let origin = WorldPoint::new(8.0, 8.0);
        let target = WorldPoint::new(8.0, 158.0);

        let base_cells = classes_with(&[(TileCoord::new(0, 5), ObstacleClass::LowCover)]);
        let base = check(origin, target, &TerrainView::new(&base_cells, GRID_COLUMNS, ROWS));

        let raised_cells = classes_with(&[
            (TileCoord::new(0, 5), ObstacleClass::LowCover),
            (TileCoord::new(0, 8), ObstacleClass::HighCover),
        ]);
        let raised = check(
            origin,
            target,
            &TerrainView::new(&raised_cells, GRID_COLUMNS, ROWS),
        );

        assert!(raised >= base);
        assert_eq!(raised, Obstruction::High);
    }
}
