//! Immutable level terrain with cached obstacle classes.

use gridfire_core::{
    ObstacleClass, ObstacleClassifier, TerrainRow, TileCoord, TileIndex, GRID_COLUMNS, TILE_LENGTH,
    VIEW_HEIGHT,
};

/// Row-major tile storage for one loaded level.
///
/// Tile indices are kept for presentation queries while the obstacle class of
/// every tile is cached at load so per-tick lookups never touch the
/// classifier.
#[derive(Debug, Clone)]
pub(crate) struct TerrainGrid {
    columns: u32,
    rows: u32,
    tiles: Vec<TileIndex>,
    classes: Vec<ObstacleClass>,
}

impl TerrainGrid {
    /// Grid with no rows, used before any level has been loaded.
    pub(crate) fn empty() -> Self {
        Self {
            columns: GRID_COLUMNS,
            rows: 0,
            tiles: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Builds a grid from validated rows and a tile classifier.
    pub(crate) fn from_rows(rows: &[TerrainRow], classifier: &ObstacleClassifier) -> Self {
        let mut tiles = Vec::with_capacity(rows.len() * GRID_COLUMNS as usize);
        let mut classes = Vec::with_capacity(rows.len() * GRID_COLUMNS as usize);
        for row in rows {
            for tile in row.tiles() {
                tiles.push(*tile);
                classes.push(classifier.classify(*tile));
            }
        }
        Self {
            columns: GRID_COLUMNS,
            rows: rows.len() as u32,
            tiles,
            classes,
        }
    }

    pub(crate) const fn columns(&self) -> u32 {
        self.columns
    }

    pub(crate) const fn rows(&self) -> u32 {
        self.rows
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.rows > 0
    }

    /// Obstacle class of the tile, or `None` beyond the grid.
    pub(crate) fn class_at(&self, tile: TileCoord) -> Option<ObstacleClass> {
        let index = self.index(tile)?;
        self.classes.get(index).copied()
    }

    /// Whether motion into the tile is refused; coordinates beyond the grid
    /// always refuse.
    pub(crate) fn blocks_motion(&self, tile: TileCoord) -> bool {
        self.class_at(tile)
            .map_or(true, ObstacleClass::obstructs_motion)
    }

    /// Row-major obstacle classes backing query views.
    pub(crate) fn classes(&self) -> &[ObstacleClass] {
        &self.classes
    }

    /// Row-major tile indices backing presentation queries.
    pub(crate) fn tiles(&self) -> &[TileIndex] {
        &self.tiles
    }

    /// World-space Y of the view top when the level starts.
    ///
    /// The view opens on the bottom of the map and scrolls toward row zero.
    pub(crate) fn initial_scroll(&self) -> f32 {
        (self.rows as f32 * TILE_LENGTH - VIEW_HEIGHT).max(0.0)
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        let column = u32::try_from(tile.column()).ok()?;
        let row = u32::try_from(tile.row()).ok()?;
        if column < self.columns && row < self.rows {
            Some(row as usize * self.columns as usize + column as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TerrainGrid;
    use gridfire_core::{
        ObstacleClass, ObstacleClassifier, TerrainRow, TileCoord, TileIndex, GRID_COLUMNS,
    };

    fn classifier_with(index: u8, class: ObstacleClass) -> ObstacleClassifier {
        let mut classes = [ObstacleClass::Free; TileIndex::COUNT];
        classes[index as usize] = class;
        ObstacleClassifier::new(classes)
    }

    fn uniform_row(index: u8) -> TerrainRow {
        let tile = TileIndex::new(index).expect("tile index");
        TerrainRow::from_tiles(&[tile; GRID_COLUMNS as usize]).expect("row width")
    }

    #[test]
    fn classes_are_cached_from_the_classifier() {
        let rows = vec![uniform_row(0), uniform_row(9)];
        let classifier = classifier_with(9, ObstacleClass::HighCover);
        let grid = TerrainGrid::from_rows(&rows, &classifier);

        assert_eq!(grid.class_at(TileCoord::new(0, 0)), Some(ObstacleClass::Free));
        assert_eq!(
            grid.class_at(TileCoord::new(15, 1)),
            Some(ObstacleClass::HighCover)
        );
        assert!(grid.blocks_motion(TileCoord::new(15, 1)));
        assert!(!grid.blocks_motion(TileCoord::new(0, 0)));
    }

    #[test]
    fn coordinates_beyond_the_grid_refuse_motion() {
        let grid = TerrainGrid::from_rows(&[uniform_row(0)], &ObstacleClassifier::all_free());

        assert_eq!(grid.class_at(TileCoord::new(-1, 0)), None);
        assert_eq!(grid.class_at(TileCoord::new(16, 0)), None);
        assert_eq!(grid.class_at(TileCoord::new(0, 1)), None);
        assert!(grid.blocks_motion(TileCoord::new(-1, 0)));
        assert!(grid.blocks_motion(TileCoord::new(0, -1)));
    }

    #[test]
    fn initial_scroll_opens_on_the_map_bottom() {
        let rows: Vec<_> = (0..20).map(|_| uniform_row(0)).collect();
        let grid = TerrainGrid::from_rows(&rows, &ObstacleClassifier::all_free());

        // 20 rows of 16 units minus the 224 unit view leaves 96.
        assert_eq!(grid.initial_scroll(), 96.0);
    }

    #[test]
    fn short_maps_never_scroll_below_zero() {
        let rows: Vec<_> = (0..5).map(|_| uniform_row(0)).collect();
        let grid = TerrainGrid::from_rows(&rows, &ObstacleClassifier::all_free());
        assert_eq!(grid.initial_scroll(), 0.0);
    }

    #[test]
    fn empty_grid_reports_unloaded() {
        let grid = TerrainGrid::empty();
        assert!(!grid.is_loaded());
        assert_eq!(grid.rows(), 0);
        assert!(grid.blocks_motion(TileCoord::new(0, 0)));
    }
}
