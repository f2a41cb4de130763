#![allow(clippy::missing_errors_doc)]

//! Parsers for level tile maps, spawn manifests and archetype tuning.
//!
//! Tile maps are plain text, one row per line, one hexadecimal digit per
//! tile. Spawn manifests are line-oriented `key=value` text carrying the
//! obstacle classification and the spawn roster. Archetype tuning is TOML.
//! Blank lines and lines starting with `#` are skipped in both text formats.

use gridfire_core::{
    archetype::{ArchetypeCatalog, ArchetypePolicy, CatalogError},
    ObstacleClass, ObstacleClassifier, TerrainRow, TerrainRowError, TileCoord, TileIndex,
    GRID_COLUMNS,
};
use serde::Deserialize;
use thiserror::Error;

/// Parses a hex tile map into terrain rows ordered top to bottom.
pub(crate) fn parse_level(text: &str) -> Result<Vec<TerrainRow>, LevelFormatError> {
    let mut rows = Vec::new();
    for (line, content) in numbered_lines(text) {
        let mut tiles = Vec::with_capacity(GRID_COLUMNS as usize);
        for symbol in content.chars() {
            let digit = symbol
                .to_digit(16)
                .ok_or(LevelFormatError::InvalidTileDigit { line, symbol })?;
            match TileIndex::new(digit as u8) {
                Some(tile) => tiles.push(tile),
                None => return Err(LevelFormatError::InvalidTileDigit { line, symbol }),
            }
        }
        let row = TerrainRow::from_tiles(&tiles).map_err(|error| match error {
            TerrainRowError::UnexpectedWidth { found } => {
                LevelFormatError::UnexpectedRowWidth { line, found }
            }
        })?;
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(LevelFormatError::EmptyLevel);
    }
    Ok(rows)
}

/// Spawn roster entry naming an archetype and its starting tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SpawnEntry {
    /// Archetype name, resolved against the catalog at spawn time.
    pub archetype: String,
    /// Tile the actor occupies after spawning.
    pub tile: TileCoord,
}

/// Parsed spawn manifest: obstacle classification plus the spawn roster.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LevelManifest {
    /// Obstacle class per tile index; unlisted indices stay open ground.
    pub classifier: ObstacleClassifier,
    /// Spawn roster ordered by manifest index.
    pub spawns: Vec<SpawnEntry>,
}

/// Parses a spawn manifest from line-oriented `key=value` text.
///
/// `class.<hex digit>` entries assign an obstacle class to a tile index and
/// `spawn.<n>` entries add `archetype,column,row` roster lines. Spawns are
/// ordered by `<n>`, which fixes the actor identifiers a replay sees.
pub(crate) fn parse_manifest(text: &str) -> Result<LevelManifest, ManifestError> {
    let mut classes = [ObstacleClass::Free; TileIndex::COUNT];
    let mut spawns: Vec<(u32, SpawnEntry)> = Vec::new();

    for (line, content) in numbered_lines(text) {
        let (key, value) = content
            .split_once('=')
            .ok_or(ManifestError::MissingSeparator { line })?;
        let key = key.trim();
        let value = value.trim();

        if let Some(token) = key.strip_prefix("class.") {
            let index = parse_tile_index(token, line)?;
            classes[index.get() as usize] = parse_class(value, line)?;
        } else if let Some(token) = key.strip_prefix("spawn.") {
            let index = token.parse::<u32>().map_err(|_| ManifestError::InvalidSpawnIndex {
                line,
                token: token.to_owned(),
            })?;
            if spawns.iter().any(|(existing, _)| *existing == index) {
                return Err(ManifestError::DuplicateSpawnIndex { line, index });
            }
            spawns.push((index, parse_spawn(value, line)?));
        } else {
            return Err(ManifestError::UnknownKey {
                line,
                key: key.to_owned(),
            });
        }
    }

    spawns.sort_by_key(|(index, _)| *index);
    Ok(LevelManifest {
        classifier: ObstacleClassifier::new(classes),
        spawns: spawns.into_iter().map(|(_, entry)| entry).collect(),
    })
}

/// Parses a TOML tuning file into a validated archetype catalog.
pub(crate) fn parse_tuning(text: &str) -> Result<ArchetypeCatalog, TuningError> {
    let file: TuningFile = toml::from_str(text)?;
    ArchetypeCatalog::new(file.archetype).map_err(TuningError::Catalog)
}

#[derive(Debug, Deserialize)]
struct TuningFile {
    archetype: Vec<ArchetypePolicy>,
}

fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_tile_index(token: &str, line: usize) -> Result<TileIndex, ManifestError> {
    u8::from_str_radix(token, 16)
        .ok()
        .and_then(TileIndex::new)
        .ok_or_else(|| ManifestError::InvalidClassIndex {
            line,
            token: token.to_owned(),
        })
}

fn parse_class(token: &str, line: usize) -> Result<ObstacleClass, ManifestError> {
    match token {
        "free" => Ok(ObstacleClass::Free),
        "low" => Ok(ObstacleClass::LowCover),
        "high" => Ok(ObstacleClass::HighCover),
        "overpass" => Ok(ObstacleClass::Overpass),
        _ => Err(ManifestError::UnknownClass {
            line,
            token: token.to_owned(),
        }),
    }
}

fn parse_spawn(value: &str, line: usize) -> Result<SpawnEntry, ManifestError> {
    let mut fields = value.split(',');
    let archetype = fields.next().map(str::trim).filter(|name| !name.is_empty());
    let column = fields.next().and_then(|field| field.trim().parse::<i32>().ok());
    let row = fields.next().and_then(|field| field.trim().parse::<i32>().ok());

    match (archetype, column, row, fields.next()) {
        (Some(archetype), Some(column), Some(row), None) => {
            if column < 0 || column >= GRID_COLUMNS as i32 || row < 0 {
                return Err(ManifestError::SpawnOutOfGrid { line, column, row });
            }
            Ok(SpawnEntry {
                archetype: archetype.to_owned(),
                tile: TileCoord::new(column, row),
            })
        }
        _ => Err(ManifestError::MalformedSpawn {
            line,
            value: value.to_owned(),
        }),
    }
}

/// Errors raised while parsing a level tile map.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum LevelFormatError {
    /// The map held no tile rows at all.
    #[error("level map holds no tile rows")]
    EmptyLevel,
    /// A map line held a character outside the hexadecimal tile range.
    #[error("level map line {line} holds '{symbol}', not a hex tile digit")]
    InvalidTileDigit {
        /// One-based source line of the offending character.
        line: usize,
        /// Character that failed to parse.
        symbol: char,
    },
    /// A map line did not hold exactly one grid width of digits.
    #[error("level map line {line} holds {found} tiles, not one full grid row")]
    UnexpectedRowWidth {
        /// One-based source line of the offending row.
        line: usize,
        /// Number of tiles the line actually held.
        found: usize,
    },
}

/// Errors raised while parsing a spawn manifest.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ManifestError {
    /// A manifest line held no `key=value` separator.
    #[error("manifest line {line} is missing the '=' separator")]
    MissingSeparator {
        /// One-based source line of the offending entry.
        line: usize,
    },
    /// A manifest key matched neither `class.` nor `spawn.`.
    #[error("manifest line {line} uses unknown key '{key}'")]
    UnknownKey {
        /// One-based source line of the offending entry.
        line: usize,
        /// Key that was not recognized.
        key: String,
    },
    /// A `class.` key did not name a hex tile index.
    #[error("manifest line {line} classifies invalid tile index '{token}'")]
    InvalidClassIndex {
        /// One-based source line of the offending entry.
        line: usize,
        /// Index token that failed to parse.
        token: String,
    },
    /// A `class.` value named no known obstacle class.
    #[error("manifest line {line} uses unknown obstacle class '{token}'")]
    UnknownClass {
        /// One-based source line of the offending entry.
        line: usize,
        /// Class token that was not recognized.
        token: String,
    },
    /// A `spawn.` key carried a non-numeric roster index.
    #[error("manifest line {line} uses invalid spawn index '{token}'")]
    InvalidSpawnIndex {
        /// One-based source line of the offending entry.
        line: usize,
        /// Index token that failed to parse.
        token: String,
    },
    /// Two `spawn.` keys carried the same roster index.
    #[error("manifest line {line} repeats spawn index {index}")]
    DuplicateSpawnIndex {
        /// One-based source line of the second occurrence.
        line: usize,
        /// Roster index that appeared twice.
        index: u32,
    },
    /// A `spawn.` value did not follow `archetype,column,row`.
    #[error("manifest line {line} holds malformed spawn entry '{value}'")]
    MalformedSpawn {
        /// One-based source line of the offending entry.
        line: usize,
        /// Value that failed to parse.
        value: String,
    },
    /// A spawn tile sat outside the grid columns or above the first row.
    #[error("manifest line {line} spawns outside the grid at column {column}, row {row}")]
    SpawnOutOfGrid {
        /// One-based source line of the offending entry.
        line: usize,
        /// Column the entry requested.
        column: i32,
        /// Row the entry requested.
        row: i32,
    },
}

/// Errors raised while loading archetype tuning.
#[derive(Debug, Error)]
pub(crate) enum TuningError {
    /// The tuning file was not valid TOML for the expected schema.
    #[error("archetype tuning is not valid TOML: {0}")]
    Syntax(#[from] toml::de::Error),
    /// The parsed policies did not assemble into a valid catalog.
    #[error("archetype tuning rejected: {0}")]
    Catalog(#[source] CatalogError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfire_core::archetype::DEFAULT_ARCHETYPE;

    fn tile(value: u8) -> TileIndex {
        TileIndex::new(value).expect("tile index in range")
    }

    #[test]
    fn parses_tiles_and_skips_comments_and_blank_lines() {
        let text = "# perimeter test strip\n\n0000000888000000\n00000000000000a0\n";

        let rows = parse_level(text).expect("map parses");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tile(7), Some(tile(8)));
        assert_eq!(rows[0].tile(0), Some(tile(0)));
        assert_eq!(rows[1].tile(14), Some(tile(0xa)));
    }

    #[test]
    fn short_rows_fail_at_parse_and_at_row_construction() {
        let error = parse_level("00000008880\n").expect_err("short row must fail");
        assert_eq!(
            error,
            LevelFormatError::UnexpectedRowWidth { line: 1, found: 11 }
        );

        let tiles = vec![tile(0); 11];
        assert_eq!(
            TerrainRow::from_tiles(&tiles),
            Err(TerrainRowError::UnexpectedWidth { found: 11 })
        );
    }

    #[test]
    fn stray_characters_and_empty_maps_are_rejected() {
        let error = parse_level("000000088800000g\n").expect_err("bad digit must fail");
        assert_eq!(
            error,
            LevelFormatError::InvalidTileDigit { line: 1, symbol: 'g' }
        );

        let error = parse_level("# nothing here\n").expect_err("empty map must fail");
        assert_eq!(error, LevelFormatError::EmptyLevel);
    }

    #[test]
    fn manifest_entries_assemble_classes_and_ordered_spawns() {
        let text = "\
# cover palette
class.8 = high
class.a = low
class.b = overpass

spawn.1 = sniper, 4, 18
spawn.0 = normal, 8, 30
";

        let manifest = parse_manifest(text).expect("manifest parses");
        assert_eq!(manifest.classifier.classify(tile(8)), ObstacleClass::HighCover);
        assert_eq!(manifest.classifier.classify(tile(0xa)), ObstacleClass::LowCover);
        assert_eq!(manifest.classifier.classify(tile(0xb)), ObstacleClass::Overpass);
        assert_eq!(manifest.classifier.classify(tile(0)), ObstacleClass::Free);
        assert_eq!(
            manifest.spawns,
            vec![
                SpawnEntry {
                    archetype: "normal".to_owned(),
                    tile: TileCoord::new(8, 30),
                },
                SpawnEntry {
                    archetype: "sniper".to_owned(),
                    tile: TileCoord::new(4, 18),
                },
            ]
        );
    }

    #[test]
    fn malformed_manifest_lines_are_rejected() {
        assert_eq!(
            parse_manifest("class.8 high\n"),
            Err(ManifestError::MissingSeparator { line: 1 })
        );
        assert_eq!(
            parse_manifest("speed = 3\n"),
            Err(ManifestError::UnknownKey {
                line: 1,
                key: "speed".to_owned(),
            })
        );
        assert_eq!(
            parse_manifest("class.z = high\n"),
            Err(ManifestError::InvalidClassIndex {
                line: 1,
                token: "z".to_owned(),
            })
        );
        assert_eq!(
            parse_manifest("class.8 = soft\n"),
            Err(ManifestError::UnknownClass {
                line: 1,
                token: "soft".to_owned(),
            })
        );
        assert_eq!(
            parse_manifest("spawn.one = normal, 4, 4\n"),
            Err(ManifestError::InvalidSpawnIndex {
                line: 1,
                token: "one".to_owned(),
            })
        );
        assert_eq!(
            parse_manifest("spawn.0 = normal, 4, 4\nspawn.0 = sniper, 5, 5\n"),
            Err(ManifestError::DuplicateSpawnIndex { line: 2, index: 0 })
        );
        assert_eq!(
            parse_manifest("spawn.0 = ghost\n"),
            Err(ManifestError::MalformedSpawn {
                line: 1,
                value: "ghost".to_owned(),
            })
        );
        assert_eq!(
            parse_manifest("spawn.0 = normal, 16, 2\n"),
            Err(ManifestError::SpawnOutOfGrid {
                line: 1,
                column: 16,
                row: 2,
            })
        );
    }

    #[test]
    fn tuning_toml_builds_a_catalog() {
        let text = r#"
[[archetype]]
name = "normal"
max_health = 40
near_band = 64.0
far_band = 256.0
fire = { cooldown = 90, speed = 260.0, damage = 10, spread_degrees = 6.0, los_gated = false }
drops = []

[[archetype.phases]]
action = "advance"
base_ticks = 60
jitter_ticks = 30
pace = 20

[[archetype]]
name = "sniper"
max_health = 60
near_band = 96.0
far_band = 320.0
fire = { cooldown = 150, speed = 320.0, damage = 25, spread_degrees = 2.0, los_gated = true }
aim = { windup = 30, track = 50, degrees_per_tick = 1.5 }
drops = [{ item = "ammo_cache", chance_percent = 25 }]

[[archetype.phases]]
action = "engage"
base_ticks = 75
jitter_ticks = 45
pace = 30
"#;

        let catalog = parse_tuning(text).expect("tuning parses");
        assert_eq!(catalog.len(), 2);
        let sniper = catalog.resolve("sniper").expect("sniper resolves");
        let policy = catalog.policy(sniper);
        assert!(policy.fire.los_gated);
        assert!(policy.aim.is_some());
        assert!(catalog.resolve(DEFAULT_ARCHETYPE).is_some());
    }

    #[test]
    fn tuning_without_the_default_archetype_is_rejected() {
        let text = r#"
[[archetype]]
name = "scout"
max_health = 20
near_band = 48.0
far_band = 200.0
fire = { cooldown = 60, speed = 240.0, damage = 5, spread_degrees = 8.0, los_gated = false }
drops = []

[[archetype.phases]]
action = "advance"
base_ticks = 40
jitter_ticks = 20
pace = 15
"#;

        assert!(matches!(
            parse_tuning(text),
            Err(TuningError::Catalog(CatalogError::MissingDefault))
        ));
    }
}
