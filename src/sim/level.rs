/// Level parsing: ASCII text to a validated `LevelDef`.
///
/// Parsing is all-or-nothing. Any malformed row, unknown glyph, or
/// missing/duplicate marker fails the whole level before a world is
/// ever built from it.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use thiserror::Error;

use crate::domain::actor::Species;
use crate::domain::geometry::Rect;
use crate::domain::tile::{Tile, TileCollision, TileGrid, TILE_HEIGHT, TILE_WIDTH};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level is empty")]
    Empty,
    #[error("row {line} is {found} tiles wide, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile '{glyph}' at ({x}, {y})")]
    UnknownTile { glyph: char, x: usize, y: usize },
    #[error("level has no start marker")]
    NoStart,
    #[error("level has more than one start marker")]
    MultipleStart,
    #[error("level has no exit")]
    NoExit,
    #[error("level has more than one exit")]
    MultipleExit,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A parsed, validated level, ready to build a world from.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub grid: TileGrid,
    /// Ghost spawn, bottom-center of the marked cell.
    pub start: Vec2,
    /// Exit trigger point, center of the marked cell.
    pub exit: Vec2,
    /// Animal spawns in reading order, bottom-center each.
    pub spawns: Vec<(Species, Vec2)>,
}

fn cell_bounds(x: usize, y: usize) -> Rect {
    Rect::new(
        x as f32 * TILE_WIDTH,
        y as f32 * TILE_HEIGHT,
        TILE_WIDTH,
        TILE_HEIGHT,
    )
}

fn bottom_center(x: usize, y: usize) -> Vec2 {
    let cell = cell_bounds(x, y);
    Vec2::new(cell.center().x, cell.bottom())
}

/// Glyph legend:
/// `.` or space open air, `:` decorative block, `|` climbable trunk,
/// `-` branch and `~` log (one-way platforms), `#` `g` `d` `/` `\`
/// solid ground, `p` ghost start, `x`/`X` exit, `r s q m k o` animals.
pub fn parse(name: &str, text: &str) -> Result<LevelDef, LevelError> {
    let rows: Vec<&str> = text.lines().filter(|row| !row.is_empty()).collect();
    if rows.is_empty() {
        return Err(LevelError::Empty);
    }
    let width = rows[0].chars().count();
    if width == 0 {
        return Err(LevelError::Empty);
    }

    let mut tiles = Vec::with_capacity(width * rows.len());
    let mut start = None;
    let mut exit = None;
    let mut spawns = Vec::new();

    for (y, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != width {
            return Err(LevelError::RaggedRow {
                line: y + 1,
                expected: width,
                found,
            });
        }
        for (x, glyph) in row.chars().enumerate() {
            let collision = match glyph {
                '.' | ' ' | ':' => TileCollision::Passable,
                '-' | '~' => TileCollision::Platform,
                '|' => TileCollision::Climbable,
                '#' | 'g' | 'd' | '/' | '\\' => TileCollision::Impassable,
                'p' => {
                    if start.is_some() {
                        return Err(LevelError::MultipleStart);
                    }
                    start = Some(bottom_center(x, y));
                    TileCollision::Passable
                }
                'x' | 'X' => {
                    if exit.is_some() {
                        return Err(LevelError::MultipleExit);
                    }
                    exit = Some(cell_bounds(x, y).center());
                    TileCollision::Passable
                }
                code => match Species::from_code(code) {
                    Some(species) => {
                        spawns.push((species, bottom_center(x, y)));
                        TileCollision::Passable
                    }
                    None => return Err(LevelError::UnknownTile { glyph: code, x, y }),
                },
            };
            // Markers render as the terrain they sit in.
            let display = match glyph {
                ' ' | 'p' => '.',
                'X' => 'x',
                c if Species::from_code(c).is_some() => '.',
                c => c,
            };
            tiles.push(Tile {
                glyph: display,
                collision,
            });
        }
    }

    let start = start.ok_or(LevelError::NoStart)?;
    let exit = exit.ok_or(LevelError::NoExit)?;

    Ok(LevelDef {
        name: name.to_string(),
        grid: TileGrid::new(tiles, width, rows.len()),
        start,
        exit,
        spawns,
    })
}

/// Load `*.txt` levels from `dir` in filename order; when the directory
/// is missing or holds no levels, fall back to the built-in set.
pub fn load_levels(dir: Option<&Path>) -> Result<Vec<LevelDef>, LevelError> {
    if let Some(dir) = dir {
        if dir.is_dir() {
            let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
                .collect();
            paths.sort();
            if !paths.is_empty() {
                let mut levels = Vec::with_capacity(paths.len());
                for path in paths {
                    let name = path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let text = fs::read_to_string(&path)?;
                    levels.push(parse(&name, &text)?);
                }
                return Ok(levels);
            }
        }
    }
    BUILTIN_LEVELS
        .iter()
        .map(|(name, text)| parse(name, text))
        .collect()
}

pub const BUILTIN_LEVELS: &[(&str, &str)] = &[
    (
        "meadow",
        "\
........................
........................
.................x......
...............###......
........................
...........----.........
........................
..p...r.................
########################
",
    ),
    (
        "grove",
        "\
........................
..x.....................
..###...................
........|...............
........|.....~~~~......
........|...............
........|....k..........
..p..q..|............o..
########################
",
    ),
    (
        "keep",
        "\
........................
...................x....
.................###....
........................
............----........
........................
.......----.............
..p.o...................
########################
",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_levels_all_parse() {
        let levels = load_levels(None).unwrap();
        assert_eq!(levels.len(), BUILTIN_LEVELS.len());
        for level in &levels {
            assert!(!level.spawns.is_empty(), "{} has no animals", level.name);
        }
    }

    #[test]
    fn markers_map_to_cell_anchors() {
        let def = parse("t", "x..\n.p.\n###\n").unwrap();
        // Exit at the cell center, start at the cell's bottom-center.
        assert_eq!(def.exit, Vec2::new(16.0, 16.0));
        assert_eq!(def.start, Vec2::new(48.0, 64.0));
    }

    #[test]
    fn animal_codes_spawn_and_clear_the_tile() {
        let def = parse("t", "p.x\nr.k\n###\n").unwrap();
        assert_eq!(def.spawns.len(), 2);
        assert_eq!(def.spawns[0].0, Species::Rabbit);
        assert_eq!(def.spawns[1].0, Species::Kiwi);
        assert_eq!(def.spawns[0].1, Vec2::new(16.0, 64.0));
        assert_eq!(def.grid.glyph_at(0, 1), Some('.'));
        assert_eq!(
            def.grid.collision_at(0, 1),
            crate::domain::tile::TileCollision::Passable
        );
    }

    #[test]
    fn space_reads_as_open_air() {
        let def = parse("t", "p x\n###\n").unwrap();
        assert_eq!(
            def.grid.collision_at(1, 0),
            crate::domain::tile::TileCollision::Passable
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        match parse("t", "p.x\n##\n") {
            Err(LevelError::RaggedRow {
                line,
                expected,
                found,
            }) => {
                assert_eq!((line, expected, found), (2, 3, 2));
            }
            other => panic!("expected ragged row error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_glyphs_are_rejected() {
        assert!(matches!(
            parse("t", "p?x\n###\n"),
            Err(LevelError::UnknownTile { glyph: '?', .. })
        ));
    }

    #[test]
    fn start_and_exit_must_be_unique() {
        assert!(matches!(parse("t", "..x\n###\n"), Err(LevelError::NoStart)));
        assert!(matches!(parse("t", "p..\n###\n"), Err(LevelError::NoExit)));
        assert!(matches!(
            parse("t", "ppx\n###\n"),
            Err(LevelError::MultipleStart)
        ));
        assert!(matches!(
            parse("t", "pxx\n###\n"),
            Err(LevelError::MultipleExit)
        ));
    }
}
