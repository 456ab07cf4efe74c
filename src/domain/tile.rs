/// Tile classifications and the immutable tile grid.
/// Collision semantics live behind methods so they stay centralized here.
///
/// Grid layout: `(0, 0)` is the top-left tile, x grows rightward,
/// y grows downward. Gravity is +y.

use crate::domain::geometry::Rect;

/// Tile edge length in world pixels.
pub const TILE_WIDTH: f32 = 32.0;
pub const TILE_HEIGHT: f32 = 32.0;

/// How an actor interacts with a tile.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileCollision {
    /// Does not hinder motion at all.
    Passable,
    /// Completely solid on every side.
    Impassable,
    /// Solid only when landed on from above; actors jump up through it
    /// and walk past it sideways.
    Platform,
    /// Passable, but an actor aligned with its edge may climb it, and it
    /// acts as ground to walk across the top of.
    Climbable,
}

impl TileCollision {
    /// Tiles the collision resolver can skip outright.
    #[inline]
    pub fn is_passable(self) -> bool {
        matches!(self, TileCollision::Passable)
    }

    #[inline]
    pub fn is_climbable(self) -> bool {
        matches!(self, TileCollision::Climbable)
    }
}

/// One grid cell: the glyph it was loaded from (display only — collision
/// code never reads it) plus its collision classification.
#[derive(Clone, Copy, Debug)]
pub struct Tile {
    pub glyph: char,
    pub collision: TileCollision,
}

impl Tile {
    pub const fn new(glyph: char, collision: TileCollision) -> Self {
        Tile { glyph, collision }
    }
}

/// Fixed-size grid of tiles, immutable once the level is loaded.
#[derive(Clone, Debug)]
pub struct TileGrid {
    tiles: Vec<Tile>, // row-major
    width: usize,
    height: usize,
}

impl TileGrid {
    /// `tiles` must be row-major with exactly `width * height` entries.
    pub fn new(tiles: Vec<Tile>, width: usize, height: usize) -> Self {
        debug_assert_eq!(tiles.len(), width * height);
        TileGrid { tiles, width, height }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Level width in world pixels.
    #[inline]
    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * TILE_WIDTH
    }

    /// Level height in world pixels. An actor wholly below this line has
    /// fallen into a pit.
    #[inline]
    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * TILE_HEIGHT
    }

    /// Collision classification at a tile coordinate.
    ///
    /// Out-of-bounds policy is load-bearing: beyond the left or right
    /// edge everything is solid, so nothing can walk off the sides of a
    /// level; above the top and below the bottom everything is open,
    /// which is what allows jumping over the skyline and falling into
    /// pits.
    pub fn collision_at(&self, x: i32, y: i32) -> TileCollision {
        if x < 0 || x >= self.width as i32 {
            return TileCollision::Impassable;
        }
        if y < 0 || y >= self.height as i32 {
            return TileCollision::Passable;
        }
        self.tiles[y as usize * self.width + x as usize].collision
    }

    /// Display glyph for the renderer. `None` out of bounds.
    pub fn glyph_at(&self, x: usize, y: usize) -> Option<char> {
        if x < self.width && y < self.height {
            Some(self.tiles[y * self.width + x].glyph)
        } else {
            None
        }
    }

    /// World-space bounds of the tile at `(x, y)`.
    pub fn bounds_of(&self, x: i32, y: i32) -> Rect {
        Rect::new(
            x as f32 * TILE_WIDTH,
            y as f32 * TILE_HEIGHT,
            TILE_WIDTH,
            TILE_HEIGHT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_1x1(collision: TileCollision) -> TileGrid {
        TileGrid::new(vec![Tile::new('#', collision)], 1, 1)
    }

    #[test]
    fn sides_are_sealed() {
        let g = grid_1x1(TileCollision::Passable);
        assert_eq!(g.collision_at(-1, 0), TileCollision::Impassable);
        assert_eq!(g.collision_at(1, 0), TileCollision::Impassable);
    }

    #[test]
    fn top_and_bottom_are_open() {
        let g = grid_1x1(TileCollision::Impassable);
        assert_eq!(g.collision_at(0, -1), TileCollision::Passable);
        assert_eq!(g.collision_at(0, 1), TileCollision::Passable);
    }

    #[test]
    fn in_bounds_query_reads_the_tile() {
        let g = grid_1x1(TileCollision::Platform);
        assert_eq!(g.collision_at(0, 0), TileCollision::Platform);
    }

    #[test]
    fn corner_uses_horizontal_seal_first() {
        // Off both axes at once: the side seal wins.
        let g = grid_1x1(TileCollision::Passable);
        assert_eq!(g.collision_at(-1, -1), TileCollision::Impassable);
    }

    #[test]
    fn tile_bounds_are_tile_sized_and_placed() {
        let g = grid_1x1(TileCollision::Passable);
        let b = g.bounds_of(3, 2);
        assert_eq!(b, Rect::new(96.0, 64.0, 32.0, 32.0));
    }
}
