/// Actor physics: velocity integration, the jump state machine, climb
/// handling, and collision resolution against the tile grid.
///
/// Everything here is a pure function of (actor, input, grid, dt); no
/// I/O and no global state, so each rule is testable in isolation.

use glam::Vec2;

use crate::domain::actor::{Actor, ClimbSide, ControlInput};
use crate::domain::geometry::intersection_depth;
use crate::domain::tile::{TileCollision, TileGrid, TILE_HEIGHT, TILE_WIDTH};

/// How close (px) an actor's horizontal center must be to a trunk edge
/// to latch onto it.
pub const CLIMB_ALIGN_TOLERANCE: f32 = 8.0;

/// Hovering kiwi: seconds of free hover before the slow sink kicks in.
const HOVER_GRACE: f32 = 0.15;
/// Hover sink rate, whole pixels per frame.
const HOVER_SINK: f32 = 1.0;

/// Advance one actor by one frame. Climb intent is resolved first so
/// the integrator sees the final climb state, then velocities are
/// rebuilt, integrated, and the result pushed out of solid tiles.
pub fn update_actor(actor: &mut Actor, input: &ControlInput, grid: &TileGrid, dt: f32) {
    resolve_climb_intent(actor, input, grid);
    apply_physics(actor, input, grid, dt);
    actor.was_jumping = actor.is_jumping;
    actor.was_climbing = actor.climbing.is_some();
}

/// Latch onto (or fall off) a climbable trunk. Climbing is held only
/// while a vertical input is pressed and the actor stays aligned.
fn resolve_climb_intent(actor: &mut Actor, input: &ControlInput, grid: &TileGrid) {
    if input.move_axis.y == 0.0 {
        actor.climbing = None;
        return;
    }
    match aligned_climbable(actor, grid) {
        Some(side) => {
            if actor.climbing.is_none() {
                // Entering a climb sheds any accumulated fall speed.
                actor.velocity.y = 0.0;
            }
            actor.climbing = Some(side);
        }
        None => actor.climbing = None,
    }
}

/// An actor is aligned to a trunk when its bounds overlap a climbable
/// cell and its horizontal center sits within tolerance of one of that
/// cell's vertical edges. The nearer edge picks the side.
fn aligned_climbable(actor: &Actor, grid: &TileGrid) -> Option<ClimbSide> {
    let bounds = actor.bounding_rect();
    let center_x = bounds.center().x;

    let left_tile = (bounds.left() / TILE_WIDTH).floor() as i32;
    let right_tile = (bounds.right() / TILE_WIDTH).ceil() as i32 - 1;
    let top_tile = (bounds.top() / TILE_HEIGHT).floor() as i32;
    // One row past the feet, so a trunk directly underfoot can be
    // grabbed and descended into from a standing start.
    let bottom_tile = (bounds.bottom() / TILE_HEIGHT).ceil() as i32;

    for y in top_tile..=bottom_tile {
        for x in left_tile..=right_tile {
            if grid.collision_at(x, y) != TileCollision::Climbable {
                continue;
            }
            let cell = grid.bounds_of(x, y);
            let to_left = (center_x - cell.left()).abs();
            let to_right = (center_x - cell.right()).abs();
            if to_left <= to_right && to_left <= CLIMB_ALIGN_TOLERANCE {
                return Some(ClimbSide::Left);
            }
            if to_right < to_left && to_right <= CLIMB_ALIGN_TOLERANCE {
                return Some(ClimbSide::Right);
            }
        }
    }
    None
}

fn apply_physics(actor: &mut Actor, input: &ControlInput, grid: &TileGrid, dt: f32) {
    let t = actor.tunables;
    let previous_position = actor.position;

    let hovering =
        actor.species.hovers() && input.jump_held && !actor.on_ground && actor.climbing.is_none();

    // Vertical base velocity. A climb replaces gravity with direct
    // input-driven movement; leaving a climb sheds the fall speed that
    // would otherwise carry over.
    if actor.climbing.is_some() {
        actor.velocity.y = input.move_axis.y * t.move_acceleration * dt;
    } else {
        if actor.was_climbing {
            actor.velocity.y = 0.0;
        }
        if hovering {
            actor.velocity.y = 0.0;
            actor.hover_airtime += dt;
            if actor.hover_airtime > HOVER_GRACE {
                actor.position.y += HOVER_SINK;
            }
        } else {
            actor.velocity.y =
                (actor.velocity.y + t.gravity * dt).clamp(-t.max_fall_speed, t.max_fall_speed);
        }
    }
    if actor.on_ground || !input.jump_held {
        actor.hover_airtime = 0.0;
    }

    actor.velocity.x += input.move_axis.x * t.move_acceleration * dt;

    actor.is_jumping = input.jump_held;
    actor.velocity.y = do_jump(actor, actor.velocity.y, dt);

    // Drag, then the hard speed cap. Climbing counts as ground contact
    // for drag purposes and also damps the vertical axis.
    if actor.on_ground || actor.climbing.is_some() {
        actor.velocity.x *= t.ground_drag;
    } else {
        actor.velocity.x *= t.air_drag;
    }
    if actor.climbing.is_some() {
        actor.velocity.y *= t.ground_drag;
    }
    actor.velocity.x = actor.velocity.x.clamp(-t.max_move_speed, t.max_move_speed);

    // Integrate on whole pixels so tile-edge comparisons stay exact.
    actor.position += actor.velocity * dt;
    actor.position = actor.position.round();

    handle_collisions(actor, grid);

    // A fully blocked axis also loses its velocity, so pushing into a
    // wall does not bank speed.
    if actor.position.x == previous_position.x {
        actor.velocity.x = 0.0;
    }
    if actor.position.y == previous_position.y {
        actor.velocity.y = 0.0;
    }
}

/// The variable-height jump. Ascent velocity follows a power curve of
/// elapsed jump time; releasing the button ends the override early and
/// gravity takes back over. Non-jumping species (the ghost) instead
/// have their vertical velocity pinned to zero outside of climbs.
fn do_jump(actor: &mut Actor, velocity_y: f32, dt: f32) -> f32 {
    let t = actor.tunables;

    if !actor.species.can_jump() {
        actor.jump_time = 0.0;
        return if actor.climbing.is_some() { velocity_y } else { 0.0 };
    }

    if actor.is_jumping {
        let launching = !actor.was_jumping && (actor.on_ground || actor.climbing.is_some());
        if launching || actor.jump_time > 0.0 {
            if launching && actor.climbing.is_some() {
                // Jumping off a trunk releases the climb.
                actor.climbing = None;
            }
            actor.jump_time += dt;
        }

        if 0.0 < actor.jump_time && actor.jump_time <= t.max_jump_time {
            return t.jump_launch_velocity
                * (1.0 - (actor.jump_time / t.max_jump_time).powf(t.jump_control_power));
        }
        // Apex reached while the button is still held.
        actor.jump_time = 0.0;
    } else {
        actor.jump_time = 0.0;
    }
    velocity_y
}

/// Push the actor out of every solid tile its bounds overlap, scanning
/// the overlapped cell range row-major, top-left to bottom-right, and
/// recomputing bounds after each correction. The shallower penetration
/// axis is resolved first per tile; platforms and trunks only push back
/// when the actor arrived from above.
fn handle_collisions(actor: &mut Actor, grid: &TileGrid) {
    let mut bounds = actor.bounding_rect();
    let left_tile = (bounds.left() / TILE_WIDTH).floor() as i32;
    let right_tile = (bounds.right() / TILE_WIDTH).ceil() as i32 - 1;
    let top_tile = (bounds.top() / TILE_HEIGHT).floor() as i32;
    let bottom_tile = (bounds.bottom() / TILE_HEIGHT).ceil() as i32 - 1;

    actor.on_ground = false;

    for y in top_tile..=bottom_tile {
        for x in left_tile..=right_tile {
            let collision = grid.collision_at(x, y);
            if collision == TileCollision::Passable {
                continue;
            }

            let cell = grid.bounds_of(x, y);
            let depth = intersection_depth(&bounds, &cell);
            if depth == Vec2::ZERO {
                continue;
            }

            if depth.y.abs() <= depth.x.abs() || collision == TileCollision::Platform {
                // Crossed the tile's top edge this frame?
                if actor.previous_bottom <= cell.top() {
                    if collision == TileCollision::Climbable {
                        if actor.climbing.is_none() && !actor.is_jumping {
                            actor.on_ground = true;
                        }
                    } else {
                        actor.on_ground = true;
                    }
                }

                if collision == TileCollision::Impassable || actor.on_ground {
                    actor.position.y += depth.y;
                    bounds = actor.bounding_rect();
                }
            } else if collision == TileCollision::Impassable {
                actor.position.x += depth.x;
                bounds = actor.bounding_rect();
            }
        }
    }

    actor.previous_bottom = bounds.bottom();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::Species;
    use crate::domain::tile::Tile;

    /// Build a grid from ASCII rows: '#' solid, '.' empty, '-' platform,
    /// '|' trunk.
    fn tiles_from(rows: &[&str]) -> TileGrid {
        let width = rows[0].len();
        let mut tiles = Vec::with_capacity(width * rows.len());
        for row in rows {
            assert_eq!(row.len(), width);
            for glyph in row.chars() {
                let collision = match glyph {
                    '#' => TileCollision::Impassable,
                    '-' => TileCollision::Platform,
                    '|' => TileCollision::Climbable,
                    _ => TileCollision::Passable,
                };
                tiles.push(Tile { glyph, collision });
            }
        }
        TileGrid::new(tiles, width, rows.len())
    }

    /// Bottom-center spawn on top of tile (x, y).
    fn standing_on(x: usize, y: usize) -> Vec2 {
        Vec2::new(
            x as f32 * TILE_WIDTH + TILE_WIDTH / 2.0,
            y as f32 * TILE_HEIGHT,
        )
    }

    const DT: f32 = 1.0 / 60.0;

    fn settle(actor: &mut Actor, grid: &TileGrid) {
        let idle = ControlInput::default();
        for _ in 0..10 {
            update_actor(actor, &idle, grid, DT);
        }
        assert!(actor.on_ground);
    }

    #[test]
    fn free_fall_speeds_up_then_caps() {
        let grid = tiles_from(&["....", "....", "....", "...."]);
        let mut a = Actor::new(0, Species::Rabbit, Vec2::new(64.0, 32.0));
        let idle = ControlInput::default();

        let mut last = 0.0;
        for _ in 0..8 {
            update_actor(&mut a, &idle, &grid, DT);
            assert!(a.velocity.y > last);
            last = a.velocity.y;
        }
        for _ in 0..120 {
            update_actor(&mut a, &idle, &grid, DT);
        }
        assert!(a.velocity.y <= a.tunables.max_fall_speed);
    }

    #[test]
    fn landing_stops_on_solid_ground() {
        let grid = tiles_from(&["....", "....", "....", "####"]);
        let mut a = Actor::new(0, Species::Rabbit, Vec2::new(64.0, 48.0));
        let idle = ControlInput::default();
        for _ in 0..120 {
            update_actor(&mut a, &idle, &grid, DT);
        }
        assert!(a.on_ground);
        assert_eq!(a.bounding_rect().bottom(), 3.0 * TILE_HEIGHT);
    }

    #[test]
    fn jump_override_runs_until_max_jump_time() {
        let grid = tiles_from(&["....", "....", "....", "####"]);
        let mut a = Actor::new(0, Species::Rabbit, standing_on(1, 3));
        settle(&mut a, &grid);

        let jump = ControlInput {
            jump_held: true,
            ..ControlInput::default()
        };
        let mut override_frames = 0;
        for _ in 0..40 {
            update_actor(&mut a, &jump, &grid, DT);
            if a.jump_time > 0.0 {
                override_frames += 1;
                assert!(a.velocity.y <= 0.0);
            }
        }
        // max_jump_time (0.35 s) worth of frames, give or take float
        // accumulation in jump_time.
        let expected = (a.tunables.max_jump_time / DT) as i32;
        assert!((override_frames - expected).abs() <= 1);
        // Once the window closes, holding the button adds nothing and
        // gravity pulls the velocity back down.
        assert_eq!(a.jump_time, 0.0);
    }

    #[test]
    fn releasing_jump_ends_the_ascent_override() {
        let grid = tiles_from(&["....", "....", "....", "####"]);
        let mut a = Actor::new(0, Species::Rabbit, standing_on(1, 3));
        settle(&mut a, &grid);

        let jump = ControlInput {
            jump_held: true,
            ..ControlInput::default()
        };
        let idle = ControlInput::default();
        for _ in 0..3 {
            update_actor(&mut a, &jump, &grid, DT);
        }
        assert!(a.jump_time > 0.0);
        let vy_at_release = a.velocity.y;

        update_actor(&mut a, &idle, &grid, DT);
        assert_eq!(a.jump_time, 0.0);
        assert!(a.velocity.y > vy_at_release);
    }

    #[test]
    fn holding_jump_longer_reaches_a_higher_peak() {
        let grid = tiles_from(&["....", "....", "....", "####"]);
        let peak_y = |hold_frames: i32| {
            let mut a = Actor::new(0, Species::Rabbit, standing_on(1, 3));
            settle(&mut a, &grid);
            let jump = ControlInput {
                jump_held: true,
                ..ControlInput::default()
            };
            let idle = ControlInput::default();
            let mut peak = a.position.y;
            for frame in 0..120 {
                let input = if frame < hold_frames { &jump } else { &idle };
                update_actor(&mut a, input, &grid, DT);
                peak = peak.min(a.position.y);
            }
            peak
        };

        let window = Species::Rabbit.tunables().max_jump_time;
        let full = peak_y((window / DT).ceil() as i32 + 2);
        let half = peak_y((window / (2.0 * DT)) as i32);
        // Screen y grows downward, so the higher apex is the smaller value.
        assert!(full < half);
    }

    #[test]
    fn jump_is_deterministic() {
        let grid = tiles_from(&["....", "....", "....", "####"]);
        let jump = ControlInput {
            jump_held: true,
            ..ControlInput::default()
        };

        let trace = || {
            let mut a = Actor::new(0, Species::Rabbit, standing_on(1, 3));
            settle(&mut a, &grid);
            let mut positions = Vec::new();
            for _ in 0..60 {
                update_actor(&mut a, &jump, &grid, DT);
                positions.push(a.position);
            }
            positions
        };
        assert_eq!(trace(), trace());
    }

    #[test]
    fn side_walls_contain_the_actor() {
        // No '#' columns; the sealed out-of-bounds sides do the work.
        let grid = tiles_from(&["...", "...", "###"]);
        let mut a = Actor::new(0, Species::Rabbit, standing_on(0, 2));
        settle(&mut a, &grid);

        let push_left = ControlInput {
            move_axis: Vec2::new(-1.0, 0.0),
            ..ControlInput::default()
        };
        for _ in 0..120 {
            update_actor(&mut a, &push_left, &grid, DT);
        }
        assert!(a.bounding_rect().left() >= 0.0);
        assert_eq!(a.velocity.x, 0.0);
    }

    #[test]
    fn platforms_carry_from_above_only() {
        let grid = tiles_from(&["....", "....", ".--.", "...."]);

        // Falling from above lands on the platform row.
        let mut a = Actor::new(0, Species::Rabbit, Vec2::new(64.0, 40.0));
        let idle = ControlInput::default();
        for _ in 0..60 {
            update_actor(&mut a, &idle, &grid, DT);
        }
        assert!(a.on_ground);
        assert_eq!(a.bounding_rect().bottom(), 2.0 * TILE_HEIGHT);

        // Starting below, the platform never blocks the ascent or a
        // later fall through it.
        let mut b = Actor::new(1, Species::Rabbit, Vec2::new(64.0, 120.0));
        for _ in 0..60 {
            update_actor(&mut b, &idle, &grid, DT);
        }
        assert!(!b.on_ground);
        assert!(b.bounding_rect().top() > 3.0 * TILE_HEIGHT);
    }

    #[test]
    fn trunk_top_is_standable_but_climbable_through() {
        let grid = tiles_from(&["....", ".||.", ".||.", "####"]);

        // Falling onto the trunk without climbing: it carries weight.
        let mut a = Actor::new(0, Species::Rabbit, Vec2::new(48.0, 16.0));
        let idle = ControlInput::default();
        for _ in 0..60 {
            update_actor(&mut a, &idle, &grid, DT);
        }
        assert!(a.on_ground);
        assert_eq!(a.bounding_rect().bottom(), TILE_HEIGHT);

        // Hug the trunk's left edge; holding down descends through it.
        a.position.x = TILE_WIDTH + 2.0;
        let down = ControlInput {
            move_axis: Vec2::new(0.0, 1.0),
            ..ControlInput::default()
        };
        for _ in 0..30 {
            update_actor(&mut a, &down, &grid, DT);
        }
        assert!(a.climbing.is_some());
        assert!(a.bounding_rect().bottom() > TILE_HEIGHT);
    }

    #[test]
    fn climbing_ascends_a_trunk() {
        let grid = tiles_from(&["....", ".||.", ".||.", "####"]);
        let mut a = Actor::new(0, Species::Rabbit, standing_on(1, 3));
        settle(&mut a, &grid);

        // Stand against the trunk's left edge and climb.
        a.position.x = TILE_WIDTH + 2.0;
        let up = ControlInput {
            move_axis: Vec2::new(0.0, -1.0),
            ..ControlInput::default()
        };
        let start_y = a.position.y;
        for _ in 0..30 {
            update_actor(&mut a, &up, &grid, DT);
        }
        assert_eq!(a.climbing, Some(ClimbSide::Left));
        assert!(a.position.y < start_y);
    }

    #[test]
    fn climb_needs_edge_alignment() {
        let grid = tiles_from(&["....", ".|..", ".|..", "####"]);
        let up = ControlInput {
            move_axis: Vec2::new(0.0, -1.0),
            ..ControlInput::default()
        };

        // Nowhere near the trunk.
        let mut a = Actor::new(0, Species::Rabbit, standing_on(3, 3));
        settle(&mut a, &grid);
        update_actor(&mut a, &up, &grid, DT);
        assert!(a.climbing.is_none());

        // Overlapping the trunk's cell but centered 16 px from either
        // edge, outside the grab tolerance.
        let mut b = Actor::new(1, Species::Rabbit, standing_on(1, 3));
        settle(&mut b, &grid);
        update_actor(&mut b, &up, &grid, DT);
        assert!(b.climbing.is_none());
    }

    #[test]
    fn ghost_floats_in_open_air() {
        let grid = tiles_from(&["....", "....", "....", "...."]);
        let mut a = Actor::new(0, Species::Ghost, Vec2::new(64.0, 64.0));
        let idle = ControlInput::default();
        for _ in 0..60 {
            update_actor(&mut a, &idle, &grid, DT);
        }
        assert_eq!(a.position.y, 64.0);
        assert_eq!(a.velocity.y, 0.0);
    }

    #[test]
    fn kiwi_hover_holds_altitude_then_sinks() {
        let grid = tiles_from(&["....", "....", "....", "...."]);
        let mut a = Actor::new(0, Species::Kiwi, Vec2::new(64.0, 48.0));
        let hover = ControlInput {
            jump_held: true,
            ..ControlInput::default()
        };
        // Past the grace window, altitude drops by the fixed sink rate
        // rather than accelerating under gravity.
        let mut prev_y = a.position.y;
        for _ in 0..5 {
            update_actor(&mut a, &hover, &grid, DT);
        }
        for _ in 0..20 {
            prev_y = a.position.y;
            update_actor(&mut a, &hover, &grid, DT);
            assert!(a.position.y - prev_y <= 1.0);
        }
    }
}
