/// World state for one level in play: the tile grid, every actor, and
/// which actor currently carries the player's will.

use glam::Vec2;

use crate::domain::actor::{Actor, Species};
use crate::domain::tile::{TileGrid, TILE_HEIGHT, TILE_WIDTH};
use crate::sim::level::LevelDef;

pub struct World {
    pub grid: TileGrid,
    pub actors: Vec<Actor>,
    /// Index into `actors` of the possessed actor.
    pub active: usize,
    /// Ghost spawn point, bottom-center in pixels.
    pub start: Vec2,
    /// Exit marker, cell center in pixels.
    pub exit: Vec2,
    /// Latched once the exit fires so the event is raised exactly once.
    pub reached_exit: bool,
    /// Single-slot queue for an actor joining next frame. Filled by the
    /// step when the possessed animal dies and the ghost must return.
    pub pending_insert: Option<Actor>,
    next_id: usize,
}

impl World {
    pub fn from_level(def: &LevelDef) -> World {
        let mut actors = Vec::with_capacity(def.spawns.len() + 1);
        let mut ghost = Actor::new(0, Species::Ghost, def.start);
        ghost.active = true;
        actors.push(ghost);
        for (i, &(species, spawn)) in def.spawns.iter().enumerate() {
            actors.push(Actor::new(i + 1, species, spawn));
        }
        let next_id = actors.len();
        World {
            grid: def.grid.clone(),
            actors,
            active: 0,
            start: def.start,
            exit: def.exit,
            reached_exit: false,
            pending_insert: None,
            next_id,
        }
    }

    pub fn active_actor(&self) -> &Actor {
        &self.actors[self.active]
    }

    /// Mint a fresh ghost for the return trip after a possessed animal
    /// dies. Ids keep counting up so events stay unambiguous.
    pub fn spawn_ghost(&mut self) -> Actor {
        let id = self.next_id;
        self.next_id += 1;
        Actor::new(id, Species::Ghost, self.start)
    }

    /// Queue `actor` for insertion at the end of the current step. At
    /// most one actor can be queued per frame; a second request in the
    /// same frame is dropped.
    pub fn queue_insert(&mut self, actor: Actor) {
        if self.pending_insert.is_none() {
            self.pending_insert = Some(actor);
        }
    }
}

/// Where the shell currently is. `Dying` is the beat between losing a
/// host and the ghost resuming control.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    Dying,
    LevelComplete,
    GameOver,
    GameComplete,
}

/// Everything the presentation layer needs in one place: the live
/// world, the shell phase, and the run's progress counters.
pub struct Session {
    pub world: World,
    pub camera: Camera,
    pub phase: Phase,
    pub lives: u32,
    pub level_index: usize,
    pub level_count: usize,
    pub level_name: String,
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
}

impl Session {
    pub fn new(world: World, level_name: String, level_count: usize, lives: u32) -> Session {
        Session {
            world,
            camera: Camera::default(),
            phase: Phase::Title,
            lives,
            level_index: 0,
            level_count,
            level_name,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
        }
    }

    /// Show `text` in the message bar for `ticks` frames; 0 pins it
    /// until replaced or cleared.
    pub fn set_message(&mut self, text: &str, ticks: u32) {
        self.message = text.to_string();
        self.message_timer = ticks;
    }

    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}

/// Viewport anchor in pixels, top-left corner. Follows the active actor
/// and stays clamped inside the level.
#[derive(Clone, Copy, Debug, Default)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
}

impl Camera {
    /// Center the view on `focus` given a viewport of `view_w` by
    /// `view_h` cells, without showing past the level edge.
    pub fn center_on(&mut self, focus: Vec2, grid: &TileGrid, view_w: usize, view_h: usize) {
        let view_px_w = view_w as f32 * TILE_WIDTH;
        let view_px_h = view_h as f32 * TILE_HEIGHT;
        let max_x = (grid.pixel_width() - view_px_w).max(0.0);
        let max_y = (grid.pixel_height() - view_px_h).max(0.0);
        self.x = (focus.x - view_px_w / 2.0).clamp(0.0, max_x);
        self.y = (focus.y - view_px_h / 2.0).clamp(0.0, max_y);
    }
}
