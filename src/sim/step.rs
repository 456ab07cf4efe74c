/// One fixed simulation step, run in four phases: advance every actor,
/// settle deaths, check the exit, then resolve possession. Actor
/// insertion is deferred to a single slot drained at the very end, so
/// the roster never changes while a phase iterates over it.

use glam::Vec2;

use crate::domain::actor::{ControlInput, Species};
use crate::domain::geometry::intersection_depth;
use crate::domain::physics::update_actor;
use crate::sim::event::GameEvent;
use crate::sim::world::World;

pub fn step(
    world: &mut World,
    input: &ControlInput,
    dt: f32,
    rng: &mut fastrand::Rng,
) -> Vec<GameEvent> {
    let mut events = Vec::new();
    advance_actors(world, input, dt, rng, &mut events);
    resolve_pit_deaths(world, &mut events);
    resolve_exit(world, &mut events);
    resolve_possession(world, input, &mut events);
    drain_pending(world);
    events
}

/// Physics for every actor in roster order. The possessed actor gets
/// the player's input, living bystanders their ambient idle input, and
/// the dead fall inert.
fn advance_actors(
    world: &mut World,
    input: &ControlInput,
    dt: f32,
    rng: &mut fastrand::Rng,
    events: &mut Vec<GameEvent>,
) {
    for i in 0..world.actors.len() {
        let control = if !world.actors[i].alive {
            ControlInput::default()
        } else if i == world.active {
            *input
        } else {
            world.actors[i].idle_input(dt, rng)
        };

        let was_on_ground = world.actors[i].on_ground;
        let was_ascending = world.actors[i].jump_time > 0.0;
        update_actor(&mut world.actors[i], &control, &world.grid, dt);

        let actor = &world.actors[i];
        if actor.jump_time > 0.0 && !was_ascending {
            events.push(GameEvent::JumpStarted { actor: actor.id });
        }
        if actor.on_ground && !was_on_ground {
            events.push(GameEvent::Landed { actor: actor.id });
        }
    }
}

/// Anything that falls past the bottom row dies. Death latches on the
/// `alive` flag, so each actor is killed at most once. Losing the
/// possessed animal queues a fresh ghost at the level start.
fn resolve_pit_deaths(world: &mut World, events: &mut Vec<GameEvent>) {
    let floor = world.grid.pixel_height();
    let mut active_died = false;
    for (i, actor) in world.actors.iter_mut().enumerate() {
        if actor.alive && actor.bounding_rect().top() >= floor {
            actor.alive = false;
            events.push(GameEvent::Killed { actor: actor.id });
            if i == world.active {
                active_died = true;
            }
        }
    }
    if active_died {
        let ghost = world.spawn_ghost();
        world.queue_insert(ghost);
    }
}

fn resolve_exit(world: &mut World, events: &mut Vec<GameEvent>) {
    if world.reached_exit {
        return;
    }
    let actor = world.active_actor();
    if actor.alive && actor.bounding_rect().contains(world.exit) {
        world.reached_exit = true;
        events.push(GameEvent::ExitReached);
    }
}

/// Move the player's control into an overlapping animal. With no
/// overlapping living candidate the press does nothing. When several
/// candidates touch, the shallowest overlap wins: the smallest
/// separation vector marks the nearest body. Possessing out of the
/// ghost removes it from the roster; it only comes back through death.
fn resolve_possession(world: &mut World, input: &ControlInput, events: &mut Vec<GameEvent>) {
    if !input.possess_pressed {
        return;
    }
    let active = &world.actors[world.active];
    if !active.alive {
        return;
    }
    let bounds = active.bounding_rect();

    let mut best: Option<(usize, f32)> = None;
    for (i, actor) in world.actors.iter().enumerate() {
        if i == world.active || !actor.alive {
            continue;
        }
        let depth = intersection_depth(&bounds, &actor.bounding_rect());
        if depth == Vec2::ZERO {
            continue;
        }
        let overlap = depth.length();
        if best.map_or(true, |(_, shallowest)| overlap < shallowest) {
            best = Some((i, overlap));
        }
    }
    let Some((target, _)) = best else {
        return;
    };

    let from = world.actors[world.active].id;
    let to = world.actors[target].id;
    world.actors[world.active].active = false;
    world.actors[target].active = true;

    if world.actors[world.active].species == Species::Ghost {
        // The ghost dissolves into its host.
        let old = world.active;
        world.actors.remove(old);
        world.active = if target > old { target - 1 } else { target };
    } else {
        world.active = target;
    }
    events.push(GameEvent::PossessionChanged { from, to });
}

/// Admit the actor queued during this step, handing it control. Only
/// the ghost's return uses the slot, and the returning ghost is always
/// the player.
fn drain_pending(world: &mut World) {
    if let Some(mut actor) = world.pending_insert.take() {
        actor.active = true;
        world.actors[world.active].active = false;
        world.actors.push(actor);
        world.active = world.actors.len() - 1;
    }
}
