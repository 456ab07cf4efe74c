/// Actors: every physics-simulated creature in a level, ghost included.
///
/// The old deep hierarchy (base actor → controllable → one class per
/// animal) is flattened into a single struct carrying a `Species` tag.
/// The species supplies the movement tunables, the collision box, and
/// the handful of per-species hooks (the ghost's pinned vertical
/// velocity, the kiwi's hover) that the physics layer consults.

use glam::Vec2;

use crate::domain::geometry::Rect;

/// Which side of a climbable trunk the actor is hanging on.
/// Meaningful only while `Actor::climbing` is set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClimbSide {
    Left,
    Right,
}

/// One frame of control, already debounced upstream. `move_axis` is
/// -1/0/+1 per axis (+y = down), `possess_pressed` is edge-triggered.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlInput {
    pub move_axis: Vec2,
    pub jump_held: bool,
    pub possess_pressed: bool,
}

/// Movement tunables, per species. Units are pixels and seconds.
#[derive(Clone, Copy, Debug)]
pub struct Tunables {
    pub move_acceleration: f32,
    pub max_move_speed: f32,
    pub ground_drag: f32,
    pub air_drag: f32,
    pub max_jump_time: f32,
    pub jump_launch_velocity: f32,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub jump_control_power: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Tunables {
            move_acceleration: 13000.0,
            max_move_speed: 1750.0,
            ground_drag: 0.48,
            air_drag: 0.58,
            max_jump_time: 0.35,
            jump_launch_velocity: -3500.0,
            gravity: 3400.0,
            max_fall_speed: 550.0,
            jump_control_power: 0.14,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Species {
    Ghost,
    Rabbit,
    Snake,
    Squirrel,
    Mouse,
    Kiwi,
    Ostrich,
}

impl Species {
    /// Animal spawn codes used in level files. The ghost has no code
    /// here; it only ever enters a level through the start marker.
    pub fn from_code(code: char) -> Option<Species> {
        match code {
            'r' => Some(Species::Rabbit),
            's' => Some(Species::Snake),
            'q' => Some(Species::Squirrel),
            'm' => Some(Species::Mouse),
            'k' => Some(Species::Kiwi),
            'o' => Some(Species::Ostrich),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Ghost => "ghost",
            Species::Rabbit => "rabbit",
            Species::Snake => "snake",
            Species::Squirrel => "squirrel",
            Species::Mouse => "mouse",
            Species::Kiwi => "kiwi",
            Species::Ostrich => "ostrich",
        }
    }

    /// Display glyph for the renderer.
    pub fn glyph(self) -> char {
        match self {
            Species::Ghost => '@',
            Species::Rabbit => 'r',
            Species::Snake => 's',
            Species::Squirrel => 'q',
            Species::Mouse => 'm',
            Species::Kiwi => 'k',
            Species::Ostrich => 'o',
        }
    }

    pub fn tunables(self) -> Tunables {
        let base = Tunables::default();
        match self {
            // The ghost drifts: gentle acceleration, low top speed.
            Species::Ghost => Tunables {
                move_acceleration: 6000.0,
                max_move_speed: 400.0,
                ..base
            },
            // Long ascent, ordinary launch: floaty hops.
            Species::Rabbit => Tunables {
                max_jump_time: 0.45,
                ..base
            },
            // Hard launch and a stretched ascent window.
            Species::Ostrich => Tunables {
                jump_launch_velocity: base.jump_launch_velocity * 1.8,
                max_jump_time: base.max_jump_time * 1.5,
                ..base
            },
            Species::Snake | Species::Squirrel | Species::Mouse | Species::Kiwi => base,
        }
    }

    /// The ghost floats; its vertical velocity is pinned to zero outside
    /// of a climb, and it never enters the jump state machine.
    pub fn can_jump(self) -> bool {
        !matches!(self, Species::Ghost)
    }

    /// Kiwi only: gravity drops to zero while the jump input is held,
    /// with a slow sink once airborne past a grace period.
    pub fn hovers(self) -> bool {
        matches!(self, Species::Kiwi)
    }

    /// Collision box relative to the bottom-center anchor. Derived from
    /// the sprite frames: 40% of the frame wide, 80% tall, feet flush
    /// with the anchor.
    pub fn local_bounds(self) -> Rect {
        match self {
            // 64 px frame
            Species::Snake => Rect::new(-13.0, -51.0, 25.0, 51.0),
            // 32 px frame
            _ => Rect::new(-6.0, -25.0, 12.0, 25.0),
        }
    }
}

/// A simulated creature. `position` is the feet/bottom-center anchor in
/// world pixels.
#[derive(Clone, Debug)]
pub struct Actor {
    pub id: usize,
    pub species: Species,
    pub tunables: Tunables,
    pub local_bounds: Rect,
    pub spawn: Vec2,

    pub position: Vec2,
    pub velocity: Vec2,
    pub on_ground: bool,
    pub climbing: Option<ClimbSide>,
    /// Climb state at the end of the previous frame; a true→false edge
    /// zeroes vertical velocity so fall speed never carries out of a climb.
    pub was_climbing: bool,
    pub is_jumping: bool,
    pub was_jumping: bool,
    pub jump_time: f32,
    pub alive: bool,
    /// Whether this actor receives the player's input this frame.
    pub active: bool,
    /// Bottom edge of the resolved bounds from last frame, for the
    /// landed-on-top test in collision resolution.
    pub previous_bottom: f32,

    // Ambient idle behavior (inactive animals only).
    idle_wait: f32,
    idle_jumping: bool,
    /// Kiwi: seconds spent airborne while hovering.
    pub hover_airtime: f32,
}

impl Actor {
    pub fn new(id: usize, species: Species, spawn: Vec2) -> Self {
        let mut actor = Actor {
            id,
            species,
            tunables: species.tunables(),
            local_bounds: species.local_bounds(),
            spawn,
            position: spawn,
            velocity: Vec2::ZERO,
            on_ground: false,
            climbing: None,
            was_climbing: false,
            is_jumping: false,
            was_jumping: false,
            jump_time: 0.0,
            alive: true,
            active: false,
            previous_bottom: 0.0,
            idle_wait: 0.0,
            idle_jumping: false,
            hover_airtime: 0.0,
        };
        actor.reset(spawn);
        actor
    }

    /// Reinitialize at `spawn` without destroying the actor. Used on
    /// death/respawn; the species, id and tunables survive.
    pub fn reset(&mut self, spawn: Vec2) {
        self.position = spawn;
        self.velocity = Vec2::ZERO;
        self.alive = true;
        self.on_ground = false;
        self.climbing = None;
        self.was_climbing = false;
        self.is_jumping = false;
        self.was_jumping = false;
        self.jump_time = 0.0;
        self.idle_wait = 0.0;
        self.idle_jumping = false;
        self.hover_airtime = 0.0;
        self.previous_bottom = self.bounding_rect().bottom();
    }

    /// World-space collision box. Pixel-rounded, matching the integrator's
    /// whole-pixel positions, so tile-boundary comparisons stay exact.
    pub fn bounding_rect(&self) -> Rect {
        Rect::new(
            self.position.x.round() + self.local_bounds.x,
            self.position.y.round() + self.local_bounds.y,
            self.local_bounds.w,
            self.local_bounds.h,
        )
    }

    /// Ambient input for an inactive animal: hold an imaginary jump
    /// button for a short random burst, rest for a longer one, repeat.
    /// Randomness comes from the caller's rng so idle timing is
    /// reproducible in tests.
    pub fn idle_input(&mut self, dt: f32, rng: &mut fastrand::Rng) -> ControlInput {
        if !self.alive || self.species == Species::Ghost {
            return ControlInput::default();
        }

        if self.idle_wait == 0.0 {
            if self.idle_jumping {
                self.idle_jumping = false;
                self.idle_wait = rng.f32() * 3.0 + 1.0;
            } else {
                self.idle_jumping = true;
                self.idle_wait = rng.f32() * 1.0 + 0.1;
            }
        } else {
            self.idle_wait = (self.idle_wait - dt).max(0.0);
        }

        ControlInput {
            jump_held: self.idle_jumping,
            ..ControlInput::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_a_dead_actor() {
        let mut a = Actor::new(0, Species::Rabbit, Vec2::new(48.0, 96.0));
        a.alive = false;
        a.velocity = Vec2::new(120.0, -300.0);
        a.is_jumping = true;
        a.climbing = Some(ClimbSide::Left);
        a.jump_time = 0.2;

        let respawn = Vec2::new(16.0, 32.0);
        a.reset(respawn);

        assert!(a.alive);
        assert_eq!(a.position, respawn);
        assert_eq!(a.velocity, Vec2::ZERO);
        assert!(!a.is_jumping);
        assert!(a.climbing.is_none());
        assert_eq!(a.jump_time, 0.0);
    }

    #[test]
    fn bounding_rect_hangs_from_the_anchor() {
        let a = Actor::new(0, Species::Rabbit, Vec2::new(100.0, 200.0));
        let b = a.bounding_rect();
        assert_eq!(b.bottom(), 200.0);
        assert_eq!((b.left() + b.right()) / 2.0, 100.0);
    }

    #[test]
    fn idle_input_toggles_on_a_randomized_schedule() {
        let mut a = Actor::new(0, Species::Rabbit, Vec2::ZERO);
        let mut rng = fastrand::Rng::with_seed(7);

        // First call flips straight into a jump burst.
        assert!(a.idle_input(0.0, &mut rng).jump_held);

        // Run the burst out; eventually the rest phase begins.
        let mut saw_rest = false;
        for _ in 0..400 {
            if !a.idle_input(0.05, &mut rng).jump_held {
                saw_rest = true;
                break;
            }
        }
        assert!(saw_rest);
    }

    #[test]
    fn ghost_never_idle_jumps() {
        let mut a = Actor::new(0, Species::Ghost, Vec2::ZERO);
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..100 {
            assert!(!a.idle_input(0.05, &mut rng).jump_held);
        }
    }

    #[test]
    fn species_overrides_apply() {
        let base = Tunables::default();
        assert_eq!(Species::Rabbit.tunables().max_jump_time, 0.45);
        let ostrich = Species::Ostrich.tunables();
        assert!(ostrich.jump_launch_velocity < base.jump_launch_velocity);
        assert!(Species::Ghost.tunables().max_move_speed < base.max_move_speed);
        assert!(!Species::Ghost.can_jump());
        assert!(Species::Kiwi.hovers());
    }
}
