/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::{self, LevelDef};
use sim::step;
use sim::world::{Phase, Session, World};
use ui::input::{InputState, KEYS_CONFIRM, KEYS_RESTART};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(4);

/// Frames spent in the Dying beat before the ghost takes back over.
const DYING_TICKS: u32 = 45;

fn main() {
    let config = GameConfig::load();

    let levels = match level::load_levels(Some(&config.levels_dir)) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Failed to load levels: {e}");
            std::process::exit(1);
        }
    };
    if levels.is_empty() {
        eprintln!("No levels to play.");
        std::process::exit(1);
    }

    let world = World::from_level(&levels[0]);
    let mut session = Session::new(world, levels[0].name.clone(), levels.len(), config.lives);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &levels, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for haunting Wispwood.");
}

fn game_loop(
    session: &mut Session,
    levels: &[LevelDef],
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.key_release_supported();
    let mut rng = fastrand::Rng::new();

    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let dt = config.dt();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(session, levels, &kb, config) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            session.anim_tick = session.anim_tick.wrapping_add(1);

            match session.phase {
                Phase::Playing => {
                    let input = kb.control_input();
                    let host_id = session.world.active_actor().id;
                    let events = step::step(&mut session.world, &input, dt, &mut rng);
                    react_to_events(session, sound, &events, host_id);
                }
                Phase::Dying => {
                    if session.anim_tick >= DYING_TICKS {
                        session.phase = if session.lives == 0 {
                            Phase::GameOver
                        } else {
                            Phase::Playing
                        };
                    }
                }
                _ => {}
            }

            session.tick_message();
            last_tick = Instant::now();
        }

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn react_to_events(
    session: &mut Session,
    sound: Option<&SoundEngine>,
    events: &[GameEvent],
    host_id: usize,
) {
    for event in events {
        match event {
            GameEvent::JumpStarted { actor } if *actor == host_id => {
                if let Some(sfx) = sound {
                    sfx.play_jump();
                }
            }
            GameEvent::Landed { actor } if *actor == host_id => {
                if let Some(sfx) = sound {
                    sfx.play_land();
                }
            }
            GameEvent::PossessionChanged { .. } => {
                if let Some(sfx) = sound {
                    sfx.play_possess();
                }
                let host = session.world.active_actor().species.name().to_string();
                session.set_message(&format!("You are the {host} now"), 90);
            }
            GameEvent::Killed { actor } if *actor == host_id => {
                if let Some(sfx) = sound {
                    sfx.play_die();
                }
                session.lives = session.lives.saturating_sub(1);
                session.anim_tick = 0;
                session.phase = Phase::Dying;
                session.set_message("Your host perished", DYING_TICKS);
            }
            GameEvent::ExitReached => {
                if let Some(sfx) = sound {
                    sfx.play_clear();
                }
                session.phase = Phase::LevelComplete;
            }
            _ => {}
        }
    }
}

/// Load level `index` into the session and start playing it.
fn start_level(session: &mut Session, levels: &[LevelDef], index: usize) {
    session.world = World::from_level(&levels[index]);
    session.level_index = index;
    session.level_name = levels[index].name.clone();
    session.message.clear();
    session.message_timer = 0;
    session.anim_tick = 0;
    session.phase = Phase::Playing;
}

/// Phase-dependent meta keys. Returns true to quit the program.
fn handle_meta(
    session: &mut Session,
    levels: &[LevelDef],
    kb: &InputState,
    config: &GameConfig,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.any_pressed(&[KeyCode::Esc]);

    match session.phase {
        Phase::Title => {
            if confirm {
                session.lives = config.lives;
                start_level(session, levels, 0);
            } else if esc || kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) {
                return true;
            }
        }

        Phase::Playing => {
            if esc {
                session.phase = Phase::Title;
            } else if kb.any_pressed(KEYS_RESTART) {
                let index = session.level_index;
                start_level(session, levels, index);
                session.set_message("Level restarted", 30);
            }
        }

        Phase::Dying => {
            // Can't skip the beat.
        }

        Phase::LevelComplete => {
            if confirm {
                let next = session.level_index + 1;
                if next < levels.len() {
                    start_level(session, levels, next);
                } else {
                    session.phase = Phase::GameComplete;
                    session.anim_tick = 0;
                }
            } else if esc {
                session.phase = Phase::Title;
            }
        }

        Phase::GameOver => {
            if confirm {
                session.lives = config.lives;
                start_level(session, levels, 0);
            } else if esc {
                session.phase = Phase::Title;
            }
        }

        Phase::GameComplete => {
            if confirm || esc {
                session.phase = Phase::Title;
            }
        }
    }

    false
}
