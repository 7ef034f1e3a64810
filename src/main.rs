use std::path::PathBuf;

use log::{info, warn};

use urchin::config::{self, Config};
use urchin::core::input::{KeyState, LaneState};
use urchin::game::feedback::LoggingFeedback;
use urchin::game::note::{Note, NoteType, Timeline};
use urchin::game::session::PlaySession;
use urchin::scene::SceneManager;
use urchin::script::ScriptHost;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    config::load();
    let cfg = config::get();
    log::set_max_level(cfg.log_level.as_level_filter());

    let script = std::env::args()
        .nth(1)
        .or_else(|| (!cfg.scene_script.is_empty()).then(|| cfg.scene_script.clone()))
        .map(PathBuf::from);

    match script {
        Some(path) => run_scene(&cfg, &path),
        None => {
            run_demo_session(&cfg);
            Ok(())
        }
    }
}

/// Ticks a scene script at the configured frame rate until it dies.
fn run_scene(cfg: &Config, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let host = ScriptHost::new()?;
    let mut manager = SceneManager::new();
    host.attach_scenes(manager.spawner());
    let scene = host.load_scene_file(path)?;
    manager.add(Box::new(scene));

    let delta = cfg.frame_delta();
    let keys = KeyState::default();
    let mut frames = 0u64;
    while !manager.is_empty() {
        if cfg.max_frames != 0 && frames >= cfg.max_frames {
            warn!("stopping after {frames} frames with {} scene(s) alive", manager.len());
            break;
        }
        manager.tick(delta, &keys);
        manager.draw();
        frames += 1;
    }
    info!("scene run finished after {frames} frames");
    Ok(())
}

/// Plays a generated chart with no input attached.
fn run_demo_session(cfg: &Config) {
    let mut session = PlaySession::from_config(demo_chart(), cfg);
    let mut fx = LoggingFeedback::default();
    let lanes = LaneState::default();
    let delta = cfg.frame_delta();
    let mut frames = 0u64;

    while !session.is_over() && (cfg.max_frames == 0 || frames < cfg.max_frames) {
        session.update(delta, &lanes, &mut fx);
        session.draw(&lanes, &mut fx);
        frames += 1;
    }

    let status = session.play_status();
    let (fulfilled, rest) = status.gauge_value();
    info!(
        "score {} | critical {} justice {} attack {} miss {} | combo {} | gauge {} + {:.0}%",
        status.score(),
        status.justice_critical,
        status.justice,
        status.attack,
        status.miss,
        status.combo,
        fulfilled,
        rest * 100.0,
    );
    info!(
        "{} sounds, {} effects over {frames} frames",
        fx.sounds_played, fx.effects_spawned
    );
}

fn demo_chart() -> Timeline {
    let mut notes = Vec::new();
    for i in 0..16u8 {
        let kind = match i % 4 {
            0 => NoteType::TAP,
            1 => NoteType::EX_TAP,
            2 => NoteType::FLICK,
            _ => NoteType::AIR | NoteType::UP,
        };
        notes.push(Note::new(kind, 1.0 + f64::from(i) * 0.25, (i % 4) * 4, 4));
    }
    notes.push(
        Note::new(NoteType::HOLD, 5.0, 0, 4)
            .with_extra(Note::new(NoteType::STEP, 5.5, 0, 4))
            .with_extra(Note::new(NoteType::END, 6.0, 0, 4)),
    );
    notes.push(
        Note::new(NoteType::SLIDE, 6.5, 4, 4)
            .with_extra(Note::new(NoteType::CONTROL, 6.75, 6, 4))
            .with_extra(Note::new(NoteType::STEP, 7.0, 8, 4))
            .with_extra(Note::new(NoteType::END, 7.5, 12, 4)),
    );
    notes.push(
        Note::new(NoteType::AIR_ACTION, 6.5, 4, 4)
            .with_extra(Note::new(NoteType::STEP, 7.0, 8, 4))
            .with_extra(Note::new(NoteType::END, 7.5, 12, 4)),
    );
    Timeline::new(notes)
}
