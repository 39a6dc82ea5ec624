//! # Noodle
//!
//! Runs a game description until the game quits.
//!
//! ```bash
//! noodle crates/noodle/data/demo.toml
//! noodle game.toml --workers 8 --tick-rate 0 --log debug
//! ```
//!
//! The process exits with 0 on a normal quit and 1 when the game quit with
//! an error status or could not be loaded.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use noodle::{load, render, telemetry, NullRenderer, TickClock, UpdateLoop};

/// Noodle 2D engine.
#[derive(Parser, Debug)]
#[command(name = "noodle", version, about)]
struct Args {
    /// Game description (TOML).
    game: PathBuf,

    /// Collecting workers; overrides `engine.workers`.
    #[arg(long)]
    workers: Option<usize>,

    /// Ticks per second, 0 for unpaced; overrides `engine.tick_rate`.
    #[arg(long)]
    tick_rate: Option<u32>,

    /// Log filter; overrides `engine.log_filter`. `RUST_LOG` wins over both.
    #[arg(long)]
    log: Option<String>,
}

/// Frame period of the headless render loop.
const FRAME_TIME: Duration = Duration::from_millis(16);

fn main() -> ExitCode {
    let args = Args::parse();

    let game = match load(&args.game) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("noodle: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = game.config;
    if let Some(workers) = args.workers {
        config.workers = workers.max(1);
    }
    if let Some(tick_rate) = args.tick_rate {
        config.tick_rate = tick_rate;
    }
    if let Some(filter) = args.log {
        config.log_filter = filter;
    }

    if let Err(err) = telemetry::init_logging(&config.log_filter) {
        eprintln!("noodle: logging disabled: {err}");
    }
    tracing::info!(game = %args.game.display(), ?config, "starting");

    let state = game.state;
    let mut update = UpdateLoop::new(Arc::clone(&state)).with_workers(config.workers);
    let deferred = update.command_sender();
    let stop = AtomicBool::new(false);
    let mut clock = TickClock::new(config.tick_rate);

    let status = thread::scope(|scope| {
        let renderer = thread::Builder::new()
            .name("render".into())
            .spawn_scoped(scope, || {
                let mut renderer = NullRenderer::default();
                render::run_render_loop(&state, &mut renderer, &deferred, &stop, FRAME_TIME)
            });
        if let Err(err) = &renderer {
            tracing::warn!(%err, "render thread not started");
        }

        let status = update.run(&mut clock);
        stop.store(true, Ordering::Release);

        if let Ok(handle) = renderer {
            match handle.join() {
                Ok(frames) => tracing::debug!(frames, "render thread joined"),
                Err(_) => tracing::error!("render thread panicked"),
            }
        }
        status
    });

    // Empty unless the loop ended without going through Quit.
    let leftover = state.teardown();
    tracing::info!(?status, leftover = leftover.total(), "exiting");
    ExitCode::from(status.exit_code())
}
