//! Polls global keyboard/mouse input at a fixed tick and logs every event.
//!
//! Usage: `tickinput-demo [config.yaml]`. Press Escape to quit early.

mod config;
mod listener;
mod surface;

use anyhow::Context;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tickinput_core::InputManager;
use tickinput_platform::RdevBackend;

use crate::config::DemoConfig;
use crate::listener::EventLogger;
use crate::surface::HeadlessSurface;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickinput=info".into()),
        )
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => DemoConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => DemoConfig::default(),
    };
    tracing::info!(?config, "starting demo");

    let surface = HeadlessSurface::new(config.window);
    let backend = RdevBackend::from_config(&config.input);
    let mut input = InputManager::new(backend, config.session_config());
    input
        .initialize(&surface)
        .context("initializing input devices")?;

    let logger = Rc::new(RefCell::new(EventLogger::new("Escape")));
    input.register_key_listener("logger", &logger);
    input.register_mouse_listener("logger", &logger);

    let tick = Duration::from_millis(config.tick_ms.max(1));
    let deadline = config.run_for_ms.map(|ms| Instant::now() + Duration::from_millis(ms));

    loop {
        let frame_start = Instant::now();
        input.poll();

        if logger.borrow().quit_requested() {
            tracing::info!("quit key pressed");
            break;
        }
        if deadline.is_some_and(|d| frame_start >= d) {
            tracing::info!("run time elapsed");
            break;
        }

        if let Some(rest) = tick.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    input.unregister_key_listener_ref(&logger);
    input.unregister_mouse_listener_ref(&logger);
    input.shutdown();

    let logger = logger.borrow();
    tracing::info!(
        keys = logger.key_events(),
        mouse = logger.mouse_events(),
        "demo finished"
    );
    Ok(())
}
