//! termdock: dockable host for an external terminal emulator
//!
//! Spawns the emulator per session record, adopts its top-level window
//! into a docked container, keeps it fitted through host resizes, and
//! restores the whole arrangement across restarts.

// the embedding core only runs on the targeted desktop; elsewhere the
// binary is a stub and the library surface is exercised by tests
#![cfg_attr(not(windows), allow(dead_code))]

mod config;
mod embed;
mod events;
mod input;
mod layout;
mod manager;
mod panel;
mod process;
#[cfg(windows)]
mod shell;
mod winsys;

use termdock_utils::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("termdock: {}", e);
        std::process::exit(1);
    }
}

#[cfg(windows)]
fn run() -> Result<()> {
    use std::sync::Arc;

    use tracing::{info, warn};

    use termdock_session::SessionStore;
    use termdock_utils::{init_logging_with_config, paths, LogConfig};

    use crate::config::AppConfig;
    use crate::embed::WindowEmbedder;
    use crate::events::EventQueue;
    use crate::input::InputHookService;
    use crate::layout::LayoutDocument;
    use crate::manager::DockingSessionManager;
    use crate::winsys::{win32::Win32WindowSystem, WindowSystem};

    paths::ensure_all_dirs()?;
    init_logging_with_config(LogConfig::host())?;
    info!("termdock starting");

    let config = AppConfig::load();
    let store = SessionStore::open_default()?;
    let winsys: Arc<dyn WindowSystem> = Arc::new(Win32WindowSystem::new());

    let shell = shell::Shell::create(winsys.clone())?;
    let frame = shell.frame();

    let waker_winsys = winsys.clone();
    let queue = EventQueue::with_waker(Arc::new(move || waker_winsys.post_wake(frame)));

    let embedder = WindowEmbedder::new(
        winsys.clone(),
        config.window_class.clone(),
        config.discovery_policy(),
    );
    let mut manager = DockingSessionManager::new(
        store,
        winsys.clone(),
        embedder,
        Box::new(shell.dock_handle()),
        queue.proxy(),
        config.terminal_path.clone(),
        frame,
    );

    // process-wide hook pair; a refusal degrades to no focus arbitration
    let mut hooks = InputHookService::new(winsys.clone(), frame, Arc::new(shell.focus_sink()));
    if let Err(e) = hooks.install() {
        warn!("focus arbitration disabled: {}", e);
    }

    // best-effort workspace restore, then auto-start sessions
    let layout_path = paths::layout_file();
    match LayoutDocument::read_from(&layout_path) {
        Ok(doc) => {
            manager.restore_layout(&doc);
        }
        Err(e) => {
            warn!("could not read layout, starting fresh: {}", e);
            manager.restore_layout(&LayoutDocument::default());
        }
    }
    manager.start_auto_sessions();
    shell.layout_containers();
    manager.sync_panel_geometry();

    // single UI-thread pump: dispatch native messages, then drain
    // cross-thread notifications marshaled by the event queue
    while shell.pump_one() {
        if shell.take_resized() {
            shell.layout_containers();
            manager.sync_panel_geometry();
        }
        for event in queue.drain() {
            if let Err(e) = manager.handle_event(event) {
                warn!("event handling failed: {}", e);
            }
        }
        if shell.take_close_requested() {
            let doc = manager.serialize_layout();
            if let Err(e) = doc.write_to(&layout_path) {
                warn!("failed to save layout: {}", e);
            }
            manager.close_all();
            hooks.uninstall();
            shell.destroy();
        }
    }

    info!("termdock exiting");
    Ok(())
}

#[cfg(not(windows))]
fn run() -> Result<()> {
    Err(termdock_utils::TermdockError::internal(
        "termdock hosts Win32 terminal windows and only runs on Windows",
    ))
}
