//! Notification surface: transient messages flashed into the window title.

use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::window::Window;

/// How long a notification stays up before the title reverts
const NOTIFY_DURATION: Duration = Duration::from_millis(1400);

/// Window-title banner.
///
/// Notifications preempt the status readout for a short interval, then the
/// title falls back to the base name (or the status line while playing).
pub struct Hud {
    window: Arc<Window>,
    base_title: String,
    current_title: String,
    clear_at: Option<Instant>,
}

impl Hud {
    pub fn new(window: Arc<Window>, base_title: impl Into<String>) -> Self {
        let base_title = base_title.into();
        Self {
            current_title: base_title.clone(),
            window,
            base_title,
            clear_at: None,
        }
    }

    /// Flash a transient message; also mirrored to the log
    pub fn notify(&mut self, text: &str) {
        log::info!("{text}");
        let title = format!("{} :: {}", self.base_title, text);
        self.apply(title);
        self.clear_at = Some(Instant::now() + NOTIFY_DURATION);
    }

    /// Low-priority readout (playback position); shown only while no
    /// notification is up
    pub fn set_status(&mut self, status: &str) {
        if self.clear_at.is_none() {
            let title = format!("{} :: {}", self.base_title, status);
            self.apply(title);
        }
    }

    /// Revert an expired notification. Call once per frame.
    pub fn tick(&mut self) {
        if self.clear_at.is_some_and(|at| Instant::now() >= at) {
            self.clear_at = None;
            let title = self.base_title.clone();
            self.apply(title);
        }
    }

    fn apply(&mut self, title: String) {
        if title != self.current_title {
            self.window.set_title(&title);
            self.current_title = title;
        }
    }
}
