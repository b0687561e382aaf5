//! Alert delivery.
//!
//! The dispatcher sits behind the deferred scheduler's fire callback, so the
//! one hard rule is that handling an event never panics and never returns an
//! error. Every lookup failure degrades: a missing break falls back to a
//! generic label, a missing or unplayable sound falls back to the built-in
//! tone, and the notification is raised regardless.

use std::sync::Arc;

use log::{info, warn};

use crate::dispatch::sinks::{AudioSink, Notifier};
use crate::scheduler::trigger::TriggerEvent;
use crate::store::breaks::BreakStore;
use crate::store::settings::Settings;

/// Turns due trigger events into sound and notifications.
pub struct AlertDispatcher {
    settings: Settings,
    breaks: BreakStore,
    audio: Arc<dyn AudioSink>,
    notifier: Arc<dyn Notifier>,
}

impl AlertDispatcher {
    pub fn new(
        settings: Settings,
        breaks: BreakStore,
        audio: Arc<dyn AudioSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        AlertDispatcher {
            settings,
            breaks,
            audio,
            notifier,
        }
    }

    /// Delivers one due event. Infallible by contract.
    pub fn handle(&self, event: TriggerEvent) {
        info!("dispatching {}", event.kind());
        match event {
            TriggerEvent::TestAdhan => {
                self.play_or_fallback(self.settings.adhan_uri());
                self.notifier.notify("Adhan test", "This is how the adhan will sound");
            }
            TriggerEvent::Prayer { pray } => {
                self.play_or_fallback(self.settings.adhan_uri());
                self.notifier
                    .notify("Prayer time", &format!("Time for {}", pray));
            }
            TriggerEvent::BreakStart { break_id } => {
                let definition = self.breaks.find(&break_id);
                let uri = definition
                    .as_ref()
                    .and_then(|d| d.start_uri.clone())
                    .or_else(|| self.settings.break_start_uri());
                self.play_or_fallback(uri);
                let name = definition.map_or_else(
                    || {
                        warn!("break {} not found, using generic label", break_id);
                        "Break".to_string()
                    },
                    |d| d.name,
                );
                self.notifier
                    .notify(&name, &format!("{} starts now", name));
            }
            TriggerEvent::BreakEnd { break_id } => {
                let definition = self.breaks.find(&break_id);
                let uri = definition
                    .as_ref()
                    .and_then(|d| d.end_uri.clone())
                    .or_else(|| self.settings.break_end_uri());
                self.play_or_fallback(uri);
                let name = definition.map_or_else(
                    || {
                        warn!("break {} not found, using generic label", break_id);
                        "Break".to_string()
                    },
                    |d| d.name,
                );
                self.notifier.notify(&name, &format!("{} is over", name));
            }
        }
    }

    fn play_or_fallback(&self, uri: Option<String>) {
        match uri {
            Some(uri) => {
                if let Err(e) = self.audio.play(&uri) {
                    warn!("playback failed, falling back to tone: {}", e);
                    self.audio.play_fallback_tone();
                }
            }
            None => {
                warn!("no sound configured, falling back to tone");
                self.audio.play_fallback_tone();
            }
        }
    }
}
