//! Output boundaries for alerts.
//!
//! Audio playback and user notification sit behind traits so the dispatcher
//! logic is testable and the actual delivery mechanism stays swappable. The
//! default implementations write to the log, which is the honest rendering
//! for a headless daemon.

use log::info;
use mockall::automock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("sound {uri} cannot be played: {reason}")]
    Unplayable { uri: String, reason: String },
}

/// Plays alert sounds.
///
/// `play_fallback_tone` is the last resort and must always succeed in some
/// audible or at least visible form; it has no error channel on purpose.
#[automock]
pub trait AudioSink: Send + Sync {
    fn play(&self, uri: &str) -> Result<(), PlaybackError>;
    fn play_fallback_tone(&self);
}

/// Raises user-visible notifications.
#[automock]
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Log-backed [`AudioSink`].
pub struct LogAudioSink;

impl AudioSink for LogAudioSink {
    fn play(&self, uri: &str) -> Result<(), PlaybackError> {
        info!("playing {}", uri);
        Ok(())
    }

    fn play_fallback_tone(&self) {
        info!("playing fallback tone");
    }
}

/// Log-backed [`Notifier`].
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!("notification: {}: {}", title, body);
    }
}
