//! Alert delivery: the dispatcher and its output sinks.
//!
//! The [`AlertDispatcher`] handles due trigger events and never fails:
//! missing breaks degrade to generic labels, missing or unplayable sounds
//! degrade to the fallback tone.

mod dispatcher;
mod sinks;

pub use crate::dispatch::dispatcher::AlertDispatcher;
pub use crate::dispatch::sinks::{
    AudioSink, LogAudioSink, LogNotifier, Notifier, PlaybackError,
};
