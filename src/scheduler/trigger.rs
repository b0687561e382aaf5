//! Trigger event model shared between the arming side and the firing side.
//!
//! This module defines the [`TriggerEvent`] union carried through the deferred
//! execution facility, and the [`TriggerTime`] input accepted by the trigger
//! scheduler. Events are strongly typed at construction and decoded
//! exhaustively at dispatch; the serialized form is the stable wire contract
//! of the persisted job table.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A single alarm occurrence handed to the deferred execution facility.
///
/// The serialized representation is the wire contract: the `type` tag is one
/// of `test_adhan`, `pray`, `break_start`, `break_end`, and the payload field
/// is `pray` (prayer name) or `breakId` as applicable.
///
/// # Identity
///
/// Two events are equal when their type and payload match. The deduplication
/// name used for submission additionally embeds the target instant, see
/// [`TriggerEvent::unique_name`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TriggerEvent {
    /// Immediate adhan playback requested by the user for verification.
    #[serde(rename = "test_adhan")]
    TestAdhan,
    /// A daily prayer alert. `pray` is the wire name of the prayer (e.g. "fajr").
    #[serde(rename = "pray")]
    Prayer { pray: String },
    /// Start of a user-defined break, identified by the break id.
    #[serde(rename = "break_start")]
    BreakStart {
        #[serde(rename = "breakId")]
        break_id: String,
    },
    /// End of a user-defined break, identified by the break id.
    #[serde(rename = "break_end")]
    BreakEnd {
        #[serde(rename = "breakId")]
        break_id: String,
    },
}

impl TriggerEvent {
    /// The wire tag of this event type.
    pub fn kind(&self) -> &'static str {
        match self {
            TriggerEvent::TestAdhan => "test_adhan",
            TriggerEvent::Prayer { .. } => "pray",
            TriggerEvent::BreakStart { .. } => "break_start",
            TriggerEvent::BreakEnd { .. } => "break_end",
        }
    }

    /// The identifying payload value, if any: the prayer name or the break id.
    pub fn subject(&self) -> Option<&str> {
        match self {
            TriggerEvent::TestAdhan => None,
            TriggerEvent::Prayer { pray } => Some(pray),
            TriggerEvent::BreakStart { break_id } | TriggerEvent::BreakEnd { break_id } => {
                Some(break_id)
            }
        }
    }

    /// Deduplication name for a submission targeting `target_millis`.
    ///
    /// The name is `type + subject + target instant in milliseconds`.
    /// Re-submitting with identical parameters therefore produces the same
    /// name and replaces the pending request. Re-arming the same `(type,
    /// subject)` pair at a *different* instant produces a different name and
    /// does not cancel the previous request; this is a known limitation of
    /// name-based deduplication, not an oversight.
    pub fn unique_name(&self, target_millis: i64) -> String {
        format!("{}{}{}", self.kind(), self.subject().unwrap_or(""), target_millis)
    }
}

/// The wall-clock target accepted by the trigger scheduler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerTime {
    /// An absolute instant, used for one-shot requests such as test alerts.
    At(DateTime<Utc>),
    /// An hour:minute pair resolved against "today" in the configured zone,
    /// used for daily recurring events.
    Daily(NaiveTime),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_stable() {
        let prayer = TriggerEvent::Prayer {
            pray: "fajr".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&prayer).unwrap(),
            r#"{"type":"pray","pray":"fajr"}"#
        );

        let start = TriggerEvent::BreakStart {
            break_id: "b1".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&start).unwrap(),
            r#"{"type":"break_start","breakId":"b1"}"#
        );

        let end = TriggerEvent::BreakEnd {
            break_id: "b2".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&end).unwrap(),
            r#"{"type":"break_end","breakId":"b2"}"#
        );

        assert_eq!(
            serde_json::to_string(&TriggerEvent::TestAdhan).unwrap(),
            r#"{"type":"test_adhan"}"#
        );
    }

    #[test]
    fn test_wire_format_round_trips() {
        let event = TriggerEvent::BreakEnd {
            break_id: "abc-123".to_string(),
        };
        let serialized = serde_json::to_string(&event).unwrap();
        let deserialized: TriggerEvent = serde_json::from_str(&serialized).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_unique_name_composition() {
        let prayer = TriggerEvent::Prayer {
            pray: "maghrib".to_string(),
        };
        assert_eq!(prayer.unique_name(1700000000000), "praymaghrib1700000000000");

        let start = TriggerEvent::BreakStart {
            break_id: "b1".to_string(),
        };
        assert_eq!(start.unique_name(42), "break_startb142");

        // No subject for test alerts: the name is type + instant.
        assert_eq!(TriggerEvent::TestAdhan.unique_name(42), "test_adhan42");
    }

    #[test]
    fn test_unique_name_differs_per_instant() {
        // Same event at a different instant is a different submission name,
        // so the older pending request is not replaced.
        let event = TriggerEvent::Prayer {
            pray: "isha".to_string(),
        };
        assert_ne!(event.unique_name(1000), event.unique_name(2000));
    }
}
