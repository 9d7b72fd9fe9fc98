//! Core configuration for cadence-animation-core.

use serde::{Deserialize, Serialize};

use crate::alpha::BuiltinAlpha;
use crate::animation::EndAction;

/// Engine-wide defaults and sizing hints.
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// End action given to newly created animations.
    pub default_end_action: EndAction,
    /// Disconnect action given to newly created animations.
    pub default_disconnect_action: EndAction,
    /// Alpha function used by animators that do not name one.
    pub default_alpha: BuiltinAlpha,

    /// Ticks during which a discarded property keeps being reverted to its
    /// baseline before the engine stops touching it.
    pub discard_settle_frames: u32,

    /// Maximum events to retain per tick; the rest are dropped with a warning.
    pub max_events_per_tick: usize,

    /// Initial capacity hint for the per-tick property buffer.
    pub scratch_properties: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_end_action: EndAction::Bake,
            default_disconnect_action: EndAction::BakeFinal,
            default_alpha: BuiltinAlpha::Default,
            discard_settle_frames: 2,
            max_events_per_tick: 1024,
            scratch_properties: 256,
        }
    }
}

impl Config {
    /// Parse a configuration document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
