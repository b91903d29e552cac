//! Explicit option values for boundary calls that have more than one knob.
//!
//! Every field has a named default; set only what differs:
//!
//! ```
//! use badlads_sdk::{ChatOptions, Color};
//!
//! let options = ChatOptions::default().color(Color::RED).eventful(true);
//! assert_eq!(options.color, Color::RED);
//! ```

use badlads_types::Color;
use serde::{Deserialize, Serialize};

/// Options for chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatOptions {
    /// Message color. Default [`Color::WHITE`].
    pub color: Color,
    /// Raise the host's chat event for this message. Default `false`.
    pub eventful: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            eventful: false,
        }
    }
}

impl ChatOptions {
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn eventful(mut self, eventful: bool) -> Self {
        self.eventful = eventful;
        self
    }
}

/// Options for spawning an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnOptions {
    /// Let the host finish the spawn later. Default `false`.
    ///
    /// An asynchronous spawn produces no usable handle.
    pub asynchronous: bool,
}

impl SpawnOptions {
    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = asynchronous;
        self
    }
}

/// An item to put in a player's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemGrant {
    /// Host item id. Default `0`.
    pub item_id: i32,
    /// Default `1`.
    pub stack_size: i32,
    /// Merge into an existing stack when possible. Default `true`.
    pub auto_stack: bool,
}

impl Default for ItemGrant {
    fn default() -> Self {
        Self {
            item_id: 0,
            stack_size: 1,
            auto_stack: true,
        }
    }
}

impl ItemGrant {
    pub fn new(item_id: i32) -> Self {
        Self {
            item_id,
            ..Self::default()
        }
    }

    pub fn stack_size(mut self, stack_size: i32) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn auto_stack(mut self, auto_stack: bool) -> Self {
        self.auto_stack = auto_stack;
        self
    }
}

/// How a job change is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobChange {
    /// Announce the new job to the server. Default `true`.
    pub broadcast_become: bool,
    /// Refuse the change when the job has no free slots. Default `false`.
    pub check_for_availability: bool,
    /// Default `true`.
    pub try_respawn: bool,
    /// Treat the change as a demotion. Default `false`.
    pub was_demoted: bool,
    /// Default `false`.
    pub force_respawn: bool,
}

impl Default for JobChange {
    fn default() -> Self {
        Self {
            broadcast_become: true,
            check_for_availability: false,
            try_respawn: true,
            was_demoted: false,
            force_respawn: false,
        }
    }
}

impl JobChange {
    pub fn broadcast_become(mut self, value: bool) -> Self {
        self.broadcast_become = value;
        self
    }

    pub fn check_for_availability(mut self, value: bool) -> Self {
        self.check_for_availability = value;
        self
    }

    pub fn try_respawn(mut self, value: bool) -> Self {
        self.try_respawn = value;
        self
    }

    pub fn was_demoted(mut self, value: bool) -> Self {
        self.was_demoted = value;
        self
    }

    pub fn force_respawn(mut self, value: bool) -> Self {
        self.force_respawn = value;
        self
    }
}
