//! Board button edges to Remote service button indices

use remote_proto::ble::BUTTON_COUNT;

pub const BTN1_MSK: u32 = 1 << 0;
pub const BTN2_MSK: u32 = 1 << 1;
pub const BTN3_MSK: u32 = 1 << 2;
pub const BTN4_MSK: u32 = 1 << 3;

/// A pressed button, 1..=4 on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ButtonIndex(u8);

impl ButtonIndex {
    pub fn new(index: u8) -> Option<Self> {
        (1..=BUTTON_COUNT).contains(&index).then_some(Self(index))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Map a button driver event to the button that was pressed.
    ///
    /// `button_state` is the current level of every button, `has_changed` the
    /// buttons whose level changed in this event. Releases and events where
    /// `has_changed` is not exactly one known button yield `None`.
    pub fn from_edge(button_state: u32, has_changed: u32) -> Option<Self> {
        if has_changed & button_state == 0 {
            return None;
        }
        match has_changed {
            BTN1_MSK => Some(Self(1)),
            BTN2_MSK => Some(Self(2)),
            BTN3_MSK => Some(Self(3)),
            BTN4_MSK => Some(Self(4)),
            _ => None,
        }
    }
}

impl std::fmt::Display for ButtonIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
