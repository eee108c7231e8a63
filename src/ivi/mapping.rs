//! Device button mappings and profiles per IVI state
//!
//! Static tables keyed by [`IviState`]. String lookups that do not name a
//! known state resolve to the `Stable` entry.

use crate::ivi::types::IviState;
use serde::Serialize;

/// Symbolic control slot on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonSlot {
    ThumbButton,
    ScrollClick,
    GestureUp,
    GestureDown,
    GestureLeft,
    GestureRight,
}

impl ButtonSlot {
    pub const ALL: [ButtonSlot; 6] = [
        ButtonSlot::ThumbButton,
        ButtonSlot::ScrollClick,
        ButtonSlot::GestureUp,
        ButtonSlot::GestureDown,
        ButtonSlot::GestureLeft,
        ButtonSlot::GestureRight,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ButtonSlot::ThumbButton => "Thumb Button",
            ButtonSlot::ScrollClick => "Scroll Click",
            ButtonSlot::GestureUp => "Gesture ↑",
            ButtonSlot::GestureDown => "Gesture ↓",
            ButtonSlot::GestureLeft => "Gesture ←",
            ButtonSlot::GestureRight => "Gesture →",
        }
    }
}

/// Action bound to each slot for one state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ButtonMapping {
    pub thumb_button: &'static str,
    pub scroll_click: &'static str,
    pub gesture_up: &'static str,
    pub gesture_down: &'static str,
    pub gesture_left: &'static str,
    pub gesture_right: &'static str,
}

impl ButtonMapping {
    pub fn action(&self, slot: ButtonSlot) -> &'static str {
        match slot {
            ButtonSlot::ThumbButton => self.thumb_button,
            ButtonSlot::ScrollClick => self.scroll_click,
            ButtonSlot::GestureUp => self.gesture_up,
            ButtonSlot::GestureDown => self.gesture_down,
            ButtonSlot::GestureLeft => self.gesture_left,
            ButtonSlot::GestureRight => self.gesture_right,
        }
    }

    /// Slot/action pairs in display order
    pub fn entries(&self) -> Vec<(ButtonSlot, &'static str)> {
        ButtonSlot::ALL.iter().map(|slot| (*slot, self.action(*slot))).collect()
    }
}

/// Named device profile for one state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    pub state: IviState,
    pub profile_name: &'static str,
    pub behavior_summary: &'static str,
}

const DEEP_FOCUS_MAPPING: ButtonMapping = ButtonMapping {
    thumb_button: "Back to Main App (Primary Tool)",
    scroll_click: "Quick Note – Capture Distraction",
    gesture_up: "Toggle Do Not Disturb",
    gesture_down: "Flow Review Panel",
    gesture_left: "Switch to IDE",
    gesture_right: "Switch to Docs",
};

const STABLE_MAPPING: ButtonMapping = ButtonMapping {
    thumb_button: "Forward / Back Navigation",
    scroll_click: "Middle Click",
    gesture_up: "Mission Control",
    gesture_down: "App Expose",
    gesture_left: "Back",
    gesture_right: "Forward",
};

const FRAGMENTED_MAPPING: ButtonMapping = ButtonMapping {
    thumb_button: "Return to Last Stable App",
    scroll_click: "Close Current Tab",
    gesture_up: "Open Flow Review Panel",
    gesture_down: "Snap Distraction to Sidebar",
    gesture_left: "Switch to Primary App",
    gesture_right: "Switch to Secondary App",
};

const OVERLOADED_MAPPING: ButtonMapping = ButtonMapping {
    thumb_button: "Close Current Tab",
    scroll_click: "Dump Distraction to Inbox",
    gesture_up: "Start 10-min Reset Break",
    gesture_down: "Lock Screen",
    gesture_left: "Return to Main App",
    gesture_right: "Enable Aggressive DND",
};

/// Profiles in band order
pub static DEVICE_PROFILES: [DeviceProfile; 4] = [
    DeviceProfile {
        state: IviState::DeepFocus,
        profile_name: "Focus Lock",
        behavior_summary: "Limit navigation to 1–2 core apps. Scroll wheel resistance increased.",
    },
    DeviceProfile {
        state: IviState::Stable,
        profile_name: "Balanced Flow",
        behavior_summary: "Normal behavior with gentle guardrails. Smart context switching enabled.",
    },
    DeviceProfile {
        state: IviState::Fragmented,
        profile_name: "Flow Rescue",
        behavior_summary: "Reduce scrolling, prioritize 'back to main app'. Tab churn dampening active.",
    },
    DeviceProfile {
        state: IviState::Overloaded,
        profile_name: "Cognitive Shield",
        behavior_summary: "Aggressively remove distractions, add mandatory micro-breaks every 10 min.",
    },
];

/// Button mapping for a state
pub fn button_mapping(state: IviState) -> &'static ButtonMapping {
    match state {
        IviState::DeepFocus => &DEEP_FOCUS_MAPPING,
        IviState::Stable => &STABLE_MAPPING,
        IviState::Fragmented => &FRAGMENTED_MAPPING,
        IviState::Overloaded => &OVERLOADED_MAPPING,
    }
}

/// Button mapping for a state label; unknown labels resolve to `Stable`.
pub fn lookup_button_mapping(label: &str) -> &'static ButtonMapping {
    button_mapping(resolve_state(label))
}

/// Device profile for a state
pub fn device_profile(state: IviState) -> &'static DeviceProfile {
    DEVICE_PROFILES
        .iter()
        .find(|p| p.state == state)
        .unwrap_or(&DEVICE_PROFILES[1])
}

/// Device profile for a state label; unknown labels resolve to `Stable`.
pub fn lookup_device_profile(label: &str) -> &'static DeviceProfile {
    device_profile(resolve_state(label))
}

/// Resolve a free-form label to a state, defaulting to `Stable`.
pub fn resolve_state(label: &str) -> IviState {
    IviState::parse_label(label).unwrap_or(IviState::Stable)
}
