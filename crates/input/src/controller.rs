use handworks_common::Transform;
use serde::{Deserialize, Serialize};

/// Default analog deadzone. A grip or trigger reading must be strictly
/// above this fraction of full scale to count as pressed.
pub const DEFAULT_DEADZONE: f32 = 0.25;

/// What kind of input a grabbable wants before a hand may hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GrabInputMode {
    /// Held while the grip axis is down.
    #[default]
    Grip,
    /// Held while the trigger axis is down.
    Trigger,
    /// Always active: touching the object is enough to take it.
    Hover,
}

/// Discrete controller buttons the core cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    /// Face button A / X.
    Primary,
    /// Face button B / Y.
    Secondary,
    /// Thumbstick click.
    StickPress,
}

/// Raw per-hand controller snapshot, refreshed once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerState {
    /// Tracked controller pose in world space.
    pub pose: Transform,
    /// Grip axis in [0, 1].
    pub grip: f32,
    /// Trigger axis in [0, 1].
    pub trigger: f32,
    pub primary: bool,
    pub secondary: bool,
    pub stick_press: bool,
}

impl ControllerState {
    pub fn at(pose: Transform) -> Self {
        Self {
            pose,
            ..Self::default()
        }
    }

    pub fn with_grip(mut self, grip: f32) -> Self {
        self.grip = grip;
        self
    }

    pub fn with_trigger(mut self, trigger: f32) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_button(mut self, button: Button, pressed: bool) -> Self {
        match button {
            Button::Primary => self.primary = pressed,
            Button::Secondary => self.secondary = pressed,
            Button::StickPress => self.stick_press = pressed,
        }
        self
    }

    pub fn is_grip_down(&self, deadzone: f32) -> bool {
        self.grip > deadzone
    }

    pub fn is_trigger_down(&self, deadzone: f32) -> bool {
        self.trigger > deadzone
    }

    /// Whether the reading satisfies `mode`. Hover is always satisfied.
    pub fn is_down(&self, mode: GrabInputMode, deadzone: f32) -> bool {
        match mode {
            GrabInputMode::Hover => true,
            GrabInputMode::Grip => self.is_grip_down(deadzone),
            GrabInputMode::Trigger => self.is_trigger_down(deadzone),
        }
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        match button {
            Button::Primary => self.primary,
            Button::Secondary => self.secondary,
            Button::StickPress => self.stick_press,
        }
    }
}
