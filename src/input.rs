//! Logical per-tick input and the grace-window timers built on top of it.

use crate::body::Side;
use crate::profile::CharacterProfile;

/// Stick values inside this band count as neutral.
pub const MOVE_AXIS_DEADZONE: f32 = 0.2;

/// One tick's worth of actions, already decoupled from keys and pads.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct InputFrame {
    /// -1.0 full left to 1.0 full right
    pub move_axis: f32,
    pub jump_held: bool,
    /// Rising edge of jump this tick
    pub jump_pressed: bool,
    pub run_held: bool,
    pub dash_pressed: bool,
}

impl InputFrame {
    /// Digital direction after the deadzone, `None` when neutral.
    pub fn move_direction(&self) -> Option<Side> {
        if self.move_axis.abs() < MOVE_AXIS_DEADZONE {
            return None;
        }
        Side::from_sign(self.move_axis)
    }
}

#[cfg(test)]
impl InputFrame {
    pub fn idle() -> InputFrame {
        InputFrame::default()
    }

    pub fn moving(move_axis: f32) -> InputFrame {
        InputFrame {
            move_axis,
            ..InputFrame::default()
        }
    }

    pub fn with_run(mut self) -> InputFrame {
        self.run_held = true;
        self
    }

    /// Jump pressed this tick (and therefore held).
    pub fn with_jump_press(mut self) -> InputFrame {
        self.jump_pressed = true;
        self.jump_held = true;
        self
    }

    pub fn with_jump_held(mut self) -> InputFrame {
        self.jump_held = true;
        self
    }

    pub fn with_dash(mut self) -> InputFrame {
        self.dash_pressed = true;
        self
    }
}

/// Coyote-time and jump-buffer countdowns.
///
/// Both windows are refilled to the profile's length and count down one per
/// tick, floored at zero. The coyote window is refilled on every grounded
/// tick, so its remaining count is `coyote_time` minus the ticks spent
/// airborne since leaving the ground. An event at tick `T` is honoured at
/// `T + k` exactly when `k < window`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferedInputTracker {
    coyote: u32,
    jump_buffer: u32,
}

impl BufferedInputTracker {
    /// Runs once per tick before any movement phase. `was_grounded` is the
    /// body's grounded flag as the previous tick left it.
    pub fn advance(&mut self, input: &InputFrame, was_grounded: bool, profile: &CharacterProfile) {
        if was_grounded {
            self.coyote = profile.coyote_time;
        } else {
            self.coyote = self.coyote.saturating_sub(1);
        }

        if input.jump_pressed {
            // a press is always good for the tick it arrives on
            self.jump_buffer = profile.jump_buffer.max(1);
        } else {
            self.jump_buffer = self.jump_buffer.saturating_sub(1);
        }
    }

    pub fn on_landed(&mut self, profile: &CharacterProfile) {
        self.coyote = profile.coyote_time;
    }

    pub fn jump_pending(&self) -> bool {
        self.jump_buffer > 0
    }

    pub fn in_coyote_window(&self) -> bool {
        self.coyote > 0
    }

    /// Clears the buffered press and closes the coyote window.
    pub fn consume_jump(&mut self) {
        self.jump_buffer = 0;
        self.coyote = 0;
    }

    #[cfg(test)]
    pub fn coyote_remaining(&self) -> u32 {
        self.coyote
    }

    #[cfg(test)]
    pub fn jump_buffer_remaining(&self) -> u32 {
        self.jump_buffer
    }
}
