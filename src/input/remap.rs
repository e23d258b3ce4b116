//! Button transforms applied to input reports before they reach the console.
use packed_struct::PackingError;

use crate::{
    config::profile::MiscConfig,
    drivers::switch::hid_report::{ButtonStatus, BUTTON_WORD_MASK},
};

/// Number of buttons addressable by a button mask
const BUTTON_COUNT: usize = 24;

/// Synthesize the HOME and CAPTURE buttons for controllers that lack them.
/// MINUS + DPAD_DOWN presses HOME and MINUS + DPAD_UP presses CAPTURE. The
/// HOME chord is checked first and consumes MINUS.
pub fn apply_button_combos(buttons: &mut ButtonStatus) {
    if buttons.minus && buttons.down {
        buttons.home = true;
        buttons.minus = false;
        buttons.down = false;
    }

    if buttons.minus && buttons.up {
        buttons.capture = true;
        buttons.minus = false;
        buttons.up = false;
    }
}

/// Invert the buttons selected by the low 24 bits of `mask`. Bits above the
/// button bits are left untouched.
pub fn apply_inversion_mask(word: u32, mask: u32) -> u32 {
    word ^ (mask & BUTTON_WORD_MASK)
}

/// State of a single button in the [HoldTurbo] state machine
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BitState {
    /// Not pressed, or not affected by any mask
    #[default]
    Idle,
    /// Hold button physically held after latching
    Held,
    /// Hold button released but still reported as pressed
    Latched,
    /// Hold button pressed again; it unlatches on release
    Unlatching,
    /// Turbo button held and reported as pressed this frame
    TurboOn,
    /// Turbo button held and reported as released this frame
    TurboOff,
}

impl BitState {
    fn is_pressed(&self) -> bool {
        !matches!(self, BitState::Idle | BitState::TurboOff)
    }

    fn next_hold(self, pressed: bool) -> Self {
        match (self, pressed) {
            (BitState::Idle, true) => BitState::Held,
            (BitState::Held, false) => BitState::Latched,
            (BitState::Latched, true) => BitState::Unlatching,
            (BitState::Unlatching, false) => BitState::Idle,
            (BitState::TurboOn | BitState::TurboOff, true) => BitState::Held,
            (BitState::TurboOn | BitState::TurboOff, false) => BitState::Idle,
            (state, _) => state,
        }
    }

    fn next_turbo(self, pressed: bool) -> Self {
        match (self, pressed) {
            (BitState::TurboOn, true) => BitState::TurboOff,
            (_, true) => BitState::TurboOn,
            (_, false) => BitState::Idle,
        }
    }
}

/// Per-button hold and turbo state machine.
///
/// Buttons in the turbo mask alternate between pressed and released on
/// every processed frame while physically held, regardless of the hold mask.
/// Buttons in the hold mask stay pressed after being released and are only
/// released at the end of the next physical press. Other buttons pass
/// through unchanged.
#[derive(Debug, Clone)]
pub struct HoldTurbo {
    hold_mask: u32,
    turbo_mask: u32,
    states: [BitState; BUTTON_COUNT],
}

impl HoldTurbo {
    pub fn new(hold_mask: u32, turbo_mask: u32) -> Self {
        Self {
            hold_mask: hold_mask & BUTTON_WORD_MASK,
            turbo_mask: turbo_mask & BUTTON_WORD_MASK,
            states: [BitState::Idle; BUTTON_COUNT],
        }
    }

    /// Returns the current state of the given button bit
    pub fn state(&self, bit: usize) -> Option<BitState> {
        self.states.get(bit).copied()
    }

    /// Process one frame of button state, returning the buttons to report
    pub fn apply(&mut self, word: u32) -> u32 {
        let mut output = word & !BUTTON_WORD_MASK;
        for (bit, state) in self.states.iter_mut().enumerate() {
            let flag = 1 << bit;
            let pressed = word & flag != 0;
            let pressed = if self.turbo_mask & flag != 0 {
                *state = state.next_turbo(pressed);
                state.is_pressed()
            } else if self.hold_mask & flag != 0 {
                *state = state.next_hold(pressed);
                state.is_pressed()
            } else {
                pressed
            };
            if pressed {
                output |= flag;
            }
        }
        output
    }

    /// Forget all latched and turbo state
    pub fn reset(&mut self) {
        self.states = [BitState::Idle; BUTTON_COUNT];
    }
}

/// Applies the hold, turbo and inversion masks of a controller profile
#[derive(Debug, Clone)]
pub struct ButtonRemapper {
    hold_turbo: HoldTurbo,
    inversion_mask: u32,
}

impl ButtonRemapper {
    pub fn new(hold_mask: u32, turbo_mask: u32, inversion_mask: u32) -> Self {
        Self {
            hold_turbo: HoldTurbo::new(hold_mask, turbo_mask),
            inversion_mask,
        }
    }

    pub fn from_profile(misc: &MiscConfig) -> Self {
        Self::new(
            misc.hold_enable_mask,
            misc.turbo_enable_mask,
            misc.inversion_enable_mask,
        )
    }

    /// Apply hold/turbo and then inversion to the given buttons
    pub fn apply(&mut self, buttons: &ButtonStatus) -> Result<ButtonStatus, PackingError> {
        let word = buttons.to_word()?;
        let word = self.hold_turbo.apply(word);
        let word = apply_inversion_mask(word, self.inversion_mask);
        ButtonStatus::from_word(word)
    }
}
