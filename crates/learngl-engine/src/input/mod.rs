//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The runtime translates platform events through `platform::winit`.

mod state;
mod types;

pub(crate) mod platform {
    pub(crate) mod winit;
}

pub use state::InputState;
pub use types::{InputEvent, Key, KeyState};
