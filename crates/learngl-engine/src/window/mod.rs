//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single application window, and wires
//! them to the GPU layer.

mod display;
mod runtime;

pub use display::DisplayConfig;
pub use runtime::Runtime;
