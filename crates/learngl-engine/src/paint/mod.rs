//! Colour types.

mod color;

pub use color::Color;
