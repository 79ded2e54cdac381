//! learngl engine crate.
//!
//! Window, GPU context and thin GPU resource wrappers used by the letter demo.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod window;
