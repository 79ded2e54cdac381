//! learngl: draws a "T" and an "F" from hardcoded vertex data.
//!
//! Escape or the window close button quits.

mod app;
mod letters;

use anyhow::Result;

use learngl_engine::device::GpuInit;
use learngl_engine::logging::{init_logging, LoggingConfig};
use learngl_engine::window::{DisplayConfig, Runtime};

use crate::app::LettersApp;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(DisplayConfig::default(), GpuInit::default(), LettersApp::new())
}
