//! # scout-orchestrator
//!
//! Drives a Scout run:
//! - [`LoopEngine`]: the propose → validate → decide loop
//! - [`ActivityLogger`]: Markdown log of every round
//! - [`export_websites`]: writes the found list as a one-column table

mod activity_logger;
mod export;
mod loop_engine;

pub use activity_logger::ActivityLogger;
pub use export::{export_websites, ExportFormat, WEBSITE_COLUMN};
pub use loop_engine::{LoopEngine, LoopResult};
