//! AppMessage enum for async communication within the application.

use crate::aggregator::Aggregate;
use crate::module::ModuleMessage;

/// Messages delivered into the event loop by spawned work and timers.
///
/// Every variant carries the generation it was issued under; the loop drops
/// messages from an earlier generation.
#[derive(Debug)]
pub enum AppMessage {
    /// Result of work a module asked for.
    ModuleResult {
        generation: u64,
        module: String,
        message: ModuleMessage,
    },
    /// Background polling tick for the active module.
    PollTick { generation: u64, module: String },
    /// Home overview summaries finished loading.
    HomeSummary {
        generation: u64,
        aggregate: Aggregate,
    },
}

impl AppMessage {
    pub fn generation(&self) -> u64 {
        match self {
            AppMessage::ModuleResult { generation, .. }
            | AppMessage::PollTick { generation, .. }
            | AppMessage::HomeSummary { generation, .. } => *generation,
        }
    }
}
