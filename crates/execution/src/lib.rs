//! Execution layer - command building, tree traversal and the scan loop.

#![warn(missing_docs)]

pub mod command;
pub mod traversal;
pub mod scheduler;
pub mod engine;
pub mod status;
pub mod redo;

pub use command::{source_name, target_path, BuildOutcome, CommandBuilder, Settlement};
pub use traversal::{Flow, StopReason, Walker};
pub use scheduler::SchedulerConfig;
pub use engine::{CycleResult, Scheduler, SchedulerState};
pub use status::{collect_status, StatusEntry, StatusKind, StatusReport};
pub use redo::clear_settlement;
