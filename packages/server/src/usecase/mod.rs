//! Use case layer: one struct per operation of the matching-and-signaling
//! core, each depending only on the domain interfaces.

pub mod disconnect;
pub mod end_call;
pub mod error;
pub mod join_queue;
pub mod leave_queue;
pub mod relay_signal;
pub mod run_matching;

pub use disconnect::{DisconnectReport, DisconnectUseCase};
pub use end_call::{EndCallOutcome, EndCallUseCase};
pub use error::{EndCallError, JoinQueueError, LeaveQueueError, RelaySignalError};
pub use join_queue::JoinQueueUseCase;
pub use leave_queue::LeaveQueueUseCase;
pub use relay_signal::RelaySignalUseCase;
pub use run_matching::{CycleReport, RunMatchingCycleUseCase};
