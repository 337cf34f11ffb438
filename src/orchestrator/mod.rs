//! Phase orchestration: one [`PhaseDriver`] session per phase, sequenced by a
//! [`RunController`].

pub mod controller;
pub mod driver;
pub mod state;

pub use controller::{RunController, RunSettings};
pub use driver::{DriverSettings, PhaseDriver, phase_prompt};
pub use state::{
    FailureReason, PhaseRecord, PhaseVerdict, RunOutcome, RunReport, RunState, SuccessKind,
};
