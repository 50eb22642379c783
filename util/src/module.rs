//! Cyclic module interface
//!
//! Cyclic modules in `drive_exec` (the estimator and trajectory control)
//! implement [`State`]. They are initialised once at start up, then
//! processed once per control cycle by the executable's main loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A module stepped by the control cycle.
pub trait State {
    /// Parameters or initial readings passed to `init`
    type InitData;
    type InitError;

    /// What the module consumes each cycle
    type InputData;
    /// What the module produces each cycle
    type OutputData;
    /// Monitoring quantities for the cycle, usually also archived
    type StatusReport;
    type ProcError;

    /// Initialise the module, opening its archives in `session`.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one control cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
