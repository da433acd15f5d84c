//! Process lifecycle for the render service binary.

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub use launch::{ServicePlan, run_service, run_service_with};
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
