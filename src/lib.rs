//! Powered-descent and N-body simulation toolkit.
//!
//! The workspace crates are re-exported here so front-ends (the CLI binaries, tests) can depend
//! on a single library. The modules in this crate glue them together: `scenario` turns
//! configuration into validated runtime values, `descent` flies the lander and exposes the
//! gain-tuning problem, `mission` propagates body catalogs and probes.

pub use descent_config as config;
pub use descent_core::{ActuatorLimits, Command, angle, constants, time, vector};
pub use descent_dynamics as dynamics;
pub use descent_export as export;
pub use descent_guidance as guidance;
pub use descent_ode as ode;
pub use descent_optimize as optimize;

pub mod descent;
pub mod mission;
pub mod scenario;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
