//! Execution runtime: the managed environment, value conversion and the host
//! callback bridge.
//!
//! - **[`ds`]** - Data structures (values, objects, isolates, contexts)
//! - **[`binary_value`]** - Host-side values and conversion
//! - **[`callback`]** - Managed functions that call back into the host
//! - **[`session`]** - Per-context owner tying the above together
//! - **[`config`]** - TOML runtime configuration

pub mod binary_value;
pub mod callback;
pub mod config;
pub mod context_holder;
pub mod ds;
pub mod session;
