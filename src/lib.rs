//! # just-bridge - host callbacks for the `just` script engine
//!
//! Lets a native host hand managed code functions that call back into it:
//! - Isolates and contexts with heap accounting
//! - Conversion between managed values and thread-safe host values
//! - A process-wide registry so minted functions never point at native state
//! - Silent no-op calls once the owning session is gone
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use just_bridge::runner::binary_value::BinaryValue;
//! use just_bridge::runner::config::RuntimeConfig;
//! use just_bridge::runner::session::JsSession;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! let session = JsSession::new(
//!     &RuntimeConfig::default(),
//!     Arc::new(move |callback_id, args| sink.lock().unwrap().push((callback_id, args))),
//! )
//! .unwrap();
//!
//! let callback = session.make_js_callback(42).unwrap();
//! session.call_function(&callback, vec![BinaryValue::Integer(7)]).unwrap();
//!
//! assert_eq!(
//!     *seen.lock().unwrap(),
//!     vec![(42, BinaryValue::Array(vec![BinaryValue::Integer(7)]))]
//! );
//! ```
//!
//! ## Architecture
//!
//! - **[`runner`]** - Runtime and bridge
//!   - **[`runner::ds`]** - Data structures (values, objects, contexts)
//!   - **[`runner::callback`]** - Callback makers and the caller registry
//!   - **[`runner::session`]** - Host-facing session

#[macro_use]
extern crate lazy_static;

pub mod runner;
