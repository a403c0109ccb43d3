//! Host callbacks reachable from managed code.
//!
//! A minted function carries two numbers as its data: the id of a
//! [`JsCallbackCaller`] and the callback id chosen by the host. Calling it
//! looks the caller up in the process-wide [`JsCallbackCallerRegistry`] and
//! forwards the converted arguments.
//!
//! ```text
//! managed call ──► on_called_static ──► registry lookup ──► JsCallbackCaller
//!                   (decode data)         (by caller id)      (convert, invoke host)
//! ```
//!
//! ### Lifetimes
//!
//! - **[`JsCallbackMaker`]** is owned by a session and mints functions.
//! - **[`JsCallbackCallerHolder`]** keeps one caller registered for as long as
//!   the maker lives.
//! - Minted functions may outlive both. Once the holder is dropped their
//!   caller id no longer resolves and a call does nothing.

pub mod caller;
pub mod holder;
pub mod maker;
pub mod registry;

pub use caller::{Callback, JsCallbackCaller};
pub use holder::JsCallbackCallerHolder;
pub use maker::JsCallbackMaker;
pub use registry::{JsCallbackCallerRegistry, RegistryConfig};
