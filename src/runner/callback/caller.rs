use std::fmt;
use std::sync::Arc;

use crate::runner::binary_value::{BinaryValue, BinaryValueFactory};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::JsContext;
use crate::runner::ds::value::JsValue;

/// Host function invoked when script code calls a minted callback. It receives
/// the callback id the function was minted with and the converted arguments.
pub type Callback = Arc<dyn Fn(u64, BinaryValue) + Send + Sync>;

/// Pairs a value factory with a host callback. Immutable once built, so it is
/// shared freely between the registry and in-flight calls.
pub struct JsCallbackCaller {
    bv_factory: Arc<BinaryValueFactory>,
    callback: Callback,
}

impl JsCallbackCaller {
    pub fn new(bv_factory: Arc<BinaryValueFactory>, callback: Callback) -> Self {
        JsCallbackCaller {
            bv_factory,
            callback,
        }
    }

    /// Convert `args` against `context` and hand them to the host callback.
    pub fn do_callback(
        &self,
        context: &JsContext,
        callback_id: u64,
        args: &JsValue,
    ) -> Result<(), JErrorType> {
        let args = self.bv_factory.new_value(context, args)?;
        (self.callback)(callback_id, args);
        Ok(())
    }
}

impl fmt::Debug for JsCallbackCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsCallbackCaller")
            .field("bv_factory", &self.bv_factory)
            .finish()
    }
}
