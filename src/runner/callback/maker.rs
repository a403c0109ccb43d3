use std::rc::Rc;
use std::sync::Arc;

use crate::runner::binary_value::{BinaryValue, BinaryValueFactory};
use crate::runner::callback::caller::Callback;
use crate::runner::callback::holder::JsCallbackCallerHolder;
use crate::runner::callback::registry::JsCallbackCallerRegistry;
use crate::runner::context_holder::ContextHolder;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::Isolate;
use crate::runner::ds::function_object::FunctionCallbackInfo;
use crate::runner::ds::operations::type_conversion::to_big_uint64_lossless;
use crate::runner::ds::value::JsValue;

/// Mints managed functions that call back into the host.
///
/// One maker exists per context. It owns the registration of its caller, so
/// once the maker is dropped every function it minted turns into a no-op.
pub struct JsCallbackMaker {
    context_holder: Rc<ContextHolder>,
    bv_factory: Arc<BinaryValueFactory>,
    callback_caller_holder: JsCallbackCallerHolder,
}

impl JsCallbackMaker {
    pub fn new(
        context_holder: Rc<ContextHolder>,
        bv_factory: &Arc<BinaryValueFactory>,
        callback: Callback,
    ) -> Result<Self, JErrorType> {
        Ok(JsCallbackMaker {
            context_holder,
            bv_factory: bv_factory.clone(),
            callback_caller_holder: JsCallbackCallerHolder::new(bv_factory.clone(), callback)?,
        })
    }

    pub fn callback_caller_id(&self) -> u64 {
        self.callback_caller_holder.get()
    }

    pub fn make_js_callback(
        &self,
        isolate: &Isolate,
        callback_id: u64,
    ) -> Result<BinaryValue, JErrorType> {
        let context = self.context_holder.resolve(isolate)?;
        let _scope = context.enter();

        // The function carries [caller id, callback id] rather than anything
        // pointing at native state, so it can safely outlive this maker.
        let data = context.new_array(vec![
            context.new_bigint_from_unsigned(self.callback_caller_holder.get()),
            context.new_bigint_from_unsigned(callback_id),
        ])?;
        let func = context.new_function("", JsCallbackMaker::on_called_static, data)?;

        self.bv_factory.new_value(&context, &func)
    }

    /// Entry point of every minted function.
    ///
    /// Bad data and unknown callers are expected after teardown, so each of
    /// those paths quietly returns `undefined`.
    fn on_called_static(info: &FunctionCallbackInfo) -> Result<JsValue, JErrorType> {
        let context = match info.get_isolate().get_current_context() {
            Some(context) => context,
            None => {
                log::trace!("Ignoring callback invoked outside of any context");
                return Ok(JsValue::Undefined);
            }
        };
        let _scope = context.enter();

        let (callback_caller_id, callback_id) = match decode_callback_data(info.data()) {
            Some(ids) => ids,
            None => {
                log::trace!("Ignoring callback with malformed data: {}", info.data());
                return Ok(JsValue::Undefined);
            }
        };

        // Nothing is allocated for an unregistered caller.
        let callback_caller = match JsCallbackCallerRegistry::get().get_caller(callback_caller_id) {
            Some(callback_caller) => callback_caller,
            None => {
                log::trace!(
                    "Ignoring callback {} for unregistered caller {}",
                    callback_id,
                    callback_caller_id
                );
                return Ok(JsValue::Undefined);
            }
        };

        let args = context.new_array_from_fn(info.length(), |idx| info.get(idx))?;

        callback_caller.do_callback(&context, callback_id, &args)?;
        Ok(JsValue::Undefined)
    }
}

/// `[caller id, callback id]`, both BigInts that fit a `u64` exactly.
fn decode_callback_data(data: &JsValue) -> Option<(u64, u64)> {
    let data_object = data.as_object()?.borrow();
    let data_array = data_object.as_array()?;
    if data_array.elements().len() != 2 {
        return None;
    }
    let callback_caller_id = to_big_uint64_lossless(&data_array.get_index(0)?)?;
    let callback_id = to_big_uint64_lossless(&data_array.get_index(1)?)?;
    Some((callback_caller_id, callback_id))
}
