//! One isolate, one context and its callback maker, wired together.

use std::rc::Rc;
use std::sync::Arc;

use crate::runner::binary_value::{BinaryValue, BinaryValueFactory};
use crate::runner::callback::caller::Callback;
use crate::runner::callback::maker::JsCallbackMaker;
use crate::runner::config::RuntimeConfig;
use crate::runner::context_holder::ContextHolder;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::{Isolate, JsContext};
use crate::runner::ds::value::JsValue;

/// Host-facing owner of a single execution context.
///
/// Everything crossing this boundary is a [`BinaryValue`]. Functions and
/// objects come back as handles pinned in the context and stay alive until
/// passed to [`JsSession::free_value`] or the session is dropped.
pub struct JsSession {
    // Fields drop in declaration order: the maker unregisters its caller
    // before the context it converts against goes away.
    callback_maker: JsCallbackMaker,
    bv_factory: Arc<BinaryValueFactory>,
    context_holder: Rc<ContextHolder>,
    isolate: Isolate,
}

impl JsSession {
    /// Build a session from the `heap` and `conversion` sections of `config`.
    ///
    /// The `registry` section is not applied here. The caller registry is
    /// process-wide, so hosts configure it once with
    /// `JsCallbackCallerRegistry::get().configure(&config.registry)`.
    pub fn new(config: &RuntimeConfig, callback: Callback) -> Result<Self, JErrorType> {
        let isolate = Isolate::new(config.heap.clone());
        let context_holder = Rc::new(ContextHolder::new(&isolate));
        let bv_factory = Arc::new(BinaryValueFactory::new(&config.conversion));
        let callback_maker = JsCallbackMaker::new(context_holder.clone(), &bv_factory, callback)?;
        log::debug!(
            "Created session for context {} with callback caller {}",
            context_holder.get().id(),
            callback_maker.callback_caller_id()
        );
        Ok(JsSession {
            callback_maker,
            bv_factory,
            context_holder,
            isolate,
        })
    }

    /// Mint a managed function that reports `callback_id` to the host callback.
    pub fn make_js_callback(&self, callback_id: u64) -> Result<BinaryValue, JErrorType> {
        self.callback_maker
            .make_js_callback(&self.isolate, callback_id)
    }

    pub fn set_global(&self, name: &str, value: &BinaryValue) -> Result<(), JErrorType> {
        let context = self.context();
        let value = self.bv_factory.to_js_value(context, value)?;
        if context.set_global(name, value) {
            Ok(())
        } else {
            Err(JErrorType::TypeError(format!(
                "Cannot define global {}",
                name
            )))
        }
    }

    pub fn get_global(&self, name: &str) -> Result<BinaryValue, JErrorType> {
        let context = self.context();
        self.bv_factory.new_value(context, &context.get_global(name))
    }

    /// Call a function handle with host arguments and convert its result.
    pub fn call_function(
        &self,
        function: &BinaryValue,
        args: Vec<BinaryValue>,
    ) -> Result<BinaryValue, JErrorType> {
        let context = self.context();
        let function = self.bv_factory.to_js_value(context, function)?;
        let args = args
            .iter()
            .map(|a| self.bv_factory.to_js_value(context, a))
            .collect::<Result<Vec<JsValue>, JErrorType>>()?;
        let result = context.call_function(&function, JsValue::Undefined, args)?;
        self.bv_factory.new_value(context, &result)
    }

    pub fn free_value(&self, value: &BinaryValue) {
        self.bv_factory.free_value(self.context(), value);
    }

    pub fn caller_id(&self) -> u64 {
        self.callback_maker.callback_caller_id()
    }

    pub fn context(&self) -> &JsContext {
        self.context_holder.get()
    }

    pub fn isolate(&self) -> &Isolate {
        &self.isolate
    }
}

impl Drop for JsSession {
    fn drop(&mut self) {
        log::debug!(
            "Tearing down session for context {} (callback caller {})",
            self.context().id(),
            self.caller_id()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::heap::HeapConfig;
    use crate::runner::callback::registry::{JsCallbackCallerRegistry, DEFAULT_MAX_CALLERS};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn noop() -> Callback {
        Arc::new(|_, _| {})
    }

    #[test]
    fn test_globals_round_trip() {
        let session = JsSession::new(&RuntimeConfig::default(), noop()).unwrap();
        let value = BinaryValue::Array(vec![BinaryValue::Bool(true), BinaryValue::Double(0.5)]);
        session.set_global("settings", &value).unwrap();
        assert_eq!(session.get_global("settings").unwrap(), value);
        assert_eq!(session.get_global("missing").unwrap(), BinaryValue::Undefined);
    }

    #[test]
    fn test_callback_stored_as_global_stays_callable() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let session = JsSession::new(
            &RuntimeConfig::default(),
            Arc::new(move |id, args| sink.lock().unwrap().push((id, args))),
        )
        .unwrap();

        let callback = session.make_js_callback(5).unwrap();
        session.set_global("notify", &callback).unwrap();
        session.free_value(&callback);
        assert_eq!(session.context().persistent_count(), 0);

        let notify = session.get_global("notify").unwrap();
        assert_eq!(notify.type_name(), "function");
        let result = session
            .call_function(&notify, vec![BinaryValue::String("ready".to_string())])
            .unwrap();

        assert_eq!(result, BinaryValue::Undefined);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![(5, BinaryValue::Array(vec![BinaryValue::String("ready".to_string())]))]
        );
    }

    #[test]
    fn test_calling_a_non_function_is_type_error() {
        let session = JsSession::new(&RuntimeConfig::default(), noop()).unwrap();
        assert!(matches!(
            session.call_function(&BinaryValue::Integer(1), vec![]),
            Err(JErrorType::TypeError(_))
        ));
    }

    #[test]
    fn test_heap_limit_applies_to_minted_callbacks() {
        let config = RuntimeConfig {
            heap: HeapConfig::with_limit(100),
            ..RuntimeConfig::default()
        };
        let session = JsSession::new(&config, noop()).unwrap();
        assert_eq!(
            session.make_js_callback(1),
            Err(JErrorType::RangeError("Out of memory".to_string()))
        );
        assert_eq!(session.isolate().heap_allocated(), 0);
    }

    #[test]
    fn test_new_leaves_global_registry_config_alone() {
        let config = RuntimeConfig::parse("[registry]\nmax_callers = 8\n").unwrap();
        let _session = JsSession::new(&config, noop()).unwrap();
        assert_eq!(
            JsCallbackCallerRegistry::get().max_callers(),
            Some(DEFAULT_MAX_CALLERS)
        );
    }

    #[test]
    fn test_drop_unregisters_caller() {
        let session = JsSession::new(&RuntimeConfig::default(), noop()).unwrap();
        let caller_id = session.caller_id();
        assert!(JsCallbackCallerRegistry::get().get_caller(caller_id).is_some());
        drop(session);
        assert!(JsCallbackCallerRegistry::get().get_caller(caller_id).is_none());
    }
}
