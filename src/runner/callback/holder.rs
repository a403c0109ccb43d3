use std::sync::Arc;

use crate::runner::binary_value::BinaryValueFactory;
use crate::runner::callback::caller::Callback;
use crate::runner::callback::registry::JsCallbackCallerRegistry;
use crate::runner::ds::error::JErrorType;

/// Keeps one caller registered for as long as it lives.
pub struct JsCallbackCallerHolder {
    callback_caller_id: u64,
}

impl JsCallbackCallerHolder {
    pub fn new(bv_factory: Arc<BinaryValueFactory>, callback: Callback) -> Result<Self, JErrorType> {
        let callback_caller_id = JsCallbackCallerRegistry::get().register(bv_factory, callback)?;
        Ok(JsCallbackCallerHolder { callback_caller_id })
    }

    pub fn get(&self) -> u64 {
        self.callback_caller_id
    }
}

impl Drop for JsCallbackCallerHolder {
    fn drop(&mut self) {
        JsCallbackCallerRegistry::get().unregister(self.callback_caller_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holder_registers_until_dropped() {
        let holder =
            JsCallbackCallerHolder::new(Arc::new(BinaryValueFactory::default()), Arc::new(|_, _| {}))
                .unwrap();
        let id = holder.get();
        assert!(JsCallbackCallerRegistry::get().get_caller(id).is_some());

        drop(holder);
        assert!(JsCallbackCallerRegistry::get().get_caller(id).is_none());
    }

    #[test]
    fn test_each_holder_gets_its_own_id() {
        let factory = Arc::new(BinaryValueFactory::default());
        let first = JsCallbackCallerHolder::new(factory.clone(), Arc::new(|_, _| {})).unwrap();
        let second = JsCallbackCallerHolder::new(factory, Arc::new(|_, _| {})).unwrap();
        assert!(second.get() > first.get());
    }
}
