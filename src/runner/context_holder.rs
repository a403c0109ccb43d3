use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::{Isolate, JsContext};

/// Owns the single context a session runs its code in.
pub struct ContextHolder {
    context: JsContext,
}

impl ContextHolder {
    pub fn new(isolate: &Isolate) -> Self {
        ContextHolder {
            context: isolate.new_context(),
        }
    }

    pub fn get(&self) -> &JsContext {
        &self.context
    }

    /// The held context, provided it lives in `isolate`.
    pub fn resolve(&self, isolate: &Isolate) -> Result<JsContext, JErrorType> {
        if self.context.isolate().ptr_eq(isolate) {
            Ok(self.context.clone())
        } else {
            Err(JErrorType::TypeError(format!(
                "context {} does not belong to isolate {}",
                self.context.id(),
                isolate.id()
            )))
        }
    }
}
