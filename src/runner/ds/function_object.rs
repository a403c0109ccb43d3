use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::Isolate;
use crate::runner::ds::heap::HeapAllocation;
use crate::runner::ds::object::{JsObject, ObjectBase};
use crate::runner::ds::value::JsValue;

/// Entry point of a native-backed function.
///
/// This is a plain function pointer rather than a closure: anything the entry
/// point needs to know about its caller must travel in the function's `data`.
pub type FunctionCallback = fn(&FunctionCallbackInfo) -> Result<JsValue, JErrorType>;

/// Everything a native entry point sees of the call that reached it.
pub struct FunctionCallbackInfo {
    isolate: Isolate,
    this: JsValue,
    args: Vec<JsValue>,
    data: JsValue,
}

impl FunctionCallbackInfo {
    pub fn new(isolate: Isolate, this: JsValue, args: Vec<JsValue>, data: JsValue) -> Self {
        FunctionCallbackInfo {
            isolate,
            this,
            args,
            data,
        }
    }

    pub fn get_isolate(&self) -> &Isolate {
        &self.isolate
    }

    pub fn this(&self) -> &JsValue {
        &self.this
    }

    /// The value attached to the function when it was created.
    pub fn data(&self) -> &JsValue {
        &self.data
    }

    pub fn length(&self) -> usize {
        self.args.len()
    }

    /// Argument `idx`, or `undefined` when fewer arguments were passed.
    pub fn get(&self, idx: usize) -> JsValue {
        self.args.get(idx).cloned().unwrap_or(JsValue::Undefined)
    }

    pub fn args(&self) -> &[JsValue] {
        &self.args
    }
}

pub struct NativeFunctionObject {
    name: String,
    callback: FunctionCallback,
    data: JsValue,
    base: ObjectBase,
}

impl NativeFunctionObject {
    pub fn new(
        name: impl Into<String>,
        callback: FunctionCallback,
        data: JsValue,
        allocation: HeapAllocation,
    ) -> Self {
        NativeFunctionObject {
            name: name.into(),
            callback,
            data,
            base: ObjectBase::new(allocation),
        }
    }

    /// The entry point and a copy of the attached data, so a caller can drop
    /// its borrow of the object before running host code.
    pub fn call_target(&self) -> (FunctionCallback, JsValue) {
        (self.callback, self.data.clone())
    }
}

impl JsObject for NativeFunctionObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn class_name(&self) -> &'static str {
        "Function"
    }

    fn to_string(&self) -> String {
        format!("function {}() {{ [native code] }}", self.name)
    }
}
