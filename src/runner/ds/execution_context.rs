//! Isolates and execution contexts.
//!
//! An [`Isolate`] is one instance of the engine: it owns the heap accounting and
//! the stack of contexts that are currently entered. A [`JsContext`] is one
//! global scope inside an isolate. Both are cheap reference-counted handles and
//! are confined to the thread that created them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;
use std::thread;

use num_bigint::BigInt;
use uuid::Uuid;

use crate::runner::ds::array_object::ArrayObject;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{FunctionCallback, FunctionCallbackInfo, NativeFunctionObject};
use crate::runner::ds::heap::{Heap, HeapAllocation, HeapConfig, JsHeapType};
use crate::runner::ds::object::{new_object_type, JsObjectType, ObjectType, OrdinaryObject};
use crate::runner::ds::value::JsValue;

const OBJECT_BYTES: usize = 64;
const FUNCTION_BYTES: usize = 96;
const VALUE_BYTES: usize = mem::size_of::<JsValue>();

pub struct ExecutionContextStack {
    stack: Vec<JsContext>,
}

impl ExecutionContextStack {
    pub fn new() -> Self {
        ExecutionContextStack { stack: Vec::new() }
    }

    pub fn get_running_execution_ctx(&self) -> Option<&JsContext> {
        self.stack.last()
    }

    pub fn pop_running_execution_ctx(&mut self) -> Option<JsContext> {
        self.stack.pop()
    }

    pub fn push_execution_ctx(&mut self, ctx: JsContext) {
        self.stack.push(ctx)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for ExecutionContextStack {
    fn default() -> Self {
        Self::new()
    }
}

struct IsolateInner {
    id: Uuid,
    heap: JsHeapType,
    ctx_stack: RefCell<ExecutionContextStack>,
}

#[derive(Clone)]
pub struct Isolate {
    inner: Rc<IsolateInner>,
}

impl Isolate {
    pub fn new(config: HeapConfig) -> Self {
        Isolate {
            inner: Rc::new(IsolateInner {
                id: Uuid::new_v4(),
                heap: Rc::new(RefCell::new(Heap::new(config))),
                ctx_stack: RefCell::new(ExecutionContextStack::new()),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn ptr_eq(&self, other: &Isolate) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn new_context(&self) -> JsContext {
        JsContext::new(self)
    }

    /// The innermost entered context, if any.
    pub fn get_current_context(&self) -> Option<JsContext> {
        self.inner
            .ctx_stack
            .borrow()
            .get_running_execution_ctx()
            .cloned()
    }

    pub fn entered_depth(&self) -> usize {
        self.inner.ctx_stack.borrow().depth()
    }

    pub fn heap_allocated(&self) -> usize {
        self.inner.heap.borrow().get_allocated()
    }

    pub fn live_allocations(&self) -> usize {
        self.inner.heap.borrow().live_allocations()
    }

    fn charge(&self, bytes: usize) -> Result<HeapAllocation, JErrorType> {
        HeapAllocation::charge(&self.inner.heap, bytes)
    }
}

impl Default for Isolate {
    fn default() -> Self {
        Self::new(HeapConfig::default())
    }
}

/// Keeps a context entered on its isolate until dropped.
///
/// Scopes must be dropped in reverse order of entry.
pub struct ContextScope {
    isolate: Isolate,
    context: JsContext,
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        let popped = self
            .isolate
            .inner
            .ctx_stack
            .borrow_mut()
            .pop_running_execution_ctx();
        if !thread::panicking() {
            debug_assert!(
                popped.map_or(false, |ctx| ctx.ptr_eq(&self.context)),
                "context scope for {} dropped out of order",
                self.context.id()
            );
        }
    }
}

struct PersistentTable {
    next_id: u64,
    values: HashMap<u64, JsValue>,
}

struct ContextInner {
    id: Uuid,
    isolate: Isolate,
    global: JsObjectType,
    persistent: RefCell<PersistentTable>,
}

#[derive(Clone)]
pub struct JsContext {
    inner: Rc<ContextInner>,
}

impl JsContext {
    fn new(isolate: &Isolate) -> Self {
        let global = new_object_type(ObjectType::Ordinary(OrdinaryObject::new(
            HeapAllocation::untracked(),
        )));
        JsContext {
            inner: Rc::new(ContextInner {
                id: Uuid::new_v4(),
                isolate: isolate.clone(),
                global,
                persistent: RefCell::new(PersistentTable {
                    next_id: 1,
                    values: HashMap::new(),
                }),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn isolate(&self) -> &Isolate {
        &self.inner.isolate
    }

    pub fn ptr_eq(&self, other: &JsContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Make this the isolate's current context until the returned scope is dropped.
    pub fn enter(&self) -> ContextScope {
        let isolate = self.isolate().clone();
        isolate
            .inner
            .ctx_stack
            .borrow_mut()
            .push_execution_ctx(self.clone());
        ContextScope {
            isolate,
            context: self.clone(),
        }
    }

    pub fn new_object(&self) -> Result<JsValue, JErrorType> {
        let allocation = self.isolate().charge(OBJECT_BYTES)?;
        Ok(JsValue::Object(new_object_type(ObjectType::Ordinary(
            OrdinaryObject::new(allocation),
        ))))
    }

    pub fn new_array(&self, values: Vec<JsValue>) -> Result<JsValue, JErrorType> {
        let allocation = self
            .isolate()
            .charge(OBJECT_BYTES + values.len() * VALUE_BYTES)?;
        Ok(JsValue::Object(new_object_type(ObjectType::Array(
            ArrayObject::from_values(values, allocation),
        ))))
    }

    /// Build an array of `length` elements, asking `next` for each one in order.
    pub fn new_array_from_fn<F>(&self, length: usize, mut next: F) -> Result<JsValue, JErrorType>
    where
        F: FnMut(usize) -> JsValue,
    {
        let values = (0..length).map(|idx| next(idx)).collect();
        self.new_array(values)
    }

    pub fn new_function(
        &self,
        name: &str,
        callback: FunctionCallback,
        data: JsValue,
    ) -> Result<JsValue, JErrorType> {
        let allocation = self.isolate().charge(FUNCTION_BYTES)?;
        Ok(JsValue::Object(new_object_type(ObjectType::Function(
            NativeFunctionObject::new(name, callback, data, allocation),
        ))))
    }

    pub fn new_bigint_from_unsigned(&self, value: u64) -> JsValue {
        JsValue::BigInt(BigInt::from(value))
    }

    pub fn set_global(&self, name: &str, value: JsValue) -> bool {
        self.inner
            .global
            .borrow_mut()
            .as_js_object_mut()
            .set(name, value)
    }

    pub fn get_global(&self, name: &str) -> JsValue {
        self.inner.global.borrow().as_js_object().get(name)
    }

    /// Call `function` with `this` and `args` inside this context.
    ///
    /// No borrow of the function object is held while its entry point runs, so
    /// the entry point is free to touch the function again.
    pub fn call_function(
        &self,
        function: &JsValue,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        let target = match function {
            JsValue::Object(o) => o.borrow().as_function().map(|f| f.call_target()),
            _ => None,
        };
        let (callback, data) = target.ok_or_else(|| {
            JErrorType::TypeError(format!("{} is not a function", function))
        })?;

        let _scope = self.enter();
        let info = FunctionCallbackInfo::new(self.isolate().clone(), this, args, data);
        callback(&info)
    }

    /// Pin `value` so the host can refer to it by id.
    pub fn persist(&self, value: JsValue) -> u64 {
        let mut table = self.inner.persistent.borrow_mut();
        let id = table.next_id;
        table.next_id += 1;
        table.values.insert(id, value);
        id
    }

    pub fn get_persistent(&self, id: u64) -> Option<JsValue> {
        self.inner.persistent.borrow().values.get(&id).cloned()
    }

    pub fn release_persistent(&self, id: u64) -> bool {
        self.inner.persistent.borrow_mut().values.remove(&id).is_some()
    }

    pub fn persistent_count(&self) -> usize {
        self.inner.persistent.borrow().values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::value::JsNumberType;

    fn echo_args(info: &FunctionCallbackInfo) -> Result<JsValue, JErrorType> {
        let context = info
            .get_isolate()
            .get_current_context()
            .ok_or_else(|| JErrorType::ReferenceError("no current context".to_string()))?;
        context.new_array(info.args().to_vec())
    }

    fn read_data(info: &FunctionCallbackInfo) -> Result<JsValue, JErrorType> {
        Ok(info.data().clone())
    }

    fn read_this(info: &FunctionCallbackInfo) -> Result<JsValue, JErrorType> {
        Ok(info.this().clone())
    }

    #[test]
    fn test_enter_and_leave_context() {
        let isolate = Isolate::default();
        let context = isolate.new_context();
        assert!(isolate.get_current_context().is_none());
        {
            let _scope = context.enter();
            let current = isolate.get_current_context().unwrap();
            assert!(current.ptr_eq(&context));
            {
                let other = isolate.new_context();
                let _inner = other.enter();
                assert!(isolate.get_current_context().unwrap().ptr_eq(&other));
                assert_eq!(isolate.entered_depth(), 2);
            }
            assert!(isolate.get_current_context().unwrap().ptr_eq(&context));
        }
        assert!(isolate.get_current_context().is_none());
    }

    #[test]
    fn test_call_native_function_sees_args_and_data() {
        let isolate = Isolate::default();
        let context = isolate.new_context();
        let echo = context.new_function("echo", echo_args, JsValue::Undefined).unwrap();
        let result = context
            .call_function(
                &echo,
                JsValue::Undefined,
                vec![JsValue::Null, JsValue::Boolean(true)],
            )
            .unwrap();
        let borrowed = result.as_object().unwrap().borrow();
        let array = borrowed.as_array().unwrap();
        assert_eq!(array.elements(), &[JsValue::Null, JsValue::Boolean(true)]);

        let data = JsValue::String("payload".to_string());
        let f = context.new_function("", read_data, data.clone()).unwrap();
        assert_eq!(context.call_function(&f, JsValue::Undefined, vec![]), Ok(data));
        assert!(isolate.get_current_context().is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "dropped out of order")]
    fn test_out_of_order_scope_drop_is_caught() {
        let isolate = Isolate::default();
        let outer = isolate.new_context().enter();
        let _inner = isolate.new_context().enter();
        drop(outer);
    }

    #[test]
    fn test_call_passes_this() {
        let context = Isolate::default().new_context();
        let f = context.new_function("self", read_this, JsValue::Undefined).unwrap();
        let this = JsValue::String("receiver".to_string());
        assert_eq!(context.call_function(&f, this.clone(), vec![]), Ok(this));
    }

    #[test]
    fn test_calling_non_function_is_type_error() {
        let context = Isolate::default().new_context();
        let result = context.call_function(
            &JsValue::Number(JsNumberType::Integer(1)),
            JsValue::Undefined,
            vec![],
        );
        assert_eq!(
            result,
            Err(JErrorType::TypeError("1 is not a function".to_string()))
        );
    }

    #[test]
    fn test_heap_limit_applies_to_allocations() {
        let isolate = Isolate::new(HeapConfig::with_limit(OBJECT_BYTES));
        let context = isolate.new_context();
        let obj = context.new_object().unwrap();
        assert!(context.new_object().is_err());
        drop(obj);
        assert_eq!(isolate.heap_allocated(), 0);
        assert!(context.new_object().is_ok());
    }

    #[test]
    fn test_persistent_handles() {
        let context = Isolate::default().new_context();
        let id = context.persist(JsValue::Boolean(true));
        assert_eq!(context.get_persistent(id), Some(JsValue::Boolean(true)));
        assert_eq!(context.persistent_count(), 1);
        assert!(context.release_persistent(id));
        assert!(!context.release_persistent(id));
        assert_eq!(context.get_persistent(id), None);
    }

    #[test]
    fn test_globals() {
        let context = Isolate::default().new_context();
        assert!(context.set_global("x", JsValue::Null));
        assert_eq!(context.get_global("x"), JsValue::Null);
        assert_eq!(context.get_global("y"), JsValue::Undefined);
    }
}
