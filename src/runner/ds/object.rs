use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::array_object::ArrayObject;
use crate::runner::ds::function_object::NativeFunctionObject;
use crate::runner::ds::heap::HeapAllocation;
use crate::runner::ds::value::JsValue;

pub type JsObjectType = Rc<RefCell<ObjectType>>;

pub enum ObjectType {
    Ordinary(OrdinaryObject),
    Function(NativeFunctionObject),
    Array(ArrayObject),
}

impl ObjectType {
    pub fn is_callable(&self) -> bool {
        matches!(self, ObjectType::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ObjectType::Array(_))
    }

    pub fn as_js_object(&self) -> &dyn JsObject {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(o) => o,
            ObjectType::Array(o) => o,
        }
    }

    pub fn as_js_object_mut(&mut self) -> &mut dyn JsObject {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(o) => o,
            ObjectType::Array(o) => o,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayObject> {
        match self {
            ObjectType::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&NativeFunctionObject> {
        match self {
            ObjectType::Function(f) => Some(f),
            _ => None,
        }
    }
}

pub fn new_object_type(obj: ObjectType) -> JsObjectType {
    Rc::new(RefCell::new(obj))
}

/// State shared by every kind of object: named properties and the heap charge
/// that keeps the isolate's accounting honest.
pub struct ObjectBase {
    properties: HashMap<String, JsValue>,
    is_extensible: bool,
    _allocation: HeapAllocation,
}

impl ObjectBase {
    pub fn new(allocation: HeapAllocation) -> Self {
        ObjectBase {
            properties: HashMap::new(),
            is_extensible: true,
            _allocation: allocation,
        }
    }
}

pub trait JsObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase;

    fn get_object_base(&self) -> &ObjectBase;

    fn class_name(&self) -> &'static str;

    fn is_extensible(&self) -> bool {
        self.get_object_base().is_extensible
    }

    fn prevent_extensions(&mut self) -> bool {
        self.get_object_base_mut().is_extensible = false;
        true
    }

    fn has_own_property(&self, key: &str) -> bool {
        self.get_object_base().properties.contains_key(key)
    }

    fn get(&self, key: &str) -> JsValue {
        self.get_object_base()
            .properties
            .get(key)
            .cloned()
            .unwrap_or(JsValue::Undefined)
    }

    /// Returns false when a new property would be added to a non-extensible object.
    fn set(&mut self, key: &str, value: JsValue) -> bool {
        if !self.is_extensible() && !self.has_own_property(key) {
            return false;
        }
        self.get_object_base_mut()
            .properties
            .insert(key.to_string(), value);
        true
    }

    fn delete(&mut self, key: &str) -> bool {
        self.get_object_base_mut().properties.remove(key).is_some()
    }

    fn own_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.get_object_base().properties.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn to_string(&self) -> String {
        format!("[object {}]", self.class_name())
    }
}

pub struct OrdinaryObject {
    base: ObjectBase,
}

impl OrdinaryObject {
    pub fn new(allocation: HeapAllocation) -> Self {
        OrdinaryObject {
            base: ObjectBase::new(allocation),
        }
    }
}

impl JsObject for OrdinaryObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn class_name(&self) -> &'static str {
        "Object"
    }
}
