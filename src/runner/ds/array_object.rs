use crate::runner::ds::heap::HeapAllocation;
use crate::runner::ds::object::{JsObject, ObjectBase};
use crate::runner::ds::value::JsValue;

/// A dense array. Holes read back as `undefined`.
pub struct ArrayObject {
    base: ObjectBase,
    elements: Vec<JsValue>,
}

impl ArrayObject {
    pub fn new(length: u32, allocation: HeapAllocation) -> Self {
        ArrayObject {
            base: ObjectBase::new(allocation),
            elements: vec![JsValue::Undefined; length as usize],
        }
    }

    pub fn from_values(values: Vec<JsValue>, allocation: HeapAllocation) -> Self {
        ArrayObject {
            base: ObjectBase::new(allocation),
            elements: values,
        }
    }

    /// Saturates at `u32::MAX`.
    pub fn length(&self) -> u32 {
        u32::try_from(self.elements.len()).unwrap_or(u32::MAX)
    }

    /// Element at `idx`, or `None` past the end of the array.
    pub fn get_index(&self, idx: u32) -> Option<JsValue> {
        self.elements.get(idx as usize).cloned()
    }

    pub fn set_index(&mut self, idx: u32, value: JsValue) {
        let idx = idx as usize;
        if idx >= self.elements.len() {
            self.elements.resize(idx + 1, JsValue::Undefined);
        }
        self.elements[idx] = value;
    }

    pub fn push(&mut self, value: JsValue) -> u32 {
        self.elements.push(value);
        self.length()
    }

    pub fn elements(&self) -> &[JsValue] {
        &self.elements
    }
}

impl JsObject for ArrayObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn class_name(&self) -> &'static str {
        "Array"
    }

    fn to_string(&self) -> String {
        self.elements
            .iter()
            .map(|e| match e {
                JsValue::Undefined | JsValue::Null => String::new(),
                JsValue::String(s) => s.to_string(),
                other => other.to_string(),
            })
            .collect::<Vec<String>>()
            .join(",")
    }
}
