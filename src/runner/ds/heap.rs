//! Heap accounting for an isolate.
//!
//! Objects are reference counted, so the heap does not own them. It keeps a
//! running total of the bytes charged by live objects and enforces an optional
//! limit. Every object holds a [`HeapAllocation`] which hands its bytes back
//! when the object is finally dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Deserialize;

use crate::runner::ds::error::JErrorType;

pub type JsHeapType = Rc<RefCell<Heap>>;

/// Configuration for the heap manager.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Maximum heap size in bytes. None means unlimited.
    pub max_bytes: Option<usize>,
}

impl HeapConfig {
    pub fn unlimited() -> Self {
        HeapConfig { max_bytes: None }
    }

    pub fn with_limit(max_bytes: usize) -> Self {
        HeapConfig {
            max_bytes: Some(max_bytes),
        }
    }
}

#[derive(Debug)]
pub struct Heap {
    config: HeapConfig,
    allocated_bytes: usize,
    live_allocations: usize,
}

impl Heap {
    pub fn new(config: HeapConfig) -> Self {
        Heap {
            config,
            allocated_bytes: 0,
            live_allocations: 0,
        }
    }

    /// Charge `bytes` to the heap.
    ///
    /// Returns an error if the allocation would exceed the memory limit.
    pub fn allocate(&mut self, bytes: usize) -> Result<(), JErrorType> {
        if !self.can_allocate(bytes) {
            return Err(JErrorType::RangeError("Out of memory".to_string()));
        }
        self.allocated_bytes += bytes;
        self.live_allocations += 1;
        Ok(())
    }

    pub fn deallocate(&mut self, bytes: usize) {
        self.allocated_bytes = self.allocated_bytes.saturating_sub(bytes);
        self.live_allocations = self.live_allocations.saturating_sub(1);
    }

    pub fn get_allocated(&self) -> usize {
        self.allocated_bytes
    }

    pub fn live_allocations(&self) -> usize {
        self.live_allocations
    }

    pub fn can_allocate(&self, bytes: usize) -> bool {
        match self.config.max_bytes {
            Some(max_bytes) => self.allocated_bytes + bytes <= max_bytes,
            None => true,
        }
    }

    pub fn available_bytes(&self) -> Option<usize> {
        self.config
            .max_bytes
            .map(|max| max.saturating_sub(self.allocated_bytes))
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(HeapConfig::default())
    }
}

/// Bytes charged to a heap on behalf of one object.
pub struct HeapAllocation {
    heap: Weak<RefCell<Heap>>,
    bytes: usize,
}

impl HeapAllocation {
    pub fn charge(heap: &JsHeapType, bytes: usize) -> Result<Self, JErrorType> {
        heap.borrow_mut().allocate(bytes)?;
        Ok(HeapAllocation {
            heap: Rc::downgrade(heap),
            bytes,
        })
    }

    /// An allocation that is not tracked by any heap (e.g. a context's global object).
    pub fn untracked() -> Self {
        HeapAllocation {
            heap: Weak::new(),
            bytes: 0,
        }
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for HeapAllocation {
    fn drop(&mut self) {
        if let Some(heap) = self.heap.upgrade() {
            if let Ok(mut heap) = heap.try_borrow_mut() {
                heap.deallocate(self.bytes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_heap(config: HeapConfig) -> JsHeapType {
        Rc::new(RefCell::new(Heap::new(config)))
    }

    #[test]
    fn test_heap_unlimited() {
        let mut heap = Heap::new(HeapConfig::unlimited());
        assert!(heap.allocate(1000).is_ok());
        assert!(heap.allocate(1000000).is_ok());
        assert_eq!(heap.get_allocated(), 1001000);
        assert_eq!(heap.available_bytes(), None);
    }

    #[test]
    fn test_heap_limited() {
        let mut heap = Heap::new(HeapConfig::with_limit(1000));
        assert!(heap.allocate(500).is_ok());
        assert!(heap.allocate(400).is_ok());
        assert_eq!(heap.available_bytes(), Some(100));

        let result = heap.allocate(200);
        assert_eq!(
            result,
            Err(JErrorType::RangeError("Out of memory".to_string()))
        );
        assert_eq!(heap.get_allocated(), 900);
        assert_eq!(heap.live_allocations(), 2);
    }

    #[test]
    fn test_allocation_is_returned_on_drop() {
        let heap = new_heap(HeapConfig::with_limit(100));
        let first = HeapAllocation::charge(&heap, 60).unwrap();
        assert!(HeapAllocation::charge(&heap, 60).is_err());

        drop(first);
        assert_eq!(heap.borrow().get_allocated(), 0);
        assert_eq!(heap.borrow().live_allocations(), 0);
        assert!(HeapAllocation::charge(&heap, 60).is_ok());
    }

    #[test]
    fn test_allocation_outliving_heap() {
        let heap = new_heap(HeapConfig::unlimited());
        let allocation = HeapAllocation::charge(&heap, 10).unwrap();
        drop(heap);
        assert_eq!(allocation.bytes(), 10);
        drop(allocation);
    }
}
