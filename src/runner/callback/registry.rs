//! Process-wide registry of callback callers.
//!
//! Managed functions never hold a pointer to native state. They carry a caller
//! id, and every call resolves that id here. Tearing a caller down is just a
//! removal from the map, after which late calls find nothing and do nothing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use crate::runner::binary_value::BinaryValueFactory;
use crate::runner::callback::caller::{Callback, JsCallbackCaller};
use crate::runner::ds::error::JErrorType;

pub const DEFAULT_MAX_CALLERS: usize = 65_536;

const MIN_SHRINK_CAPACITY: usize = 64;

lazy_static! {
    static ref REGISTRY: JsCallbackCallerRegistry =
        JsCallbackCallerRegistry::new(&RegistryConfig::default());
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Upper bound on simultaneously registered callers. None means unbounded.
    pub max_callers: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            max_callers: Some(DEFAULT_MAX_CALLERS),
        }
    }
}

struct RegistryState {
    next_id: u64,
    callers: HashMap<u64, Arc<JsCallbackCaller>>,
    max_callers: Option<usize>,
}

pub struct JsCallbackCallerRegistry {
    state: Mutex<RegistryState>,
}

impl JsCallbackCallerRegistry {
    /// The process-wide instance every minted callback resolves against.
    pub fn get() -> &'static JsCallbackCallerRegistry {
        &REGISTRY
    }

    pub fn new(config: &RegistryConfig) -> Self {
        JsCallbackCallerRegistry {
            state: Mutex::new(RegistryState {
                next_id: 1,
                callers: HashMap::new(),
                max_callers: config.max_callers,
            }),
        }
    }

    // The lock only ever guards plain map operations, so a poisoned lock still
    // holds a consistent map.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn configure(&self, config: &RegistryConfig) {
        self.lock().max_callers = config.max_callers;
    }

    pub fn max_callers(&self) -> Option<usize> {
        self.lock().max_callers
    }

    pub fn register(
        &self,
        bv_factory: Arc<BinaryValueFactory>,
        callback: Callback,
    ) -> Result<u64, JErrorType> {
        let caller = Arc::new(JsCallbackCaller::new(bv_factory, callback));
        let mut state = self.lock();
        if let Some(max_callers) = state.max_callers {
            if state.callers.len() >= max_callers {
                log::warn!(
                    "Refusing to register callback caller: limit of {} live callers reached",
                    max_callers
                );
                return Err(JErrorType::RangeError(format!(
                    "Callback caller limit of {} reached",
                    max_callers
                )));
            }
        }
        let callback_caller_id = state.next_id;
        state.next_id = callback_caller_id
            .checked_add(1)
            .ok_or_else(|| JErrorType::RangeError("Callback caller ids exhausted".to_string()))?;
        state.callers.insert(callback_caller_id, caller);
        drop(state);

        log::debug!("Registered callback caller {}", callback_caller_id);
        Ok(callback_caller_id)
    }

    pub fn unregister(&self, callback_caller_id: u64) {
        let removed = {
            let mut state = self.lock();
            let removed = state.callers.remove(&callback_caller_id);
            let capacity = state.callers.capacity();
            if capacity > MIN_SHRINK_CAPACITY && state.callers.len() <= capacity / 4 {
                state.callers.shrink_to_fit();
            }
            removed
        };
        // The caller (and the host closure inside it) is dropped outside the lock.
        if removed.is_some() {
            log::debug!("Unregistered callback caller {}", callback_caller_id);
        }
    }

    pub fn get_caller(&self, callback_caller_id: u64) -> Option<Arc<JsCallbackCaller>> {
        self.lock().callers.get(&callback_caller_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
