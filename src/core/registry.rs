//! Process-wide logger registry
//!
//! Logger names are unique per process. The registry keeps weak references,
//! so it never keeps a logger alive; closing or dropping a logger frees its
//! name.

use super::error::{LoggerError, Result};
use super::logger::{Logger, LoggerInner};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

type Entries = HashMap<String, Weak<LoggerInner>>;

fn entries() -> &'static Mutex<Entries> {
    static REGISTRY: OnceLock<Mutex<Entries>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Live logger, or a reservation still being built
fn is_taken(weak: &Weak<LoggerInner>) -> bool {
    weak.strong_count() > 0 || weak.ptr_eq(&Weak::new())
}

/// Reserve `name` for a logger that is about to be built.
pub(crate) fn reserve(name: &str) -> Result<()> {
    let mut entries = entries().lock();
    if entries.get(name).is_some_and(is_taken) {
        return Err(LoggerError::duplicate(name));
    }
    // A placeholder until `attach` links the live logger.
    entries.insert(name.to_string(), Weak::new());
    Ok(())
}

pub(crate) fn attach(name: &str, inner: &Arc<LoggerInner>) {
    entries().lock().insert(name.to_string(), Arc::downgrade(inner));
}

/// Release `name` if it still belongs to `inner` (or to a pending reservation).
pub(crate) fn release(name: &str, inner: Option<&LoggerInner>) {
    let mut entries = entries().lock();
    let owned = match (entries.get(name), inner) {
        (Some(weak), Some(inner)) => std::ptr::eq(weak.as_ptr(), inner),
        (Some(weak), None) => weak.ptr_eq(&Weak::new()),
        (None, _) => false,
    };
    if owned {
        entries.remove(name);
    }
}

/// Look up a live logger by name
pub fn get(name: &str) -> Option<Logger> {
    entries()
        .lock()
        .get(name)
        .and_then(Weak::upgrade)
        .map(Logger::from_inner)
}

/// Whether `name` is currently taken
pub fn contains(name: &str) -> bool {
    entries().lock().get(name).is_some_and(is_taken)
}

/// Names of all registered loggers, sorted
pub fn names() -> Vec<String> {
    let mut names: Vec<String> = entries()
        .lock()
        .iter()
        .filter(|(_, weak)| is_taken(weak))
        .map(|(name, _)| name.clone())
        .collect();
    names.sort();
    names
}
