//! Process-environment fixture for config tests.

use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Holds the env lock for one test and restores every variable it touched
/// when dropped.
pub(super) struct ScopedEnv {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    /// A `None` value clears the variable for the lifetime of the guard.
    pub(super) fn new(vars: &[(&'static str, Option<&str>)]) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let saved = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var(key).ok();
                write_var(key, *value);
                (*key, previous)
            })
            .collect();
        Self { saved, _lock: lock }
    }
}

fn write_var(key: &str, value: Option<&str>) {
    // SAFETY: ENV_LOCK serializes every env mutation made by tests.
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            write_var(key, previous.as_deref());
        }
    }
}
