use std::sync::LazyLock;

use cred2clp_session::Engine;

/// The engine shared by every export. Built on first use; the description
/// source is read from the environment at that point.
static ENGINE: LazyLock<Engine> = LazyLock::new(Engine::from_env);

pub(crate) fn engine() -> &'static Engine {
    &ENGINE
}

/// Serialises tests that touch the shared engine's sessions or last error.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
