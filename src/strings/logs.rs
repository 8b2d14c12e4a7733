//! Startup and shutdown log lines used by `main`.

pub fn config_loaded(path: &str) -> String {
    format!("Loaded configuration from {path}")
}

pub fn logged_in(username: &str) -> String {
    format!("Logged in as @{username}")
}

pub const STORAGE_DISABLED: &str = "Persistent storage not configured, user registration disabled";

pub fn storage_enabled(backend: &str) -> String {
    format!("User registry backend: {backend}")
}

pub fn locales_loaded(count: usize, dir: &str) -> String {
    format!("Loaded {count} locale file(s) from {dir}")
}

pub const DISPATCHER_START: &str = "Starting update dispatcher...";
pub const SHUTDOWN: &str = "Shutting down...";
