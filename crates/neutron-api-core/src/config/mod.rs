//! Hook state loading

mod loader;

pub use loader::{HookState, STATE_ENV_VAR};
