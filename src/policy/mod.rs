pub mod hot_reload;
pub mod loader;

pub use hot_reload::PolicyWatcher;
pub use loader::{load_policy, validate_policy, PolicyError, PolicyLoader};
