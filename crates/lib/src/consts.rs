//! Names and defaults shared across the crate.

/// Directory name used under the XDG config and data roots.
pub const APP_NAME: &str = "envlens";

/// Hidden directory the environment tool keeps its state in.
pub const ENV_DIR_NAME: &str = ".flox";

/// Declarative manifest file name.
pub const MANIFEST_FILENAME: &str = "manifest.toml";

/// Lock file name.
pub const LOCK_FILENAME: &str = "manifest.lock";

/// Default external CLI binary.
pub const DEFAULT_CLI_BINARY: &str = "flox";

/// Default quiet period before a burst of file events triggers a reload.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default upper bound on already-open sessions patched per activation.
pub const DEFAULT_MAX_PATCHED_SESSIONS: usize = 10;

/// Overrides the data directory.
pub const DATA_DIR_ENV: &str = "ENVLENS_DATA_DIR";

/// Overrides the external CLI binary.
pub const CLI_BINARY_ENV: &str = "ENVLENS_CLI";

/// Overrides the debounce delay in milliseconds.
pub const DEBOUNCE_ENV: &str = "ENVLENS_DEBOUNCE_MS";

/// Overrides the patched session bound.
pub const MAX_SESSIONS_ENV: &str = "ENVLENS_MAX_SESSIONS";

/// Settings file name under the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Persisted applier state under the data directory.
pub const STATE_FILENAME: &str = "state.json";

/// Persisted variable collection under the data directory.
pub const COLLECTION_FILENAME: &str = "collection.json";

/// Directory of session patch files under the data directory.
pub const SESSIONS_DIR_NAME: &str = "sessions";
