//! Environment variable source: DOCFS__ prefix with __ separator

use config::Environment;

/// Environment overlay. `DOCFS__TRANSFER__STORE_ONLY=true` sets
/// `transfer.store_only`.
pub fn source() -> Environment {
    Environment::with_prefix("DOCFS")
        .separator("__")
        .try_parsing(true)
}
