//! Base plugin trait definition.
//!
//! Extractors and OCR engines implement `Plugin`, which provides identity and
//! lifecycle hooks.

use crate::Result;

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    /// Called once when the plugin is registered.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        ""
    }
}
