//! # botrelay_core
//!
//! Core domain logic for the bot relay gateway: the bot registry, the
//! completion provider seam, fallback reply selection and the request
//! handling state machine.

pub mod bots;
pub mod config;
pub mod gateway;
pub mod picker;
pub mod provider;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
