//! Shared data model for the recon record store.

pub mod provenance;
pub mod record;

pub use provenance::{Provenance, DEFAULT_LABEL};
pub use record::{ArrayCodecError, Record, StringList};

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }
}
