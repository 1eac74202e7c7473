//! Developer tooling: frame-rate counter and read-only pit inspector.
//!
//! # Invariants
//! - Tools never mutate world or entity state.

mod fps;
mod inspector;

pub use fps::FpsCounter;
pub use inspector::{EntityInfo, PitInspector, PitSummary};

pub fn crate_info() -> &'static str {
    "ballpit-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
