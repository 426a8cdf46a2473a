//! Per-run synthetic identifier minting.
//!
//! Probe functions and temporary variables live in one translation unit, so
//! their names must not collide. A generator is created for every
//! verification run and threaded through everything that writes code.

/// Prefix of every synthetic identifier.
pub const ID_PREFIX: &str = "____fragcheck____";

/// Monotonic sequence of unique identifiers for one run.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next identifier.
    pub fn next_id(&mut self) -> String {
        self.next += 1;
        format!("{}{}", ID_PREFIX, self.next)
    }

    /// Number of identifiers minted so far.
    pub fn issued(&self) -> u32 {
        self.next
    }
}
