//! Identifier generation capability
//!
//! Init containers need cluster-unique names; the generator is injected so
//! tests get deterministic identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of unique identifiers. Must be safe for concurrent use.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Uuid;
}

/// Random identifiers; the production implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Monotonic identifiers starting at
/// `00000000-0000-0000-0000-000000000001`, for tests.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> Uuid {
        let next = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_generator_counts_up_from_one() {
        let generator = SequentialIdGenerator::default();
        assert_eq!(
            generator.generate().to_string(),
            "00000000-0000-0000-0000-000000000001",
        );
        assert_eq!(
            generator.generate().to_string(),
            "00000000-0000-0000-0000-000000000002",
        );
    }
}
