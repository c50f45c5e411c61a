//! Order-Key Allocator
//!
//! Computes a `sort_order` for a node landing at a given index among an
//! already sorted sibling list, without renumbering the other siblings.
//! Pure arithmetic: no knowledge of trees, parents or storage.

use crate::domain::{DomainError, DomainResult};

/// Gap left before the head / after the tail
pub const DEFAULT_SPACING: f64 = 1000.0;
/// Offset used when two neighbours are too close to bisect
pub const DEFAULT_COLLISION_OFFSET: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderKeyAllocator {
    spacing: f64,
    collision_offset: f64,
}

impl Default for OrderKeyAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_SPACING, DEFAULT_COLLISION_OFFSET)
    }
}

impl OrderKeyAllocator {
    pub fn new(spacing: f64, collision_offset: f64) -> Self {
        Self { spacing, collision_offset }
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn collision_offset(&self) -> f64 {
        self.collision_offset
    }

    /// Key for a node landing at `target` among `siblings`.
    ///
    /// `siblings` are the current keys in ascending order with the moving
    /// node already excluded. A target past the end means the tail.
    pub fn allocate(&self, siblings: &[f64], target: usize) -> DomainResult<f64> {
        let key = match siblings {
            [] => self.spacing,
            [first, ..] if target == 0 => (finite(*first)? - self.spacing).max(0.0),
            [.., last] if target >= siblings.len() => finite(*last)? + self.spacing,
            _ => {
                let before = finite(siblings[target - 1])?;
                let after = finite(siblings[target])?;
                if after - before > 1.0 {
                    (before + after) / 2.0
                } else {
                    // Collided or too close to bisect
                    before + self.collision_offset
                }
            }
        };
        finite(key)
    }

    /// Key placing a node after every sibling: `max(0, keys...) + spacing`.
    pub fn append(&self, siblings: &[f64]) -> DomainResult<f64> {
        let mut max = 0.0_f64;
        for key in siblings {
            max = max.max(finite(*key)?);
        }
        finite(max + self.spacing)
    }
}

fn finite(key: f64) -> DomainResult<f64> {
    if key.is_finite() {
        Ok(key)
    } else {
        Err(DomainError::InvalidInput(format!("Invalid sort order calculated: {}", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc() -> OrderKeyAllocator {
        OrderKeyAllocator::default()
    }

    #[test]
    fn test_tail_insert() {
        // [A, B, C] with A moved after C: siblings without A are [B, C]
        assert_eq!(alloc().allocate(&[2000.0, 3000.0], 2).unwrap(), 4000.0);
        // Index past the end is still the tail
        assert_eq!(alloc().allocate(&[2000.0, 3000.0], 9).unwrap(), 4000.0);
    }

    #[test]
    fn test_head_insert_clamps_at_zero() {
        assert_eq!(alloc().allocate(&[2500.0, 3000.0], 0).unwrap(), 1500.0);
        assert_eq!(alloc().allocate(&[400.0, 3000.0], 0).unwrap(), 0.0);
    }

    #[test]
    fn test_midpoint_insert() {
        let key = alloc().allocate(&[1000.0, 2000.0, 3000.0], 1).unwrap();
        assert_eq!(key, 1500.0);
        assert!(1000.0 < key && key < 2000.0);
    }

    #[test]
    fn test_collision_fallback() {
        // [A:1000, B:1001, C:2000], C moved between A and B
        assert_eq!(alloc().allocate(&[1000.0, 1001.0], 1).unwrap(), 1500.0);
        // Duplicate keys
        assert_eq!(alloc().allocate(&[700.0, 700.0, 900.0], 1).unwrap(), 1200.0);
    }

    #[test]
    fn test_empty_siblings() {
        assert_eq!(alloc().allocate(&[], 0).unwrap(), DEFAULT_SPACING);
        assert_eq!(alloc().append(&[]).unwrap(), DEFAULT_SPACING);
    }

    #[test]
    fn test_append_uses_max_key() {
        assert_eq!(alloc().append(&[800.0, 300.0, 500.0]).unwrap(), 1800.0);
    }

    #[test]
    fn test_non_finite_input_rejected() {
        assert!(alloc().allocate(&[f64::NAN, 2000.0], 0).is_err());
        assert!(alloc().allocate(&[1000.0, f64::INFINITY], 2).is_err());
        assert!(alloc().allocate(&[1000.0, f64::NAN], 1).is_err());
        assert!(alloc().append(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_overflowing_key_rejected() {
        let err = OrderKeyAllocator::new(f64::MAX, 0.0).allocate(&[f64::MAX], 1).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_custom_spacing() {
        let a = OrderKeyAllocator::new(10.0, 5.0);
        assert_eq!(a.allocate(&[100.0], 1).unwrap(), 110.0);
        assert_eq!(a.allocate(&[100.0, 100.5], 1).unwrap(), 105.0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn sorted_keys() -> impl Strategy<Value = Vec<f64>> {
            prop::collection::vec(0u32..1_000_000, 0..12).prop_map(|mut keys| {
                keys.sort_unstable();
                keys.into_iter().map(f64::from).collect()
            })
        }

        proptest! {
            #[test]
            fn allocated_key_sits_between_neighbours(keys in sorted_keys(), target in 0usize..16) {
                let a = alloc();
                let k = a.allocate(&keys, target).unwrap();
                prop_assert!(k.is_finite() && k >= 0.0);

                if keys.is_empty() {
                    prop_assert_eq!(k, DEFAULT_SPACING);
                } else if target == 0 {
                    prop_assert_eq!(k, (keys[0] - DEFAULT_SPACING).max(0.0));
                    prop_assert!(k <= keys[0]);
                } else if target >= keys.len() {
                    prop_assert_eq!(k, keys[keys.len() - 1] + DEFAULT_SPACING);
                } else {
                    let (before, after) = (keys[target - 1], keys[target]);
                    if after - before > 1.0 {
                        prop_assert!(before < k && k < after);
                    } else {
                        prop_assert_eq!(k, before + DEFAULT_COLLISION_OFFSET);
                    }
                }
            }

            #[test]
            fn allocation_is_deterministic(keys in sorted_keys(), target in 0usize..16) {
                let a = alloc();
                prop_assert_eq!(a.allocate(&keys, target).unwrap(), a.allocate(&keys, target).unwrap());
            }

            #[test]
            fn append_lands_after_every_key(keys in prop::collection::vec(0u32..1_000_000, 0..12)) {
                let keys: Vec<f64> = keys.into_iter().map(f64::from).collect();
                let k = alloc().append(&keys).unwrap();
                prop_assert!(keys.iter().all(|key| *key < k));
                prop_assert!(k >= DEFAULT_SPACING);
            }
        }
    }
}
