//! Property-based tests for the ACL set algebra.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::model::{Ace, AuthzId};

    /// Strategy to generate small lists of hex-ish authz ids, with
    /// repeats likely so dedup paths are exercised.
    fn id_list_strategy() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec("[0-9a-f]{1,8}", 0..12)
    }

    fn ids(raw: &[String]) -> Vec<AuthzId> {
        raw.iter().map(|s| AuthzId::new(s.clone()).unwrap()).collect()
    }

    proptest! {
        #[test]
        fn test_ace_equality_ignores_order(
            actors in id_list_strategy(),
            groups in id_list_strategy(),
            seed in any::<u64>()
        ) {
            let forward = Ace::new(ids(&actors), ids(&groups));
            // Deterministic permutation derived from the seed
            let mut shuffled = actors.clone();
            if !shuffled.is_empty() {
                let pivot = (seed as usize) % shuffled.len();
                shuffled.rotate_left(pivot);
            }
            let rotated = Ace::new(ids(&shuffled), ids(&groups));
            prop_assert_eq!(forward, rotated);
        }

        #[test]
        fn test_ace_has_no_duplicates(
            actors in id_list_strategy(),
            groups in id_list_strategy()
        ) {
            let ace = Ace::new(ids(&actors), ids(&groups));
            let mut seen = std::collections::HashSet::new();
            for id in ace.actors() {
                prop_assert!(seen.insert(id.clone()), "duplicate actor {}", id);
            }
            seen.clear();
            for id in ace.groups() {
                prop_assert!(seen.insert(id.clone()), "duplicate group {}", id);
            }
        }

        #[test]
        fn test_ace_merge_is_commutative(
            a_actors in id_list_strategy(),
            a_groups in id_list_strategy(),
            b_actors in id_list_strategy(),
            b_groups in id_list_strategy()
        ) {
            let a = Ace::new(ids(&a_actors), ids(&a_groups));
            let b = Ace::new(ids(&b_actors), ids(&b_groups));
            prop_assert_eq!(a.merge(&b), b.merge(&a));
        }

        #[test]
        fn test_ace_merge_is_idempotent(
            actors in id_list_strategy(),
            groups in id_list_strategy()
        ) {
            let ace = Ace::new(ids(&actors), ids(&groups));
            prop_assert_eq!(ace.merge(&ace), ace.clone());
        }

        #[test]
        fn test_ace_merge_contains_both_operands(
            a_actors in id_list_strategy(),
            b_actors in id_list_strategy()
        ) {
            let a = Ace::new(ids(&a_actors), []);
            let b = Ace::new(ids(&b_actors), []);
            let merged = a.merge(&b);
            for id in a.actors().iter().chain(b.actors()) {
                prop_assert!(merged.contains_actor(id));
            }
        }
    }
}
