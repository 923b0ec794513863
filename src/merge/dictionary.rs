//! Type dictionary
//!
//! Indexes every internal callable of the closure under its
//! (type, signature) key so the resolver can answer "which callables does
//! type T define for signature S" in one lookup.

use std::collections::{BTreeSet, HashMap};

use crate::report::MergeReport;
use crate::store::CallableRow;
use crate::uri;

use super::intern::{TypeId, TypeInterner};

const NO_TARGETS: &BTreeSet<u64> = &BTreeSet::new();

/// (type, signature) -> callable-id index over the whole closure.
///
/// A callable appears under exactly one key, the one implied by its own
/// URI. Missing entries read as empty sets.
#[derive(Debug, Default)]
pub struct TypeDictionary {
    entries: HashMap<TypeId, HashMap<String, BTreeSet<u64>>>,
}

impl TypeDictionary {
    /// Build from the stored URIs of the closure's callables.
    ///
    /// Callables whose URI fails to parse are dropped and counted; the
    /// build itself never fails.
    pub fn build(
        callables: &[CallableRow],
        interner: &mut TypeInterner,
        report: &mut MergeReport,
    ) -> TypeDictionary {
        let mut dictionary = TypeDictionary::default();
        for row in callables {
            let node = match uri::parse_node(&row.uri) {
                Ok(node) => node,
                Err(error) => {
                    tracing::warn!(
                        callable = row.id,
                        %error,
                        "dropping callable with unparsable URI"
                    );
                    report.callables_dropped += 1;
                    continue;
                }
            };
            let type_id = interner.intern(&node.type_uri);
            dictionary
                .entries
                .entry(type_id)
                .or_default()
                .entry(node.signature)
                .or_default()
                .insert(row.id);
        }
        tracing::info!(types = dictionary.entries.len(), "built type dictionary");
        dictionary
    }

    /// Callables that type `ty` defines for `signature`, ascending.
    pub fn targets(&self, ty: TypeId, signature: &str) -> impl Iterator<Item = u64> + '_ {
        self.entries
            .get(&ty)
            .and_then(|sigs| sigs.get(signature))
            .unwrap_or(NO_TARGETS)
            .iter()
            .copied()
    }

    /// Number of types with at least one entry.
    pub fn type_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(rows: &[(u64, &str)]) -> (TypeDictionary, TypeInterner, MergeReport) {
        let callables: Vec<CallableRow> = rows
            .iter()
            .map(|(id, uri)| CallableRow {
                id: *id,
                uri: uri.to_string(),
            })
            .collect();
        let mut interner = TypeInterner::new();
        let mut report = MergeReport::default();
        let dictionary = TypeDictionary::build(&callables, &mut interner, &mut report);
        (dictionary, interner, report)
    }

    #[test]
    fn test_lookup_by_type_and_signature() {
        let (dictionary, interner, report) = build(&[
            (1, "/ns/A.m()%2Fns%2FV"),
            (2, "/ns/B.m()%2Fns%2FV"),
            (3, "/ns/A.other()%2Fns%2FV"),
        ]);
        assert!(report.is_clean());

        let a = interner.get("/ns/A").unwrap();
        let b = interner.get("/ns/B").unwrap();
        assert_eq!(
            dictionary.targets(a, "m()/ns/V").collect::<Vec<_>>(),
            vec![1]
        );
        assert_eq!(
            dictionary.targets(b, "m()/ns/V").collect::<Vec<_>>(),
            vec![2]
        );
        assert_eq!(
            dictionary.targets(a, "other()/ns/V").collect::<Vec<_>>(),
            vec![3]
        );
    }

    #[test]
    fn test_missing_entries_are_empty() {
        let (dictionary, interner, _) = build(&[(1, "/ns/A.m()%2Fns%2FV")]);
        let a = interner.get("/ns/A").unwrap();
        assert_eq!(
            dictionary.targets(a, "absent()/ns/V").count(),
            0,
            "missing signature should read as empty"
        );
        assert_eq!(dictionary.targets(999, "m()/ns/V").count(), 0);
    }

    #[test]
    fn test_same_signature_across_types_stays_disjoint() {
        let (dictionary, interner, _) = build(&[
            (10, "/ns/A.m()%2Fns%2FV"),
            (20, "/ns/B.m()%2Fns%2FV"),
        ]);
        // Each id appears under exactly one type key
        let a = interner.get("/ns/A").unwrap();
        let b = interner.get("/ns/B").unwrap();
        assert!(dictionary.targets(a, "m()/ns/V").all(|id| id == 10));
        assert!(dictionary.targets(b, "m()/ns/V").all(|id| id == 20));
    }

    #[test]
    fn test_unparsable_callable_dropped_and_counted() {
        let (dictionary, _, report) = build(&[
            (1, "/ns/A.m()%2Fns%2FV"),
            (2, "not-a-method-uri"),
        ]);
        assert_eq!(report.callables_dropped, 1);
        assert_eq!(dictionary.type_count(), 1);
    }

    #[test]
    fn test_duplicate_insertion_is_noop() {
        let (dictionary, interner, _) = build(&[
            (1, "/ns/A.m()%2Fns%2FV"),
            (1, "/ns/A.m()%2Fns%2FV"),
        ]);
        let a = interner.get("/ns/A").unwrap();
        assert_eq!(
            dictionary.targets(a, "m()/ns/V").collect::<Vec<_>>(),
            vec![1]
        );
    }
}
