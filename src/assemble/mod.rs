//! Phrase assembly
//!
//! Pure derivation from a collection: sort by order index ascending, join
//! tokens with single spaces. Deterministic for a fixed collection no matter
//! what order the messages arrived in.

use crate::drain::Collection;
use crate::error::{GatherError, GatherResult};

/// Assembles the ordered phrase from a collected index-to-token mapping
///
/// An empty collection is a fault (it signals an upstream collection
/// failure, not a valid empty phrase). With `strict_contiguity` the
/// assembler additionally rejects gaps in the index sequence, which a
/// drain aborted at the cycle ceiling can produce.
#[derive(Debug, Clone, Default)]
pub struct PhraseAssembler {
    strict_contiguity: bool,
}

impl PhraseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the gap check
    pub fn with_strict_contiguity(strict_contiguity: bool) -> Self {
        Self { strict_contiguity }
    }

    /// Derive the phrase from the collection
    pub fn assemble(&self, collection: &Collection) -> GatherResult<String> {
        if collection.is_empty() {
            return Err(GatherError::EmptyCollection);
        }

        if self.strict_contiguity {
            self.check_contiguity(collection)?;
        }

        let phrase = collection
            .iter()
            .map(|(_, token)| token)
            .collect::<Vec<_>>()
            .join(" ");

        Ok(phrase)
    }

    /// Indices may start anywhere, but must have no gaps
    fn check_contiguity(&self, collection: &Collection) -> GatherResult<()> {
        let mut expected = None;
        for (index, _) in collection.iter() {
            if let Some(expected) = expected {
                if index != expected {
                    return Err(GatherError::NonContiguous {
                        expected,
                        found: index,
                    });
                }
            }
            expected = Some(index + 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn collection(pairs: &[(i64, &str)]) -> Collection {
        pairs
            .iter()
            .map(|(index, token)| (*index, token.to_string()))
            .collect()
    }

    #[test]
    fn test_assembles_in_index_order() {
        let collection = collection(&[(2, "world"), (0, "hello"), (1, "brave")]);
        let phrase = PhraseAssembler::new().assemble(&collection).unwrap();
        assert_eq!(phrase, "hello brave world");
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let collection = collection(&[(4, "d"), (1, "a"), (3, "c"), (2, "b")]);
        let assembler = PhraseAssembler::new();
        let first = assembler.assemble(&collection).unwrap();
        let second = assembler.assemble(&collection).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_collection_is_a_fault() {
        let result = PhraseAssembler::new().assemble(&Collection::new());
        assert!(matches!(result, Err(GatherError::EmptyCollection)));
    }

    #[test]
    fn test_single_token_has_no_separator() {
        let collection = collection(&[(0, "solo")]);
        let phrase = PhraseAssembler::new().assemble(&collection).unwrap();
        assert_eq!(phrase, "solo");
    }

    #[test]
    fn test_strict_mode_rejects_gaps() {
        let collection = collection(&[(0, "a"), (1, "b"), (3, "d")]);
        let result = PhraseAssembler::with_strict_contiguity(true).assemble(&collection);
        assert!(matches!(
            result,
            Err(GatherError::NonContiguous {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_strict_mode_accepts_any_starting_index() {
        let collection = collection(&[(5, "first"), (6, "second"), (7, "third")]);
        let phrase = PhraseAssembler::with_strict_contiguity(true)
            .assemble(&collection)
            .unwrap();
        assert_eq!(phrase, "first second third");
    }

    #[test]
    fn test_default_mode_tolerates_gaps() {
        let collection = collection(&[(0, "a"), (10, "b")]);
        let phrase = PhraseAssembler::new().assemble(&collection).unwrap();
        assert_eq!(phrase, "a b");
    }

    proptest! {
        #[test]
        fn prop_insertion_order_never_changes_the_phrase(
            pairs in proptest::collection::btree_map(any::<i16>(), "[a-z]{1,8}", 1..20)
        ) {
            let forward: Collection = pairs
                .iter()
                .map(|(index, token)| (i64::from(*index), token.clone()))
                .collect();
            let reversed: Collection = pairs
                .iter()
                .rev()
                .map(|(index, token)| (i64::from(*index), token.clone()))
                .collect();

            let assembler = PhraseAssembler::new();
            let phrase = assembler.assemble(&forward).unwrap();
            prop_assert_eq!(&phrase, &assembler.assemble(&reversed).unwrap());
            prop_assert_eq!(phrase.split(' ').count(), pairs.len());
        }
    }
}
