//! Property tests for the applicator's splice and conflict invariants.

use ast_rewriter::{apply, ApplyError, AtomicChange, Edit};
use proptest::prelude::*;

/// Build one atomic change per edit, mirroring how the engine scopes
/// unrelated matches.
fn changes_from(edits: Vec<Edit>) -> Vec<AtomicChange> {
    edits
        .into_iter()
        .map(|e| {
            let mut c = AtomicChange::new("prop.rs");
            c.push_edit(e);
            c
        })
        .collect()
}

fn apply_changes(original: &str, changes: &[AtomicChange]) -> Result<String, ApplyError> {
    let refs: Vec<&AtomicChange> = changes.iter().collect();
    apply(original, &refs)
}

/// Disjoint ranges over a text of length `len`: sorted unique cut points
/// paired up into half-open intervals.
fn disjoint_ranges(len: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::btree_set(0..=len, 0..8).prop_map(|cuts| {
        let cuts: Vec<usize> = cuts.into_iter().collect();
        cuts.chunks_exact(2).map(|c| (c[0], c[1])).collect()
    })
}

proptest! {
    #[test]
    fn empty_edit_list_returns_original(original in "[a-z ();{}]{0,80}") {
        let result = apply_changes(&original, &[]).unwrap();
        prop_assert_eq!(result, original);
    }

    #[test]
    fn order_of_non_overlapping_edits_is_irrelevant(
        original in "[a-z]{60}",
        ranges in disjoint_ranges(60),
        texts in prop::collection::vec("[A-Z]{0,5}", 8),
    ) {
        let edits: Vec<Edit> = ranges
            .iter()
            .zip(texts.iter())
            .map(|(&(start, end), text)| {
                Edit::new(start, end, text.clone(), &original[start..end])
            })
            .collect();

        let forward = changes_from(edits.clone());
        let mut reversed_edits = edits.clone();
        reversed_edits.reverse();
        let reversed = changes_from(reversed_edits);
        let mut rotated_edits = edits;
        if !rotated_edits.is_empty() {
            rotated_edits.rotate_left(1);
        }
        let rotated = changes_from(rotated_edits);

        let a = apply_changes(&original, &forward).unwrap();
        let b = apply_changes(&original, &reversed).unwrap();
        let c = apply_changes(&original, &rotated).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
    }

    #[test]
    fn untouched_spans_survive_byte_for_byte(
        original in "[a-z]{40}",
        start in 0usize..20,
        len in 1usize..10,
        replacement in "[A-Z]{0,6}",
    ) {
        let end = start + len;
        let edit = Edit::new(start, end, replacement.clone(), &original[start..end]);
        let changes = changes_from(vec![edit]);

        let result = apply_changes(&original, &changes).unwrap();
        prop_assert_eq!(&result[..start], &original[..start]);
        prop_assert_eq!(&result[start..start + replacement.len()], replacement.as_str());
        prop_assert_eq!(&result[start + replacement.len()..], &original[end..]);
    }

    #[test]
    fn overlapping_edits_always_conflict(
        original in "[a-z]{40}",
        start1 in 0usize..20,
        len1 in 1usize..10,
        offset in 0usize..9,
        len2 in 1usize..10,
    ) {
        let end1 = start1 + len1;
        // Second range starts inside the first: guaranteed overlap.
        let start2 = start1 + offset.min(len1 - 1);
        let end2 = (start2 + len2).min(original.len());

        let edits = vec![
            Edit::new(start1, end1, "X", &original[start1..end1]),
            Edit::new(start2, end2, "Y", &original[start2..end2]),
        ];
        let changes = changes_from(edits);

        let result = apply_changes(&original, &changes);
        let is_conflict = matches!(result, Err(ApplyError::ConflictingEdits { .. }));
        prop_assert!(is_conflict);
    }

    #[test]
    fn output_length_is_predictable(
        original in "[a-z]{60}",
        ranges in disjoint_ranges(60),
        texts in prop::collection::vec("[A-Z]{0,5}", 8),
    ) {
        let edits: Vec<Edit> = ranges
            .iter()
            .zip(texts.iter())
            .map(|(&(start, end), text)| {
                Edit::new(start, end, text.clone(), &original[start..end])
            })
            .collect();

        let removed: usize = edits.iter().map(|e| e.byte_end - e.byte_start).sum();
        let added: usize = edits.iter().map(|e| e.new_text.len()).sum();
        let changes = changes_from(edits);

        let result = apply_changes(&original, &changes).unwrap();
        prop_assert_eq!(result.len(), original.len() - removed + added);
    }
}
