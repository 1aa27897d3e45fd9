#![forbid(unsafe_code)]

use crate::ids::RowId;
use std::collections::HashMap;

/// A row that takes part in manual ordering through predecessor/successor links.
pub trait Linked {
    fn id(&self) -> RowId;
    fn prev(&self) -> Option<RowId>;
    fn next(&self) -> Option<RowId>;
}

/// Rebuilds the manual order encoded by `prev`/`next` links.
///
/// The links are not trusted: the walk starts at the first row (in input order) whose `prev` is
/// absent or points outside the set, follows `next` until it ends, dangles, or revisits a row, and
/// then appends every row it did not reach in input order. Each distinct identifier is emitted
/// exactly once; later duplicates of an identifier are dropped.
pub fn reconstruct_order<T: Linked>(rows: Vec<T>) -> Vec<T> {
    let mut index: HashMap<RowId, usize> = HashMap::with_capacity(rows.len());
    let mut slots: Vec<Option<T>> = Vec::with_capacity(rows.len());
    for row in rows {
        if index.contains_key(&row.id()) {
            continue;
        }
        index.insert(row.id(), slots.len());
        slots.push(Some(row));
    }

    let head = slots.iter().position(|slot| {
        slot.as_ref()
            .is_some_and(|row| row.prev().is_none_or(|prev| !index.contains_key(&prev)))
    });

    let mut out = Vec::with_capacity(slots.len());
    let mut cursor = head;
    while let Some(position) = cursor {
        // An empty slot means this row was already emitted: the links loop back.
        let Some(row) = slots[position].take() else {
            break;
        };
        cursor = row.next().and_then(|next| index.get(&next).copied());
        out.push(row);
    }

    out.extend(slots.into_iter().flatten());
    out
}
