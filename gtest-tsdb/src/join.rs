//! Joins over typed rows

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Inner join of `left` and `right` on equal keys.
///
/// Pairs come out in left order, and for each left row in right order.
pub fn join<'a, L, R, K, FL, FR>(left: &'a [L], right: &'a [R], left_key: FL, right_key: FR) -> Vec<(&'a L, &'a R)>
where
    K: Eq + Hash,
    FL: Fn(&L) -> K,
    FR: Fn(&R) -> K,
{
    let mut index: HashMap<K, Vec<&'a R>> = HashMap::new();
    for row in right {
        index.entry(right_key(row)).or_default().push(row);
    }

    let mut joined = Vec::new();
    for l in left {
        if let Some(matches) = index.get(&left_key(l)) {
            joined.extend(matches.iter().map(|r| (l, *r)));
        }
    }
    joined
}

/// Rows from two tables grouped under one key value
pub type Matched<'a, K, T> = (K, Vec<&'a T>, Vec<&'a T>);

/// Group rows of two same-typed tables by key.
///
/// Every key present on either side appears once, in ascending key order; a
/// side without rows for a key gets an empty group.
pub fn match_rows<'a, T, K, F>(left: &'a [T], right: &'a [T], key: F) -> Vec<Matched<'a, K, T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, (Vec<&'a T>, Vec<&'a T>)> = BTreeMap::new();
    for row in left {
        groups.entry(key(row)).or_default().0.push(row);
    }
    for row in right {
        groups.entry(key(row)).or_default().1.push(row);
    }
    groups.into_iter().map(|(k, (l, r))| (k, l, r)).collect()
}
