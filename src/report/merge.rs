//! Recursive map union used by every summary field.
//!
//! Keys present on one side only pass through untouched. Keys present on both
//! sides are combined, which for numeric leaves means summing. Nested maps
//! recurse one level at a time, so a key is never dropped at any depth.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Union two maps, combining the values of shared keys with `combine`
pub fn merge_with<K, V, F>(one: &BTreeMap<K, V>, two: &BTreeMap<K, V>, combine: F) -> BTreeMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
    F: Fn(&V, &V) -> V,
{
    let mut merged = one.clone();
    for (key, value) in two {
        match merged.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                let combined = combine(slot.get(), value);
                slot.insert(combined);
            }
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
            }
        }
    }
    merged
}

/// key -> number, summing shared keys
pub fn merge_scalar<K: Ord + Clone>(one: &BTreeMap<K, f64>, two: &BTreeMap<K, f64>) -> BTreeMap<K, f64> {
    merge_with(one, two, |a, b| a + b)
}

/// id -> attribute -> number
pub fn merge_two_level<K1, K2>(
    one: &BTreeMap<K1, BTreeMap<K2, f64>>,
    two: &BTreeMap<K1, BTreeMap<K2, f64>>,
) -> BTreeMap<K1, BTreeMap<K2, f64>>
where
    K1: Ord + Clone,
    K2: Ord + Clone,
{
    merge_with(one, two, |a, b| merge_scalar(a, b))
}

/// service -> region -> attribute -> number
pub fn merge_three_level<K1, K2, K3>(
    one: &BTreeMap<K1, BTreeMap<K2, BTreeMap<K3, f64>>>,
    two: &BTreeMap<K1, BTreeMap<K2, BTreeMap<K3, f64>>>,
) -> BTreeMap<K1, BTreeMap<K2, BTreeMap<K3, f64>>>
where
    K1: Ord + Clone,
    K2: Ord + Clone,
    K3: Ord + Clone,
{
    merge_with(one, two, |a, b| merge_two_level(a, b))
}

/// Rekey the outer level of a two-level map, summing entries whose new keys
/// collide. Entries for which `rekey` yields `None` are skipped.
pub fn rekey_two_level<K1, N, K2, F>(
    source: &BTreeMap<K1, BTreeMap<K2, f64>>,
    mut rekey: F,
) -> BTreeMap<N, BTreeMap<K2, f64>>
where
    N: Ord + Clone,
    K2: Ord + Clone,
    F: FnMut(&K1) -> Option<N>,
{
    let mut result: BTreeMap<N, BTreeMap<K2, f64>> = BTreeMap::new();
    for (key, values) in source {
        let Some(new_key) = rekey(key) else {
            continue;
        };
        let merged = match result.get(&new_key) {
            Some(existing) => merge_scalar(existing, values),
            None => values.clone(),
        };
        result.insert(new_key, merged);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_scalar_union_sums_shared_keys() {
        let one = scalar(&[("a", 1.0), ("b", 2.0)]);
        let two = scalar(&[("b", 3.0), ("c", 4.0)]);

        let merged = merge_scalar(&one, &two);
        assert_eq!(merged, scalar(&[("a", 1.0), ("b", 5.0), ("c", 4.0)]));
    }

    #[test]
    fn test_two_level_keeps_disjoint_inner_keys() {
        let mut one = BTreeMap::new();
        one.insert("x".to_string(), scalar(&[("cpu", 1.0)]));
        let mut two = BTreeMap::new();
        two.insert("x".to_string(), scalar(&[("mem", 2.0)]));
        two.insert("y".to_string(), scalar(&[("cpu", 7.0)]));

        let merged = merge_two_level(&one, &two);
        assert_eq!(merged["x"], scalar(&[("cpu", 1.0), ("mem", 2.0)]));
        assert_eq!(merged["y"], scalar(&[("cpu", 7.0)]));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_three_level_recurses() {
        let mut one = BTreeMap::new();
        one.insert("svc".to_string(), BTreeMap::from([("r1".to_string(), scalar(&[("cpu", 1.0)]))]));
        let mut two = BTreeMap::new();
        two.insert("svc".to_string(), BTreeMap::from([("r1".to_string(), scalar(&[("cpu", 2.5)]))]));

        let merged = merge_three_level(&one, &two);
        assert_eq!(merged["svc"]["r1"]["cpu"], 3.5);
    }

    #[test]
    fn test_rekey_sums_collisions_and_skips_unknown() {
        let mut source = BTreeMap::new();
        source.insert("n1".to_string(), scalar(&[("rate", 10.0)]));
        source.insert("n2".to_string(), scalar(&[("rate", 5.0)]));
        source.insert("n3".to_string(), scalar(&[("rate", 1.0)]));

        let rekeyed = rekey_two_level(&source, |node: &String| match node.as_str() {
            "n1" | "n2" => Some("east".to_string()),
            _ => None,
        });

        assert_eq!(rekeyed.len(), 1);
        assert_eq!(rekeyed["east"]["rate"], 15.0);
    }
}
