use std::collections::HashMap;
use std::hash::Hash;

/// Record that can be matched by key in a [`left_join`].
pub trait Keyed {
    type Key: Eq + Hash;

    fn key(&self) -> Self::Key;
}

/// A primary record with its (optional) matched secondary record.
#[derive(Clone, Debug, PartialEq)]
pub struct Joined<P, S> {
    pub primary: P,
    pub matched: Option<S>,
}

/// Left join on equal keys.
///
/// Every primary record is kept, in order; each gets the first secondary
/// record with the same key, or `None`. The output length always equals
/// the primary length.
pub fn left_join<P, S>(primary: Vec<P>, secondary: &[S]) -> Vec<Joined<P, S>>
where
    P: Keyed,
    S: Keyed<Key = P::Key> + Clone,
{
    left_join_by(primary, secondary, P::key, S::key)
}

/// [`left_join`] with explicit key selectors.
pub fn left_join_by<P, S, K, FP, FS>(
    primary: Vec<P>,
    secondary: &[S],
    primary_key: FP,
    secondary_key: FS,
) -> Vec<Joined<P, S>>
where
    K: Eq + Hash,
    S: Clone,
    FP: Fn(&P) -> K,
    FS: Fn(&S) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::with_capacity(secondary.len());
    for (i, s) in secondary.iter().enumerate() {
        index.entry(secondary_key(s)).or_insert(i);
    }

    primary
        .into_iter()
        .map(|p| {
            let matched = index.get(&primary_key(&p)).map(|&i| secondary[i].clone());
            Joined { primary: p, matched }
        })
        .collect()
}

/// `numerator / denominator`, absent when either side is absent or the
/// denominator is not strictly positive.
pub fn derived_rate(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 && d.is_finite() && n.is_finite() => Some(n / d),
        _ => None,
    }
}
