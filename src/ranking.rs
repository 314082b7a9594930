//! # Rank Selector
//!
//! Bounded top-N selection of annotation candidates per feature.
//!
//! Candidates are ordered by descending score. The sort is stable, so tied
//! scores keep their original row order, and a missing or NaN score ranks
//! below every real score. Ranks are 1-based and contiguous:
//! `1..=min(N, count)`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A candidate with its 1-based rank
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub rank: u32,
    pub item: T,
}

/// Top-N selector shared by the ranked annotation builders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankSelector {
    top_n: usize,
}

impl RankSelector {
    /// Keep at most `top_n` candidates per feature
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Configured bound
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Rank one feature's candidates
    pub fn select<T, F>(&self, candidates: Vec<T>, score: F) -> Vec<Ranked<T>>
    where
        F: Fn(&T) -> Option<f64>,
    {
        select_top_n(candidates, self.top_n, score)
    }

    /// Group candidates by feature, then rank each group independently.
    ///
    /// Groups are returned in key order; each group keeps input order on ties.
    pub fn select_grouped<T, K, FK, FS>(
        &self,
        candidates: impl IntoIterator<Item = T>,
        key: FK,
        score: FS,
    ) -> Vec<(K, Vec<Ranked<T>>)>
    where
        K: Ord,
        FK: Fn(&T) -> K,
        FS: Fn(&T) -> Option<f64>,
    {
        let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
        for candidate in candidates {
            groups.entry(key(&candidate)).or_default().push(candidate);
        }

        groups
            .into_iter()
            .map(|(k, group)| (k, select_top_n(group, self.top_n, &score)))
            .collect()
    }
}

/// Order two scores descending, absent and NaN last
fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.filter(|v| !v.is_nan());
    let b = b.filter(|v| !v.is_nan());
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Keep the `n` best candidates by descending score and assign ranks
pub fn select_top_n<T, F>(candidates: Vec<T>, n: usize, score: F) -> Vec<Ranked<T>>
where
    F: Fn(&T) -> Option<f64>,
{
    let mut scored: Vec<(Option<f64>, T)> = candidates
        .into_iter()
        .map(|c| (score(&c), c))
        .collect();

    // sort_by is stable: ties keep input order
    scored.sort_by(|(a, _), (b, _)| compare_scores(*a, *b));

    scored
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (_, item))| Ranked {
            rank: (i + 1) as u32,
            item,
        })
        .collect()
}
