//! Brute-force descriptor matching.
//!
//! Two acceptance policies are supported: mutual nearest neighbour
//! (cross-check) and Lowe's ratio test. Both work on anything that
//! implements [`DescriptorDistance`], so binary ORB descriptors are
//! compared by Hamming distance and float vectors by L2.

mod brute_force;
mod error;

pub use brute_force::{nearest, two_nearest};
pub use error::{MatchError, MatchResult};

use orbmatch_core::{DescriptorDistance, Match, MatchMode};
use rayon::prelude::*;

/// Accept a nearest neighbour iff it is clearly closer than the runner-up
pub fn passes_ratio_test(nearest: f32, second: f32, ratio: f32) -> bool {
    nearest < ratio * second
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorMatcher {
    mode: MatchMode,
    max_distance: Option<f32>,
}

impl Default for DescriptorMatcher {
    fn default() -> Self {
        Self {
            mode: MatchMode::CrossCheck,
            max_distance: None,
        }
    }
}

impl DescriptorMatcher {
    pub fn new(mode: MatchMode) -> MatchResult<Self> {
        if let MatchMode::RatioTest { ratio } = mode {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(MatchError::InvalidRatio(ratio));
            }
        }
        Ok(Self { mode, max_distance: None })
    }

    pub fn cross_check() -> Self {
        Self::default()
    }

    pub fn ratio_test(ratio: f32) -> MatchResult<Self> {
        Self::new(MatchMode::RatioTest { ratio })
    }

    /// Drop accepted matches whose distance exceeds `max_distance`
    pub fn with_max_distance(mut self, max_distance: f32) -> MatchResult<Self> {
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(MatchError::InvalidMaxDistance(max_distance));
        }
        self.max_distance = Some(max_distance);
        Ok(self)
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn max_distance(&self) -> Option<f32> {
        self.max_distance
    }

    /// Match every query descriptor against the train set.
    ///
    /// The result is sorted ascending by distance; equal distances keep
    /// query order.
    pub fn match_descriptors<D>(&self, query: &[D], train: &[D]) -> Vec<Match>
    where
        D: DescriptorDistance + Sync,
    {
        if query.is_empty() || train.is_empty() {
            log::debug!("Nothing to match ({} query, {} train)", query.len(), train.len());
            return Vec::new();
        }

        let mut matches = match self.mode {
            MatchMode::CrossCheck => cross_check_matches(query, train),
            MatchMode::RatioTest { ratio } => ratio_test_matches(query, train, ratio),
        };

        if let Some(limit) = self.max_distance {
            matches.retain(|m| m.distance <= limit);
        }

        sort_by_distance(&mut matches);

        debug_assert!(matches.iter().all(|m| m.query_idx < query.len() && m.train_idx < train.len()));
        log::debug!(
            "{:?}: {} matches from {} query / {} train descriptors",
            self.mode,
            matches.len(),
            query.len(),
            train.len()
        );
        matches
    }
}

/// Keep (i, j) only when j is i's nearest neighbour in `train` and i is j's
/// nearest neighbour in `query`
pub fn cross_check_matches<D>(query: &[D], train: &[D]) -> Vec<Match>
where
    D: DescriptorDistance + Sync,
{
    let forward: Vec<Option<(usize, f32)>> = query.par_iter().map(|q| nearest(q, train)).collect();
    let backward: Vec<Option<usize>> = train
        .par_iter()
        .map(|t| nearest(t, query).map(|(idx, _)| idx))
        .collect();

    forward
        .into_iter()
        .enumerate()
        .filter_map(|(query_idx, best)| {
            let (train_idx, distance) = best?;
            (backward[train_idx] == Some(query_idx)).then_some(Match {
                query_idx,
                train_idx,
                distance,
            })
        })
        .collect()
}

/// Keep each query's nearest neighbour when it passes the ratio test
/// against the second nearest. A train set with fewer than two entries
/// yields nothing.
pub fn ratio_test_matches<D>(query: &[D], train: &[D], ratio: f32) -> Vec<Match>
where
    D: DescriptorDistance + Sync,
{
    if train.len() < 2 {
        return Vec::new();
    }

    query
        .par_iter()
        .enumerate()
        .filter_map(|(query_idx, q)| {
            let ((train_idx, d1), d2) = two_nearest(q, train)?;
            let d2 = d2?;
            passes_ratio_test(d1, d2, ratio).then_some(Match {
                query_idx,
                train_idx,
                distance: d1,
            })
        })
        .collect()
}

fn sort_by_distance(matches: &mut [Match]) {
    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbmatch_core::Descriptor;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn float(values: &[f32]) -> Vec<Vec<f32>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    fn binary(bytes: &[u8]) -> Vec<Descriptor> {
        bytes.iter().map(|&b| [b; 32]).collect()
    }

    #[test]
    fn test_ratio_accepts_clear_winner() {
        // distances from 0.0 are 0.5 and 1.0
        let query = float(&[0.0]);
        let train = float(&[0.5, 1.0]);
        let matches = ratio_test_matches(&query, &train, 0.7);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].train_idx, 0);
        assert_eq!(matches[0].distance, 0.5);
    }

    #[test]
    fn test_ratio_rejects_ambiguous() {
        let query = float(&[0.0]);
        let train = float(&[0.8, 1.0]);
        assert!(ratio_test_matches(&query, &train, 0.7).is_empty());
    }

    #[test]
    fn test_ratio_needs_two_train_descriptors() {
        let query = float(&[0.0, 1.0]);
        let train = float(&[0.0]);
        assert!(ratio_test_matches(&query, &train, 0.7).is_empty());
    }

    #[test]
    fn test_passes_ratio_test_is_strict() {
        assert!(passes_ratio_test(0.5, 1.0, 0.7));
        assert!(!passes_ratio_test(0.7, 1.0, 0.7));
        assert!(!passes_ratio_test(0.0, 0.0, 0.7));
    }

    #[test]
    fn test_cross_check_mutual_pairs() {
        let query = float(&[0.0, 10.0, 20.0]);
        let train = float(&[10.5, 0.2, 50.0]);
        let matches = cross_check_matches(&query, &train);
        let pairs: HashSet<(usize, usize)> = matches.iter().map(|m| (m.query_idx, m.train_idx)).collect();
        assert_eq!(pairs, HashSet::from([(0, 1), (1, 0)]));
    }

    #[test]
    fn test_cross_check_rejects_one_sided() {
        // both queries prefer train 0, which only prefers query 1
        let query = float(&[0.0, 4.0]);
        let train = float(&[5.0]);
        let matches = cross_check_matches(&query, &train);
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].query_idx, matches[0].train_idx), (1, 0));
    }

    #[test]
    fn test_cross_check_nonempty_inputs_match_something() {
        let query = binary(&[0x00, 0x0F, 0xF0]);
        let train = binary(&[0xFF, 0x01]);
        assert!(!DescriptorMatcher::cross_check().match_descriptors(&query, &train).is_empty());
    }

    #[test]
    fn test_identical_sets_match_fully() {
        let set = binary(&[0x00, 0x0F, 0xFF, 0x3C]);
        let matches = DescriptorMatcher::cross_check().match_descriptors(&set, &set);
        assert_eq!(matches.len(), set.len());
        assert!(matches.iter().all(|m| m.distance == 0.0 && m.query_idx == m.train_idx));
    }

    #[test]
    fn test_empty_inputs() {
        let some = binary(&[0x00, 0x01]);
        let none: Vec<Descriptor> = Vec::new();
        let cc = DescriptorMatcher::cross_check();
        let rt = DescriptorMatcher::ratio_test(MatchMode::DEFAULT_RATIO).unwrap();
        assert!(cc.match_descriptors(&none, &some).is_empty());
        assert!(cc.match_descriptors(&some, &none).is_empty());
        assert!(rt.match_descriptors(&none, &some).is_empty());
        assert!(rt.match_descriptors(&some, &none).is_empty());
    }

    #[test]
    fn test_results_sorted_ascending() {
        let query = float(&[0.0, 10.0, 20.0, 30.0]);
        let train = float(&[30.4, 20.1, 10.3, 0.2]);
        let matches = DescriptorMatcher::cross_check().match_descriptors(&query, &train);
        assert_eq!(matches.len(), 4);
        assert!(matches.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(matches[0].query_idx, 2);
    }

    #[test]
    fn test_max_distance_gate() {
        let query = float(&[0.0, 10.0]);
        let train = float(&[0.5, 13.0]);
        let matcher = DescriptorMatcher::cross_check().with_max_distance(1.0).unwrap();
        let matches = matcher.match_descriptors(&query, &train);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].query_idx, 0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(DescriptorMatcher::ratio_test(0.0), Err(MatchError::InvalidRatio(0.0)));
        assert_eq!(DescriptorMatcher::ratio_test(1.5), Err(MatchError::InvalidRatio(1.5)));
        assert!(DescriptorMatcher::ratio_test(f32::NAN).is_err());
        assert!(DescriptorMatcher::cross_check().with_max_distance(-1.0).is_err());
        assert!(DescriptorMatcher::cross_check().with_max_distance(f32::INFINITY).is_err());
        assert!(DescriptorMatcher::ratio_test(1.0).is_ok());
    }

    #[test]
    fn test_default_is_cross_check() {
        let matcher = DescriptorMatcher::default();
        assert_eq!(matcher.mode(), MatchMode::CrossCheck);
        assert_eq!(matcher.max_distance(), None);
    }

    fn descriptor_set() -> impl Strategy<Value = Vec<Descriptor>> {
        prop::collection::vec(prop::array::uniform32(any::<u8>()), 0..24)
    }

    proptest! {
        #[test]
        fn prop_cross_check_is_one_to_one(query in descriptor_set(), train in descriptor_set()) {
            let matches = DescriptorMatcher::cross_check().match_descriptors(&query, &train);
            let q: HashSet<usize> = matches.iter().map(|m| m.query_idx).collect();
            let t: HashSet<usize> = matches.iter().map(|m| m.train_idx).collect();
            prop_assert_eq!(q.len(), matches.len());
            prop_assert_eq!(t.len(), matches.len());
            prop_assert!(matches.windows(2).all(|w| w[0].distance <= w[1].distance));
            if !query.is_empty() && !train.is_empty() {
                prop_assert!(!matches.is_empty());
            }
        }

        #[test]
        fn prop_ratio_matches_pass_the_ratio(query in descriptor_set(), train in descriptor_set()) {
            let matches = ratio_test_matches(&query, &train, MatchMode::DEFAULT_RATIO);
            for m in &matches {
                let ((idx, d1), d2) = two_nearest(&query[m.query_idx], &train).unwrap();
                prop_assert_eq!(idx, m.train_idx);
                prop_assert!(passes_ratio_test(d1, d2.unwrap(), MatchMode::DEFAULT_RATIO));
            }
        }

        #[test]
        fn prop_matching_is_deterministic(query in descriptor_set(), train in descriptor_set()) {
            let matcher = DescriptorMatcher::cross_check();
            prop_assert_eq!(
                matcher.match_descriptors(&query, &train),
                matcher.match_descriptors(&query, &train)
            );
        }
    }
}
