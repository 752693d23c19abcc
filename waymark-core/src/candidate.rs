//! # Candidates
//!
//! While a request path is narrowed down to one endpoint, every endpoint still
//! under consideration is tracked by a [`CandidateState`]. The states of one
//! attempt live in a [`CandidateSet`], built fresh per attempt and dropped
//! once a winner is chosen.
//!
//! Candidates are never removed from the set. A later stage (constraint
//! checks, metadata policies) withdraws a candidate by invalidating it, which
//! keeps indices stable while stages iterate.

use crate::{endpoint::Endpoint, error::MatchError, values::RouteValues};

/// Matching state for one endpoint during one attempt.
#[derive(Debug)]
pub struct CandidateState<'a> {
    endpoint: &'a Endpoint,
    score: usize,
    values: Option<RouteValues>,
    valid: bool,
}

impl<'a> CandidateState<'a> {
    /// A valid candidate without values.
    pub fn new(endpoint: &'a Endpoint, score: usize) -> Self {
        Self {
            endpoint,
            score,
            values: None,
            valid: true,
        }
    }

    /// The endpoint under consideration.
    pub fn endpoint(&self) -> &'a Endpoint {
        self.endpoint
    }

    /// Rank among the current set; lower wins.
    pub fn score(&self) -> usize {
        self.score
    }

    /// Returns false once the candidate has been withdrawn.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Withdraw the candidate. Withdrawal is permanent and drops its values.
    pub fn invalidate(&mut self) {
        self.valid = false;
        self.values = None;
    }

    /// Extracted route values; always `None` for a withdrawn candidate.
    pub fn values(&self) -> Option<&RouteValues> {
        self.values.as_ref()
    }

    /// Mutable access to the extracted values of a valid candidate.
    pub fn values_mut(&mut self) -> Option<&mut RouteValues> {
        self.values.as_mut()
    }

    /// Replace the extracted values. Ignored once the candidate is withdrawn.
    pub fn set_values(&mut self, values: Option<RouteValues>) {
        if self.valid {
            self.values = values;
        }
    }

    fn into_values(self) -> Option<RouteValues> {
        self.values
    }
}

/// The candidates of one matching attempt.
#[derive(Debug, Default)]
pub struct CandidateSet<'a> {
    candidates: Vec<CandidateState<'a>>,
}

impl<'a> CandidateSet<'a> {
    /// Build a set, scoring each endpoint by inbound precedence and then
    /// declared order.
    ///
    /// Endpoints with equal precedence and order share a score. Candidates
    /// keep the order in which they were supplied.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a Endpoint, Option<RouteValues>)>,
    {
        let entries: Vec<_> = entries.into_iter().collect();
        let key = |i: usize| {
            let endpoint = entries[i].0;
            (endpoint.pattern().inbound_precedence(), endpoint.order())
        };

        let mut ranked: Vec<usize> = (0..entries.len()).collect();
        ranked.sort_by(|&a, &b| key(a).cmp(&key(b)));

        let mut scores = vec![0; entries.len()];
        let mut score = 0;
        for (position, &index) in ranked.iter().enumerate() {
            if position > 0 && key(ranked[position - 1]) != key(index) {
                score += 1;
            }
            scores[index] = score;
        }

        let candidates = entries
            .into_iter()
            .zip(scores)
            .map(|((endpoint, values), score)| {
                let mut state = CandidateState::new(endpoint, score);
                state.set_values(values);
                state
            })
            .collect();
        Self { candidates }
    }

    /// Build a set from precomputed scores.
    pub fn with_scores<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a Endpoint, usize, Option<RouteValues>)>,
    {
        let candidates = entries
            .into_iter()
            .map(|(endpoint, score, values)| {
                let mut state = CandidateState::new(endpoint, score);
                state.set_values(values);
                state
            })
            .collect();
        Self { candidates }
    }

    /// Number of candidates, valid or not.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns true if the set has no candidates.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of candidates still valid.
    pub fn valid_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_valid()).count()
    }

    /// Candidate at `index`.
    pub fn get(&self, index: usize) -> Option<&CandidateState<'a>> {
        self.candidates.get(index)
    }

    /// Candidate at `index`, mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut CandidateState<'a>> {
        self.candidates.get_mut(index)
    }

    /// Returns true if the candidate at `index` exists and is valid.
    pub fn is_valid(&self, index: usize) -> bool {
        self.candidates.get(index).is_some_and(CandidateState::is_valid)
    }

    /// Withdraw the candidate at `index`.
    pub fn invalidate(&mut self, index: usize) {
        if let Some(candidate) = self.candidates.get_mut(index) {
            candidate.invalidate();
        }
    }

    /// Iterate candidates in supply order.
    pub fn iter(&self) -> impl Iterator<Item = &CandidateState<'a>> {
        self.candidates.iter()
    }

    /// Iterate candidates mutably in supply order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CandidateState<'a>> {
        self.candidates.iter_mut()
    }

    fn best_index(&self) -> Result<Option<usize>, MatchError> {
        let mut best: Option<usize> = None;
        let mut tied: Vec<usize> = Vec::new();

        for (index, candidate) in self.candidates.iter().enumerate() {
            if !candidate.is_valid() {
                continue;
            }
            match best {
                None => best = Some(index),
                Some(current) => {
                    let current_score = self.candidates[current].score();
                    if candidate.score() < current_score {
                        best = Some(index);
                        tied.clear();
                    } else if candidate.score() == current_score {
                        tied.push(index);
                    }
                }
            }
        }

        match best {
            Some(winner) if !tied.is_empty() => Err(MatchError::Ambiguous {
                endpoints: std::iter::once(winner)
                    .chain(tied)
                    .map(|i| self.candidates[i].endpoint().to_string())
                    .collect(),
            }),
            other => Ok(other),
        }
    }

    /// The valid candidate with the lowest score.
    ///
    /// Returns `Ok(None)` when nothing is valid, and
    /// [`MatchError::Ambiguous`] when several valid candidates share the best
    /// score.
    pub fn select(&self) -> Result<Option<&CandidateState<'a>>, MatchError> {
        Ok(self.best_index()?.map(|i| &self.candidates[i]))
    }

    /// Like [`select`](Self::select), but consumes the set and returns the
    /// winning endpoint with its values.
    pub fn into_selected(mut self) -> Result<Option<(&'a Endpoint, RouteValues)>, MatchError> {
        let Some(index) = self.best_index()? else {
            return Ok(None);
        };
        let winner = self.candidates.swap_remove(index);
        let endpoint = winner.endpoint();
        Ok(Some((endpoint, winner.into_values().unwrap_or_default())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoutePatternBuilder;

    fn endpoint(name: &str, build: RoutePatternBuilder, order: i32) -> Endpoint {
        Endpoint::builder(build.build().unwrap())
            .display_name(name)
            .order(order)
            .build()
    }

    #[test]
    fn test_new_candidate_defaults() {
        let e = endpoint("a", RoutePatternBuilder::new().literal("a"), 0);
        let state = CandidateState::new(&e, 4);
        assert!(state.is_valid());
        assert!(state.values().is_none());
        assert_eq!(state.score(), 4);
        assert!(Endpoint::ptr_eq(state.endpoint(), &e));
    }

    #[test]
    fn test_invalidate_is_permanent() {
        let e = endpoint("a", RoutePatternBuilder::new().literal("a"), 0);
        let mut state = CandidateState::new(&e, 0);
        state.set_values(Some(RouteValues::new()));
        state.invalidate();

        assert!(!state.is_valid());
        assert!(state.values().is_none());

        state.set_values(Some(RouteValues::new()));
        assert!(state.values().is_none());
    }

    #[test]
    fn test_scores_follow_precedence_then_order() {
        let catch_all = endpoint("catch-all", RoutePatternBuilder::new().catch_all("rest"), 0);
        let literal_late = endpoint("literal-late", RoutePatternBuilder::new().literal("a"), 5);
        let literal = endpoint("literal", RoutePatternBuilder::new().literal("a"), 0);
        let parameter = endpoint("parameter", RoutePatternBuilder::new().parameter("x"), 0);

        let set = CandidateSet::new([
            (&catch_all, None),
            (&literal_late, None),
            (&literal, None),
            (&parameter, None),
        ]);

        let scores: Vec<_> = set.iter().map(CandidateState::score).collect();
        assert_eq!(scores, vec![3, 1, 0, 2]);
        assert_eq!(set.select().unwrap().unwrap().endpoint().to_string(), "literal");
    }

    #[test]
    fn test_equal_keys_share_a_score() {
        let a = endpoint("a", RoutePatternBuilder::new().parameter("x"), 0);
        let b = endpoint("b", RoutePatternBuilder::new().parameter("y"), 0);
        let set = CandidateSet::new([(&a, None), (&b, None)]);
        assert_eq!(set.get(0).unwrap().score(), set.get(1).unwrap().score());
    }

    #[test]
    fn test_select_skips_invalid_candidates() {
        let literal = endpoint("literal", RoutePatternBuilder::new().literal("a"), 0);
        let parameter = endpoint("parameter", RoutePatternBuilder::new().parameter("x"), 0);
        let mut set = CandidateSet::new([(&literal, None), (&parameter, None)]);

        set.invalidate(0);
        assert_eq!(set.valid_count(), 1);
        assert!(!set.is_valid(0));
        assert_eq!(set.select().unwrap().unwrap().endpoint().to_string(), "parameter");

        set.invalidate(1);
        assert!(set.select().unwrap().is_none());
    }

    #[test]
    fn test_select_reports_ambiguity() {
        let a = endpoint("a", RoutePatternBuilder::new().parameter("x"), 0);
        let b = endpoint("b", RoutePatternBuilder::new().parameter("y"), 0);
        let set = CandidateSet::new([(&a, None), (&b, None)]);

        match set.select() {
            Err(MatchError::Ambiguous { endpoints }) => {
                assert_eq!(endpoints, vec!["a".to_string(), "b".to_string()])
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_into_selected_returns_values() {
        let a = endpoint("a", RoutePatternBuilder::new().parameter("x"), 0);
        let values: RouteValues = [("x", "1".to_string())].into_iter().collect();
        let set = CandidateSet::new([(&a, Some(values.clone()))]);

        let (endpoint, selected) = set.into_selected().unwrap().unwrap();
        assert!(Endpoint::ptr_eq(endpoint, &a));
        assert_eq!(selected, values);
    }

    #[test]
    fn test_with_scores_keeps_given_scores() {
        let a = endpoint("a", RoutePatternBuilder::new().literal("a"), 0);
        let b = endpoint("b", RoutePatternBuilder::new().literal("b"), 0);
        let set = CandidateSet::with_scores([(&a, 1, None), (&b, 0, None)]);
        assert_eq!(set.select().unwrap().unwrap().endpoint().to_string(), "b");
    }
}
