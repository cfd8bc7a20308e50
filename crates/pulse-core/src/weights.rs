use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Weight of a pattern that has never been evaluated.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Parameters of the clamped weight update rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    pub learning_rate: f64,
    pub min_weight: f64,
    pub max_weight: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            min_weight: 0.1,
            max_weight: 5.0,
        }
    }
}

impl LearningParams {
    /// `weight + rate * (observed - predicted)`, clamped to the configured bounds.
    ///
    /// Non-finite inputs leave the weight unchanged.
    #[must_use]
    pub fn adjust(&self, weight: f64, predicted: f64, observed: f64) -> f64 {
        if !predicted.is_finite() || !observed.is_finite() || !weight.is_finite() {
            return weight;
        }
        let error = observed - predicted;
        (weight + self.learning_rate * error).clamp(self.min_weight, self.max_weight)
    }
}

/// Pattern name to weight. Patterns not present read as [`DEFAULT_WEIGHT`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightSet(BTreeMap<String, f64>);

impl WeightSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, pattern: &str) -> f64 {
        self.0.get(pattern).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn set(&mut self, pattern: impl Into<String>, weight: f64) {
        self.0.insert(pattern.into(), weight);
    }

    /// Apply one evaluated outcome and return the new weight.
    pub fn apply_outcome(
        &mut self,
        params: &LearningParams,
        pattern: &str,
        predicted: f64,
        observed: f64,
    ) -> f64 {
        let updated = params.adjust(self.get(pattern), predicted, observed);
        self.set(pattern, updated);
        updated
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for WeightSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(rate: f64, max: f64) -> LearningParams {
        LearningParams {
            learning_rate: rate,
            min_weight: 0.1,
            max_weight: max,
        }
    }

    #[test]
    fn adjust_moves_weight_by_scaled_error() {
        let p = params(0.1, 10.0);
        assert!((p.adjust(1.0, 100.0, 150.0) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn adjust_clamps_to_max() {
        let p = params(0.1, 5.0);
        assert!((p.adjust(1.0, 100.0, 150.0) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn adjust_clamps_to_min() {
        let p = params(0.1, 5.0);
        assert!((p.adjust(1.0, 150.0, 0.0) - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn adjust_ignores_non_finite_inputs() {
        let p = params(0.1, 5.0);
        assert!((p.adjust(2.0, f64::NAN, 10.0) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_pattern_reads_default_weight() {
        let set = WeightSet::new();
        assert!((set.get("story_times") - DEFAULT_WEIGHT).abs() < f64::EPSILON);
        assert!(set.is_empty());
    }

    #[test]
    fn apply_outcome_stores_updated_weight() {
        let mut set = WeightSet::new();
        let updated = set.apply_outcome(&params(0.1, 10.0), "couple_content", 100.0, 150.0);
        assert!((updated - 6.0).abs() < 1e-9);
        assert!((set.get("couple_content") - 6.0).abs() < 1e-9);
        assert_eq!(set.len(), 1);
    }
}
