use crate::model::YearlyProgress;

/// Decoded years in arrival order, at most one per year number.
///
/// Mutated only from the single decode loop that owns it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultAccumulator {
    results: Vec<YearlyProgress>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `progress` unless its year is already present. Returns whether
    /// it was inserted.
    pub fn insert(&mut self, progress: YearlyProgress) -> bool {
        if self.contains_year(progress.year) {
            return false;
        }
        self.results.push(progress);
        true
    }

    pub fn contains_year(&self, year: u8) -> bool {
        self.results.iter().any(|p| p.year == year)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[YearlyProgress] {
        &self.results
    }

    pub fn latest_year(&self) -> Option<u8> {
        self.results.last().map(|p| p.year)
    }

    pub fn into_results(self) -> Vec<YearlyProgress> {
        self.results
    }
}
