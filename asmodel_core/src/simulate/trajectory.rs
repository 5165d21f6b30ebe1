//! Time series of model states produced by the integrator
use nalgebra::DVector;

/// Ordered (time, state) samples, states in component declaration order
///
/// Only the integrator appends to a trajectory; once handed out it is read only.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    labels: Vec<String>,
    times: Vec<f64>,
    states: Vec<DVector<f64>>,
}

impl Trajectory {
    pub(crate) fn with_capacity(labels: Vec<String>, capacity: usize) -> Self {
        Trajectory {
            labels,
            times: Vec::with_capacity(capacity),
            states: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, time: f64, state: DVector<f64>) {
        self.times.push(time);
        self.states.push(state);
    }

    /// Component ids, one per state entry
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[DVector<f64>] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample at `index`
    pub fn get(&self, index: usize) -> Option<(f64, &DVector<f64>)> {
        Some((*self.times.get(index)?, self.states.get(index)?))
    }

    /// Final sample
    pub fn last(&self) -> Option<(f64, &DVector<f64>)> {
        self.get(self.len().checked_sub(1)?)
    }

    /// Iterate over the (time, state) samples
    pub fn iter(&self) -> impl Iterator<Item = (f64, &DVector<f64>)> {
        self.times.iter().copied().zip(self.states.iter())
    }

    /// Values of one component over time
    pub fn component(&self, id: &str) -> Option<Vec<f64>> {
        let index = self.labels.iter().position(|label| label == id)?;
        Some(self.states.iter().map(|state| state[index]).collect())
    }
}

#[cfg(test)]
mod trajectory_tests {
    use super::*;

    #[test]
    fn push_and_read() {
        let mut trajectory = Trajectory::with_capacity(vec!["A".to_string(), "B".to_string()], 2);
        assert!(trajectory.is_empty());
        assert!(trajectory.last().is_none());
        trajectory.push(0., DVector::from_vec(vec![1., 2.]));
        trajectory.push(0.5, DVector::from_vec(vec![3., 4.]));
        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory.times(), &[0., 0.5]);
        let (time, state) = trajectory.last().unwrap();
        assert_eq!(time, 0.5);
        assert_eq!(state[1], 4.);
        assert_eq!(trajectory.component("B"), Some(vec![2., 4.]));
        assert_eq!(trajectory.component("C"), None);
        assert_eq!(trajectory.iter().count(), 2);
    }
}
