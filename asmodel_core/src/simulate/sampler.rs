//! Subsample a trajectory at a fixed stride
use nalgebra::DVector;

use crate::configuration::ConfigError;
use crate::simulate::trajectory::Trajectory;

/// Borrowed view of every `stride`-th sample of a trajectory, plus its final sample
#[derive(Debug, Clone, PartialEq)]
pub struct SampledTrajectory<'a> {
    trajectory: &'a Trajectory,
    indices: Vec<usize>,
}

/// Select the samples `0, s, 2s, ...` of `trajectory` and, if not already included, the final one
///
/// # Examples
/// With 11 samples (h = 0.1, T = 1) and a stride of 20 only t = 0 and t = 1 are kept.
pub fn sample(trajectory: &Trajectory, stride: usize) -> Result<SampledTrajectory<'_>, ConfigError> {
    if stride == 0 {
        return Err(ConfigError::InvalidSamplingStride(0));
    }
    let mut indices: Vec<usize> = (0..trajectory.len()).step_by(stride).collect();
    if let Some(last) = trajectory.len().checked_sub(1) {
        if indices.last() != Some(&last) {
            indices.push(last);
        }
    }
    Ok(SampledTrajectory {
        trajectory,
        indices,
    })
}

impl<'a> SampledTrajectory<'a> {
    /// Indices into the underlying trajectory
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn labels(&self) -> &'a [String] {
        self.trajectory.labels()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over the selected (time, state) samples
    pub fn iter(&self) -> impl Iterator<Item = (f64, &'a DVector<f64>)> + '_ {
        let trajectory = self.trajectory;
        self.indices
            .iter()
            .filter_map(move |index| trajectory.get(*index))
    }
}

#[cfg(test)]
mod sampler_tests {
    use super::*;

    fn trajectory(samples: usize) -> Trajectory {
        let mut trajectory = Trajectory::with_capacity(vec!["A".to_string()], samples);
        for i in 0..samples {
            trajectory.push(i as f64 * 0.1, DVector::from_vec(vec![i as f64]));
        }
        trajectory
    }

    #[test]
    fn stride_one_keeps_everything() {
        let trajectory = trajectory(11);
        let sampled = sample(&trajectory, 1).unwrap();
        assert_eq!(sampled.len(), 11);
        assert_eq!(sampled.indices(), (0..11).collect::<Vec<usize>>().as_slice());
    }

    #[test]
    fn final_sample_always_included() {
        let trajectory = trajectory(11);
        assert_eq!(sample(&trajectory, 20).unwrap().indices(), &[0, 10]);
        assert_eq!(sample(&trajectory, 3).unwrap().indices(), &[0, 3, 6, 9, 10]);
        // Not repeated when the stride lands on it
        assert_eq!(sample(&trajectory, 5).unwrap().indices(), &[0, 5, 10]);
        let times: Vec<f64> = sample(&trajectory, 20).unwrap().iter().map(|(t, _)| t).collect();
        assert_eq!(times.len(), 2);
        assert!((times[1] - 1.).abs() < 1e-12);
    }

    #[test]
    fn zero_stride() {
        assert_eq!(
            sample(&trajectory(3), 0),
            Err(ConfigError::InvalidSamplingStride(0))
        );
    }

    #[test]
    fn single_sample() {
        let trajectory = trajectory(1);
        assert_eq!(sample(&trajectory, 4).unwrap().indices(), &[0]);
    }
}
