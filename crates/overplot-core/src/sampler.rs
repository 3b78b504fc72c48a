//! Gaussian mixture sampler.
//!
//! Draws labelled point clouds from isotropic 2D Gaussians, one component per
//! [`GaussianSpec`]. Output is reproducible: the same seed and specs give a
//! bit-identical [`PointSet`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{validation, OverplotError, OverplotResult};
use crate::point::{GroupLabel, Point, PointSet};

/// One mixture component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianSpec {
    pub mean_x: f64,
    pub mean_y: f64,
    pub std_dev: f64,
    /// Scalar attached to every point of this component
    #[serde(default)]
    pub value: Option<f64>,
}

impl GaussianSpec {
    pub fn new(mean_x: f64, mean_y: f64, std_dev: f64) -> Self {
        Self {
            mean_x,
            mean_y,
            std_dev,
            value: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    fn validate(&self) -> OverplotResult<()> {
        validation::validate_finite("mean_x", self.mean_x)?;
        validation::validate_finite("mean_y", self.mean_y)?;
        validation::validate_positive("std_dev", self.std_dev)?;
        if let Some(value) = self.value {
            validation::validate_finite("value", value)?;
        }
        Ok(())
    }
}

/// Five offset clusters with increasing spread, each tagged with its index
/// as value
pub fn default_mixture() -> Vec<GaussianSpec> {
    [
        (2.0, 2.0, 0.01),
        (2.0, -2.0, 0.1),
        (-2.0, -2.0, 0.5),
        (-2.0, 2.0, 1.0),
        (0.0, 0.0, 3.0),
    ]
    .iter()
    .enumerate()
    .map(|(i, &(x, y, s))| GaussianSpec::new(x, y, s).with_value(i as f64))
    .collect()
}

/// Draw `count_per_spec` points from every component
pub fn sample(specs: &[GaussianSpec], count_per_spec: usize, seed: u64) -> OverplotResult<PointSet> {
    let components: Vec<(GaussianSpec, usize)> =
        specs.iter().map(|&spec| (spec, count_per_spec)).collect();
    sample_counts(&components, seed)
}

/// Draw a per-component number of points
///
/// Points of component `i` are labelled `GroupLabel(i)` and appear in
/// component order. All parameters are checked before any point is drawn.
pub fn sample_counts(components: &[(GaussianSpec, usize)], seed: u64) -> OverplotResult<PointSet> {
    let labels = components
        .iter()
        .enumerate()
        .map(|(idx, (spec, count))| {
            validation::validate_count("count", *count)?;
            spec.validate()?;
            component_label(idx)
        })
        .collect::<OverplotResult<Vec<GroupLabel>>>()?;

    let total: usize = components.iter().map(|(_, count)| count).sum();
    let mut points = PointSet::with_capacity(total);
    let mut rng = StdRng::seed_from_u64(seed);

    for ((spec, count), &group) in components.iter().zip(&labels) {
        for _ in 0..*count {
            let (gx, gy) = box_muller(&mut rng);
            let mut point = Point::new(
                spec.mean_x + gx * spec.std_dev,
                spec.mean_y + gy * spec.std_dev,
                group,
            );
            point.value = spec.value;
            points.push(point);
        }
    }

    debug!(
        components = components.len(),
        points = points.len(),
        seed,
        "sampled gaussian mixture"
    );
    Ok(points)
}

/// Group label of the component at `idx`
fn component_label(idx: usize) -> OverplotResult<GroupLabel> {
    u32::try_from(idx)
        .map(GroupLabel)
        .map_err(|_| OverplotError::invalid("components", format!("index {} exceeds u32 labels", idx)))
}

/// Box-Muller transform for generating Gaussian-distributed values
fn box_muller(rng: &mut StdRng) -> (f64, f64) {
    // random() is in [0, 1); flip it so ln never sees 0
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();

    let r = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * std::f64::consts::PI * u2;

    (r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_counts_and_labels() {
        let specs = default_mixture();
        let points = sample(&specs, 100, 1).unwrap();
        assert_eq!(points.len(), 500);

        let labels: HashSet<u32> = points.labels().iter().map(|g| g.0).collect();
        assert_eq!(labels.len(), 5);
        // Component order is kept
        assert_eq!(points.get(0).unwrap().group, GroupLabel(0));
        assert_eq!(points.get(499).unwrap().group, GroupLabel(4));
    }

    #[test]
    fn test_reproducibility() {
        let specs = default_mixture();
        let a = sample(&specs, 50, 12345).unwrap();
        let b = sample(&specs, 50, 12345).unwrap();

        for (v1, v2) in a.xs().iter().zip(b.xs().iter()) {
            assert_eq!(v1.to_bits(), v2.to_bits(), "Reproducibility failed");
        }
        assert_ne!(a.xs(), sample(&specs, 50, 54321).unwrap().xs());
    }

    #[test]
    fn test_moments_follow_spec() {
        let spec = GaussianSpec::new(3.0, -1.0, 0.5);
        let points = sample(&[spec], 20_000, 5).unwrap();

        let sx = points.summary_x();
        let sy = points.summary_y();
        assert!((sx.mean - 3.0).abs() < 0.02);
        assert!((sy.mean + 1.0).abs() < 0.02);
        assert!((sx.std_dev - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_values_follow_spec() {
        let specs = [GaussianSpec::new(0.0, 0.0, 1.0), GaussianSpec::new(1.0, 1.0, 1.0).with_value(2.5)];
        let points = sample(&specs, 3, 0).unwrap();
        assert_eq!(points.get(0).unwrap().value, None);
        assert_eq!(points.get(3).unwrap().value, Some(2.5));
    }

    #[test]
    fn test_invalid_parameters() {
        let spec = GaussianSpec::new(0.0, 0.0, 1.0);
        assert!(sample(&[spec], 0, 1).unwrap_err().is_invalid_parameter());
        assert!(sample(&[GaussianSpec::new(0.0, 0.0, 0.0)], 10, 1).is_err());
        assert!(sample(&[GaussianSpec::new(0.0, 0.0, -1.0)], 10, 1).is_err());
        assert!(sample(&[GaussianSpec::new(f64::NAN, 0.0, 1.0)], 10, 1).is_err());
    }

    #[test]
    fn test_uneven_counts() {
        let spec = GaussianSpec::new(0.0, 0.0, 1.0);
        let points = sample_counts(&[(spec, 3), (spec, 7)], 2).unwrap();
        assert_eq!(points.len(), 10);
        assert_eq!(points.filter_group(GroupLabel(1)).len(), 7);
    }

    #[test]
    fn test_empty_specs() {
        assert!(sample(&[], 10, 1).unwrap().is_empty());
    }

    #[test]
    fn test_component_label_range() {
        assert_eq!(component_label(0).unwrap(), GroupLabel(0));
        assert_eq!(component_label(u32::MAX as usize).unwrap(), GroupLabel(u32::MAX));
        assert!(component_label(u32::MAX as usize + 1).unwrap_err().is_invalid_parameter());
    }
}
