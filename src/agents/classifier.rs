//! Binary logistic regression
//!
//! L2-regularized with inverse strength `c` (the intercept is not
//! penalized), fitted by full-batch gradient descent. Fitting is CPU-bound
//! and synchronous; callers run it on a blocking thread.
//!
//! The penalty can pull the boundary of a single-feature model past the
//! gap between two separable classes (imbalanced or tight-margin data), so
//! `fit_and_score` re-centres such a model on the midpoint of the gap.

use thiserror::Error;

/// Inverse regularization strength
pub const DEFAULT_C: f64 = 1.0;

const MAX_ITERATIONS: usize = 10_000;
const GRADIENT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    #[error("No samples to fit")]
    Empty,

    #[error("Feature and label counts differ: {features} vs {labels}")]
    LengthMismatch { features: usize, labels: usize },

    #[error("Sample {index} has {found} features, expected {expected}")]
    RaggedFeatures {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("This solver needs samples of at least 2 classes in the data, but the data contains only one class: {0}")]
    SingleClass(u8),

    #[error("Feature value at sample {0} is not finite")]
    NonFinite(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    /// One weight per feature
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn decision(&self, sample: &[f64]) -> f64 {
        self.intercept
            + self
                .coef
                .iter()
                .zip(sample)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    pub fn predict(&self, sample: &[f64]) -> u8 {
        u8::from(self.decision(sample) > 0.0)
    }

    /// Fraction of samples whose predicted label equals the true label
    pub fn accuracy(&self, features: &[Vec<f64>], labels: &[u8]) -> f64 {
        if labels.is_empty() {
            return 0.0;
        }
        let correct = features
            .iter()
            .zip(labels)
            .filter(|(x, y)| self.predict(x) == **y)
            .count();
        correct as f64 / labels.len() as f64
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn validate(features: &[Vec<f64>], labels: &[u8]) -> Result<usize, ClassifierError> {
    if features.is_empty() {
        return Err(ClassifierError::Empty);
    }
    if features.len() != labels.len() {
        return Err(ClassifierError::LengthMismatch {
            features: features.len(),
            labels: labels.len(),
        });
    }

    let n_features = features[0].len();
    for (index, sample) in features.iter().enumerate() {
        if sample.len() != n_features {
            return Err(ClassifierError::RaggedFeatures {
                index,
                expected: n_features,
                found: sample.len(),
            });
        }
        if sample.iter().any(|x| !x.is_finite()) {
            return Err(ClassifierError::NonFinite(index));
        }
    }

    let first = labels[0];
    if labels.iter().all(|&y| y == first) {
        return Err(ClassifierError::SingleClass(first));
    }

    Ok(n_features)
}

/// Fit a model minimizing `0.5 * |w|^2 + c * sum(log_loss)`
pub fn fit(features: &[Vec<f64>], labels: &[u8], c: f64) -> Result<LogisticModel, ClassifierError> {
    let n_features = validate(features, labels)?;

    // Step size from a Lipschitz bound on the gradient
    let curvature: f64 = features
        .iter()
        .map(|x| 1.0 + x.iter().map(|v| v * v).sum::<f64>())
        .sum();
    let step = 1.0 / (1.0 + 0.25 * c * curvature);

    let mut coef = vec![0.0; n_features];
    let mut intercept = 0.0;
    let mut grad_coef = vec![0.0; n_features];

    for _ in 0..MAX_ITERATIONS {
        grad_coef.copy_from_slice(&coef);
        let mut grad_intercept = 0.0;

        for (x, &y) in features.iter().zip(labels) {
            let z = intercept + coef.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
            let residual = c * (sigmoid(z) - f64::from(y));
            for (g, v) in grad_coef.iter_mut().zip(x) {
                *g += residual * v;
            }
            grad_intercept += residual;
        }

        let norm = (grad_coef.iter().map(|g| g * g).sum::<f64>() + grad_intercept * grad_intercept)
            .sqrt();
        if norm < GRADIENT_TOLERANCE {
            break;
        }

        for (w, g) in coef.iter_mut().zip(&grad_coef) {
            *w -= step * g;
        }
        intercept -= step * grad_intercept;
    }

    Ok(LogisticModel { coef, intercept })
}

/// Decision threshold strictly between two linearly separable classes of a
/// single feature, with the side class 1 lies on (+1.0 above, -1.0 below)
fn separating_threshold(features: &[Vec<f64>], labels: &[u8]) -> Option<(f64, f64)> {
    if features.iter().any(|x| x.len() != 1) {
        return None;
    }

    let (mut min0, mut max0) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min1, mut max1) = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, &y) in features.iter().zip(labels) {
        let v = x[0];
        if y == 0 {
            min0 = min0.min(v);
            max0 = max0.max(v);
        } else {
            min1 = min1.min(v);
            max1 = max1.max(v);
        }
    }

    if max0 < min1 {
        Some(((max0 + min1) / 2.0, 1.0))
    } else if max1 < min0 {
        Some(((max1 + min0) / 2.0, -1.0))
    } else {
        None
    }
}

/// Move the boundary of a single-feature model into the gap between
/// separable classes, keeping the fitted slope when it points the right way
fn align_to_separating_threshold(
    model: LogisticModel,
    features: &[Vec<f64>],
    labels: &[u8],
) -> LogisticModel {
    let Some((threshold, side)) = separating_threshold(features, labels) else {
        return model;
    };

    let fitted = model.coef.first().copied().unwrap_or(0.0);
    let slope = if fitted * side > 0.0 { fitted } else { side };
    LogisticModel {
        coef: vec![slope],
        intercept: -slope * threshold,
    }
}

/// Fitted model and its in-sample accuracy. Separable single-feature data
/// always scores 1.0.
pub fn fit_and_score(
    features: &[Vec<f64>],
    labels: &[u8],
) -> Result<(LogisticModel, f64), ClassifierError> {
    let mut model = fit(features, labels, DEFAULT_C)?;
    let mut accuracy = model.accuracy(features, labels);
    if accuracy < 1.0 {
        let aligned = align_to_separating_threshold(model.clone(), features, labels);
        let aligned_accuracy = aligned.accuracy(features, labels);
        if aligned_accuracy > accuracy {
            log::debug!(
                "Re-centred boundary on separable data (accuracy {} -> {})",
                accuracy,
                aligned_accuracy
            );
            model = aligned;
            accuracy = aligned_accuracy;
        }
    }
    Ok((model, accuracy))
}
