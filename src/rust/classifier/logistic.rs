use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{argmax, softmax};
use super::vectorizer::FeatureVector;
use crate::corpus::Sentiment;

const MAX_STEP: f64 = 64.0;
const MIN_STEP: f64 = 1e-12;

/// Raised (as a value, not an error) when the solver stops at its iteration
/// cap before the gradient is below tolerance. The model is still usable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceWarning {
    pub iterations: usize,
    /// Max-abs gradient at the stopping point
    pub gradient_norm: f64,
}

/// Solver settings for [`LogisticRegression`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    /// Inverse L2 regularization strength (`C`)
    pub regularization: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            regularization: 1.0,
            max_iterations: 1000,
            tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone)]
struct Params {
    weights: Array2<f64>,
    intercepts: Array1<f64>,
}

impl Params {
    fn zeros(n_classes: usize, n_features: usize) -> Self {
        Self {
            weights: Array2::zeros((n_classes, n_features)),
            intercepts: Array1::zeros(n_classes),
        }
    }

    /// `self + scale * direction`
    fn offset(&self, direction: &Params, scale: f64) -> Params {
        let mut next = self.clone();
        next.weights.scaled_add(scale, &direction.weights);
        next.intercepts.scaled_add(scale, &direction.intercepts);
        next
    }

    fn difference(&self, other: &Params) -> Params {
        Params {
            weights: &self.weights - &other.weights,
            intercepts: &self.intercepts - &other.intercepts,
        }
    }

    fn max_abs(&self) -> f64 {
        self.weights
            .iter()
            .chain(self.intercepts.iter())
            .fold(0.0, |m, v| m.max(v.abs()))
    }

    fn squared_norm(&self) -> f64 {
        self.weights.iter().chain(self.intercepts.iter()).map(|v| v * v).sum()
    }

    fn scores(&self, x: &FeatureVector) -> Array1<f64> {
        Array1::from_shape_fn(self.intercepts.len(), |c| {
            self.intercepts[c] + x.dot(self.weights.row(c))
        })
    }
}

/// Class-weighted, L2-penalized multinomial cross-entropy:
/// `(1/n) * sum_i s_i * CE_i + ||W||^2 / (2 * C * n)`. Intercepts are not
/// penalized.
struct Objective<'a> {
    features: &'a [FeatureVector],
    targets: Vec<usize>,
    sample_weights: Vec<f64>,
    penalty: f64,
    n_classes: usize,
    n_features: usize,
}

impl Objective<'_> {
    fn sample_loss(scores: &Array1<f64>, target: usize) -> f64 {
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let log_sum_exp = max + scores.iter().map(|s| (s - max).exp()).sum::<f64>().ln();
        log_sum_exp - scores[target]
    }

    fn regularization(&self, params: &Params) -> f64 {
        0.5 * self.penalty * params.weights.iter().map(|w| w * w).sum::<f64>()
    }

    fn loss(&self, params: &Params) -> f64 {
        let n = self.features.len() as f64;
        let data: f64 = self
            .features
            .iter()
            .zip(&self.targets)
            .zip(&self.sample_weights)
            .map(|((x, &y), &s)| s * Self::sample_loss(&params.scores(x), y))
            .sum();
        data / n + self.regularization(params)
    }

    fn loss_and_gradient(&self, params: &Params) -> (f64, Params) {
        let n = self.features.len() as f64;
        let mut gradient = Params::zeros(self.n_classes, self.n_features);
        let mut data = 0.0;

        for ((x, &y), &s) in self.features.iter().zip(&self.targets).zip(&self.sample_weights) {
            let scores = params.scores(x);
            data += s * Self::sample_loss(&scores, y);

            let mut residual = softmax(&scores);
            residual[y] -= 1.0;
            residual *= s / n;

            gradient.intercepts += &residual;
            for (j, value) in x.iter() {
                for c in 0..self.n_classes {
                    gradient.weights[[c, j]] += residual[c] * value;
                }
            }
        }

        gradient.weights.scaled_add(self.penalty, &params.weights);
        (data / n + self.regularization(params), gradient)
    }
}

#[derive(Debug, Clone)]
struct FittedModel {
    classes: Vec<Sentiment>,
    coefficients: Array2<f64>,
    intercepts: Array1<f64>,
    iterations: usize,
    convergence_warning: Option<ConvergenceWarning>,
}

/// Multinomial (softmax) logistic regression with balanced class weights.
///
/// Each sample is weighted by `n / (k * n_c)` so every class contributes
/// equally to the loss regardless of its frequency. The solver is
/// accelerated gradient descent with backtracking line search and adaptive
/// restart; it stops when the max-abs gradient drops to `tolerance` or after
/// `max_iterations` steps, in which case the lowest-loss iterate is kept and a
/// [`ConvergenceWarning`] is recorded.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    params: SolverParams,
    state: Option<FittedModel>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(SolverParams::default())
    }
}

impl LogisticRegression {
    pub fn new(params: SolverParams) -> Self {
        Self { params, state: None }
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Balanced weight per class: `n / (k * n_c)`.
    pub fn class_weights(labels: &[Sentiment]) -> BTreeMap<Sentiment, f64> {
        let mut counts: BTreeMap<Sentiment, usize> = BTreeMap::new();
        for &label in labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        let n = labels.len() as f64;
        let k = counts.len() as f64;
        counts
            .into_iter()
            .map(|(label, count)| (label, n / (k * count as f64)))
            .collect()
    }

    /// Trains on `features` / `labels`, replacing any previous fit.
    ///
    /// # Errors
    /// - `ValidationError` if the inputs are empty, of different lengths, or
    ///   the vectors disagree on dimension
    /// - `InsufficientDataError` if fewer than two distinct classes are present
    pub fn fit(&mut self, features: &[FeatureVector], labels: &[Sentiment]) -> Result<(), ClassifierError> {
        if features.is_empty() {
            return Err(ClassifierError::validation("Cannot fit on an empty training set"));
        }
        if features.len() != labels.len() {
            return Err(ClassifierError::validation(format!(
                "Got {} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }
        let n_features = features[0].dim();
        if let Some(pos) = features.iter().position(|x| x.dim() != n_features) {
            return Err(ClassifierError::validation(format!(
                "Feature vector {} has dimension {}, expected {}",
                pos,
                features[pos].dim(),
                n_features
            )));
        }

        let classes: Vec<Sentiment> = labels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if classes.len() < 2 {
            return Err(ClassifierError::insufficient_data(format!(
                "Need samples of at least 2 classes, got {:?}",
                classes
            )));
        }

        let weights = Self::class_weights(labels);
        let objective = Objective {
            features,
            targets: labels
                .iter()
                .map(|label| classes.iter().position(|c| c == label).unwrap_or(0))
                .collect(),
            sample_weights: labels.iter().map(|label| weights[label]).collect(),
            penalty: 1.0 / (self.params.regularization * features.len() as f64),
            n_classes: classes.len(),
            n_features,
        };

        info!(
            "Fitting logistic regression: {} samples, {} features, {} classes",
            features.len(),
            n_features,
            classes.len()
        );
        let (solution, iterations, convergence_warning) = self.solve(&objective);

        if let Some(warning) = &convergence_warning {
            warn!(
                "Solver did not converge within {} iterations (gradient norm {:.3e} > tolerance {:.1e}); keeping best iterate",
                warning.iterations, warning.gradient_norm, self.params.tolerance
            );
        } else {
            info!("Solver converged after {} iterations", iterations);
        }

        self.state = Some(FittedModel {
            classes,
            coefficients: solution.weights,
            intercepts: solution.intercepts,
            iterations,
            convergence_warning,
        });
        Ok(())
    }

    fn solve(&self, objective: &Objective<'_>) -> (Params, usize, Option<ConvergenceWarning>) {
        let mut current = Params::zeros(objective.n_classes, objective.n_features);
        let mut previous = current.clone();
        let mut current_loss = objective.loss(&current);
        let mut best = (current_loss, current.clone());
        let mut since_restart = 0usize;
        let mut step = 1.0;
        let mut gradient_norm = f64::INFINITY;

        for iteration in 1..=self.params.max_iterations {
            let beta = since_restart as f64 / (since_restart as f64 + 3.0);
            let lookahead = current.offset(&current.difference(&previous), beta);
            let (lookahead_loss, gradient) = objective.loss_and_gradient(&lookahead);

            gradient_norm = gradient.max_abs();
            if gradient_norm <= self.params.tolerance {
                debug!("Gradient norm {:.3e} at iteration {}", gradient_norm, iteration);
                return (lookahead, iteration - 1, None);
            }

            let squared = gradient.squared_norm();
            let (candidate, candidate_loss) = loop {
                let candidate = lookahead.offset(&gradient, -step);
                let loss = objective.loss(&candidate);
                if loss <= lookahead_loss - 0.5 * step * squared || step <= MIN_STEP {
                    break (candidate, loss);
                }
                step *= 0.5;
            };

            if candidate_loss > current_loss {
                // momentum overshot: drop it and take a plain step next time
                since_restart = 0;
                previous = current.clone();
            } else {
                previous = std::mem::replace(&mut current, candidate);
                current_loss = candidate_loss;
                since_restart += 1;
                if current_loss < best.0 {
                    best = (current_loss, current.clone());
                }
            }
            step = (step * 2.0).min(MAX_STEP);
        }

        let iterations = self.params.max_iterations;
        (
            best.1,
            iterations,
            Some(ConvergenceWarning {
                iterations,
                gradient_norm,
            }),
        )
    }

    fn fitted(&self) -> Result<&FittedModel, ClassifierError> {
        self.state
            .as_ref()
            .ok_or_else(|| ClassifierError::not_fitted("LogisticRegression must be fitted before prediction"))
    }

    /// Classes in model order (lexicographic)
    pub fn classes(&self) -> Result<&[Sentiment], ClassifierError> {
        self.fitted().map(|m| m.classes.as_slice())
    }

    /// `classes x features` coefficient matrix
    pub fn coefficients(&self) -> Result<&Array2<f64>, ClassifierError> {
        self.fitted().map(|m| &m.coefficients)
    }

    pub fn intercepts(&self) -> Result<&Array1<f64>, ClassifierError> {
        self.fitted().map(|m| &m.intercepts)
    }

    /// Solver steps taken, `None` before fit
    pub fn iterations(&self) -> Option<usize> {
        self.state.as_ref().map(|m| m.iterations)
    }

    pub fn convergence_warning(&self) -> Option<ConvergenceWarning> {
        self.state.as_ref().and_then(|m| m.convergence_warning)
    }

    fn check_dimension(model: &FittedModel, x: &FeatureVector) -> Result<(), ClassifierError> {
        if x.dim() != model.coefficients.ncols() {
            return Err(ClassifierError::validation(format!(
                "Feature vector has dimension {}, model expects {}",
                x.dim(),
                model.coefficients.ncols()
            )));
        }
        Ok(())
    }

    /// Raw per-class scores `W x + b` in class order
    pub fn decision_function(&self, x: &FeatureVector) -> Result<Array1<f64>, ClassifierError> {
        let model = self.fitted()?;
        Self::check_dimension(model, x)?;
        Ok(Array1::from_shape_fn(model.classes.len(), |c| {
            model.intercepts[c] + x.dot(model.coefficients.row(c))
        }))
    }

    fn probabilities(&self, x: &FeatureVector) -> Result<Array1<f64>, ClassifierError> {
        Ok(softmax(&self.decision_function(x)?))
    }

    /// One probability per known class; the values sum to 1.
    pub fn predict_proba(&self, x: &FeatureVector) -> Result<BTreeMap<Sentiment, f64>, ClassifierError> {
        let probabilities = self.probabilities(x)?;
        let classes = self.classes()?;
        Ok(classes.iter().copied().zip(probabilities.iter().copied()).collect())
    }

    /// Most probable class; exact ties go to the lexicographically smallest label.
    pub fn predict(&self, x: &FeatureVector) -> Result<Sentiment, ClassifierError> {
        let probabilities = self.probabilities(x)?;
        let classes = self.classes()?;
        Ok(classes[argmax(&probabilities.to_vec())])
    }

    pub fn predict_batch(&self, features: &[FeatureVector]) -> Result<Vec<Sentiment>, ClassifierError> {
        features.iter().map(|x| self.predict(x)).collect()
    }

    /// Feature indices with the largest coefficients for `class`, descending,
    /// ties by index.
    ///
    /// # Errors
    /// - `ValidationError` if the model was not trained on `class`
    pub fn top_coefficients(&self, class: Sentiment, top_n: usize) -> Result<Vec<(usize, f64)>, ClassifierError> {
        let model = self.fitted()?;
        let row = model
            .classes
            .iter()
            .position(|&c| c == class)
            .ok_or_else(|| ClassifierError::validation(format!("Model was not trained on class '{}'", class)))?;

        let mut ranked: Vec<(usize, f64)> = model.coefficients.row(row).iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(top_n);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(dim: usize, index: usize) -> FeatureVector {
        FeatureVector::from_sorted(dim, [(index, 1.0)])
    }

    fn separable() -> (Vec<FeatureVector>, Vec<Sentiment>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..4 {
            features.push(one_hot(3, 0));
            labels.push(Sentiment::Negative);
            features.push(one_hot(3, 1));
            labels.push(Sentiment::Neutral);
            features.push(one_hot(3, 2));
            labels.push(Sentiment::Positive);
        }
        (features, labels)
    }

    #[test]
    fn test_fit_and_predict() {
        let (features, labels) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&features, &labels).unwrap();

        assert_eq!(model.classes().unwrap(), &Sentiment::ALL);
        assert_eq!(model.predict(&one_hot(3, 0)).unwrap(), Sentiment::Negative);
        assert_eq!(model.predict(&one_hot(3, 1)).unwrap(), Sentiment::Neutral);
        assert_eq!(model.predict(&one_hot(3, 2)).unwrap(), Sentiment::Positive);
        assert!(model.convergence_warning().is_none());
    }

    #[test]
    fn test_probabilities_are_valid() {
        let (features, labels) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&features, &labels).unwrap();

        for x in features.iter().chain([FeatureVector::zeros(3)].iter()) {
            let proba = model.predict_proba(x).unwrap();
            assert_eq!(proba.len(), 3);
            let sum: f64 = proba.values().sum();
            assert!((sum - 1.0).abs() < 1e-6);
            assert!(proba.values().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn test_class_weights_balanced() {
        let labels = [Sentiment::Positive, Sentiment::Positive, Sentiment::Positive, Sentiment::Negative];
        let weights = LogisticRegression::class_weights(&labels);
        assert!((weights[&Sentiment::Positive] - 4.0 / 6.0).abs() < 1e-12);
        assert!((weights[&Sentiment::Negative] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_imbalanced_labels_do_not_bias_empty_input() {
        // 6 positive vs 2 negative samples with mirrored features: balanced weights
        // keep the intercepts equal, so the zero vector is close to 50/50
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..6 {
            features.push(one_hot(2, 1));
            labels.push(Sentiment::Positive);
        }
        for _ in 0..2 {
            features.push(one_hot(2, 0));
            labels.push(Sentiment::Negative);
        }
        let mut model = LogisticRegression::default();
        model.fit(&features, &labels).unwrap();
        let proba = model.predict_proba(&FeatureVector::zeros(2)).unwrap();
        assert!((proba[&Sentiment::Positive] - proba[&Sentiment::Negative]).abs() < 0.05);
    }

    #[test]
    fn test_exact_tie_prefers_smallest_label() {
        let model = LogisticRegression {
            params: SolverParams::default(),
            state: Some(FittedModel {
                classes: Sentiment::ALL.to_vec(),
                coefficients: Array2::zeros((3, 2)),
                intercepts: Array1::zeros(3),
                iterations: 0,
                convergence_warning: None,
            }),
        };
        assert_eq!(model.predict(&FeatureVector::zeros(2)).unwrap(), Sentiment::Negative);

        let model = LogisticRegression {
            state: model.state.map(|mut m| {
                m.intercepts = Array1::from(vec![0.0, 1.0, 1.0]);
                m
            }),
            ..LogisticRegression::default()
        };
        assert_eq!(model.predict(&FeatureVector::zeros(2)).unwrap(), Sentiment::Neutral);
    }

    #[test]
    fn test_iteration_cap_is_not_fatal() {
        let (features, labels) = separable();
        let mut model = LogisticRegression::new(SolverParams {
            max_iterations: 2,
            ..SolverParams::default()
        });
        model.fit(&features, &labels).unwrap();

        let warning = model.convergence_warning().expect("expected a convergence warning");
        assert_eq!(warning.iterations, 2);
        assert!(warning.gradient_norm > 1e-4);
        assert_eq!(model.predict(&one_hot(3, 2)).unwrap(), Sentiment::Positive);
    }

    #[test]
    fn test_errors() {
        let model = LogisticRegression::default();
        assert!(matches!(model.predict(&one_hot(3, 0)), Err(ClassifierError::NotFittedError(_))));
        assert!(matches!(model.predict_proba(&one_hot(3, 0)), Err(ClassifierError::NotFittedError(_))));

        let mut model = LogisticRegression::default();
        let single = vec![one_hot(2, 0), one_hot(2, 1)];
        assert!(matches!(
            model.fit(&single, &[Sentiment::Positive, Sentiment::Positive]),
            Err(ClassifierError::InsufficientDataError(_))
        ));
        assert!(matches!(
            model.fit(&single, &[Sentiment::Positive]),
            Err(ClassifierError::ValidationError(_))
        ));
        assert!(matches!(model.fit(&[], &[]), Err(ClassifierError::ValidationError(_))));

        let (features, labels) = separable();
        model.fit(&features, &labels).unwrap();
        assert!(matches!(model.predict(&one_hot(5, 0)), Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_top_coefficients() {
        let (features, labels) = separable();
        let mut model = LogisticRegression::default();
        model.fit(&features, &labels).unwrap();

        let top = model.top_coefficients(Sentiment::Positive, 1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, 2);
        assert!(top[0].1 > 0.0);

        let all = model.top_coefficients(Sentiment::Negative, 10).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].1 >= w[1].1));
    }
}
