use std::collections::BTreeMap;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::classifier::ClassifierError;
use crate::corpus::Sentiment;

/// Disjoint train/test row indices into a corpus, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn group_by_class(labels: &[Sentiment]) -> BTreeMap<Sentiment, Vec<usize>> {
    let mut groups: BTreeMap<Sentiment, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(i);
    }
    groups
}

fn check_groups(groups: &BTreeMap<Sentiment, Vec<usize>>, min_members: usize) -> Result<(), ClassifierError> {
    if groups.is_empty() {
        return Err(ClassifierError::insufficient_data("cannot split an empty corpus"));
    }
    if let Some((label, members)) = groups.iter().find(|(_, members)| members.len() < min_members) {
        return Err(ClassifierError::insufficient_data(format!(
            "class '{}' has {} example(s), at least {} required",
            label,
            members.len(),
            min_members
        )));
    }
    if groups.len() < 2 {
        return Err(ClassifierError::insufficient_data(format!(
            "need at least 2 classes, found only '{}'",
            groups.keys().map(Sentiment::as_str).collect::<Vec<_>>().join(", ")
        )));
    }
    Ok(())
}

/// Splits row indices so every class keeps its share in both halves.
///
/// Classes are processed in label order; each is shuffled with one
/// `StdRng` seeded from `seed` and contributes `round(n_c * test_fraction)`
/// rows to the test split, clamped to `[1, n_c - 1]`.
///
/// # Errors
/// - `ConfigError` if `test_fraction` is not in (0, 1)
/// - `InsufficientDataError` for an empty input, a single class, or a class
///   with fewer than 2 examples
pub fn stratified_split(labels: &[Sentiment], test_fraction: f64, seed: u64) -> Result<Split, ClassifierError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ClassifierError::config(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    let groups = group_by_class(labels);
    check_groups(&groups, 2)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();
    for (label, mut members) in groups {
        members.shuffle(&mut rng);
        let n = members.len();
        let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
        debug!("Class '{}': {} train, {} test", label, n - n_test, n_test);
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

/// Partitions row indices into `folds` stratified folds and returns one
/// [`Split`] per fold, with that fold as the test side.
///
/// # Errors
/// - `ConfigError` if `folds < 2`
/// - `InsufficientDataError` for an empty input, a single class, or a class
///   with fewer members than `folds`
pub fn stratified_k_fold(labels: &[Sentiment], folds: usize, seed: u64) -> Result<Vec<Split>, ClassifierError> {
    if folds < 2 {
        return Err(ClassifierError::config(format!("cv_folds must be at least 2, got {}", folds)));
    }
    let groups = group_by_class(labels);
    check_groups(&groups, folds)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = vec![0usize; labels.len()];
    let mut offset = 0;
    for (_, mut members) in groups {
        members.shuffle(&mut rng);
        for (position, &row) in members.iter().enumerate() {
            assignment[row] = (offset + position) % folds;
        }
        offset += members.len();
    }

    Ok((0..folds)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) = (0..labels.len()).partition(|&row| assignment[row] == fold);
            Split { train, test }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(counts: [usize; 3]) -> Vec<Sentiment> {
        Sentiment::ALL
            .iter()
            .zip(counts)
            .flat_map(|(&label, n)| std::iter::repeat(label).take(n))
            .collect()
    }

    #[test]
    fn test_split_is_stratified_and_disjoint() {
        let labels = labels([10, 10, 10]);
        let split = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(split.train.len(), 24);
        assert_eq!(split.test.len(), 6);
        for label in Sentiment::ALL {
            assert_eq!(split.test.iter().filter(|&&i| labels[i] == label).count(), 2);
        }
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_deterministic() {
        let labels = labels([7, 5, 9]);
        assert_eq!(
            stratified_split(&labels, 0.3, 11).unwrap(),
            stratified_split(&labels, 0.3, 11).unwrap()
        );
        assert_ne!(
            stratified_split(&labels, 0.3, 11).unwrap(),
            stratified_split(&labels, 0.3, 12).unwrap()
        );
    }

    #[test]
    fn test_small_classes_are_clamped() {
        // round(2 * 0.2) = 0 is raised to 1; round(3 * 0.9) = 3 is lowered to 2
        let split = stratified_split(&labels([2, 0, 2]), 0.2, 1).unwrap();
        assert_eq!(split.test.len(), 2);
        let split = stratified_split(&labels([3, 3, 0]), 0.9, 1).unwrap();
        assert_eq!(split.train.len(), 2);
    }

    #[test]
    fn test_split_errors() {
        assert!(matches!(
            stratified_split(&[], 0.2, 42),
            Err(ClassifierError::InsufficientDataError(_))
        ));
        assert!(matches!(
            stratified_split(&labels([5, 1, 5]), 0.2, 42),
            Err(ClassifierError::InsufficientDataError(_))
        ));
        assert!(matches!(
            stratified_split(&labels([0, 6, 0]), 0.2, 42),
            Err(ClassifierError::InsufficientDataError(_))
        ));
        assert!(matches!(
            stratified_split(&labels([4, 4, 4]), 0.0, 42),
            Err(ClassifierError::ConfigError(_))
        ));
    }

    #[test]
    fn test_k_fold_covers_every_row_once() {
        let labels = labels([6, 5, 7]);
        let folds = stratified_k_fold(&labels, 3, 42).unwrap();
        assert_eq!(folds.len(), 3);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..labels.len()).collect::<Vec<_>>());

        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), labels.len());
            for label in Sentiment::ALL {
                let n = fold.test.iter().filter(|&&i| labels[i] == label).count();
                assert!(n == 1 || n == 2 || n == 3, "{} {}", label, n);
                assert!(fold.train.iter().any(|&i| labels[i] == label));
            }
        }
    }

    #[test]
    fn test_k_fold_errors() {
        assert!(matches!(
            stratified_k_fold(&labels([5, 5, 5]), 1, 42),
            Err(ClassifierError::ConfigError(_))
        ));
        assert!(matches!(
            stratified_k_fold(&labels([5, 2, 5]), 3, 42),
            Err(ClassifierError::InsufficientDataError(_))
        ));
    }
}
