//! Grouped cross-validation splits and class weighting
//!
//! Folds never split a group across train and test, so a team's matches
//! are held out together and the score reflects generalization to teams
//! the model did not fit on.

use std::collections::HashMap;

/// Grouped k-fold splitter. Groups are assigned whole to folds, largest
/// group first into the currently lightest fold, so fold sizes stay
/// balanced.
pub struct GroupKFold {
    folds: usize,
}

impl GroupKFold {
    pub fn new(folds: usize) -> Self {
        GroupKFold { folds: folds.max(2) }
    }

    /// Produce (train_indices, test_indices) per fold.
    ///
    /// When there are fewer distinct groups than folds, the fold count is
    /// clamped to the group count.
    pub fn split(&self, groups: &[String]) -> Vec<(Vec<usize>, Vec<usize>)> {
        let mut sizes: HashMap<&str, usize> = HashMap::new();
        for g in groups {
            *sizes.entry(g.as_str()).or_insert(0) += 1;
        }

        let folds = if sizes.len() < self.folds {
            log::warn!(
                "Only {} distinct groups for {} folds, clamping",
                sizes.len(),
                self.folds
            );
            sizes.len().max(1)
        } else {
            self.folds
        };

        // Largest group first, name as the deterministic tie-break
        let mut ordered: Vec<(&str, usize)> = sizes.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut fold_of: HashMap<&str, usize> = HashMap::new();
        let mut fold_sizes = vec![0usize; folds];
        for (group, size) in ordered {
            let lightest = fold_sizes
                .iter()
                .enumerate()
                .min_by_key(|(_, s)| **s)
                .map(|(i, _)| i)
                .unwrap_or(0);
            fold_of.insert(group, lightest);
            fold_sizes[lightest] += size;
        }

        (0..folds)
            .map(|fold| {
                let mut train = Vec::new();
                let mut test = Vec::new();
                for (i, g) in groups.iter().enumerate() {
                    if fold_of[g.as_str()] == fold {
                        test.push(i);
                    } else {
                        train.push(i);
                    }
                }
                (train, test)
            })
            .collect()
    }
}

/// Balanced class weights: n_samples / (n_classes * count(class)).
/// Returns the sorted class labels alongside their weights.
pub fn balanced_class_weights(labels: &[String]) -> (Vec<String>, Vec<f32>) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }

    let mut classes: Vec<String> = counts.keys().map(|s| s.to_string()).collect();
    classes.sort();

    let n = labels.len() as f32;
    let k = classes.len() as f32;
    let weights = classes
        .iter()
        .map(|c| n / (k * counts[c.as_str()] as f32))
        .collect();
    (classes, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn groups(spec: &[(&str, usize)]) -> Vec<String> {
        spec.iter()
            .flat_map(|(name, count)| std::iter::repeat(name.to_string()).take(*count))
            .collect()
    }

    #[test]
    fn splits_partition_all_indices() {
        let g = groups(&[("A", 4), ("B", 3), ("C", 2), ("D", 2), ("E", 1)]);
        let splits = GroupKFold::new(3).split(&g);
        assert_eq!(splits.len(), 3);

        let mut seen = HashSet::new();
        for (train, test) in &splits {
            assert_eq!(train.len() + test.len(), g.len());
            for &i in test {
                assert!(seen.insert(i), "index {} tested twice", i);
            }
        }
        assert_eq!(seen.len(), g.len());
    }

    #[test]
    fn no_group_spans_train_and_test() {
        let g = groups(&[("A", 3), ("B", 3), ("C", 3), ("D", 3)]);
        for (train, test) in GroupKFold::new(4).split(&g) {
            let train_groups: HashSet<&str> = train.iter().map(|&i| g[i].as_str()).collect();
            let test_groups: HashSet<&str> = test.iter().map(|&i| g[i].as_str()).collect();
            assert!(train_groups.is_disjoint(&test_groups));
        }
    }

    #[test]
    fn clamps_folds_to_group_count() {
        let g = groups(&[("A", 5), ("B", 5)]);
        let splits = GroupKFold::new(5).split(&g);
        assert_eq!(splits.len(), 2);
    }

    #[test]
    fn balanced_weights_invert_frequency() {
        let labels: Vec<String> = ["3-0", "3-0", "3-0", "3-1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (classes, weights) = balanced_class_weights(&labels);
        assert_eq!(classes, vec!["3-0", "3-1"]);
        // 4 / (2 * 3) and 4 / (2 * 1)
        assert!((weights[0] - 4.0 / 6.0).abs() < 1e-6);
        assert!((weights[1] - 2.0).abs() < 1e-6);
    }
}
