//! Rank-based discrimination metrics (AUC / Gini)

/// Calculate weighted AUC using the weighted Mann-Whitney U statistic.
///
/// Input is `(score, target, weight)` sorted ascending by score. Ties share
/// the weighted midpoint rank.
pub fn weighted_auc(sorted_pairs: &[(f64, i32, f64)]) -> f64 {
    if sorted_pairs.is_empty() {
        return 0.5;
    }

    let total_pos: f64 = sorted_pairs
        .iter()
        .filter(|(_, t, _)| *t == 1)
        .map(|(_, _, w)| w)
        .sum();
    let total_neg: f64 = sorted_pairs
        .iter()
        .filter(|(_, t, _)| *t == 0)
        .map(|(_, _, w)| w)
        .sum();

    if total_pos <= 0.0 || total_neg <= 0.0 {
        return 0.5;
    }

    let n = sorted_pairs.len();
    let mut weighted_rank_sum_pos = 0.0;
    let mut cumulative_weight = 0.0;
    let mut i = 0;

    while i < n {
        let current_value = sorted_pairs[i].0;
        let mut j = i;

        while j < n && (sorted_pairs[j].0 - current_value).abs() < 1e-10 {
            j += 1;
        }

        let group_weight: f64 = sorted_pairs[i..j].iter().map(|(_, _, w)| w).sum();
        let avg_rank = cumulative_weight + group_weight / 2.0;

        for &(_, target, weight) in &sorted_pairs[i..j] {
            if target == 1 {
                weighted_rank_sum_pos += avg_rank * weight;
            }
        }

        cumulative_weight += group_weight;
        i = j;
    }

    let u = weighted_rank_sum_pos - total_pos * total_pos / 2.0;

    (u / (total_pos * total_neg)).clamp(0.0, 1.0)
}

/// Gini = 2 * AUC - 1 over unsorted `(score, target, weight)` triples
pub fn gini(mut scored: Vec<(f64, i32, f64)>) -> f64 {
    if scored.is_empty() {
        return 0.0;
    }
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    2.0 * weighted_auc(&scored) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_auc_calculation() {
        // Perfect separation: all 0s have lower values than all 1s
        let perfect = vec![(1.0, 0, 1.0), (2.0, 0, 1.0), (3.0, 1, 1.0), (4.0, 1, 1.0)];
        let auc = weighted_auc(&perfect);
        assert!((auc - 1.0).abs() < 0.01, "Perfect separation should give AUC ≈ 1.0, got {}", auc);

        // No discrimination: 0s and 1s share values
        let no_disc = vec![(1.0, 0, 1.0), (1.0, 1, 1.0), (2.0, 0, 1.0), (2.0, 1, 1.0)];
        let auc = weighted_auc(&no_disc);
        assert!((auc - 0.5).abs() < 0.1, "No discrimination should give AUC ≈ 0.5, got {}", auc);

        let partial = vec![(1.0, 0, 1.0), (2.0, 1, 1.0), (3.0, 0, 1.0), (4.0, 1, 1.0)];
        let auc = weighted_auc(&partial);
        assert!(auc > 0.5 && auc < 1.0, "Partial discrimination AUC out of range: {}", auc);
    }

    #[test]
    fn test_single_class_is_uninformative() {
        let only_pos = vec![(1.0, 1, 1.0), (2.0, 1, 1.0)];
        assert_eq!(weighted_auc(&only_pos), 0.5);
        assert_eq!(gini(only_pos), 0.0);
    }

    #[test]
    fn test_gini_sorts_its_input() {
        let unsorted = vec![(4.0, 1, 1.0), (1.0, 0, 1.0), (3.0, 1, 1.0), (2.0, 0, 1.0)];
        assert!((gini(unsorted) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_inverted_scores_give_negative_gini() {
        let inverted = vec![(1.0, 1, 1.0), (2.0, 1, 1.0), (3.0, 0, 1.0), (4.0, 0, 1.0)];
        assert!(gini(inverted) < -0.9);
    }
}
