use crate::classifier::labels::Labels;
use crate::models::Prediction;

pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}

/// The `top_k` highest scores, best first, as labelled predictions.
pub fn rank(scores: &[f32], labels: &Labels, top_k: usize) -> Vec<Prediction> {
    let mut indexed: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    indexed.truncate(top_k);

    indexed
        .into_iter()
        .map(|(index, score)| {
            Prediction::new(labels.name(index, scores.len()), score.clamp(0.0, 1.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn softmax_sums_to_one_and_keeps_order() {
        let probs = softmax(&[2.0, 1.0, 0.1]);

        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);

        assert_eq!(probs, vec![0.5, 0.5]);
    }

    #[test]
    fn rank_keeps_top_k_descending() {
        let labels = Labels::parse("tench\ngoldfish\nshark\ntiger shark");

        let predictions = rank(&[0.1, 0.6, 0.05, 0.25], &labels, 3);

        assert_eq!(
            predictions,
            vec![
                Prediction::new("goldfish", 0.6),
                Prediction::new("tiger shark", 0.25),
                Prediction::new("tench", 0.1),
            ]
        );
    }

    #[test]
    fn rank_skips_nan_and_clamps() {
        let labels = Labels::parse("a\nb\nc");

        let predictions = rank(&[f32::NAN, 1.5, -0.2], &labels, 5);

        assert_eq!(
            predictions,
            vec![Prediction::new("b", 1.0), Prediction::new("c", 0.0)]
        );
    }

    #[test]
    fn rank_of_empty_output_is_empty() {
        assert!(rank(&[], &Labels::default(), 3).is_empty());
    }
}
