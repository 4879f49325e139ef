use crate::domain::DistanceFunction;

/// `Default` resolves to cosine similarity.
pub fn resolve(function: DistanceFunction) -> DistanceFunction {
    match function {
        DistanceFunction::Default => DistanceFunction::CosineSimilarity,
        other => other,
    }
}

/// Scores `b` against `a`. Vectors of different lengths score `None`.
pub fn score(function: DistanceFunction, a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let pairs = || a.iter().zip(b.iter()).map(|(x, y)| (*x as f64, *y as f64));

    let value = match function {
        DistanceFunction::CosineSimilarity | DistanceFunction::Default => cosine_similarity(a, b),
        DistanceFunction::CosineDistance => 1.0 - cosine_similarity(a, b),
        DistanceFunction::DotProduct => pairs().map(|(x, y)| x * y).sum(),
        DistanceFunction::EuclideanDistance => {
            pairs().map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
        }
        DistanceFunction::EuclideanSquaredDistance => pairs().map(|(x, y)| (x - y).powi(2)).sum(),
        DistanceFunction::Manhattan => pairs().map(|(x, y)| (x - y).abs()).sum(),
        DistanceFunction::Hamming => pairs().filter(|(x, y)| x != y).count() as f64,
    };
    Some(value)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn scores_per_function() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!(approx(score(DistanceFunction::CosineSimilarity, &a, &a), 1.0));
        assert!(approx(score(DistanceFunction::CosineDistance, &a, &b), 1.0));
        assert!(approx(score(DistanceFunction::DotProduct, &[2.0, 3.0], &[4.0, 5.0]), 23.0));
        assert!(approx(score(DistanceFunction::EuclideanDistance, &[0.0, 0.0], &[3.0, 4.0]), 5.0));
        let squared = score(DistanceFunction::EuclideanSquaredDistance, &[0.0, 0.0], &[3.0, 4.0]);
        assert!(approx(squared, 25.0));
        assert!(approx(score(DistanceFunction::Manhattan, &[0.0, 0.0], &[3.0, -4.0]), 7.0));
        assert!(approx(score(DistanceFunction::Hamming, &[1.0, 2.0, 3.0], &[1.0, 0.0, 0.0]), 2.0));
        assert!(approx(score(DistanceFunction::Default, &a, &b), 0.0));
    }

    #[test]
    fn mismatched_lengths_do_not_score() {
        assert_eq!(score(DistanceFunction::DotProduct, &[1.0], &[1.0, 2.0]), None);
    }
}
