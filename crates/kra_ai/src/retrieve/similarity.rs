pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn cosine_similarity(a: &[f32], b: &[f32], a_norm: f32, b_norm: f32) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orthogonal_and_parallel_vectors() {
        let a = [1.0, 0.0];
        let b = [0.0, 2.0];
        let c = [3.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b, l2_norm(&a), l2_norm(&b)), 0.0);
        assert!((cosine_similarity(&a, &c, l2_norm(&a), l2_norm(&c)) - 1.0).abs() < 1e-6);
    }
}
