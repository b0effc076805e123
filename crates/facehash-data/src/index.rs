// Pair indexing — arithmetic decomposition of a flat index
//
// A comparison dataset over N images exposes all N^2 ordered pairs,
// self-pairs included.  At FaceScrub scale (~64k images) that is ~4.1e9
// pairs, far too many to materialize, so a pair is addressed by one flat
// integer and recovered by div/mod over the image-list length.

/// Number of ordered pairs over a list of `num_images` images.
pub fn pair_count(num_images: usize) -> usize {
    num_images * num_images
}

/// Decompose a flat pair index into (baseline, compare) positions.
///
/// `baseline = index % num_images`, `compare = index / num_images`: the
/// baseline position varies fastest.  Callers that rely on deterministic
/// enumeration order (e.g. reserving a fixed prefix of pairs) depend on
/// exactly this decomposition.
///
/// Valid for `index < pair_count(num_images)`; the division is meaningless
/// over an empty image list.
pub fn pair_from_index(index: usize, num_images: usize) -> (usize, usize) {
    debug_assert!(num_images > 0, "pair_from_index over an empty image list");
    (index % num_images, index / num_images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_varies_fastest() {
        assert_eq!(pair_from_index(0, 5), (0, 0));
        assert_eq!(pair_from_index(1, 5), (1, 0));
        assert_eq!(pair_from_index(4, 5), (4, 0));
        assert_eq!(pair_from_index(5, 5), (0, 1));
        assert_eq!(pair_from_index(24, 5), (4, 4));
    }

    #[test]
    fn recomposition_roundtrip() {
        let n = 7;
        for index in 0..pair_count(n) {
            let (x, y) = pair_from_index(index, n);
            assert_eq!(y * n + x, index);
        }
    }

    #[test]
    fn covers_full_cross_product() {
        let n = 6;
        let mut seen = std::collections::HashSet::new();
        for index in 0..pair_count(n) {
            let (x, y) = pair_from_index(index, n);
            assert!(x < n && y < n);
            assert!(seen.insert((x, y)), "pair ({x}, {y}) produced twice");
        }
        assert_eq!(seen.len(), n * n);
    }
}
