use crate::brief::{hamming_distance, Descriptor, DESCRIPTOR_BITS};

/// A nearest-neighbour pairing between a query and a train descriptor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DescriptorMatch {
    /// Index into the query descriptors.
    pub query_idx: usize,
    /// Index into the train descriptors.
    pub train_idx: usize,
    /// Hamming distance divided by the descriptor length, in `[0, 1]`.
    pub distance: f64,
}

/// Match binary descriptors using brute-force Hamming distance.
///
/// For each descriptor in `query`, finds the nearest neighbor in `train`.
/// Optionally filters matches by cross-check and Lowe's ratio test.
///
/// # Arguments
///
/// * `query` - First set of binary descriptors.
/// * `train` - Second set of binary descriptors.
/// * `cross_check` - If true, keep only mutual nearest neighbors.
/// * `max_ratio` - If set, apply Lowe's ratio test (best / second-best < ratio).
///
/// # Returns
///
/// One match per surviving query descriptor, in query order.
pub fn match_descriptors(
    query: &[Descriptor],
    train: &[Descriptor],
    cross_check: bool,
    max_ratio: Option<f32>,
) -> Vec<DescriptorMatch> {
    let m = query.len();
    let n = train.len();
    if m == 0 || n == 0 {
        return vec![];
    }

    // forward pass, best and second best train index per query
    let mut fwd_best_j = vec![0usize; m];
    let mut fwd_best_dist = vec![u32::MAX; m];
    let mut fwd_second_dist = vec![u32::MAX; m];

    for (i, d1) in query.iter().enumerate() {
        for (j, d2) in train.iter().enumerate() {
            let dist = hamming_distance(d1, d2);
            if dist < fwd_best_dist[i] {
                fwd_second_dist[i] = fwd_best_dist[i];
                fwd_best_dist[i] = dist;
                fwd_best_j[i] = j;
            } else if dist < fwd_second_dist[i] {
                fwd_second_dist[i] = dist;
            }
        }
    }

    let rev_best_i = if cross_check {
        let mut rev = vec![0usize; n];
        let mut rev_dist = vec![u32::MAX; n];
        for (i, d1) in query.iter().enumerate() {
            for (j, d2) in train.iter().enumerate() {
                let dist = hamming_distance(d1, d2);
                if dist < rev_dist[j] {
                    rev_dist[j] = dist;
                    rev[j] = i;
                }
            }
        }
        Some(rev)
    } else {
        None
    };

    let mut matches = Vec::new();
    for i in 0..m {
        let j = fwd_best_j[i];
        let best_dist = fwd_best_dist[i];

        if let Some(ref rev) = rev_best_i {
            if rev[j] != i {
                continue;
            }
        }

        if let Some(ratio) = max_ratio {
            if ratio < 1.0 {
                let second = fwd_second_dist[i];
                let denom = if second == 0 {
                    f32::EPSILON
                } else {
                    second as f32
                };
                if best_dist as f32 / denom >= ratio {
                    continue;
                }
            }
        }

        matches.push(DescriptorMatch {
            query_idx: i,
            train_idx: j,
            distance: best_dist as f64 / DESCRIPTOR_BITS as f64,
        });
    }

    matches
}
