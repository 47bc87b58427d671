/// Indices of local maxima.
///
/// A maximum is a sample strictly above its left neighbour and strictly above
/// the first different sample to its right. Flat tops report their midpoint
/// (rounded down). The first and last samples are never maxima.
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let n = x.len();
    let mut out = Vec::new();
    if n < 3 {
        return out;
    }
    let mut i = 1;
    while i < n - 1 {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                out.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    out
}

/// Drops maxima closer than `distance` samples to a higher one.
///
/// Maxima are visited from highest to lowest; every surviving maximum
/// removes its lower neighbours within `distance`. `peaks` must be sorted.
pub fn select_by_distance(peaks: &[usize], x: &[f64], distance: usize) -> Vec<usize> {
    if distance <= 1 {
        return peaks.to_vec();
    }
    let mut keep = vec![true; peaks.len()];
    let mut priority: Vec<usize> = (0..peaks.len()).collect();
    priority.sort_by(|a, b| x[peaks[*a]].total_cmp(&x[peaks[*b]]));

    for &current in priority.iter().rev() {
        if !keep[current] {
            continue;
        }
        let mut k = current;
        while k > 0 && peaks[current] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = current + 1;
        while k < peaks.len() && peaks[k] - peaks[current] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_maxima() {
        let x = [0.0, 1.0, 0.0, 2.0, 3.0, 1.0, 1.0];
        assert_eq!(local_maxima(&x), vec![1, 4]);
    }

    #[test]
    fn test_plateau_reports_midpoint() {
        let x = [0.0, 2.0, 2.0, 2.0, 2.0, 0.0];
        assert_eq!(local_maxima(&x), vec![2]);
        // A plateau running into the edge is not a maximum.
        let x = [0.0, 2.0, 2.0, 2.0];
        assert!(local_maxima(&x).is_empty());
    }

    #[test]
    fn test_edges_are_not_maxima() {
        assert!(local_maxima(&[5.0, 1.0, 0.0]).is_empty());
        assert!(local_maxima(&[5.0, 1.0]).is_empty());
    }

    #[test]
    fn test_distance_keeps_highest() {
        let x = [0.0, 3.0, 0.0, 5.0, 0.0, 1.0, 0.0, 0.0, 0.0, 4.0, 0.0];
        let peaks = local_maxima(&x);
        assert_eq!(peaks, vec![1, 3, 5, 9]);
        assert_eq!(select_by_distance(&peaks, &x, 3), vec![3, 9]);
        assert_eq!(select_by_distance(&peaks, &x, 1), peaks);
    }
}
