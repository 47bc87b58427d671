/// Fills the gaps of a partially known signal by linear interpolation over
/// `axis`.
///
/// Positions before the first known value take that value, positions after
/// the last known value take the last one. Returns `None` if nothing is known.
///
/// ```
/// use hplc_peaks::utils::interpolation::fill_gaps;
///
/// let axis = [0.0, 1.0, 2.0, 3.0, 4.0];
/// let known = [None, Some(2.0), None, Some(4.0), None];
/// assert_eq!(fill_gaps(&axis, &known), Some(vec![2.0, 2.0, 3.0, 4.0, 4.0]));
/// ```
pub fn fill_gaps(axis: &[f64], known: &[Option<f64>]) -> Option<Vec<f64>> {
    assert_eq!(axis.len(), known.len());
    let anchors: Vec<usize> = known
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    let (&first, &last) = (anchors.first()?, anchors.last()?);

    let mut out = Vec::with_capacity(axis.len());
    let mut next_anchor = 0;
    for (i, t) in axis.iter().enumerate() {
        if let Some(v) = known[i] {
            out.push(v);
            continue;
        }
        if i < first {
            out.push(known[first].unwrap_or_default());
            continue;
        }
        if i > last {
            out.push(known[last].unwrap_or_default());
            continue;
        }
        while anchors[next_anchor + 1] < i {
            next_anchor += 1;
        }
        let (left, right) = (anchors[next_anchor], anchors[next_anchor + 1]);
        let (lv, rv) = (
            known[left].unwrap_or_default(),
            known[right].unwrap_or_default(),
        );
        let frac = (t - axis[left]) / (axis[right] - axis[left]);
        out.push(lv + frac * (rv - lv));
    }
    Some(out)
}

/// Snaps each `(time, value)` point onto the closest position of `axis`
/// within `tolerance`.
///
/// Every axis position looks up its nearest point (ties go to the earlier
/// point) and takes its value when the distance is within `tolerance`.
/// `points` must be sorted by time.
pub fn snap_nearest(axis: &[f64], points: &[(f64, f64)], tolerance: f64) -> Vec<Option<f64>> {
    if points.is_empty() {
        return vec![None; axis.len()];
    }
    axis.iter()
        .map(|t| {
            let pos = points.partition_point(|p| p.0 < *t);
            let candidates = [pos.checked_sub(1), Some(pos)];
            candidates
                .iter()
                .flatten()
                .filter_map(|&i| points.get(i))
                .map(|p| ((p.0 - t).abs(), p.1))
                .fold(None, |best: Option<(f64, f64)>, cand| match best {
                    Some(b) if b.0 <= cand.0 => Some(b),
                    _ => Some(cand),
                })
                .filter(|(dist, _)| *dist <= tolerance)
                .map(|(_, v)| v)
        })
        .collect()
}
