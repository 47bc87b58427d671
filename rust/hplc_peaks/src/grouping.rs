use tracing::debug;

use crate::models::Peak;

/// Nests peaks whose interval lies strictly inside another peak's interval.
///
/// Every candidate collects the others it strictly contains as children,
/// ordered by apex. Peaks that became someone's child are removed from the
/// top level. Partially overlapping peaks are left side by side.
pub fn fold_peaks(candidates: Vec<Peak>) -> Vec<Peak> {
    let child_sets: Vec<Vec<usize>> = candidates
        .iter()
        .enumerate()
        .map(|(i, parent)| {
            candidates
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && parent.contains(other))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    let mut is_child = vec![false; candidates.len()];
    for j in child_sets.iter().flatten() {
        is_child[*j] = true;
    }

    let folded: Vec<Peak> = child_sets
        .iter()
        .enumerate()
        .filter(|(i, _)| !is_child[*i])
        .map(|(i, children)| {
            let mut parent = candidates[i].clone();
            parent.children = children.iter().map(|j| candidates[*j].clone()).collect();
            parent.children.sort_by(|a, b| a.apex.total_cmp(&b.apex));
            parent
        })
        .collect();

    debug!(
        "Folded {} candidates into {} top-level peaks",
        candidates.len(),
        folded.len()
    );
    folded
}
