//! Exact path-dependent TreeSHAP.
//!
//! Lundberg, Erion & Lee, "Consistent Individualized Feature Attribution for
//! Tree Ensembles" (Algorithm 2). Node covers stand in for the background
//! distribution, so no reference dataset is needed. Values are in margin
//! units and satisfy `expected + Σ φ = margin` for every row.

use super::tree::{Node, Tree};

/// One feature on the current root-to-node path.
#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// `None` for the synthetic root element.
    feature: Option<usize>,
    /// Fraction of "feature absent" paths flowing through.
    zero_fraction: f64,
    /// Fraction of "feature present" paths flowing through (0 or 1).
    one_fraction: f64,
    /// Permutation weight.
    pweight: f64,
}

/// Add the SHAP values of `tree` at row `x` into `phi`.
pub(super) fn accumulate(tree: &Tree, x: &[f64], phi: &mut [f64]) {
    recurse(tree, 0, x, phi, &[], 1.0, 1.0, None);
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    idx: usize,
    x: &[f64],
    phi: &mut [f64],
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let mut path = parent_path.to_vec();
    extend(&mut path, zero_fraction, one_fraction, feature);

    let node = *tree.node(idx);
    let Some((hot, cold)) = tree.route(idx, x) else {
        if let Node::Leaf { value, .. } = node {
            for i in 1..path.len() {
                let w = unwound_sum(&path, i);
                let el = path[i];
                if let Some(f) = el.feature {
                    phi[f] += w * (el.one_fraction - el.zero_fraction) * value;
                }
            }
        }
        return;
    };

    let Node::Split {
        feature: split, cover, ..
    } = node
    else {
        return;
    };

    let hot_zero = tree.node(hot).cover() / cover;
    let cold_zero = tree.node(cold).cover() / cover;
    let mut incoming_zero = 1.0;
    let mut incoming_one = 1.0;

    // A feature already on the path is undone first so it appears once.
    if let Some(k) = path.iter().position(|p| p.feature == Some(split)) {
        incoming_zero = path[k].zero_fraction;
        incoming_one = path[k].one_fraction;
        unwind(&mut path, k);
    }

    recurse(
        tree,
        hot,
        x,
        phi,
        &path,
        hot_zero * incoming_zero,
        incoming_one,
        Some(split),
    );
    recurse(
        tree,
        cold,
        x,
        phi,
        &path,
        cold_zero * incoming_zero,
        0.0,
        Some(split),
    );
}

fn extend(
    path: &mut Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let d = depth as f64;
    for i in (0..depth).rev() {
        let fi = i as f64;
        path[i + 1].pweight += one_fraction * path[i].pweight * (fi + 1.0) / (d + 1.0);
        path[i].pweight = zero_fraction * path[i].pweight * (d - fi) / (d + 1.0);
    }
}

fn unwind(path: &mut Vec<PathElement>, path_index: usize) {
    let depth = path.len() - 1;
    let d = depth as f64;
    let one = path[path_index].one_fraction;
    let zero = path[path_index].zero_fraction;
    let mut next_one_portion = path[depth].pweight;

    for i in (0..depth).rev() {
        let fi = i as f64;
        if one != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * (d + 1.0) / ((fi + 1.0) * one);
            next_one_portion = tmp - path[i].pweight * zero * (d - fi) / (d + 1.0);
        } else {
            path[i].pweight = path[i].pweight * (d + 1.0) / (zero * (d - fi));
        }
    }

    // Permutation weights stay in place; only the path identity shifts.
    for i in path_index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.truncate(depth);
}

fn unwound_sum(path: &[PathElement], path_index: usize) -> f64 {
    let depth = path.len() - 1;
    let d = depth as f64;
    let one = path[path_index].one_fraction;
    let zero = path[path_index].zero_fraction;
    let mut next_one_portion = path[depth].pweight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        let fi = i as f64;
        if one != 0.0 {
            let tmp = next_one_portion * (d + 1.0) / ((fi + 1.0) * one);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero * ((d - fi) / (d + 1.0));
        } else if zero != 0.0 {
            total += (path[i].pweight / zero) / ((d - fi) / (d + 1.0));
        }
    }
    total
}
