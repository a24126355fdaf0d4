//! Regression tree evaluation.

use super::format::TreeDoc;

/// One node of a regression tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node {
    Leaf {
        value: f64,
        cover: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        default_left: bool,
        cover: f64,
    },
}

impl Node {
    #[must_use]
    pub fn cover(&self) -> f64 {
        match *self {
            Self::Leaf { cover, .. } | Self::Split { cover, .. } => cover,
        }
    }
}

/// A regression tree stored as a flat node array rooted at index 0.
///
/// Children always have a larger index than their parent, so every walk
/// terminates.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Build a tree from nodes, checking the structural invariants.
    ///
    /// # Errors
    /// Describes the first violated invariant.
    pub fn new(nodes: Vec<Node>, num_feature: usize) -> Result<Self, String> {
        if nodes.is_empty() {
            return Err("tree has no nodes".into());
        }

        for (idx, node) in nodes.iter().enumerate() {
            match *node {
                Node::Leaf { cover, .. } => {
                    if !(cover > 0.0) {
                        return Err(format!("leaf {idx} has non-positive cover {cover}"));
                    }
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    cover,
                    ..
                } => {
                    if feature >= num_feature {
                        return Err(format!(
                            "node {idx} splits on feature {feature}, model has {num_feature}"
                        ));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                    if !(cover > 0.0) {
                        return Err(format!("split node {idx} has non-positive cover {cover}"));
                    }
                }
            }
        }

        Ok(Self { nodes })
    }

    pub(super) fn from_doc(doc: &TreeDoc, num_feature: usize) -> Result<Self, String> {
        let n = doc.left_children.len();
        let lengths = [
            doc.right_children.len(),
            doc.split_indices.len(),
            doc.split_conditions.len(),
            doc.default_left.len(),
            doc.sum_hessian.len(),
        ];
        if lengths.iter().any(|&l| l != n) {
            return Err(format!("node arrays disagree in length ({n} vs {lengths:?})"));
        }
        if doc.split_type.iter().any(|&t| t != 0) {
            return Err("categorical splits are not supported".into());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let cover = doc.sum_hessian[i];
            let node = if doc.left_children[i] < 0 {
                Node::Leaf {
                    value: doc.split_conditions[i],
                    cover,
                }
            } else {
                let left = usize::try_from(doc.left_children[i])
                    .map_err(|_| format!("node {i} has invalid left child"))?;
                let right = usize::try_from(doc.right_children[i])
                    .map_err(|_| format!("node {i} has invalid right child"))?;
                let feature = usize::try_from(doc.split_indices[i])
                    .map_err(|_| format!("node {i} has negative split index"))?;
                Node::Split {
                    feature,
                    threshold: doc.split_conditions[i],
                    left,
                    right,
                    default_left: doc.default_left[i].is_set(),
                    cover,
                }
            };
            nodes.push(node);
        }

        Self::new(nodes, num_feature)
    }

    #[must_use]
    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child the row follows at a split: `(taken, other)`.
    ///
    /// `x < threshold` goes left; a missing (NaN) value follows the default direction.
    #[must_use]
    pub fn route(&self, idx: usize, x: &[f64]) -> Option<(usize, usize)> {
        match self.nodes[idx] {
            Node::Leaf { .. } => None,
            Node::Split {
                feature,
                threshold,
                left,
                right,
                default_left,
                ..
            } => {
                let v = x[feature];
                let go_left = if v.is_nan() { default_left } else { v < threshold };
                Some(if go_left { (left, right) } else { (right, left) })
            }
        }
    }

    /// Leaf value reached by `x`.
    #[must_use]
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            if let Node::Leaf { value, .. } = self.nodes[idx] {
                return value;
            }
            if let Some((next, _)) = self.route(idx, x) {
                idx = next;
            }
        }
    }

    /// Cover-weighted mean leaf value.
    #[must_use]
    pub fn expected_value(&self) -> f64 {
        self.subtree_mean(0)
    }

    fn subtree_mean(&self, idx: usize) -> f64 {
        match self.nodes[idx] {
            Node::Leaf { value, .. } => value,
            Node::Split {
                left, right, cover, ..
            } => {
                let l = &self.nodes[left];
                let r = &self.nodes[right];
                (l.cover() * self.subtree_mean(left) + r.cover() * self.subtree_mean(right)) / cover
            }
        }
    }
}
