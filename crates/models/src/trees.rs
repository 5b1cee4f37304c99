//! Weighted regression-tree ensembles
//!
//! This module provides:
//! - TreeNode: leaf values and threshold splits over model features
//! - RegressionTree: a weighted tree
//! - AdditiveTreesModel: score = Σ tree.weight * eval(tree.root)
//!
//! Example models are LambdaMART and Gradient Boosted Regression Trees.
//! Split nodes resolve their feature name to a position in the model's
//! feature list at construction. A name that does not resolve (trees
//! trained against a feature set that is no longer emitted) is kept
//! unresolved: the affected tree contributes zero from that point on,
//! which is a defined fallback, not an error.
//!
//! Example definition:
//!
//! ```json
//! {
//!   "weight": 1,
//!   "root": {
//!     "feature": "userTextTitleMatch",
//!     "threshold": 0.5,
//!     "left": { "value": -100 },
//!     "right": { "value": 75 }
//!   }
//! }
//! ```

use crate::config::{TreeConfig, TreeNodeConfig};
use rescore_core::{Error, Explanation, Result};
use rustc_hash::FxHashMap;
use std::fmt::Write as _;

/// Slack added to every stored threshold so that boundary comparisons are
/// deterministic under float rounding. Applied once at construction.
const NODE_SPLIT_SLACK: f32 = 1e-6;

// ============================================================================
// TreeNode
// ============================================================================

/// One node of a regression tree
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Terminal node carrying the branch value
    Leaf {
        /// Value contributed when evaluation reaches this leaf
        value: f32,
    },
    /// Threshold comparison over one model feature
    Split {
        /// Referenced feature name
        feature: String,
        /// Position in the model's feature list; `None` when the name did
        /// not resolve
        feature_index: Option<usize>,
        /// Stored threshold (configured threshold plus slack)
        threshold: f32,
        /// Branch taken when `value <= threshold`
        left: Box<TreeNode>,
        /// Branch taken otherwise
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Compile and validate a node definition
    ///
    /// A node with a `feature` is a split and must carry a threshold and
    /// both children; a node without one is a leaf and must carry neither
    /// child.
    fn compile(config: &TreeNodeConfig, fname_to_index: &FxHashMap<&str, usize>) -> Result<Self> {
        match &config.feature {
            None => {
                if config.left.is_some() || config.right.is_some() {
                    return Err(Error::Model(
                        "regression tree node is a leaf but has children".to_string(),
                    ));
                }
                Ok(TreeNode::Leaf {
                    value: config.value.unwrap_or(0.0),
                })
            }
            Some(feature) => {
                let threshold = config.threshold.ok_or_else(|| {
                    Error::Model("regression tree node is missing a threshold".to_string())
                })?;
                let left = config.left.as_deref().ok_or_else(|| {
                    Error::Model("regression tree node is missing its left child".to_string())
                })?;
                let right = config.right.as_deref().ok_or_else(|| {
                    Error::Model("regression tree node is missing its right child".to_string())
                })?;
                Ok(TreeNode::Split {
                    feature: feature.clone(),
                    feature_index: fname_to_index.get(feature.as_str()).copied(),
                    threshold: threshold + NODE_SPLIT_SLACK,
                    left: Box::new(TreeNode::compile(left, fname_to_index)?),
                    right: Box::new(TreeNode::compile(right, fname_to_index)?),
                })
            }
        }
    }

    /// Evaluate the subtree against a normalized feature vector
    pub fn eval(&self, vector: &[f32]) -> f32 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature_index,
                threshold,
                left,
                right,
                ..
            } => match feature_index {
                Some(idx) if *idx < vector.len() => {
                    if vector[*idx] <= *threshold {
                        left.eval(vector)
                    } else {
                        right.eval(vector)
                    }
                }
                // The tree references a feature this model does not emit.
                _ => 0.0,
            },
        }
    }

    /// Trace the decision path taken for a vector
    fn explain_path(&self, vector: &[f32], out: &mut String) {
        match self {
            TreeNode::Leaf { value } => {
                let _ = write!(out, "val: {value}");
            }
            TreeNode::Split {
                feature,
                feature_index,
                threshold,
                left,
                right,
            } => match feature_index {
                Some(idx) if *idx < vector.len() => {
                    if vector[*idx] <= *threshold {
                        let _ = write!(
                            out,
                            "'{feature}':{} <= {threshold}, go left | ",
                            vector[*idx]
                        );
                        left.explain_path(vector, out);
                    } else {
                        let _ = write!(
                            out,
                            "'{feature}':{} > {threshold}, go right | ",
                            vector[*idx]
                        );
                        right.explain_path(vector, out);
                    }
                }
                _ => {
                    let _ = write!(out, "'{feature}' does not exist in the vector, return zero");
                }
            },
        }
    }
}

// ============================================================================
// RegressionTree
// ============================================================================

/// A weighted regression tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    /// Contribution weight of this tree
    weight: f32,
    /// Root node
    root: TreeNode,
}

impl RegressionTree {
    fn compile(config: &TreeConfig, fname_to_index: &FxHashMap<&str, usize>) -> Result<Self> {
        let weight = config
            .weight
            .ok_or_else(|| Error::Model("regression tree doesn't contain a weight".to_string()))?;
        let root = config
            .root
            .as_ref()
            .ok_or_else(|| Error::Model("regression tree doesn't contain a root".to_string()))?;
        Ok(RegressionTree {
            weight,
            root: TreeNode::compile(root, fname_to_index)?,
        })
    }

    /// Weighted contribution of this tree
    pub fn score(&self, vector: &[f32]) -> f32 {
        self.weight * self.root.eval(vector)
    }

    /// Tree weight
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Root node
    pub fn root(&self) -> &TreeNode {
        &self.root
    }
}

// ============================================================================
// AdditiveTreesModel
// ============================================================================

/// Summation of multiple weighted regression trees
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveTreesModel {
    trees: Vec<RegressionTree>,
}

impl AdditiveTreesModel {
    /// Compile and validate an ensemble definition
    ///
    /// Split features resolve against `feature_names` (the model's feature
    /// list, in order). At least one tree is required.
    pub fn from_trees(
        model_name: &str,
        feature_names: &[&str],
        configs: &[TreeConfig],
    ) -> Result<Self> {
        if configs.is_empty() {
            return Err(Error::Model(format!(
                "no trees declared for model {model_name}"
            )));
        }
        let fname_to_index: FxHashMap<&str, usize> = feature_names
            .iter()
            .enumerate()
            .map(|(i, &name)| (name, i))
            .collect();
        let trees = configs
            .iter()
            .map(|config| RegressionTree::compile(config, &fname_to_index))
            .collect::<Result<Vec<_>>>()?;
        Ok(AdditiveTreesModel { trees })
    }

    /// The ensemble's trees
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Sum of weighted tree contributions
    pub fn score(&self, normalized: &[f32]) -> f32 {
        self.trees.iter().map(|t| t.score(normalized)).sum()
    }

    /// Per-tree decision paths summed into the final score
    pub fn explain(&self, final_score: f32, feature_explanations: &[Explanation]) -> Explanation {
        let vector: Vec<f32> = feature_explanations.iter().map(Explanation::value).collect();
        let details = self
            .trees
            .iter()
            .enumerate()
            .map(|(index, tree)| {
                let mut path = String::new();
                tree.root.explain_path(&vector, &mut path);
                Explanation::leaf(tree.score(&vector), format!("tree {index} | {path}"))
            })
            .collect();
        Explanation::with_details(
            final_score,
            "additive trees model applied to features, sum of:",
            details,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_configs(json: &str) -> Vec<TreeConfig> {
        serde_json::from_str(json).unwrap()
    }

    const SINGLE_SPLIT: &str = r#"[{
        "weight": 1.0,
        "root": {
            "feature": "x",
            "threshold": 0.5,
            "left": { "value": -100 },
            "right": { "value": 75 }
        }
    }]"#;

    #[test]
    fn test_threshold_boundary_goes_left() {
        let model = AdditiveTreesModel::from_trees("m", &["x"], &tree_configs(SINGLE_SPLIT)).unwrap();
        // The stored threshold is 0.5 plus slack, so exactly 0.5 routes left.
        assert_eq!(model.score(&[0.5]), -100.0);
        assert_eq!(model.score(&[1.0]), 75.0);
        assert_eq!(model.score(&[0.0]), -100.0);
    }

    #[test]
    fn test_tree_weight_scales_contribution() {
        let configs = tree_configs(
            r#"[{"weight": 2.0, "root": {"value": -10}},
                {"weight": 1.0, "root": {"value": 50}}]"#,
        );
        let model = AdditiveTreesModel::from_trees("m", &["x"], &configs).unwrap();
        assert_eq!(model.score(&[0.0]), 30.0);
    }

    #[test]
    fn test_unresolved_feature_contributes_zero() {
        let configs = tree_configs(
            r#"[{
                "weight": 1.0,
                "root": {
                    "feature": "this_feature_doesnt_exist",
                    "threshold": 0.5,
                    "left": { "value": -100 },
                    "right": { "value": 75 }
                }
            },
            {"weight": 1.0, "root": {"value": 5}}]"#,
        );
        let model = AdditiveTreesModel::from_trees("m", &["x"], &configs).unwrap();
        // First tree contributes exactly zero, without an error.
        assert_eq!(model.score(&[9.0]), 5.0);
    }

    #[test]
    fn test_missing_threshold_rejected() {
        let configs = tree_configs(
            r#"[{"weight": 1.0, "root": {
                "feature": "x",
                "left": { "value": 1 },
                "right": { "value": 2 }
            }}]"#,
        );
        let err = AdditiveTreesModel::from_trees("m", &["x"], &configs).unwrap_err();
        assert!(err.to_string().contains("missing a threshold"));
    }

    #[test]
    fn test_missing_child_rejected() {
        let configs = tree_configs(
            r#"[{"weight": 1.0, "root": {
                "feature": "x",
                "threshold": 0.5,
                "left": { "value": 1 }
            }}]"#,
        );
        let err = AdditiveTreesModel::from_trees("m", &["x"], &configs).unwrap_err();
        assert!(err.to_string().contains("missing its right child"));
    }

    #[test]
    fn test_leaf_with_children_rejected() {
        let configs = tree_configs(
            r#"[{"weight": 1.0, "root": {
                "value": 1,
                "left": { "value": 2 },
                "right": { "value": 3 }
            }}]"#,
        );
        let err = AdditiveTreesModel::from_trees("m", &["x"], &configs).unwrap_err();
        assert!(err.to_string().contains("leaf but has children"));
    }

    #[test]
    fn test_missing_weight_rejected() {
        let configs = tree_configs(r#"[{"root": {"value": 1}}]"#);
        let err = AdditiveTreesModel::from_trees("m", &["x"], &configs).unwrap_err();
        assert!(err.to_string().contains("doesn't contain a weight"));
    }

    #[test]
    fn test_empty_ensemble_rejected() {
        let err = AdditiveTreesModel::from_trees("m", &["x"], &[]).unwrap_err();
        assert!(err.to_string().contains("no trees declared"));
    }

    #[test]
    fn test_explain_traces_the_path() {
        let model = AdditiveTreesModel::from_trees("m", &["x"], &tree_configs(SINGLE_SPLIT)).unwrap();
        let explain = model.explain(75.0, &[Explanation::leaf(1.0, "feature x")]);
        assert_eq!(explain.details().len(), 1);
        let trace = explain.details()[0].description().to_string();
        assert!(trace.contains("go right"));
        assert!(trace.contains("val: 75"));
    }

    #[test]
    fn test_explain_names_unresolved_feature() {
        let configs = tree_configs(
            r#"[{"weight": 1.0, "root": {
                "feature": "ghost",
                "threshold": 0.5,
                "left": { "value": 1 },
                "right": { "value": 2 }
            }}]"#,
        );
        let model = AdditiveTreesModel::from_trees("m", &["x"], &configs).unwrap();
        let explain = model.explain(0.0, &[Explanation::leaf(1.0, "feature x")]);
        assert!(explain.details()[0]
            .description()
            .contains("does not exist in the vector"));
    }
}
