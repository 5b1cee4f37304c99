//! Tree-shaped score explanations
//!
//! This module provides:
//! - Explanation: a value, a description and nested detail explanations
//!
//! Explanations mirror the computation that produced a score: per-feature
//! leaves, normalizer wrappers and a model-level composition on top.

use std::fmt;

/// Explanation of one step of a score computation
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    value: f32,
    description: String,
    details: Vec<Explanation>,
}

impl Explanation {
    /// Create a leaf explanation with no nested details
    pub fn leaf(value: f32, description: impl Into<String>) -> Self {
        Explanation {
            value,
            description: description.into(),
            details: vec![],
        }
    }

    /// Create an explanation composed of nested detail explanations
    pub fn with_details(
        value: f32,
        description: impl Into<String>,
        details: Vec<Explanation>,
    ) -> Self {
        Explanation {
            value,
            description: description.into(),
            details,
        }
    }

    /// Value this step contributed
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Human-readable description of this step
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Nested detail explanations
    pub fn details(&self) -> &[Explanation] {
        &self.details
    }

    fn render(&self, depth: usize, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "{}{} = {}", "  ".repeat(depth), self.value, self.description)?;
        for detail in &self.details {
            detail.render(depth + 1, out)?;
        }
        Ok(())
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(0, f)
    }
}

// ============================================================================
// Tests
// ============================================================================
