//! Condition trees produced by the rule parser.
use std::fmt;

use crate::categories::CategorySet;

/// A boolean condition over category names.
///
/// Trees built by the parser are always simplified: a single-child `And`/`Or`
/// collapses to its child, and `And`/`Or` children of the same kind are
/// merged into their parent. Equality is structural, so two rules are equal
/// when their simplified trees are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionNode {
    /// Always true.
    True,
    /// Always false.
    False,
    /// True when the named category is active.
    Atom(String),
    /// Negation of the child.
    Not(Box<ConditionNode>),
    /// True when every child is true.
    And(Vec<ConditionNode>),
    /// True when any child is true.
    Or(Vec<ConditionNode>),
}

impl ConditionNode {
    /// Build an atom node.
    #[must_use]
    pub fn atom(name: impl Into<String>) -> Self {
        Self::Atom(name.into())
    }

    /// Build a negation node.
    #[must_use]
    pub fn negate(child: Self) -> Self {
        Self::Not(Box::new(child))
    }

    /// Evaluate the condition against a set of active categories.
    ///
    /// Unknown atoms are simply absent from the set and evaluate to `false`.
    #[must_use]
    pub fn eval(&self, categories: &CategorySet) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Atom(name) => categories.contains(name),
            Self::Not(child) => !child.eval(categories),
            Self::And(children) => children.iter().all(|c| c.eval(categories)),
            Self::Or(children) => children.iter().any(|c| c.eval(categories)),
        }
    }

    /// Return an equivalent, flattened tree.
    ///
    /// ```
    /// use uconf_cli::rules::ConditionNode;
    ///
    /// let nested = ConditionNode::And(vec![
    ///     ConditionNode::And(vec![ConditionNode::atom("a"), ConditionNode::atom("b")]),
    ///     ConditionNode::atom("c"),
    /// ]);
    /// let flat = ConditionNode::And(vec![
    ///     ConditionNode::atom("a"),
    ///     ConditionNode::atom("b"),
    ///     ConditionNode::atom("c"),
    /// ]);
    /// assert_eq!(nested.simplify(), flat);
    /// ```
    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Self::Not(child) => Self::negate(child.simplify()),
            Self::And(children) => Self::merge(children, true),
            Self::Or(children) => Self::merge(children, false),
            other => other,
        }
    }

    fn merge(children: Vec<Self>, conjunction: bool) -> Self {
        let mut merged = Vec::with_capacity(children.len());
        for child in children {
            match (child.simplify(), conjunction) {
                (Self::And(inner), true) | (Self::Or(inner), false) => merged.extend(inner),
                (other, _) => merged.push(other),
            }
        }

        if merged.len() == 1
            && let Some(only) = merged.pop()
        {
            return only;
        }

        if conjunction {
            Self::And(merged)
        } else {
            Self::Or(merged)
        }
    }

    const fn is_multi(&self) -> bool {
        matches!(self, Self::And(_) | Self::Or(_))
    }

    fn fmt_joined(children: &[Self], separator: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(separator)?;
            }
            if child.is_multi() {
                write!(f, "({child})")?;
            } else {
                write!(f, "{child}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("True"),
            Self::False => f.write_str("False"),
            Self::Atom(name) => f.write_str(name),
            Self::Not(child) if child.is_multi() => write!(f, "! ({child})"),
            Self::Not(child) => write!(f, "! {child}"),
            Self::And(children) => Self::fmt_joined(children, " && ", f),
            Self::Or(children) => Self::fmt_joined(children, " || ", f),
        }
    }
}
