//! # Evaluation Plan
//!
//! The compiled, immutable representation of a predicate expression.
//! A plan is a sorted sequence of subexpressions, each a run of fixed
//! 6-slot blocks:
//!
//! ```text
//! [ lhsPath, lhsType, indexOrKey, opVerb, rhsLiteral, intraLogicalOp ]
//! ```
//!
//! For a `list<tuple<...>>` block the slots are repurposed: `indexOrKey` is
//! the list index, `opVerb` the start byte offset and `rhsLiteral` the end
//! byte offset of the sub-expression inside the original expression string.
//!
//! Plans are born in the validator, live in the thread-local cache, and are
//! never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// `&&` or `||`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// The literal token form
    pub fn token(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for LogicalOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "&&" => Ok(LogicalOp::And),
            "||" => Ok(LogicalOp::Or),
            _ => Err(()),
        }
    }
}

/// Two-level subexpression id `L.S`, 1-based on both parts.
///
/// `level` numbers independent subexpression groups, `member` numbers the
/// members of a nested-parenthesis group. Component-wise ordering is the
/// evaluation order (so `2.1` runs before `10.1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubexprId {
    pub level: u32,
    pub member: u32,
}

impl SubexprId {
    pub fn new(level: u32, member: u32) -> Self {
        SubexprId { level, member }
    }
}

impl fmt::Display for SubexprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.level, self.member)
    }
}

impl Serialize for SubexprId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SubexprId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let (level, member) = text
            .split_once('.')
            .ok_or_else(|| serde::de::Error::custom("subexpression id is L.S"))?;
        Ok(SubexprId {
            level: level.parse().map_err(serde::de::Error::custom)?,
            member: member.parse().map_err(serde::de::Error::custom)?,
        })
    }
}

/// How the evaluator must treat one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    /// Ordinary comparison block
    Comparison,
    /// Recursive `list<tuple<...>>` block (offset slots)
    ListOfTuple,
}

/// One 6-slot block of a subexpression layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateStep {
    /// Dotted attribute path of the left-hand side
    pub lhs_path: String,
    /// Attribute type string from the path map
    pub lhs_type: String,
    /// `""`, a decimal list index, or a map key literal
    pub index_or_key: String,
    /// Operation verb; arithmetic carries operand and post-verb inline
    pub op_verb: String,
    /// Literal right-hand-side text (unquoted strings, bracketed `in` lists)
    pub rhs: String,
    /// Joins this block to the next one; `None` on the final block
    pub connector: Option<LogicalOp>,
    pub kind: StepKind,
}

/// The blocks of one subexpression, in source order
pub type SubexprLayout = Vec<PredicateStep>;

/// Compiled predicate, reusable across any number of tuples sharing the
/// schema it was validated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPlan {
    expression: String,
    schema: String,
    subexpressions: BTreeMap<SubexprId, SubexprLayout>,
    subexpression_keys: Vec<SubexprId>,
    intra_nested_logical: BTreeMap<SubexprId, LogicalOp>,
    inter_logical: Vec<LogicalOp>,
}

impl EvaluationPlan {
    /// Assemble a plan; key order is derived, not trusted from the caller
    pub fn new(
        expression: String,
        schema: String,
        subexpressions: BTreeMap<SubexprId, SubexprLayout>,
        intra_nested_logical: BTreeMap<SubexprId, LogicalOp>,
        inter_logical: Vec<LogicalOp>,
    ) -> Self {
        let subexpression_keys = subexpressions.keys().copied().collect();
        EvaluationPlan {
            expression,
            schema,
            subexpressions,
            subexpression_keys,
            intra_nested_logical,
            inter_logical,
        }
    }

    /// The raw expression this plan was compiled from
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The canonical tuple schema this plan was validated against
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Subexpression ids in evaluation order
    pub fn subexpression_keys(&self) -> &[SubexprId] {
        &self.subexpression_keys
    }

    /// Layout of one subexpression
    pub fn layout(&self, id: SubexprId) -> Option<&SubexprLayout> {
        self.subexpressions.get(&id)
    }

    /// Logical operator joining a nested-group member to its successor
    pub fn intra_nested_logical(&self, id: SubexprId) -> Option<LogicalOp> {
        self.intra_nested_logical.get(&id).copied()
    }

    /// Logical operators joining independent subexpression groups
    pub fn inter_logical(&self) -> &[LogicalOp] {
        &self.inter_logical
    }

    /// Number of members sharing `level`
    pub fn group_size(&self, level: u32) -> usize {
        self.subexpression_keys
            .iter()
            .filter(|id| id.level == level)
            .count()
    }

    /// Number of distinct levels
    pub fn group_count(&self) -> usize {
        let mut last = None;
        let mut count = 0usize;
        for id in &self.subexpression_keys {
            if last != Some(id.level) {
                count += 1;
                last = Some(id.level);
            }
        }
        count
    }
}

impl fmt::Display for EvaluationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "expression: {}", self.expression)?;
        writeln!(f, "schema: {}", self.schema)?;
        for id in &self.subexpression_keys {
            let layout = &self.subexpressions[id];
            write!(f, "  {id}:")?;
            for step in layout {
                write!(
                    f,
                    " [{} | {} | {} | {} | {} | {}]",
                    step.lhs_path,
                    step.lhs_type,
                    step.index_or_key,
                    step.op_verb,
                    step.rhs,
                    step.connector.map_or("", LogicalOp::token),
                )?;
            }
            if let Some(op) = self.intra_nested_logical.get(id) {
                write!(f, " ~{op}")?;
            }
            writeln!(f)?;
        }
        write!(f, "  inter:")?;
        for op in &self.inter_logical {
            write!(f, " {op}")?;
        }
        Ok(())
    }
}
