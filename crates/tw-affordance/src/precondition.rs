//! Preconditions gate the start of a timed action.
//!
//! A precondition is a boolean expression over a read-only
//! [`ContextSnapshot`] built at start time.  The engine only depends on the
//! [`Precondition`] trait; [`Comparison`] is the built-in implementation
//! compiled from manifest text such as `agent.hunger < 0.8` or
//! `agent.on_shift == false`.
//!
//! # Context keys
//!
//! | Key                    | Value                                     |
//! |------------------------|-------------------------------------------|
//! | `agent.<need>`         | need level in `[0, 1]`                    |
//! | `agent.wallet`         | wallet balance                            |
//! | `agent.on_shift`       | `1.0` while wage-eligible, else `0.0`     |
//! | `agent.attendance`     | rolling attendance ratio                  |
//! | `object.type`          | object type tag                           |
//! | `object.queue_length`  | agents waiting on the object              |
//! | `object.distance`      | Manhattan distance from the agent         |
//! | `world.tick`           | current tick                              |

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{AffordanceError, AffordanceResult};

// ── Context ───────────────────────────────────────────────────────────────────

/// Immutable key → number view of agent, object, and world state.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ContextSnapshot(BTreeMap<String, f64>);

impl ContextSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

pub trait Precondition: Send + Sync + fmt::Debug {
    /// Expression text as written in the manifest.
    fn source(&self) -> &str;

    fn evaluate(&self, ctx: &ContextSnapshot) -> bool;
}

/// First precondition in `list` that fails against `ctx`.
pub fn first_failing<'a>(
    list: &'a [Arc<dyn Precondition>],
    ctx:  &ContextSnapshot,
) -> Option<&'a dyn Precondition> {
    list.iter().map(|p| p.as_ref()).find(|p| !p.evaluate(ctx))
}

// ── Built-in comparison ───────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
        }
    }
}

/// Two-character operators first so `<=` is not read as `<`.
const OPERATORS: [(&str, CmpOp); 6] = [
    ("<=", CmpOp::Le),
    (">=", CmpOp::Ge),
    ("==", CmpOp::Eq),
    ("!=", CmpOp::Ne),
    ("<", CmpOp::Lt),
    (">", CmpOp::Gt),
];

/// `path op literal`, or a bare `path` meaning `path != 0`.
///
/// A key missing from the context fails the comparison.
#[derive(Clone, PartialEq, Debug)]
pub struct Comparison {
    source: String,
    path:   String,
    op:     CmpOp,
    value:  f64,
}

impl Comparison {
    pub fn compile(source: &str) -> AffordanceResult<Self> {
        let text = source.trim();
        let err = |message: &str| AffordanceError::Precondition {
            source_text: text.to_string(),
            message:     message.to_string(),
        };

        let (path, op, value) = match OPERATORS.iter().find(|(tok, _)| text.contains(tok)) {
            Some(&(tok, op)) => {
                let (lhs, rhs) = text.split_once(tok).ok_or_else(|| err("missing operand"))?;
                (lhs.trim(), op, parse_literal(rhs.trim()).ok_or_else(|| err("bad literal"))?)
            }
            None => (text, CmpOp::Ne, 0.0),
        };

        let valid_path = path
            .split_once('.')
            .is_some_and(|(scope, key)| is_ident(scope) && is_ident(key));
        if !valid_path {
            return Err(err("expected scope.key on the left-hand side"));
        }

        Ok(Self {
            source: text.to_string(),
            path:   path.to_string(),
            op,
            value,
        })
    }
}

impl Precondition for Comparison {
    fn source(&self) -> &str {
        &self.source
    }

    fn evaluate(&self, ctx: &ContextSnapshot) -> bool {
        ctx.get(&self.path)
            .is_some_and(|lhs| self.op.apply(lhs, self.value))
    }
}

fn parse_literal(s: &str) -> Option<f64> {
    match s {
        "true"  => Some(1.0),
        "false" => Some(0.0),
        n       => n.parse().ok().filter(|v: &f64| v.is_finite()),
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c == '_' || c.is_ascii_digit())
}
