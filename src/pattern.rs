//! Composable syntactic predicates over source-model nodes.
//!
//! A pattern is a predicate tree evaluated at one node. On success it
//! yields a [`MatchBinding`]: named captures of sub-nodes for the rule's
//! edit generator. Composition is logical AND; there is deliberately no
//! OR, because rules that need alternatives dispatch on [`ArgForm`] or on
//! captured node kinds instead.

use crate::cache;
use crate::model::{SgNode, SourceModel};
use std::collections::HashMap;

/// An owned reference to a sub-node captured by a pattern.
///
/// Owns the span, kind, and text so a binding outlives the traversal
/// borrow. Rules that need tree structure get back to the node through
/// [`SourceModel::node_at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub kind: String,
    pub text: String,
}

impl BoundNode {
    fn from_node(model: &SourceModel, node: &SgNode<'_>) -> Self {
        let range = node.range();
        Self {
            byte_start: range.start,
            byte_end: range.end,
            kind: node.kind().to_string(),
            text: model.text_of(node).to_string(),
        }
    }
}

/// Capture name → bound sub-node, scoped to one rule invocation.
pub type MatchBinding = HashMap<String, BoundNode>;

/// A composable predicate over syntax nodes.
#[derive(Debug, Clone)]
pub enum Pred {
    /// Node kind equals the given kind.
    Kind(String),
    /// Node is a call whose callee resolves to the given name. Handles
    /// plain calls (`f(x)`), path calls (`m::f(x)`), and method calls
    /// (`obj.f(x)`).
    Callee(String),
    /// The argument at `index` of a call node satisfies `pred`.
    ArgAt { index: usize, pred: Box<Pred> },
    /// An ast-grep metavariable pattern matches this exact node;
    /// metavariable captures join the binding.
    Grep(String),
    /// Capture this node under `name` if `pred` holds.
    Bind { name: String, pred: Box<Pred> },
    /// Every predicate holds (logical AND).
    AllOf(Vec<Pred>),
    /// Always holds.
    Any,
}

/// Builder helpers so rule constructors read like the shapes they match.
pub fn kind(k: &str) -> Pred {
    Pred::Kind(k.to_string())
}

pub fn callee(name: &str) -> Pred {
    Pred::Callee(name.to_string())
}

pub fn arg_at(index: usize, pred: Pred) -> Pred {
    Pred::ArgAt {
        index,
        pred: Box::new(pred),
    }
}

pub fn grep(pattern: &str) -> Pred {
    Pred::Grep(pattern.to_string())
}

pub fn bind(name: &str, pred: Pred) -> Pred {
    Pred::Bind {
        name: name.to_string(),
        pred: Box::new(pred),
    }
}

pub fn all_of(preds: Vec<Pred>) -> Pred {
    Pred::AllOf(preds)
}

impl Pred {
    /// Evaluate this predicate at one node.
    ///
    /// Returns the accumulated bindings on success, `None` on a non-match.
    /// A non-match is control flow, not an error; the engine just keeps
    /// traversing.
    pub fn eval(&self, model: &SourceModel, node: &SgNode<'_>) -> Option<MatchBinding> {
        let mut binding = MatchBinding::new();
        if self.eval_into(model, node, &mut binding) {
            Some(binding)
        } else {
            None
        }
    }

    fn eval_into(&self, model: &SourceModel, node: &SgNode<'_>, binding: &mut MatchBinding) -> bool {
        match self {
            Pred::Kind(k) => node.kind() == k.as_str(),

            Pred::Callee(name) => callee_name(model, node).as_deref() == Some(name.as_str()),

            Pred::ArgAt { index, pred } => match call_argument(node, *index) {
                Some(arg) => pred.eval_into(model, &arg, binding),
                None => false,
            },

            Pred::Grep(pattern) => {
                let pat = cache::get_or_compile(pattern);
                let Some(m) = node.find(&pat) else {
                    return false;
                };
                // find() searches the whole subtree; only a hit on this
                // exact node counts as a match here.
                if m.range() != node.range() {
                    return false;
                }
                let env: HashMap<String, String> = m.get_env().clone().into();
                let node_text = model.text_of(node);
                let node_start = node.range().start;
                for (capture, text) in env {
                    // Metavariable environments expose text only; recover
                    // the span by first occurrence inside the match.
                    if let Some(offset) = node_text.find(&text) {
                        let byte_start = node_start + offset;
                        let byte_end = byte_start + text.len();
                        let kind = model
                            .node_at(byte_start, byte_end)
                            .map(|n| n.kind().to_string())
                            .unwrap_or_default();
                        binding.insert(
                            capture,
                            BoundNode {
                                byte_start,
                                byte_end,
                                kind,
                                text,
                            },
                        );
                    }
                }
                true
            }

            Pred::Bind { name, pred } => {
                if !pred.eval_into(model, node, binding) {
                    return false;
                }
                binding.insert(name.clone(), BoundNode::from_node(model, node));
                true
            }

            Pred::AllOf(preds) => preds.iter().all(|p| p.eval_into(model, node, binding)),

            Pred::Any => true,
        }
    }
}

/// Resolve the callee name of a call node, if it has one.
fn callee_name(model: &SourceModel, node: &SgNode<'_>) -> Option<String> {
    if node.kind() != "call_expression" {
        return None;
    }
    let function = node.field("function")?;
    match function.kind().as_ref() {
        "identifier" => Some(model.text_of(&function).to_string()),
        "scoped_identifier" => function.field("name").map(|n| model.text_of(&n).to_string()),
        "field_expression" => function.field("field").map(|n| model.text_of(&n).to_string()),
        _ => None,
    }
}

/// The `index`-th argument of a call node, skipping punctuation.
fn call_argument<'r>(node: &SgNode<'r>, index: usize) -> Option<SgNode<'r>> {
    let args = node.field("arguments")?;
    let result = args
        .children()
        .filter(|c| !matches!(c.kind().as_ref(), "(" | ")" | "," | "comment"))
        .nth(index);
    result
}
