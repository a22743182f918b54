//! Rewrite rules: a pattern plus the logic that turns a match into edits.

use crate::edit::Edit;
use crate::model::{form, ArgForm, SourceModel};
use crate::pattern::{all_of, arg_at, bind, callee, kind, MatchBinding, Pred};

/// A rewrite rule: a pattern over syntax nodes and an edit generator
/// consuming the pattern's bindings.
///
/// `generate_edits` returning an empty vec is the supported way to decline
/// a match: the bound node has no safe rewritten form, so the engine skips
/// it and traversal continues. One non-applicable match never aborts the
/// batch.
pub trait Rule {
    /// Short identifier used in reports.
    fn name(&self) -> &str;

    /// The pattern the match engine evaluates at every candidate node.
    fn pattern(&self) -> &Pred;

    /// Turn one match into concrete text replacements against the
    /// original file text. Empty means skip.
    fn generate_edits(&self, model: &SourceModel, binding: &MatchBinding) -> Vec<Edit>;

    /// `use` lines to insert at the top of any file this rule edits.
    fn use_inserts(&self) -> &[String] {
        &[]
    }
}

/// Rewrites the argument of a named call into its dereferenced form:
/// `take(p)` becomes `take(*p)`, `take(&x)` becomes `take(x)`.
///
/// Which argument shapes are eligible is decided by the source model's
/// [`ArgForm`] classification; opaque shapes are skipped.
pub struct DerefArgRule {
    callee: String,
    arg_index: usize,
    pattern: Pred,
    use_inserts: Vec<String>,
}

impl DerefArgRule {
    pub fn new(callee_name: &str, arg_index: usize) -> Self {
        let pattern = all_of(vec![
            kind("call_expression"),
            callee(callee_name),
            arg_at(arg_index, bind("arg", Pred::Any)),
        ]);
        Self {
            callee: callee_name.to_string(),
            arg_index,
            pattern,
            use_inserts: Vec::new(),
        }
    }

    pub fn with_use_inserts(mut self, inserts: Vec<String>) -> Self {
        self.use_inserts = inserts;
        self
    }

    pub fn callee(&self) -> &str {
        &self.callee
    }

    pub fn arg_index(&self) -> usize {
        self.arg_index
    }
}

impl Rule for DerefArgRule {
    fn name(&self) -> &str {
        "deref-arg"
    }

    fn pattern(&self) -> &Pred {
        &self.pattern
    }

    fn generate_edits(&self, model: &SourceModel, binding: &MatchBinding) -> Vec<Edit> {
        let Some(arg) = binding.get("arg") else {
            return Vec::new();
        };
        let Some(node) = model.node_at(arg.byte_start, arg.byte_end) else {
            return Vec::new();
        };

        match form::classify(&node, &arg.text) {
            ArgForm::Place => {
                let replacement = format!("*{}", arg.text);
                if syn::parse_str::<syn::Expr>(&replacement).is_err() {
                    return Vec::new();
                }
                vec![Edit::new(
                    arg.byte_start,
                    arg.byte_end,
                    replacement,
                    &arg.text,
                )]
            }
            ArgForm::Borrow {
                inner_start,
                inner_end,
                mutable: _,
            } => {
                let inner = model.text_at(inner_start, inner_end).to_string();
                vec![Edit::new(arg.byte_start, arg.byte_end, inner, &arg.text)]
            }
            ArgForm::Opaque => Vec::new(),
        }
    }

    fn use_inserts(&self) -> &[String] {
        &self.use_inserts
    }
}

/// Renames the callee of matching calls: `old(x)` becomes `new(x)`.
///
/// Only the callee name span is touched; arguments and surrounding text
/// are preserved byte-for-byte.
pub struct RenameCallRule {
    from: String,
    to: String,
    pattern: Pred,
    use_inserts: Vec<String>,
}

impl RenameCallRule {
    pub fn new(from: &str, to: &str) -> Self {
        let pattern = all_of(vec![
            kind("call_expression"),
            callee(from),
            bind("call", Pred::Any),
        ]);
        Self {
            from: from.to_string(),
            to: to.to_string(),
            pattern,
            use_inserts: Vec::new(),
        }
    }

    pub fn with_use_inserts(mut self, inserts: Vec<String>) -> Self {
        self.use_inserts = inserts;
        self
    }

    pub fn from_name(&self) -> &str {
        &self.from
    }

    pub fn to_name(&self) -> &str {
        &self.to
    }
}

impl Rule for RenameCallRule {
    fn name(&self) -> &str {
        "rename-call"
    }

    fn pattern(&self) -> &Pred {
        &self.pattern
    }

    fn generate_edits(&self, model: &SourceModel, binding: &MatchBinding) -> Vec<Edit> {
        let Some(call) = binding.get("call") else {
            return Vec::new();
        };
        let Some(node) = model.node_at(call.byte_start, call.byte_end) else {
            return Vec::new();
        };
        let Some(function) = node.field("function") else {
            return Vec::new();
        };

        // The name span is the identifier itself, not the whole path or
        // receiver expression.
        let function_kind = function.kind().to_string();
        let name_node = match function_kind.as_str() {
            "identifier" => Some(function),
            "scoped_identifier" => function.field("name"),
            "field_expression" => function.field("field"),
            _ => None,
        };
        let Some(name_node) = name_node else {
            return Vec::new();
        };

        let range = name_node.range();
        let old = model.text_at(range.start, range.end).to_string();
        vec![Edit::new(range.start, range.end, self.to.clone(), &old)]
    }

    fn use_inserts(&self) -> &[String] {
        &self.use_inserts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_rule_on(rule: &dyn Rule, source: &str) -> Vec<Edit> {
        let model = SourceModel::parse("test.rs", source);
        let mut edits = Vec::new();
        for node in model.nodes() {
            if let Some(binding) = rule.pattern().eval(&model, &node) {
                edits.extend(rule.generate_edits(&model, &binding));
            }
        }
        edits
    }

    #[test]
    fn deref_wraps_place_expression() {
        let rule = DerefArgRule::new("take", 0);
        let edits = run_rule_on(&rule, "fn f() { take(p); }");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "*p");
    }

    #[test]
    fn deref_strips_borrow() {
        let rule = DerefArgRule::new("take", 0);
        let edits = run_rule_on(&rule, "fn f() { take(&value); }");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "value");
    }

    #[test]
    fn deref_skips_opaque_argument() {
        let rule = DerefArgRule::new("take", 0);
        let edits = run_rule_on(&rule, "fn f() { take(make()); }");
        assert!(edits.is_empty());
    }

    #[test]
    fn deref_skips_already_rewritten() {
        let rule = DerefArgRule::new("take", 0);
        let edits = run_rule_on(&rule, "fn f() { take(*p); }");
        assert!(edits.is_empty());
    }

    #[test]
    fn deref_targets_configured_index() {
        let rule = DerefArgRule::new("take", 1);
        let edits = run_rule_on(&rule, "fn f() { take(first, second); }");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "*second");
    }

    #[test]
    fn deref_ignores_other_callees() {
        let rule = DerefArgRule::new("take", 0);
        let edits = run_rule_on(&rule, "fn f() { other(p); }");
        assert!(edits.is_empty());
    }

    #[test]
    fn rename_touches_only_name_span() {
        let rule = RenameCallRule::new("old_name", "new_name");
        let edits = run_rule_on(&rule, "fn f() { old_name(a, b); }");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "new_name");
        assert_eq!(
            edits[0].byte_end - edits[0].byte_start,
            "old_name".len()
        );
    }

    #[test]
    fn rename_handles_path_call() {
        let rule = RenameCallRule::new("old_name", "new_name");
        let edits = run_rule_on(&rule, "fn f() { util::old_name(a); }");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "new_name");
    }
}
