//! Syntactic classification of call arguments.

use crate::model::SgNode;

/// The shape of a call argument, as seen by rewrite rules.
///
/// Produced here by the source model so rules dispatch with one exhaustive
/// match instead of inspecting raw node kinds themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgForm {
    /// A bare place expression (`p`, `obj.field`, `self`) that can be
    /// wrapped with a leading `*`.
    Place,
    /// A borrow expression (`&x`, `&mut x`); carries the byte range of the
    /// inner expression so the borrow can be stripped.
    Borrow {
        inner_start: usize,
        inner_end: usize,
        mutable: bool,
    },
    /// Anything else. No safe rewritten form exists, so rules skip it.
    Opaque,
}

/// Classify an argument node.
///
/// An argument that is already a unary deref comes back `Opaque`, which
/// keeps reruns over already-rewritten files from double-wrapping.
pub fn classify(node: &SgNode<'_>, text: &str) -> ArgForm {
    match node.kind().as_ref() {
        "identifier" | "field_expression" | "self" => ArgForm::Place,
        "reference_expression" => match node.field("value") {
            Some(inner) => {
                let range = inner.range();
                ArgForm::Borrow {
                    inner_start: range.start,
                    inner_end: range.end,
                    mutable: text.starts_with("&mut"),
                }
            }
            None => ArgForm::Opaque,
        },
        _ => ArgForm::Opaque,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceModel;

    fn first_arg_form(source: &str) -> ArgForm {
        let model = SourceModel::parse("test.rs", source);
        let args = model
            .nodes()
            .find(|n| n.kind() == "arguments")
            .expect("no argument list in source");
        let arg = args
            .children()
            .find(|c| !matches!(c.kind().as_ref(), "(" | ")" | ","))
            .expect("no argument in list");
        let text = model.text_of(&arg).to_string();
        classify(&arg, &text)
    }

    #[test]
    fn bare_identifier_is_place() {
        assert_eq!(first_arg_form("fn f() { take(p); }"), ArgForm::Place);
    }

    #[test]
    fn field_access_is_place() {
        assert_eq!(first_arg_form("fn f() { take(obj.ptr); }"), ArgForm::Place);
    }

    #[test]
    fn borrow_carries_inner_span() {
        let form = first_arg_form("fn f() { take(&value); }");
        match form {
            ArgForm::Borrow {
                inner_start,
                inner_end,
                mutable,
            } => {
                assert!(!mutable);
                assert_eq!(inner_end - inner_start, "value".len());
            }
            other => panic!("expected Borrow, got {other:?}"),
        }
    }

    #[test]
    fn mut_borrow_flagged() {
        let form = first_arg_form("fn f() { take(&mut value); }");
        assert!(matches!(form, ArgForm::Borrow { mutable: true, .. }));
    }

    #[test]
    fn call_result_is_opaque() {
        assert_eq!(first_arg_form("fn f() { take(make()); }"), ArgForm::Opaque);
    }

    #[test]
    fn existing_deref_is_opaque() {
        assert_eq!(first_arg_form("fn f() { take(*p); }"), ArgForm::Opaque);
    }

    #[test]
    fn literal_is_opaque() {
        assert_eq!(first_arg_form("fn f() { take(42); }"), ArgForm::Opaque);
    }
}
