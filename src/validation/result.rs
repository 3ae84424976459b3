//! Accumulation of validation errors and warnings with positional context.

use crate::declaration::{
    FieldDecl, MethodDecl, PackageDecl, ParamDecl, Position, PropertyDecl, TypeDecl,
};
use crate::model::locator::SubResourceLocator;
use crate::model::method::ResourceMethod;
use crate::model::param::ResourceParameter;

/// Something a diagnostic can point at: a position when one is resolvable,
/// a synthesized name label otherwise, plus any provenance chain.
pub trait Diagnose {
    fn position(&self) -> Option<&Position>;
    fn label(&self) -> String;
    fn referenced_from(&self) -> &[String] {
        &[]
    }
}

impl Diagnose for TypeDecl {
    fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
    fn label(&self) -> String {
        self.qualified_name.clone()
    }
    fn referenced_from(&self) -> &[String] {
        &self.referenced_from
    }
}

impl Diagnose for MethodDecl {
    fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Diagnose for FieldDecl {
    fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Diagnose for PropertyDecl {
    fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Diagnose for ParamDecl {
    fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Diagnose for PackageDecl {
    fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Diagnose for ResourceMethod {
    fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
    fn label(&self) -> String {
        format!("{}::{}", self.declaring_type, self.name)
    }
}

impl Diagnose for SubResourceLocator {
    fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
    fn label(&self) -> String {
        format!("{}::{}", self.declaring_type, self.name)
    }
}

impl Diagnose for ResourceParameter {
    fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
    fn label(&self) -> String {
        self.source.clone()
    }
}

/// One labeled error or warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub position: Option<Position>,
    /// Synthesized name label when no position was resolvable, or the label
    /// stamped by a labeled aggregation.
    pub label: Option<String>,
    pub text: String,
}

/// The aggregated outcome of validation. A non-empty error sequence signals
/// build failure to callers; warnings never block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<Message>,
    warnings: Vec<Message>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, source: &dyn Diagnose, text: impl Into<String>) {
        let message = Self::message(source, text.into());
        self.errors.push(message);
    }

    pub fn add_warning(&mut self, source: &dyn Diagnose, text: impl Into<String>) {
        let message = Self::message(source, text.into());
        self.warnings.push(message);
    }

    fn message(source: &dyn Diagnose, mut text: String) -> Message {
        let refs = source.referenced_from();
        if !refs.is_empty() {
            text.push_str(&format!(" (referenced from {})", refs.join(", ")));
        }
        let position = source.position().cloned();
        let label = if position.is_none() {
            Some(source.label())
        } else {
            None
        };
        Message {
            position,
            label,
            text,
        }
    }

    /// Concatenates `other` onto this result. Order-preserving, duplicates
    /// allowed, hence associative.
    pub fn aggregate(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// As [`Self::aggregate`], stamping every migrated message with `label`.
    pub fn aggregate_labeled(&mut self, label: &str, other: ValidationResult) {
        for mut m in other.errors {
            m.label = Some(label.to_string());
            self.errors.push(m);
        }
        for mut m in other.warnings {
            m.label = Some(label.to_string());
            self.warnings.push(m);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn errors(&self) -> &[Message] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Message] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::TypeKind;
    use pretty_assertions::assert_eq;

    fn type_with_position() -> TypeDecl {
        let mut decl = TypeDecl::new("demo::Thing", TypeKind::Class);
        decl.position = Some(Position::new("thing.rs", 12));
        decl
    }

    #[test]
    fn test_error_keeps_position_when_available() {
        let decl = type_with_position();
        let mut result = ValidationResult::new();
        result.add_error(&decl, "broken");

        let msg = &result.errors()[0];
        assert_eq!(msg.position, Some(Position::new("thing.rs", 12)));
        assert_eq!(msg.label, None);
        assert_eq!(msg.text, "broken");
    }

    #[test]
    fn test_error_synthesizes_label_without_position() {
        let decl = TypeDecl::new("demo::Thing", TypeKind::Class);
        let mut result = ValidationResult::new();
        result.add_error(&decl, "broken");

        let msg = &result.errors()[0];
        assert_eq!(msg.position, None);
        assert_eq!(msg.label.as_deref(), Some("demo::Thing"));
    }

    #[test]
    fn test_referenced_from_provenance_is_appended() {
        let mut decl = TypeDecl::new("demo::Thing", TypeKind::Class);
        decl.referenced_from = vec!["demo::Owner".to_string()];
        let mut result = ValidationResult::new();
        result.add_warning(&decl, "odd");

        assert_eq!(
            result.warnings()[0].text,
            "odd (referenced from demo::Owner)"
        );
    }

    #[test]
    fn test_aggregation_is_associative() {
        let decl = TypeDecl::new("demo::Thing", TypeKind::Class);
        let mut a = ValidationResult::new();
        a.add_error(&decl, "a");
        let mut b = ValidationResult::new();
        b.add_error(&decl, "b");
        b.add_warning(&decl, "bw");
        let mut c = ValidationResult::new();
        c.add_error(&decl, "c");

        // (a + b) + c
        let mut left = a.clone();
        left.aggregate(b.clone());
        left.aggregate(c.clone());

        // a + (b + c)
        let mut bc = b;
        bc.aggregate(c);
        let mut right = a;
        right.aggregate(bc);

        assert_eq!(left, right);
        let texts: Vec<_> = left.errors().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_labeled_aggregation_stamps_every_message() {
        let decl = type_with_position();
        let mut inner = ValidationResult::new();
        inner.add_error(&decl, "bad");
        inner.add_warning(&decl, "meh");

        let mut outer = ValidationResult::new();
        outer.aggregate_labeled("accessor 'name'", inner);

        assert_eq!(outer.errors()[0].label.as_deref(), Some("accessor 'name'"));
        assert_eq!(outer.warnings()[0].label.as_deref(), Some("accessor 'name'"));
    }

    #[test]
    fn test_empty_result_signals_nothing() {
        let result = ValidationResult::new();
        assert!(!result.has_errors());
        assert!(!result.has_warnings());
    }
}
