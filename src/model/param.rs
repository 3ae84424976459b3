//! Parameter classification: deciding whether a declaration is bound to part
//! of the request (path, query, header, cookie, matrix, form) or is the
//! request entity.

use crate::declaration::{Annotation, FieldDecl, ParamDecl, Position, PropertyDecl, TypeRef};

/// The closed set of request-binding categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Matrix,
    Query,
    Path,
    Cookie,
    Header,
    Form,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::Matrix => "matrix",
            ParameterKind::Query => "query",
            ParameterKind::Path => "path",
            ParameterKind::Cookie => "cookie",
            ParameterKind::Header => "header",
            ParameterKind::Form => "form",
        }
    }
}

/// One request-binding parameter of a resource, method or locator.
///
/// Built once per annotated declaration and immutable afterwards. Inherited
/// parameters are cloned into derived lists unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceParameter {
    /// The name declared by the binding annotation.
    pub parameter_name: Option<String>,
    /// Value of a `DefaultValue` annotation, when present.
    pub default_value: Option<String>,
    pub kind: ParameterKind,
    /// The declared type of the underlying declaration.
    pub type_ref: TypeRef,
    /// Name of the declaration this parameter was built from, for diagnostics.
    pub source: String,
    pub position: Option<Position>,
}

/// Classifies a declaration by its annotations.
///
/// The six binding categories are inspected in the fixed order matrix, query,
/// path, cookie, header, form, and the last category with a matching
/// annotation wins when a declaration is multi-annotated. This preserves the
/// historical sequential-overwrite semantics; the default validator flags
/// multi-annotated declarations separately, so the ambiguity surfaces as a
/// validation error rather than silently changing precedence.
///
/// Returns `None` when no binding annotation is present, which is the signal
/// callers use to select the entity parameter.
pub fn classify_annotations(
    source: &str,
    type_ref: &TypeRef,
    annotations: &[Annotation],
    position: Option<&Position>,
) -> Option<ResourceParameter> {
    let mut binding: Option<(ParameterKind, &str)> = None;

    for a in annotations {
        if let Annotation::Matrix(name) = a {
            binding = Some((ParameterKind::Matrix, name));
        }
    }
    for a in annotations {
        if let Annotation::Query(name) = a {
            binding = Some((ParameterKind::Query, name));
        }
    }
    for a in annotations {
        if let Annotation::PathParam(name) = a {
            binding = Some((ParameterKind::Path, name));
        }
    }
    for a in annotations {
        if let Annotation::Cookie(name) = a {
            binding = Some((ParameterKind::Cookie, name));
        }
    }
    for a in annotations {
        if let Annotation::Header(name) = a {
            binding = Some((ParameterKind::Header, name));
        }
    }
    for a in annotations {
        if let Annotation::Form(name) = a {
            binding = Some((ParameterKind::Form, name));
        }
    }

    let (kind, name) = binding?;
    let default_value = annotations.iter().find_map(|a| match a {
        Annotation::DefaultValue(v) => Some(v.clone()),
        _ => None,
    });

    Some(ResourceParameter {
        parameter_name: Some(name.to_string()),
        default_value,
        kind,
        type_ref: type_ref.clone(),
        source: source.to_string(),
        position: position.cloned(),
    })
}

/// True iff any binding annotation is present. Callers use this to separate
/// resource-bound parameters from the entity parameter.
pub fn is_resource_parameter(annotations: &[Annotation]) -> bool {
    annotations.iter().any(Annotation::is_binding)
}

/// How many binding annotations the declaration carries. More than one is a
/// validation error.
pub fn binding_annotation_count(annotations: &[Annotation]) -> usize {
    annotations.iter().filter(|a| a.is_binding()).count()
}

pub fn classify_param(decl: &ParamDecl) -> Option<ResourceParameter> {
    classify_annotations(
        &decl.name,
        &decl.type_ref,
        &decl.annotations,
        decl.position.as_ref(),
    )
}

pub fn classify_field(decl: &FieldDecl) -> Option<ResourceParameter> {
    classify_annotations(
        &decl.name,
        &decl.type_ref,
        &decl.annotations,
        decl.position.as_ref(),
    )
}

pub fn classify_property(decl: &PropertyDecl) -> Option<ResourceParameter> {
    classify_annotations(
        &decl.name,
        &decl.type_ref,
        &decl.combined_annotations(),
        decl.position.as_ref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::TypeRef;
    use pretty_assertions::assert_eq;

    fn string_param(annotations: Vec<Annotation>) -> ParamDecl {
        ParamDecl::new("value", TypeRef::named("String")).with_annotations(annotations)
    }

    #[test]
    fn test_classify_each_category() {
        let cases = [
            (Annotation::Matrix("m".into()), ParameterKind::Matrix),
            (Annotation::Query("q".into()), ParameterKind::Query),
            (Annotation::PathParam("p".into()), ParameterKind::Path),
            (Annotation::Cookie("c".into()), ParameterKind::Cookie),
            (Annotation::Header("h".into()), ParameterKind::Header),
            (Annotation::Form("f".into()), ParameterKind::Form),
        ];
        for (annotation, expected) in cases {
            let decl = string_param(vec![annotation]);
            let param = classify_param(&decl).unwrap();
            assert_eq!(param.kind, expected);
        }
    }

    #[test]
    fn test_classify_takes_name_and_default() {
        let decl = string_param(vec![
            Annotation::Query("page".into()),
            Annotation::DefaultValue("1".into()),
        ]);
        let param = classify_param(&decl).unwrap();
        assert_eq!(param.parameter_name.as_deref(), Some("page"));
        assert_eq!(param.default_value.as_deref(), Some("1"));
        assert_eq!(param.source, "value");
    }

    #[test]
    fn test_unannotated_declaration_is_not_classified() {
        let decl = string_param(vec![]);
        assert!(classify_param(&decl).is_none());
        assert!(!is_resource_parameter(&decl.annotations));
    }

    #[test]
    fn test_context_is_not_a_binding() {
        let decl = string_param(vec![Annotation::Context]);
        assert!(classify_param(&decl).is_none());
    }

    // Multi-annotated declarations keep the sequential-overwrite precedence:
    // form beats header beats cookie beats path beats query beats matrix.
    #[test]
    fn test_multi_annotation_last_category_wins() {
        let decl = string_param(vec![
            Annotation::Form("f".into()),
            Annotation::Matrix("m".into()),
        ]);
        let param = classify_param(&decl).unwrap();
        assert_eq!(param.kind, ParameterKind::Form);
        assert_eq!(param.parameter_name.as_deref(), Some("f"));

        let decl = string_param(vec![
            Annotation::Header("h".into()),
            Annotation::Query("q".into()),
        ]);
        let param = classify_param(&decl).unwrap();
        assert_eq!(param.kind, ParameterKind::Header);
    }

    #[test]
    fn test_binding_annotation_count() {
        let decl = string_param(vec![
            Annotation::Query("q".into()),
            Annotation::Header("h".into()),
            Annotation::DefaultValue("x".into()),
        ]);
        assert_eq!(binding_annotation_count(&decl.annotations), 2);
    }

    #[test]
    fn test_classify_property_merges_accessor_halves() {
        let mut prop = PropertyDecl::new("token", TypeRef::named("String"));
        prop.getter_annotations = vec![Annotation::Header("X-Token".into())];
        prop.setter_annotations = vec![Annotation::DefaultValue("none".into())];
        let param = classify_property(&prop).unwrap();
        assert_eq!(param.kind, ParameterKind::Header);
        assert_eq!(param.default_value.as_deref(), Some("none"));
    }
}
