//! The abstract declaration graph consumed by the model builder.
//!
//! Declarations are plain, immutable data: types with their methods, fields,
//! accessor properties and constructors, each carrying the annotations that
//! were found on it and an optional source position. The graph is the boundary
//! between the contract core and whatever front end produced the declarations;
//! the [`crate::adapter`] module is one such front end, and tests construct
//! graphs directly.
//!
//! Override and hiding checks are pure functions over two signatures, so the
//! model builder never needs to peel decoration layers or consult a runtime:
//! a declaration's identity is its place in the graph.

use std::collections::BTreeMap;
use std::fmt;

/// A source location, when the front end could resolve one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file: String,
    pub line: usize,
}

impl Position {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// What species of type a declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Interface,
    Class,
    Enum,
    /// An annotation type. Never a legal endpoint interface.
    Annotation,
}

/// Binding style declared on an endpoint interface or one of its operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStyle {
    Document,
    Rpc,
}

/// Parameter style under the document binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    Wrapped,
    Bare,
}

/// The closed set of annotations the contract core recognizes.
///
/// Path templates support inline per-parameter regex constraints with the
/// `{name:regex}` syntax; the model strips the constraint for display while
/// keeping `{name}` for pattern matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Path template on a type, resource method or locator.
    Path(String),
    /// HTTP verb marker, e.g. `GET`.
    HttpMethod(String),
    Matrix(String),
    Query(String),
    PathParam(String),
    Cookie(String),
    Header(String),
    Form(String),
    /// Context injection; exempt from resource-parameter rules.
    Context,
    DefaultValue(String),
    Consumes(Vec<String>),
    Produces(Vec<String>),
    /// Endpoint interface marker. When `endpoint_interface` is set on an
    /// implementation class it names the interface the class serves.
    WebService { endpoint_interface: Option<String> },
    SoapBinding {
        style: BindingStyle,
        parameter_style: ParameterStyle,
    },
    OneWay,
    WebResult {
        header: bool,
        element_name: Option<String>,
    },
    WebParam {
        header: bool,
        element_name: Option<String>,
    },
    XmlId,
    XmlIdRef,
    RootElement(Option<String>),
    SchemaNamespace(String),
}

impl Annotation {
    /// Whether this annotation binds a declaration to part of the request
    /// (as opposed to marking it, or selecting the entity).
    pub fn is_binding(&self) -> bool {
        matches!(
            self,
            Annotation::Matrix(_)
                | Annotation::Query(_)
                | Annotation::PathParam(_)
                | Annotation::Cookie(_)
                | Annotation::Header(_)
                | Annotation::Form(_)
        )
    }
}

/// A type reference with erased-comparison semantics: two references are the
/// same erased type when their names match, generic arguments ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
    pub array: bool,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array: false,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
            array: false,
        }
    }

    pub fn array_of(elem: TypeRef) -> Self {
        Self {
            array: true,
            ..elem
        }
    }

    pub fn erased_name(&self) -> &str {
        &self.name
    }

    pub fn is_string(&self) -> bool {
        !self.array && (self.name == "String" || self.name == "string" || self.name == "str")
    }

    pub fn is_primitive(&self) -> bool {
        !self.array
            && matches!(
                self.name.as_str(),
                "bool"
                    | "boolean"
                    | "char"
                    | "byte"
                    | "short"
                    | "int"
                    | "long"
                    | "float"
                    | "double"
                    | "i8"
                    | "i16"
                    | "i32"
                    | "i64"
                    | "u8"
                    | "u16"
                    | "u32"
                    | "u64"
                    | "usize"
                    | "isize"
                    | "f32"
                    | "f64"
            )
    }

    /// Single-type-argument collection shapes that unwrap for convertibility
    /// and header checks.
    pub fn is_collection(&self) -> bool {
        !self.array
            && self.args.len() == 1
            && matches!(self.name.as_str(), "List" | "Set" | "SortedSet" | "Collection")
    }

    pub fn element_type(&self) -> Option<&TypeRef> {
        if self.is_collection() {
            self.args.first()
        } else {
            None
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        if self.array {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

/// A method or constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub type_ref: TypeRef,
    pub annotations: Vec<Annotation>,
    pub position: Option<Position>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            annotations: Vec::new(),
            position: None,
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn has_context(&self) -> bool {
        self.annotations.iter().any(|a| matches!(a, Annotation::Context))
    }
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub params: Vec<ParamDecl>,
    /// `None` means the method returns nothing.
    pub return_type: Option<TypeRef>,
    pub is_static: bool,
    pub position: Option<Position>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            params: Vec::new(),
            return_type: None,
            is_static: false,
            position: None,
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_params(mut self, params: Vec<ParamDecl>) -> Self {
        self.params = params;
        self
    }

    pub fn returning(mut self, type_ref: TypeRef) -> Self {
        self.return_type = Some(type_ref);
        self
    }

    pub fn is_one_way(&self) -> bool {
        self.annotations.iter().any(|a| matches!(a, Annotation::OneWay))
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub type_ref: TypeRef,
    pub annotations: Vec<Annotation>,
    pub is_static: bool,
    pub position: Option<Position>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            annotations: Vec::new(),
            is_static: false,
            position: None,
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }
}

/// A bean-style accessor: the getter/setter pair for one logical property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: String,
    pub type_ref: TypeRef,
    pub getter_annotations: Vec<Annotation>,
    pub setter_annotations: Vec<Annotation>,
    pub has_getter: bool,
    pub has_setter: bool,
    pub position: Option<Position>,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            getter_annotations: Vec::new(),
            setter_annotations: Vec::new(),
            has_getter: true,
            has_setter: true,
            position: None,
        }
    }

    /// All annotations on either half of the accessor, getter first.
    pub fn combined_annotations(&self) -> Vec<Annotation> {
        let mut all = self.getter_annotations.clone();
        all.extend(self.setter_annotations.iter().cloned());
        all
    }
}

/// A constructor declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDecl {
    pub params: Vec<ParamDecl>,
    pub position: Option<Position>,
}

impl ConstructorDecl {
    pub fn new(params: Vec<ParamDecl>) -> Self {
        Self {
            params,
            position: None,
        }
    }
}

/// A type declaration: the unit the resource model builder walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub qualified_name: String,
    pub simple_name: String,
    pub kind: TypeKind,
    pub annotations: Vec<Annotation>,
    pub superclass: Option<String>,
    /// Direct superinterfaces, in declared order.
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodDecl>,
    pub fields: Vec<FieldDecl>,
    pub properties: Vec<PropertyDecl>,
    pub constructors: Vec<ConstructorDecl>,
    pub position: Option<Position>,
    /// Provenance chain for declarations pulled into the model transitively,
    /// carried into diagnostics.
    pub referenced_from: Vec<String>,
}

impl TypeDecl {
    pub fn new(qualified_name: impl Into<String>, kind: TypeKind) -> Self {
        let qualified_name = qualified_name.into();
        let simple_name = qualified_name
            .rsplit("::")
            .next()
            .unwrap_or(&qualified_name)
            .to_string();
        Self {
            qualified_name,
            simple_name,
            kind,
            annotations: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            position: None,
            referenced_from: Vec::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn path_annotation(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Path(p) => Some(p.as_str()),
            _ => None,
        })
    }

    pub fn consumes(&self) -> Option<&[String]> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Consumes(m) => Some(m.as_slice()),
            _ => None,
        })
    }

    pub fn produces(&self) -> Option<&[String]> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Produces(m) => Some(m.as_slice()),
            _ => None,
        })
    }

    pub fn web_service(&self) -> Option<&Option<String>> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::WebService { endpoint_interface } => Some(endpoint_interface),
            _ => None,
        })
    }

    pub fn soap_binding(&self) -> Option<(BindingStyle, ParameterStyle)> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::SoapBinding {
                style,
                parameter_style,
            } => Some((*style, *parameter_style)),
            _ => None,
        })
    }

    pub fn root_element(&self) -> Option<&Option<String>> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::RootElement(name) => Some(name),
            _ => None,
        })
    }

    /// Field annotated with `XmlId`, if any.
    pub fn xml_id_field(&self) -> Option<&FieldDecl> {
        self.fields
            .iter()
            .find(|f| f.annotations.iter().any(|a| matches!(a, Annotation::XmlId)))
    }
}

/// A package declaration, validated for schema bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub position: Option<Position>,
}

/// Annotation lookups shared by every declaration species.
pub trait Annotated {
    fn annotations(&self) -> &[Annotation];

    fn path_value(&self) -> Option<&str> {
        self.annotations().iter().find_map(|a| match a {
            Annotation::Path(p) => Some(p.as_str()),
            _ => None,
        })
    }

    /// Every HTTP verb annotation, in declaration order.
    fn http_methods(&self) -> Vec<String> {
        self.annotations()
            .iter()
            .filter_map(|a| match a {
                Annotation::HttpMethod(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    fn has_http_method(&self) -> bool {
        self.annotations()
            .iter()
            .any(|a| matches!(a, Annotation::HttpMethod(_)))
    }

    fn consumes_value(&self) -> Option<Vec<String>> {
        self.annotations().iter().find_map(|a| match a {
            Annotation::Consumes(m) => Some(m.clone()),
            _ => None,
        })
    }

    fn produces_value(&self) -> Option<Vec<String>> {
        self.annotations().iter().find_map(|a| match a {
            Annotation::Produces(m) => Some(m.clone()),
            _ => None,
        })
    }
}

impl Annotated for TypeDecl {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl Annotated for MethodDecl {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl Annotated for FieldDecl {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl Annotated for ParamDecl {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// Standard override-compatibility: same name, same erased parameter type
/// list. Return-type covariance is permitted, so return types are not
/// compared at all.
pub fn overrides(derived: &MethodDecl, base: &MethodDecl) -> bool {
    derived.name == base.name
        && derived.params.len() == base.params.len()
        && derived
            .params
            .iter()
            .zip(base.params.iter())
            .all(|(a, b)| a.type_ref.erased_name() == b.type_ref.erased_name())
}

/// Member hiding: same name and same static/instance kind.
pub fn hides(derived_name: &str, derived_static: bool, base_name: &str, base_static: bool) -> bool {
    derived_name == base_name && derived_static == base_static
}

/// The full declaration graph for one extraction pass. Immutable once built.
#[derive(Debug, Default)]
pub struct DeclarationGraph {
    types: BTreeMap<String, TypeDecl>,
    packages: Vec<PackageDecl>,
}

impl DeclarationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, decl: TypeDecl) {
        self.types.insert(decl.qualified_name.clone(), decl);
    }

    pub fn add_package(&mut self, decl: PackageDecl) {
        self.packages.push(decl);
    }

    /// Looks a type up by qualified name, falling back to a unique simple
    /// name match so front ends may use short references.
    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        if let Some(decl) = self.types.get(name) {
            return Some(decl);
        }
        let mut found = None;
        for decl in self.types.values() {
            if decl.simple_name == name {
                if found.is_some() {
                    // Ambiguous simple name; force qualified lookup.
                    return None;
                }
                found = Some(decl);
            }
        }
        found
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.values()
    }

    pub fn packages(&self) -> &[PackageDecl] {
        &self.packages
    }

    /// Whether `sub` is assignable to `sup`, walking superinterfaces and the
    /// superclass transitively.
    pub fn is_assignable(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        let (sub_decl, sup_decl) = match (self.get(sub), self.get(sup)) {
            (Some(a), Some(b)) => (a, b),
            _ => return false,
        };
        if sub_decl.qualified_name == sup_decl.qualified_name {
            return true;
        }
        let mut stack: Vec<&str> = Vec::new();
        stack.extend(sub_decl.interfaces.iter().map(String::as_str));
        if let Some(sc) = &sub_decl.superclass {
            stack.push(sc);
        }
        let mut seen = Vec::new();
        while let Some(next) = stack.pop() {
            if seen.contains(&next.to_string()) {
                continue;
            }
            seen.push(next.to_string());
            if let Some(decl) = self.get(next) {
                if decl.qualified_name == sup_decl.qualified_name {
                    return true;
                }
                stack.extend(decl.interfaces.iter().map(String::as_str));
                if let Some(sc) = &decl.superclass {
                    stack.push(sc);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_requires_same_erased_signature() {
        let base = MethodDecl::new("get_one")
            .with_params(vec![ParamDecl::new("id", TypeRef::named("String"))]);
        let same = MethodDecl::new("get_one")
            .with_params(vec![ParamDecl::new("key", TypeRef::named("String"))]);
        let different = MethodDecl::new("get_one")
            .with_params(vec![ParamDecl::new("id", TypeRef::named("i64"))]);

        assert!(overrides(&same, &base));
        assert!(!overrides(&different, &base));
    }

    #[test]
    fn test_override_ignores_return_type() {
        let base = MethodDecl::new("locate").returning(TypeRef::named("Base"));
        let covariant = MethodDecl::new("locate").returning(TypeRef::named("Derived"));

        assert!(overrides(&covariant, &base));
    }

    #[test]
    fn test_hiding_distinguishes_static_kind() {
        assert!(hides("id", false, "id", false));
        assert!(!hides("id", true, "id", false));
        assert!(!hides("id", false, "other", false));
    }

    #[test]
    fn test_graph_lookup_by_simple_name() {
        let mut graph = DeclarationGraph::new();
        graph.add_type(TypeDecl::new("demo::UserService", TypeKind::Interface));

        assert!(graph.get("demo::UserService").is_some());
        assert!(graph.get("UserService").is_some());
        assert!(graph.get("Missing").is_none());
    }

    #[test]
    fn test_graph_lookup_ambiguous_simple_name() {
        let mut graph = DeclarationGraph::new();
        graph.add_type(TypeDecl::new("a::Thing", TypeKind::Class));
        graph.add_type(TypeDecl::new("b::Thing", TypeKind::Class));

        assert!(graph.get("Thing").is_none());
        assert!(graph.get("a::Thing").is_some());
    }

    #[test]
    fn test_assignability_walks_hierarchy() {
        let mut graph = DeclarationGraph::new();
        let mut iface = TypeDecl::new("demo::Api", TypeKind::Interface);
        iface.interfaces.push("demo::BaseApi".to_string());
        graph.add_type(TypeDecl::new("demo::BaseApi", TypeKind::Interface));
        graph.add_type(iface);
        let mut imp = TypeDecl::new("demo::ApiImpl", TypeKind::Class);
        imp.interfaces.push("demo::Api".to_string());
        graph.add_type(imp);

        assert!(graph.is_assignable("demo::ApiImpl", "demo::Api"));
        assert!(graph.is_assignable("demo::ApiImpl", "demo::BaseApi"));
        assert!(!graph.is_assignable("demo::BaseApi", "demo::ApiImpl"));
    }

    #[test]
    fn test_type_ref_display_and_shape() {
        let list = TypeRef::generic("List", vec![TypeRef::named("String")]);
        assert_eq!(list.to_string(), "List<String>");
        assert!(list.is_collection());
        assert!(list.element_type().unwrap().is_string());

        let arr = TypeRef::array_of(TypeRef::named("i32"));
        assert_eq!(arr.to_string(), "i32[]");
        assert!(!arr.is_primitive());
    }

    #[test]
    fn test_simple_name_derivation() {
        let decl = TypeDecl::new("a::b::Customer", TypeKind::Class);
        assert_eq!(decl.simple_name, "Customer");
    }
}
