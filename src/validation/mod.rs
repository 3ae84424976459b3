//! The validation rule engine: a chain of independent, stateless rule sets
//! run against the assembled model and the raw declarations.
//!
//! Every rule is a pure function from a model entity to a
//! [`ValidationResult`]; rules never mutate the model, never abort traversal
//! and never suppress each other, so the aggregated result is independent of
//! execution order except for message ordering.

pub mod result;

pub use result::{Diagnose, Message, ValidationResult};

use std::collections::HashSet;
use std::mem;

use log::debug;

use crate::declaration::{
    Annotation, BindingStyle, DeclarationGraph, MethodDecl, PackageDecl, ParameterStyle,
    PropertyDecl, TypeDecl, TypeKind, TypeRef,
};
use crate::model::locator::SubResourceLocator;
use crate::model::method::ResourceMethod;
use crate::model::param::binding_annotation_count;
use crate::model::resource::{Resource, RootResource};

/// Rule id for the reference-integrity check: an `XmlIdRef`-bound accessor
/// must point at a type exposing an `XmlId` field.
pub const RULE_XMLIDREF_REFERENCES_XMLID: &str = "jaxb.xmlidref.references.xmlid";

/// Rule id for the companion check that the referenced id field is a string.
pub const RULE_XMLID_STRING: &str = "jaxb.xmlid.string";

/// One entry point per validated entity kind. Implementations must be pure
/// with respect to the model; they may recurse into child validations and
/// aggregate the results.
pub trait ContractValidator {
    fn validate_endpoint_interface(
        &self,
        decl: &TypeDecl,
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        let _ = (decl, graph);
        ValidationResult::new()
    }

    fn validate_endpoint_implementation(
        &self,
        implementation: &TypeDecl,
        interface: &TypeDecl,
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        let _ = (implementation, interface, graph);
        ValidationResult::new()
    }

    fn validate_root_resources(
        &self,
        resources: &[RootResource],
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        let _ = (resources, graph);
        ValidationResult::new()
    }

    fn validate_complex_type(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        let _ = (decl, graph);
        ValidationResult::new()
    }

    fn validate_simple_type(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        let _ = (decl, graph);
        ValidationResult::new()
    }

    fn validate_enum_type(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        let _ = (decl, graph);
        ValidationResult::new()
    }

    fn validate_accessor(
        &self,
        accessor: &PropertyDecl,
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        let _ = (accessor, graph);
        ValidationResult::new()
    }

    fn validate_root_element(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        let _ = (decl, graph);
        ValidationResult::new()
    }

    fn validate_package(&self, decl: &PackageDecl) -> ValidationResult {
        let _ = decl;
        ValidationResult::new()
    }
}

/// Composes any number of independent rule sets. Each entry point invokes the
/// corresponding method on every member in registration order and aggregates
/// the results.
#[derive(Default)]
pub struct ValidatorChain {
    members: Vec<Box<dyn ContractValidator>>,
}

impl ValidatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, member: Box<dyn ContractValidator>) {
        self.members.push(member);
    }

    fn run(
        &self,
        invoke: impl Fn(&dyn ContractValidator) -> ValidationResult,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        for member in &self.members {
            result.aggregate(invoke(member.as_ref()));
        }
        result
    }
}

impl ContractValidator for ValidatorChain {
    fn validate_endpoint_interface(
        &self,
        decl: &TypeDecl,
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        self.run(|m| m.validate_endpoint_interface(decl, graph))
    }

    fn validate_endpoint_implementation(
        &self,
        implementation: &TypeDecl,
        interface: &TypeDecl,
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        self.run(|m| m.validate_endpoint_implementation(implementation, interface, graph))
    }

    fn validate_root_resources(
        &self,
        resources: &[RootResource],
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        self.run(|m| m.validate_root_resources(resources, graph))
    }

    fn validate_complex_type(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        self.run(|m| m.validate_complex_type(decl, graph))
    }

    fn validate_simple_type(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        self.run(|m| m.validate_simple_type(decl, graph))
    }

    fn validate_enum_type(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        self.run(|m| m.validate_enum_type(decl, graph))
    }

    fn validate_accessor(
        &self,
        accessor: &PropertyDecl,
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        self.run(|m| m.validate_accessor(accessor, graph))
    }

    fn validate_root_element(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        self.run(|m| m.validate_root_element(decl, graph))
    }

    fn validate_package(&self, decl: &PackageDecl) -> ValidationResult {
        self.run(|m| m.validate_package(decl))
    }
}

/// A type is string-convertible, and thus a legal bound-parameter type, iff
/// it is a primitive, the string type, a single-argument list/set/sorted-set
/// of a convertible element type, has a single-string-argument constructor,
/// or exposes a static self-returning single-string-argument factory.
pub fn string_convertible(graph: &DeclarationGraph, type_ref: &TypeRef) -> bool {
    convertible_inner(graph, type_ref, 0)
}

fn convertible_inner(graph: &DeclarationGraph, type_ref: &TypeRef, depth: usize) -> bool {
    if depth > 8 || type_ref.array {
        return false;
    }
    if type_ref.is_primitive() || type_ref.is_string() {
        return true;
    }
    if let Some(elem) = type_ref.element_type() {
        return convertible_inner(graph, elem, depth + 1);
    }
    if let Some(decl) = graph.get(&type_ref.name) {
        if decl
            .constructors
            .iter()
            .any(|c| c.params.len() == 1 && c.params[0].type_ref.is_string())
        {
            return true;
        }
        if decl.methods.iter().any(|m| {
            m.is_static
                && m.params.len() == 1
                && m.params[0].type_ref.is_string()
                && m.return_type.as_ref().map_or(false, |r| {
                    r.name == decl.simple_name || r.name == decl.qualified_name
                })
        }) {
            return true;
        }
    }
    false
}

/// The default rule set. Stateless apart from the configurable set of rule
/// ids whose errors are downgraded to warnings.
#[derive(Default)]
pub struct DefaultValidator {
    disabled_rules: HashSet<String>,
}

impl DefaultValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disabled_rules(disabled_rules: HashSet<String>) -> Self {
        Self { disabled_rules }
    }

    /// Reports through a rule id: an error normally, a warning when the rule
    /// is disabled.
    fn report(
        &self,
        rule: &str,
        result: &mut ValidationResult,
        source: &dyn Diagnose,
        text: String,
    ) {
        if self.disabled_rules.contains(rule) {
            result.add_warning(source, text);
        } else {
            result.add_error(source, text);
        }
    }

    fn binding_of(interface: &TypeDecl, method: &MethodDecl) -> (BindingStyle, ParameterStyle) {
        method
            .annotations
            .iter()
            .find_map(|a| match a {
                Annotation::SoapBinding {
                    style,
                    parameter_style,
                } => Some((*style, *parameter_style)),
                _ => None,
            })
            .or_else(|| interface.soap_binding())
            .unwrap_or((BindingStyle::Document, ParameterStyle::Wrapped))
    }

    fn validate_header_messages(&self, method: &MethodDecl, result: &mut ValidationResult) {
        for a in &method.annotations {
            if let Annotation::WebResult {
                header: true,
                element_name,
            } = a
            {
                if element_name.is_none() {
                    result.add_error(
                        method,
                        format!(
                            "operation '{}': a header-bound result requires an explicit element name",
                            method.name
                        ),
                    );
                }
                if let Some(ret) = &method.return_type {
                    if ret.array || ret.is_collection() {
                        result.add_warning(
                            method,
                            format!(
                                "operation '{}': header-bound collection results serialize ambiguously",
                                method.name
                            ),
                        );
                    }
                }
            }
        }
        for p in &method.params {
            for a in &p.annotations {
                if let Annotation::WebParam {
                    header: true,
                    element_name,
                } = a
                {
                    if element_name.is_none() {
                        result.add_error(
                            p,
                            format!(
                                "parameter '{}': a header-bound parameter requires an explicit element name",
                                p.name
                            ),
                        );
                    }
                    if p.type_ref.array || p.type_ref.is_collection() {
                        result.add_warning(
                            p,
                            format!(
                                "parameter '{}': header-bound collection values serialize ambiguously",
                                p.name
                            ),
                        );
                    }
                }
            }
        }
    }

    fn validate_bare_style(&self, method: &MethodDecl, result: &mut ValidationResult) {
        let is_header = |p: &crate::declaration::ParamDecl| {
            p.annotations
                .iter()
                .any(|a| matches!(a, Annotation::WebParam { header: true, .. }))
        };

        let inputs: Vec<_> = method.params.iter().filter(|p| !is_header(p)).collect();
        if inputs.len() != 1 {
            result.add_error(
                method,
                format!(
                    "operation '{}': bare style permits exactly one input message part, found {}",
                    method.name,
                    inputs.len()
                ),
            );
        }
        if !method.is_one_way() && method.return_type.is_none() {
            result.add_error(
                method,
                format!(
                    "operation '{}': bare style requires exactly one output message part",
                    method.name
                ),
            );
        }
        for p in inputs {
            if p.type_ref.array {
                result.add_error(
                    p,
                    format!(
                        "parameter '{}': arrays are not allowed as bare message parts",
                        p.name
                    ),
                );
            }
        }
        if let Some(ret) = &method.return_type {
            if ret.array {
                result.add_error(
                    method,
                    format!(
                        "operation '{}': arrays are not allowed as bare message parts",
                        method.name
                    ),
                );
            }
        }
    }

    fn validate_resource_method(
        &self,
        method: &ResourceMethod,
        graph: &DeclarationGraph,
        result: &mut ValidationResult,
    ) {
        // At most one entity parameter; context parameters are exempt.
        if method.entity_candidates().len() > 1 {
            result.add_error(
                method,
                format!(
                    "resource method '{}' declares {} entity parameters; no more than one entity parameter is allowed",
                    method.name,
                    method.entity_candidates().len()
                ),
            );
        }

        // A form parameter next to an entity forces the entity to be a
        // multivalued string map.
        if method.has_form_parameter() {
            if let Some(entity) = method.entity_parameter() {
                if !is_multivalued_string_map(&entity.type_ref) {
                    result.add_error(
                        method,
                        format!(
                            "resource method '{}' mixes form parameters with an entity of type {}; the entity must be a MultivaluedMap<String, String>",
                            method.name, entity.type_ref
                        ),
                    );
                }
            }
        }

        for p in method.param_decls() {
            self.validate_binding(p, &p.name, &p.annotations, &p.type_ref, graph, result);
        }
    }

    /// The shared per-declaration binding rules: at most one binding
    /// annotation, and a string-convertible type when bound. Applies alike to
    /// method parameters, locator parameters, fields, accessor properties and
    /// constructor parameters.
    fn validate_binding(
        &self,
        subject: &dyn Diagnose,
        name: &str,
        annotations: &[Annotation],
        type_ref: &TypeRef,
        graph: &DeclarationGraph,
        result: &mut ValidationResult,
    ) {
        let bindings = binding_annotation_count(annotations);
        if bindings > 1 {
            result.add_error(
                subject,
                format!(
                    "parameter '{}' carries {} binding annotations; only one is allowed",
                    name, bindings
                ),
            );
        }
        if bindings >= 1 && !string_convertible(graph, type_ref) {
            result.add_error(
                subject,
                format!(
                    "parameter '{}' has unsupported type {}; bound parameters must be convertible from their string value",
                    name, type_ref
                ),
            );
        }
    }

    fn validate_locator(
        &self,
        locator: &SubResourceLocator,
        graph: &DeclarationGraph,
        result: &mut ValidationResult,
    ) {
        if locator.entity_candidates().len() > 1 {
            result.add_error(
                locator,
                format!(
                    "sub-resource locator '{}' declares {} entity parameters; no more than one entity parameter is allowed",
                    locator.name,
                    locator.entity_candidates().len()
                ),
            );
        }
        for p in locator.param_decls() {
            self.validate_binding(p, &p.name, &p.annotations, &p.type_ref, graph, result);
        }
        self.validate_resource(locator.resource().resource(), graph, result);
    }

    fn validate_resource(
        &self,
        resource: &Resource,
        graph: &DeclarationGraph,
        result: &mut ValidationResult,
    ) {
        // Bindings declared on the backing type itself: fields, accessor
        // properties and constructor parameters.
        if let Some(decl) = graph.get(&resource.type_name) {
            for f in &decl.fields {
                self.validate_binding(f, &f.name, &f.annotations, &f.type_ref, graph, result);
            }
            for p in &decl.properties {
                self.validate_binding(
                    p,
                    &p.name,
                    &p.combined_annotations(),
                    &p.type_ref,
                    graph,
                    result,
                );
            }
            for ctor in &decl.constructors {
                for p in &ctor.params {
                    self.validate_binding(p, &p.name, &p.annotations, &p.type_ref, graph, result);
                }
            }
        }
        for method in resource.resource_methods() {
            self.validate_resource_method(method, graph, result);
        }
        for locator in resource.resource_locators() {
            self.validate_locator(locator, graph, result);
        }
    }
}

/// The shape a form-accompanied entity must have.
fn is_multivalued_string_map(type_ref: &TypeRef) -> bool {
    type_ref.name == "MultivaluedMap"
        && type_ref.args.len() == 2
        && type_ref.args.iter().all(TypeRef::is_string)
}

/// Annotation categories that may not be repeated between the getter and the
/// setter of one accessor.
fn shared_accessor_annotation(getter: &[Annotation], setter: &[Annotation]) -> Option<String> {
    for g in getter {
        let relevant = g.is_binding()
            || matches!(
                g,
                Annotation::XmlId | Annotation::XmlIdRef | Annotation::DefaultValue(_)
            );
        if !relevant {
            continue;
        }
        if setter
            .iter()
            .any(|s| mem::discriminant(s) == mem::discriminant(g))
        {
            return Some(format!("{:?}", g));
        }
    }
    None
}

impl ContractValidator for DefaultValidator {
    fn validate_endpoint_interface(
        &self,
        decl: &TypeDecl,
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        debug!("Validating endpoint interface {}", decl.qualified_name);
        let mut result = ValidationResult::new();

        match decl.web_service() {
            None => result.add_error(
                decl,
                format!(
                    "{} is used as an endpoint interface but carries no web service annotation",
                    decl.qualified_name
                ),
            ),
            Some(Some(other)) => result.add_error(
                decl,
                format!(
                    "endpoint interface {} must not delegate to another endpoint interface ({})",
                    decl.qualified_name, other
                ),
            ),
            Some(None) => {}
        }

        match decl.kind {
            TypeKind::Enum => result.add_error(
                decl,
                format!("{} is an enum and cannot be an endpoint interface", decl.qualified_name),
            ),
            TypeKind::Annotation => result.add_error(
                decl,
                format!(
                    "{} is an annotation type and cannot be an endpoint interface",
                    decl.qualified_name
                ),
            ),
            TypeKind::Interface | TypeKind::Class => {}
        }

        // Advisory only: an interface nobody implements yields no endpoints.
        if decl.kind == TypeKind::Interface {
            let implemented = graph.types().any(|t| {
                t.kind == TypeKind::Class
                    && (graph.is_assignable(&t.qualified_name, &decl.qualified_name)
                        || matches!(t.web_service(), Some(Some(name)) if graph
                            .get(name)
                            .map_or(false, |r| r.qualified_name == decl.qualified_name)))
            });
            if !implemented {
                result.add_warning(
                    decl,
                    format!(
                        "endpoint interface {} has no implementing class",
                        decl.qualified_name
                    ),
                );
            }
        }

        // All operations must share one binding style.
        let mut first_style: Option<BindingStyle> = None;
        for method in &decl.methods {
            let (style, parameter_style) = Self::binding_of(decl, method);
            match first_style {
                None => first_style = Some(style),
                Some(first) if first != style => result.add_error(
                    method,
                    format!(
                        "operation '{}' uses a different binding style than the rest of {}",
                        method.name, decl.qualified_name
                    ),
                ),
                Some(_) => {}
            }

            self.validate_header_messages(method, &mut result);
            if parameter_style == ParameterStyle::Bare {
                self.validate_bare_style(method, &mut result);
            }
        }

        // Operation names must be unique, case-sensitively.
        let mut seen = HashSet::new();
        for method in &decl.methods {
            if !seen.insert(method.name.as_str()) {
                result.add_error(
                    method,
                    format!(
                        "duplicate operation name '{}' in {}",
                        method.name, decl.qualified_name
                    ),
                );
            }
        }

        result
    }

    fn validate_endpoint_implementation(
        &self,
        implementation: &TypeDecl,
        interface: &TypeDecl,
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();

        if interface.kind != TypeKind::Interface {
            result.add_error(
                interface,
                format!("{} is not an interface", interface.qualified_name),
            );
        }
        if !graph.is_assignable(&implementation.qualified_name, &interface.qualified_name) {
            result.add_error(
                implementation,
                format!(
                    "{} does not implement its declared endpoint interface {}",
                    implementation.qualified_name, interface.qualified_name
                ),
            );
        }

        result
    }

    fn validate_root_resources(
        &self,
        resources: &[RootResource],
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        for root in resources {
            debug!("Validating root resource at {}", root.path);
            self.validate_resource(root.resource(), graph, &mut result);
        }
        result
    }

    fn validate_complex_type(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !decl.constructors.is_empty()
            && !decl.constructors.iter().any(|c| c.params.is_empty())
        {
            result.add_error(
                decl,
                format!(
                    "complex type {} requires a no-argument constructor",
                    decl.qualified_name
                ),
            );
        }

        let mut seen = HashSet::new();
        for p in &decl.properties {
            if !seen.insert(p.name.as_str()) {
                result.add_error(
                    p,
                    format!(
                        "duplicate element name '{}' in {}",
                        p.name, decl.qualified_name
                    ),
                );
            }
        }

        for p in &decl.properties {
            let child = self.validate_accessor(p, graph);
            result.aggregate_labeled(&format!("accessor '{}'", p.name), child);
        }

        result
    }

    fn validate_simple_type(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        let mut result = ValidationResult::new();
        let self_ref = TypeRef::named(decl.qualified_name.clone());
        if !string_convertible(graph, &self_ref) {
            result.add_error(
                decl,
                format!(
                    "simple type {} must be convertible from its string value",
                    decl.qualified_name
                ),
            );
        }
        result
    }

    fn validate_enum_type(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        let _ = graph;
        let mut result = ValidationResult::new();
        if decl.kind != TypeKind::Enum {
            result.add_error(
                decl,
                format!("{} is not an enum type", decl.qualified_name),
            );
        } else if decl.fields.iter().filter(|f| f.is_static).count() == 0 {
            result.add_warning(
                decl,
                format!("enum type {} declares no constants", decl.qualified_name),
            );
        }
        result
    }

    fn validate_accessor(
        &self,
        accessor: &PropertyDecl,
        graph: &DeclarationGraph,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !(accessor.has_getter && accessor.has_setter) {
            result.add_error(
                accessor,
                format!(
                    "accessor '{}' requires both a getter and a setter",
                    accessor.name
                ),
            );
        }

        if let Some(repeated) =
            shared_accessor_annotation(&accessor.getter_annotations, &accessor.setter_annotations)
        {
            result.add_error(
                accessor,
                format!(
                    "accessor '{}' repeats the {} annotation on both getter and setter",
                    accessor.name, repeated
                ),
            );
        }

        let has_idref = accessor
            .combined_annotations()
            .iter()
            .any(|a| matches!(a, Annotation::XmlIdRef));
        if has_idref {
            let target = accessor
                .type_ref
                .element_type()
                .unwrap_or(&accessor.type_ref);
            match graph.get(&target.name) {
                None => result.add_warning(
                    accessor,
                    format!(
                        "accessor '{}': cannot resolve referenced type {}",
                        accessor.name, target.name
                    ),
                ),
                Some(target_decl) => match target_decl.xml_id_field() {
                    None => self.report(
                        RULE_XMLIDREF_REFERENCES_XMLID,
                        &mut result,
                        accessor,
                        format!(
                            "accessor '{}' references {} which declares no id field",
                            accessor.name, target_decl.qualified_name
                        ),
                    ),
                    Some(id_field) if !id_field.type_ref.is_string() => self.report(
                        RULE_XMLID_STRING,
                        &mut result,
                        accessor,
                        format!(
                            "accessor '{}' references {} whose id field '{}' is not a string",
                            accessor.name, target_decl.qualified_name, id_field.name
                        ),
                    ),
                    Some(_) => {}
                },
            }
        }

        result
    }

    fn validate_root_element(&self, decl: &TypeDecl, graph: &DeclarationGraph) -> ValidationResult {
        let _ = graph;
        let mut result = ValidationResult::new();

        if decl.root_element().is_none() {
            result.add_error(
                decl,
                format!(
                    "{} is used as a root element but carries no root element annotation",
                    decl.qualified_name
                ),
            );
        }
        if decl.kind == TypeKind::Interface {
            result.add_error(
                decl,
                format!("{} is an interface and cannot be a root element", decl.qualified_name),
            );
        }
        if !decl.constructors.is_empty()
            && !decl.constructors.iter().any(|c| c.params.is_empty())
        {
            result.add_error(
                decl,
                format!(
                    "root element {} requires a no-argument constructor",
                    decl.qualified_name
                ),
            );
        }

        result
    }

    fn validate_package(&self, decl: &PackageDecl) -> ValidationResult {
        let mut result = ValidationResult::new();
        let has_namespace = decl
            .annotations
            .iter()
            .any(|a| matches!(a, Annotation::SchemaNamespace(_)));
        if !has_namespace {
            result.add_warning(
                decl,
                format!("package {} declares no schema namespace", decl.name),
            );
        }
        result
    }
}
