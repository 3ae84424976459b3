//! The resource model builder: walks a type declaration's inheritance
//! hierarchy to assemble the resource contract, resolving override and hiding
//! conflicts along the way.
//!
//! Collection order is deterministic: declarations on the type itself come
//! first, then each direct superinterface recursively in declared order, then
//! the superclass recursively. An inherited candidate is dropped when
//! something already collected overrides (methods, locators) or hides
//! (fields, properties) it.

use log::debug;

use crate::declaration::{
    hides, overrides, Annotated, ConstructorDecl, DeclarationGraph, MethodDecl, TypeDecl,
};
use crate::error::{Error, Result};
use crate::model::locator::SubResourceLocator;
use crate::model::method::ResourceMethod;
use crate::model::param::{
    classify_field, classify_param, classify_property, is_resource_parameter, ResourceParameter,
};
use crate::model::default_mime_types;

/// The common shape of root and sub-resources. Built once, read-only after.
#[derive(Debug, Clone)]
pub struct Resource {
    /// The backing type declaration's qualified name.
    pub type_name: String,
    pub consumes_mime: Vec<String>,
    pub produces_mime: Vec<String>,
    resource_parameters: Vec<ResourceParameter>,
    resource_methods: Vec<ResourceMethod>,
    resource_locators: Vec<SubResourceLocator>,
    /// Root-to-self resource path segments, this resource's path last.
    path_chain: Vec<String>,
}

impl Resource {
    /// Own, interface-inherited and superclass-inherited parameters, plus any
    /// appended extras (constructor or locator parameters), in that order.
    pub fn resource_parameters(&self) -> &[ResourceParameter] {
        &self.resource_parameters
    }

    pub fn resource_methods(&self) -> &[ResourceMethod] {
        &self.resource_methods
    }

    pub fn resource_locators(&self) -> &[SubResourceLocator] {
        &self.resource_locators
    }

    pub fn path_chain(&self) -> &[String] {
        &self.path_chain
    }

    /// Assembles the resource contract for `decl`. `appended_params` land at
    /// the end of the parameter list; `ancestor_parameters` is the combined
    /// parameter chain of every enclosing resource, threaded into methods and
    /// nested locators but kept out of this resource's own list; `visited`
    /// tracks resource types on the current construction stack so locator
    /// cycles terminate.
    fn assemble(
        graph: &DeclarationGraph,
        decl: &TypeDecl,
        path_chain: Vec<String>,
        appended_params: Vec<ResourceParameter>,
        ancestor_parameters: &[ResourceParameter],
        visited: &mut Vec<String>,
    ) -> Result<Self> {
        let consumes_mime = decl
            .consumes()
            .map(|m| m.to_vec())
            .unwrap_or_else(default_mime_types);
        let produces_mime = decl
            .produces()
            .map(|m| m.to_vec())
            .unwrap_or_else(default_mime_types);

        let mut collected = Vec::new();
        collect_parameters(graph, decl, &mut collected, &mut Vec::new());
        let mut resource_parameters: Vec<ResourceParameter> =
            collected.into_iter().map(|c| c.param).collect();
        resource_parameters.extend(appended_params);

        // What methods and nested locators inherit: this resource's own list
        // first, then every enclosing resource's, nearest first.
        let mut chain_parameters = resource_parameters.clone();
        chain_parameters.extend(ancestor_parameters.iter().cloned());

        let mut method_decls = Vec::new();
        collect_methods_matching(
            graph,
            decl,
            &|m| m.has_http_method(),
            &mut method_decls,
            &mut Vec::new(),
        );
        let resource_methods = method_decls
            .iter()
            .map(|m| {
                ResourceMethod::build(
                    m,
                    &decl.qualified_name,
                    &path_chain,
                    &consumes_mime,
                    &produces_mime,
                    &chain_parameters,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let mut locator_decls = Vec::new();
        collect_methods_matching(
            graph,
            decl,
            &|m| m.path_value().is_some() && !m.has_http_method(),
            &mut locator_decls,
            &mut Vec::new(),
        );
        let resource_locators = locator_decls
            .iter()
            .map(|m| {
                SubResourceLocator::build(
                    graph,
                    m,
                    &decl.qualified_name,
                    &path_chain,
                    &chain_parameters,
                    visited,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Assembled resource {}: {} methods, {} locators, {} parameters",
            decl.qualified_name,
            resource_methods.len(),
            resource_locators.len(),
            resource_parameters.len()
        );

        Ok(Self {
            type_name: decl.qualified_name.clone(),
            consumes_mime,
            produces_mime,
            resource_parameters,
            resource_methods,
            resource_locators,
            path_chain,
        })
    }
}

/// A resource reachable at a base path of its own. Has no parent.
#[derive(Debug, Clone)]
pub struct RootResource {
    /// The type-level path annotation value.
    pub path: String,
    resource: Resource,
}

impl RootResource {
    /// Builds the root resource model for `decl`. Fails with a configuration
    /// error when the type carries no path annotation.
    pub fn build(graph: &DeclarationGraph, decl: &TypeDecl) -> Result<Self> {
        let path = decl
            .path_annotation()
            .ok_or_else(|| Error::MissingPathAnnotation {
                declaration: decl.qualified_name.clone(),
            })?
            .to_string();

        // The best constructor: most parameters among those whose parameters
        // are all resource-bindable; ties go to the first declared.
        let mut ctor_params = Vec::new();
        if let Some(ctor) = best_constructor(&decl.constructors) {
            for p in &ctor.params {
                if let Some(param) = classify_param(p) {
                    ctor_params.push(param);
                }
            }
        }

        let mut visited = vec![decl.qualified_name.clone()];
        let resource = Resource::assemble(
            graph,
            decl,
            vec![path.clone()],
            ctor_params,
            &[],
            &mut visited,
        )?;

        Ok(Self { path, resource })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }
}

/// A resource reached through a locator. Its path comes from the owning
/// locator, and the locator's own parameters are appended to its list.
#[derive(Debug, Clone)]
pub struct SubResource {
    pub path: String,
    /// Name of the locator method this resource hangs off. Identification
    /// only, not an ownership edge.
    pub locator_name: String,
    resource: Resource,
}

impl SubResource {
    /// Builds a sub-resource. `chain` is the root-to-self path sequence with
    /// this resource's own path last; `locator_params` are the owning
    /// locator's own parameters, the only ancestor parameters that join this
    /// resource's own list. `ancestor_parameters` is the owning resource's
    /// full chain, visible to nested methods but not listed here.
    pub(crate) fn build(
        graph: &DeclarationGraph,
        decl: &TypeDecl,
        path: &str,
        chain: &[String],
        locator_name: String,
        locator_params: Vec<ResourceParameter>,
        ancestor_parameters: &[ResourceParameter],
        visited: &mut Vec<String>,
    ) -> Result<Self> {
        visited.push(decl.qualified_name.clone());
        let resource = Resource::assemble(
            graph,
            decl,
            chain.to_vec(),
            locator_params,
            ancestor_parameters,
            visited,
        );
        visited.pop();

        Ok(Self {
            path: path.to_string(),
            locator_name,
            resource: resource?,
        })
    }

    /// The placeholder used when a locator's return type has no declaration
    /// or would recurse into a resource already under construction.
    pub(crate) fn empty(
        path: &str,
        chain: &[String],
        type_name: String,
        locator_name: String,
    ) -> Self {
        Self {
            path: path.to_string(),
            locator_name,
            resource: Resource {
                type_name,
                consumes_mime: default_mime_types(),
                produces_mime: default_mime_types(),
                resource_parameters: Vec::new(),
                resource_methods: Vec::new(),
                resource_locators: Vec::new(),
                path_chain: chain.to_vec(),
            },
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }
}

/// Picks the constructor with the most parameters among those whose
/// parameters are all resource-bindable. First declared wins ties.
fn best_constructor(decls: &[ConstructorDecl]) -> Option<&ConstructorDecl> {
    let mut best: Option<&ConstructorDecl> = None;
    for ctor in decls {
        if !ctor
            .params
            .iter()
            .all(|p| is_resource_parameter(&p.annotations))
        {
            continue;
        }
        match best {
            Some(b) if ctor.params.len() <= b.params.len() => {}
            _ => best = Some(ctor),
        }
    }
    best
}

/// The shared hierarchy walk for methods and locators: own declarations
/// first, then superinterfaces in declared order, then the superclass, each
/// recursively. A candidate already overridden by a collected entry is
/// skipped. Recursion stops at types with no declaration in the graph.
fn collect_methods_matching<'a>(
    graph: &'a DeclarationGraph,
    decl: &'a TypeDecl,
    matches: &dyn Fn(&MethodDecl) -> bool,
    out: &mut Vec<&'a MethodDecl>,
    seen_types: &mut Vec<String>,
) {
    if seen_types.contains(&decl.qualified_name) {
        return;
    }
    seen_types.push(decl.qualified_name.clone());

    for m in &decl.methods {
        if matches(m) && !out.iter().any(|existing| overrides(existing, m)) {
            out.push(m);
        }
    }
    for name in &decl.interfaces {
        if let Some(sup) = graph.get(name) {
            collect_methods_matching(graph, sup, matches, out, seen_types);
        }
    }
    if let Some(name) = &decl.superclass {
        if let Some(sup) = graph.get(name) {
            collect_methods_matching(graph, sup, matches, out, seen_types);
        }
    }
}

struct CollectedParam {
    name: String,
    is_static: bool,
    param: ResourceParameter,
}

/// Same walk for fields and accessor properties, with member hiding instead
/// of override compatibility.
fn collect_parameters(
    graph: &DeclarationGraph,
    decl: &TypeDecl,
    out: &mut Vec<CollectedParam>,
    seen_types: &mut Vec<String>,
) {
    if seen_types.contains(&decl.qualified_name) {
        return;
    }
    seen_types.push(decl.qualified_name.clone());

    for f in &decl.fields {
        if let Some(param) = classify_field(f) {
            if !out
                .iter()
                .any(|c| hides(&c.name, c.is_static, &f.name, f.is_static))
            {
                out.push(CollectedParam {
                    name: f.name.clone(),
                    is_static: f.is_static,
                    param,
                });
            }
        }
    }
    for p in &decl.properties {
        if let Some(param) = classify_property(p) {
            if !out.iter().any(|c| hides(&c.name, c.is_static, &p.name, false)) {
                out.push(CollectedParam {
                    name: p.name.clone(),
                    is_static: false,
                    param,
                });
            }
        }
    }
    for name in &decl.interfaces {
        if let Some(sup) = graph.get(name) {
            collect_parameters(graph, sup, out, seen_types);
        }
    }
    if let Some(name) = &decl.superclass {
        if let Some(sup) = graph.get(name) {
            collect_parameters(graph, sup, out, seen_types);
        }
    }
}
