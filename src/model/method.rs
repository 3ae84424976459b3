//! The resource method model: one HTTP-verb-annotated operation, with its
//! derived full path, servlet pattern and content-type support matrix.

use std::collections::BTreeMap;

use log::debug;

use crate::declaration::{Annotated, MethodDecl, ParamDecl, Position, TypeRef};
use crate::error::{Error, Result};
use crate::model::param::{classify_param, ResourceParameter};
use crate::model::{join_path, normalize_mime, servlet_pattern};

/// The single parameter (if any) bound to the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityParameter {
    pub name: String,
    pub type_ref: TypeRef,
    pub position: Option<Position>,
}

/// Whether one MIME type can be consumed, produced, or both by a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeSupport {
    pub mime_type: String,
    pub consumable: bool,
    pub produceable: bool,
}

/// One HTTP-verb-bound operation on a resource.
///
/// Construction fails when the declaration carries no HTTP verb annotation;
/// a method with an empty verb set never exists in the model.
#[derive(Debug, Clone)]
pub struct ResourceMethod {
    pub name: String,
    /// The declaring resource type, qualified, for diagnostics.
    pub declaring_type: String,
    /// Non-empty, in declaration order.
    pub http_methods: Vec<String>,
    /// The method's own path annotation value, when present.
    pub subpath: Option<String>,
    pub consumes_mime: Vec<String>,
    pub produces_mime: Vec<String>,
    pub position: Option<Position>,
    entity_candidates: Vec<EntityParameter>,
    own_parameters: Vec<ResourceParameter>,
    resource_parameters: Vec<ResourceParameter>,
    /// Ancestor resource paths, root first, not including `subpath`.
    ancestor_paths: Vec<String>,
    /// The raw parameter declarations, kept for validation rules.
    param_decls: Vec<ParamDecl>,
    meta_data: BTreeMap<String, String>,
}

impl ResourceMethod {
    /// Builds the method model from its declaration and the owning resource's
    /// context: ancestor path chain, effective MIME sets and full parameter
    /// chain (own + inherited).
    pub fn build(
        decl: &MethodDecl,
        declaring_type: &str,
        ancestor_paths: &[String],
        parent_consumes: &[String],
        parent_produces: &[String],
        parent_parameters: &[ResourceParameter],
    ) -> Result<Self> {
        let http_methods = decl.http_methods();
        if http_methods.is_empty() {
            return Err(Error::NoHttpMethod {
                declaration: format!("{}::{}", declaring_type, decl.name),
            });
        }

        let consumes_mime = decl
            .consumes_value()
            .unwrap_or_else(|| parent_consumes.to_vec());
        let produces_mime = decl
            .produces_value()
            .unwrap_or_else(|| parent_produces.to_vec());

        let mut own_parameters = Vec::new();
        let mut entity_candidates = Vec::new();
        for p in &decl.params {
            if let Some(param) = classify_param(p) {
                own_parameters.push(param);
            } else if !p.has_context() {
                entity_candidates.push(EntityParameter {
                    name: p.name.clone(),
                    type_ref: p.type_ref.clone(),
                    position: p.position.clone(),
                });
            }
        }

        // Own parameters first, then the parent resource's full chain.
        let mut resource_parameters = own_parameters.clone();
        resource_parameters.extend(parent_parameters.iter().cloned());

        debug!(
            "Built resource method {}::{} ({:?})",
            declaring_type, decl.name, http_methods
        );

        Ok(Self {
            name: decl.name.clone(),
            declaring_type: declaring_type.to_string(),
            http_methods,
            subpath: decl.path_value().map(str::to_string),
            consumes_mime,
            produces_mime,
            position: decl.position.clone(),
            entity_candidates,
            own_parameters,
            resource_parameters,
            ancestor_paths: ancestor_paths.to_vec(),
            param_decls: decl.params.clone(),
            meta_data: BTreeMap::new(),
        })
    }

    /// The entity parameter, when the method has one. More than one candidate
    /// is a validation error; the first declared wins here.
    pub fn entity_parameter(&self) -> Option<&EntityParameter> {
        self.entity_candidates.first()
    }

    /// Every non-resource-bound, non-context parameter, in declaration order.
    /// Validation flags methods with more than one.
    pub fn entity_candidates(&self) -> &[EntityParameter] {
        &self.entity_candidates
    }

    /// The method's own bound parameters.
    pub fn own_parameters(&self) -> &[ResourceParameter] {
        &self.own_parameters
    }

    /// Own parameters followed by the owning resource's full chain.
    pub fn resource_parameters(&self) -> &[ResourceParameter] {
        &self.resource_parameters
    }

    /// The raw parameter declarations, for validation rules that need the
    /// original annotations.
    pub fn param_decls(&self) -> &[ParamDecl] {
        &self.param_decls
    }

    /// Whether any of the method's own parameters is form-bound.
    pub fn has_form_parameter(&self) -> bool {
        self.own_parameters
            .iter()
            .any(|p| p.kind == crate::model::ParameterKind::Form)
    }

    /// The full path: ancestor resource paths plus the method's own subpath,
    /// each segment normalized and concatenated root-to-leaf.
    pub fn fullpath(&self) -> String {
        let mut segments = self.ancestor_paths.clone();
        if let Some(subpath) = &self.subpath {
            segments.push(subpath.clone());
        }
        join_path(&segments)
    }

    /// The servlet mapping pattern derived from [`Self::fullpath`].
    pub fn servlet_pattern(&self) -> String {
        servlet_pattern(&self.fullpath())
    }

    /// The content-type support matrix: each MIME type mapped to whether it
    /// is consumable, produceable, or both.
    pub fn supported_content_types(&self) -> Vec<ContentTypeSupport> {
        let mut by_type: BTreeMap<String, (bool, bool)> = BTreeMap::new();
        for mime in &self.consumes_mime {
            by_type.entry(normalize_mime(mime)).or_default().0 = true;
        }
        for mime in &self.produces_mime {
            by_type.entry(normalize_mime(mime)).or_default().1 = true;
        }
        by_type
            .into_iter()
            .map(|(mime_type, (consumable, produceable))| ContentTypeSupport {
                mime_type,
                consumable,
                produceable,
            })
            .collect()
    }

    /// Side-channel metadata for cross-module annotations. Populate-once:
    /// returns false and leaves the existing value when the key is taken.
    pub fn insert_meta(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.meta_data.contains_key(&key) {
            return false;
        }
        self.meta_data.insert(key, value.into());
        true
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta_data.get(key).map(String::as_str)
    }
}
