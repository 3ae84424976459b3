//! The sub-resource locator model: a path-annotated method without an HTTP
//! verb, dispatching to a nested resource.

use log::debug;

use crate::declaration::{
    Annotated, DeclarationGraph, MethodDecl, ParamDecl, Position,
};
use crate::error::{Error, Result};
use crate::model::method::EntityParameter;
use crate::model::param::{classify_param, ResourceParameter};
use crate::model::resource::SubResource;

/// A method that returns another resource to which the request is further
/// dispatched. The locator exclusively owns the target [`SubResource`],
/// which is built together with the locator.
#[derive(Debug, Clone)]
pub struct SubResourceLocator {
    pub name: String,
    pub declaring_type: String,
    /// The locator's path annotation value. Required.
    pub path: String,
    pub position: Option<Position>,
    resource: SubResource,
    resource_parameters: Vec<ResourceParameter>,
    entity_candidates: Vec<EntityParameter>,
    param_decls: Vec<ParamDecl>,
}

impl SubResourceLocator {
    /// Builds a locator and its target sub-resource. `parent_chain` is the
    /// owning resource's root-to-self path sequence and `parent_parameters`
    /// its full parameter chain, passed through so nested methods inherit it;
    /// `visited` is the stack of resource types currently under construction,
    /// used to terminate cyclic locator graphs with the empty placeholder
    /// resource.
    pub fn build(
        graph: &DeclarationGraph,
        decl: &MethodDecl,
        declaring_type: &str,
        parent_chain: &[String],
        parent_parameters: &[ResourceParameter],
        visited: &mut Vec<String>,
    ) -> Result<Self> {
        let path = decl
            .path_value()
            .ok_or_else(|| Error::MissingPathAnnotation {
                declaration: format!("{}::{}", declaring_type, decl.name),
            })?
            .to_string();

        let mut resource_parameters = Vec::new();
        let mut entity_candidates = Vec::new();
        for p in &decl.params {
            if let Some(param) = classify_param(p) {
                resource_parameters.push(param);
            } else if !p.has_context() {
                entity_candidates.push(EntityParameter {
                    name: p.name.clone(),
                    type_ref: p.type_ref.clone(),
                    position: p.position.clone(),
                });
            }
        }

        let mut chain = parent_chain.to_vec();
        chain.push(path.clone());

        let target = decl
            .return_type
            .as_ref()
            .and_then(|t| graph.get(&t.name))
            .filter(|t| !visited.contains(&t.qualified_name));

        let resource = match target {
            Some(target_decl) => SubResource::build(
                graph,
                target_decl,
                &path,
                &chain,
                decl.name.clone(),
                resource_parameters.clone(),
                parent_parameters,
                visited,
            )?,
            None => {
                let target_name = decl
                    .return_type
                    .as_ref()
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| "<none>".to_string());
                debug!(
                    "Locator {}::{} target {} has no declaration; using the empty resource",
                    declaring_type, decl.name, target_name
                );
                SubResource::empty(&path, &chain, target_name, decl.name.clone())
            }
        };

        Ok(Self {
            name: decl.name.clone(),
            declaring_type: declaring_type.to_string(),
            path,
            position: decl.position.clone(),
            resource,
            resource_parameters,
            entity_candidates,
            param_decls: decl.params.clone(),
        })
    }

    /// The lazily-nested resource this locator dispatches to.
    pub fn resource(&self) -> &SubResource {
        &self.resource
    }

    /// The locator's own bound parameters.
    pub fn resource_parameters(&self) -> &[ResourceParameter] {
        &self.resource_parameters
    }

    /// The entity parameter, when the locator has one. More than one
    /// candidate is a validation error; the first declared wins here.
    pub fn entity_parameter(&self) -> Option<&EntityParameter> {
        self.entity_candidates.first()
    }

    /// Every non-resource-bound, non-context parameter, in declaration order.
    /// Validation flags locators with more than one.
    pub fn entity_candidates(&self) -> &[EntityParameter] {
        &self.entity_candidates
    }

    pub fn param_decls(&self) -> &[ParamDecl] {
        &self.param_decls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{Annotation, TypeDecl, TypeKind, TypeRef};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_locator_requires_path_annotation() {
        let graph = DeclarationGraph::new();
        let decl = MethodDecl::new("sub").returning(TypeRef::named("Sub"));
        let err = SubResourceLocator::build(&graph, &decl, "demo::Api", &[], &[], &mut vec![])
            .unwrap_err();
        assert!(matches!(err, Error::MissingPathAnnotation { .. }));
    }

    #[test]
    fn test_locator_with_unknown_target_uses_empty_resource() {
        let graph = DeclarationGraph::new();
        let decl = MethodDecl::new("sub")
            .with_annotations(vec![Annotation::Path("/sub".into())])
            .returning(TypeRef::named("Missing"));
        let locator = SubResourceLocator::build(
            &graph,
            &decl,
            "demo::Api",
            &["/api".to_string()],
            &[],
            &mut vec![],
        )
        .unwrap();

        assert_eq!(locator.path, "/sub");
        assert!(locator.resource().resource().resource_methods().is_empty());
    }

    #[test]
    fn test_locator_builds_target_resource() {
        let mut graph = DeclarationGraph::new();
        let mut sub = TypeDecl::new("demo::Sub", TypeKind::Class);
        sub.methods.push(
            MethodDecl::new("get_it")
                .with_annotations(vec![Annotation::HttpMethod("GET".into())]),
        );
        graph.add_type(sub);

        let decl = MethodDecl::new("sub")
            .with_annotations(vec![Annotation::Path("/sub".into())])
            .returning(TypeRef::named("demo::Sub"));
        let locator = SubResourceLocator::build(
            &graph,
            &decl,
            "demo::Api",
            &["/api".to_string()],
            &[],
            &mut vec![],
        )
        .unwrap();

        let methods = locator.resource().resource().resource_methods();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].fullpath(), "/api/sub");
    }

    #[test]
    fn test_locator_separates_entity_from_bound_parameters() {
        let graph = DeclarationGraph::new();
        let decl = MethodDecl::new("sub")
            .with_annotations(vec![Annotation::Path("/sub".into())])
            .with_params(vec![
                ParamDecl::new("version", TypeRef::named("String"))
                    .with_annotations(vec![Annotation::Query("version".into())]),
                ParamDecl::new("seed", TypeRef::named("Seed")),
            ])
            .returning(TypeRef::named("Missing"));
        let locator =
            SubResourceLocator::build(&graph, &decl, "demo::Api", &[], &[], &mut vec![]).unwrap();

        assert_eq!(locator.resource_parameters().len(), 1);
        assert_eq!(locator.entity_parameter().unwrap().name, "seed");
    }

    #[test]
    fn test_locator_keeps_every_entity_candidate() {
        let graph = DeclarationGraph::new();
        let decl = MethodDecl::new("sub")
            .with_annotations(vec![Annotation::Path("/sub".into())])
            .with_params(vec![
                ParamDecl::new("first", TypeRef::named("Seed")),
                ParamDecl::new("second", TypeRef::named("Seed")),
            ])
            .returning(TypeRef::named("Missing"));
        let locator =
            SubResourceLocator::build(&graph, &decl, "demo::Api", &[], &[], &mut vec![]).unwrap();

        assert_eq!(locator.entity_candidates().len(), 2);
        assert_eq!(locator.entity_parameter().unwrap().name, "first");
    }
}
