//! The serializable contract document: a plain-data projection of the
//! resource model plus the diagnostics collected while validating it.

use serde::{Deserialize, Serialize};

use crate::model::{
    strip_regex_constraints, ContentTypeSupport, Resource, ResourceMethod, ResourceParameter,
    RootResource, SubResourceLocator,
};
use crate::validation::{Message, ValidationResult};

/// Top-level document emitted by the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDocument {
    /// All root resources discovered in the scanned sources, in path order.
    pub resources: Vec<ResourceEntry>,
    /// Errors and warnings from the validation pass.
    pub diagnostics: Diagnostics,
}

/// One resource, root or nested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// The annotated path of this resource, regex constraints stripped.
    pub path: String,
    /// Qualified name of the type backing the resource.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Name of the locator method this resource hangs off, absent on roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<ParameterEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub methods: Vec<MethodEntry>,
    /// Resources reached through sub-resource locators.
    #[serde(rename = "subResources", skip_serializing_if = "Vec::is_empty", default)]
    pub sub_resources: Vec<ResourceEntry>,
}

/// One HTTP-verb-bound operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodEntry {
    /// Name of the declaring method.
    pub name: String,
    #[serde(rename = "httpMethods")]
    pub http_methods: Vec<String>,
    /// Absolute path from the application root, constraints stripped.
    pub fullpath: String,
    /// The coarse servlet-style dispatch pattern for the full path.
    #[serde(rename = "servletPattern")]
    pub servlet_pattern: String,
    #[serde(rename = "contentTypes", skip_serializing_if = "Vec::is_empty", default)]
    pub content_types: Vec<ContentTypeEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<ParameterEntry>,
    /// The entity parameter, when the method takes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityEntry>,
}

/// One bound parameter: its binding kind, name within that kind, and type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(rename = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Where the binding was declared: a method parameter, field or accessor.
    pub source: String,
}

/// One row of a method's content-type support matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentTypeEntry {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub consumable: bool,
    pub produceable: bool,
}

/// The entity parameter of a method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Validation output, flattened to serializable messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<DiagnosticEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<DiagnosticEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    /// `file:line` of the offending declaration, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub message: String,
}

impl ContractDocument {
    /// Projects the resource model and validation result into the document.
    pub fn from_model(roots: &[RootResource], validation: &ValidationResult) -> Self {
        let mut resources: Vec<ResourceEntry> = roots
            .iter()
            .map(|root| resource_entry(&root.path, root.resource(), None))
            .collect();
        resources.sort_by(|a, b| a.path.cmp(&b.path));

        Self {
            resources,
            diagnostics: Diagnostics {
                errors: validation.errors().iter().map(diagnostic_entry).collect(),
                warnings: validation.warnings().iter().map(diagnostic_entry).collect(),
            },
        }
    }
}

fn resource_entry(path: &str, resource: &Resource, locator: Option<&str>) -> ResourceEntry {
    ResourceEntry {
        // Regex constraints are an implementation detail of dispatch; the
        // document shows the plain template.
        path: strip_regex_constraints(path),
        type_name: resource.type_name.clone(),
        locator: locator.map(str::to_string),
        parameters: resource
            .resource_parameters()
            .iter()
            .map(parameter_entry)
            .collect(),
        methods: resource.resource_methods().iter().map(method_entry).collect(),
        sub_resources: resource
            .resource_locators()
            .iter()
            .map(locator_entry)
            .collect(),
    }
}

fn locator_entry(locator: &SubResourceLocator) -> ResourceEntry {
    let sub = locator.resource();
    resource_entry(&sub.path, sub.resource(), Some(&locator.name))
}

fn method_entry(method: &ResourceMethod) -> MethodEntry {
    MethodEntry {
        name: method.name.clone(),
        http_methods: method.http_methods.clone(),
        fullpath: method.fullpath(),
        servlet_pattern: method.servlet_pattern(),
        content_types: method
            .supported_content_types()
            .iter()
            .map(content_type_entry)
            .collect(),
        parameters: method
            .resource_parameters()
            .iter()
            .map(parameter_entry)
            .collect(),
        entity: method.entity_parameter().map(|e| EntityEntry {
            name: e.name.clone(),
            type_name: e.type_ref.to_string(),
        }),
    }
}

fn parameter_entry(param: &ResourceParameter) -> ParameterEntry {
    ParameterEntry {
        kind: param.kind.as_str().to_string(),
        name: param.parameter_name.clone(),
        type_name: param.type_ref.to_string(),
        default_value: param.default_value.clone(),
        source: param.source.clone(),
    }
}

fn content_type_entry(support: &ContentTypeSupport) -> ContentTypeEntry {
    ContentTypeEntry {
        mime_type: support.mime_type.clone(),
        consumable: support.consumable,
        produceable: support.produceable,
    }
}

fn diagnostic_entry(message: &Message) -> DiagnosticEntry {
    DiagnosticEntry {
        position: message.position.as_ref().map(|p| p.to_string()),
        label: message.label.clone(),
        message: message.text.clone(),
    }
}
