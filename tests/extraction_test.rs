use contract_from_source::{
    adapter::DeclarationAdapter,
    declaration::Annotated,
    document::ContractDocument,
    model::RootResource,
    parser::SourceParser,
    scanner::SourceScanner,
    serializer::{serialize_json, serialize_yaml},
    validation::{ContractValidator, DefaultValidator},
};
use tempfile::TempDir;

/// Helper to materialize a temporary project from (path, content) pairs.
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

/// Runs the full pipeline over a project directory and returns the built
/// roots plus the document.
fn extract(temp_dir: &TempDir) -> (Vec<RootResource>, ContractDocument) {
    let scanner = SourceScanner::new(temp_dir.path().to_path_buf());
    let scan_result = scanner.scan().expect("Failed to scan directory");
    assert!(!scan_result.source_files.is_empty(), "Should find source files");

    let parsed_files: Vec<_> = SourceParser::parse_files(&scan_result.source_files)
        .into_iter()
        .filter_map(Result::ok)
        .collect();
    assert!(!parsed_files.is_empty(), "Should parse at least one file");

    let mut adapter = DeclarationAdapter::new();
    for parsed in &parsed_files {
        adapter.lower_file(parsed);
    }
    let graph = adapter.finish();

    let roots: Vec<_> = graph
        .types()
        .filter(|t| {
            t.path_value().is_some()
                && t.kind == contract_from_source::declaration::TypeKind::Class
        })
        .map(|t| RootResource::build(&graph, t).expect("Failed to build root resource"))
        .collect();

    let validator = DefaultValidator::new();
    let validation = validator.validate_root_resources(&roots, &graph);
    let document = ContractDocument::from_model(&roots, &validation);
    (roots, document)
}

#[test]
fn test_end_to_end_extraction() {
    let code = include_str!("fixtures/customer_service.rs");
    let temp_dir = create_test_project(vec![("src/service.rs", code)]);

    let (roots, document) = extract(&temp_dir);

    assert_eq!(roots.len(), 1);
    let root = &roots[0];
    assert_eq!(root.path, "/customers");
    assert_eq!(root.resource().type_name, "store::CustomerResource");
    assert_eq!(
        root.resource().consumes_mime,
        vec!["application/json".to_string()]
    );
    assert_eq!(
        root.resource().produces_mime,
        vec![
            "application/json".to_string(),
            "application/xml".to_string()
        ]
    );

    // Two verb methods, one locator.
    assert_eq!(root.resource().resource_methods().len(), 2);
    assert_eq!(root.resource().resource_locators().len(), 1);

    let list = root
        .resource()
        .resource_methods()
        .iter()
        .find(|m| m.name == "list")
        .unwrap();
    assert_eq!(list.http_methods, vec!["GET"]);
    assert_eq!(list.fullpath(), "/customers");
    assert_eq!(list.servlet_pattern(), "/customers");
    assert_eq!(list.resource_parameters().len(), 2);

    let create = root
        .resource()
        .resource_methods()
        .iter()
        .find(|m| m.name == "create")
        .unwrap();
    assert_eq!(create.http_methods, vec!["POST"]);
    let entity = create.entity_parameter().expect("create takes an entity");
    assert_eq!(entity.type_ref.name, "Customer");

    // Validation is clean and the document mirrors the model.
    assert!(document.diagnostics.errors.is_empty());
    assert_eq!(document.resources.len(), 1);
    assert_eq!(document.resources[0].path, "/customers");
    assert_eq!(document.resources[0].methods.len(), 2);
    assert_eq!(document.resources[0].sub_resources.len(), 1);
}

#[test]
fn test_locator_chains_into_nested_resource() {
    let code = include_str!("fixtures/customer_service.rs");
    let temp_dir = create_test_project(vec![("src/service.rs", code)]);

    let (roots, document) = extract(&temp_dir);
    let root = &roots[0];

    let locator = &root.resource().resource_locators()[0];
    assert_eq!(locator.name, "customer");
    // The model keeps the raw path; the constraint disappears from full paths.
    assert_eq!(locator.path, "/{id:[0-9]+}");

    let sub = locator.resource();
    assert_eq!(sub.resource().type_name, "store::CustomerDetail");

    let fetch = sub
        .resource()
        .resource_methods()
        .iter()
        .find(|m| m.name == "fetch")
        .unwrap();
    assert_eq!(fetch.fullpath(), "/customers/{id}");
    assert_eq!(fetch.servlet_pattern(), "/customers/*");

    // The nested method inherits the locator's binding through the chain.
    let names: Vec<_> = fetch
        .resource_parameters()
        .iter()
        .map(|p| p.parameter_name.as_deref().unwrap())
        .collect();
    assert_eq!(names, vec!["If-None-Match", "id"]);

    let nested = &document.resources[0].sub_resources[0];
    assert_eq!(nested.locator.as_deref(), Some("customer"));
    assert_eq!(nested.path, "/{id}");
    assert_eq!(nested.methods.len(), 2);
}

#[test]
fn test_content_type_matrix_reaches_the_document() {
    let code = include_str!("fixtures/customer_service.rs");
    let temp_dir = create_test_project(vec![("src/service.rs", code)]);

    let (_, document) = extract(&temp_dir);
    let list = document.resources[0]
        .methods
        .iter()
        .find(|m| m.name == "list")
        .unwrap();

    let json = list
        .content_types
        .iter()
        .find(|c| c.mime_type == "application/json")
        .unwrap();
    assert!(json.consumable && json.produceable);

    let xml = list
        .content_types
        .iter()
        .find(|c| c.mime_type == "application/xml")
        .unwrap();
    assert!(!xml.consumable && xml.produceable);
}

#[test]
fn test_cross_file_resource_and_entity() {
    let resource = r#"
        #[path("/orders")]
        struct OrderResource;

        impl OrderResource {
            #[get]
            pub fn all(&self) -> Vec<Order> {
                unimplemented!()
            }

            #[post]
            pub fn place(&self, order: Order) -> Order {
                unimplemented!()
            }
        }
    "#;
    let entity = r#"
        #[root_element]
        struct Order;

        impl Order {
            pub fn new() -> Self {
                unimplemented!()
            }
        }
    "#;
    let temp_dir = create_test_project(vec![
        ("src/resource.rs", resource),
        ("src/entity.rs", entity),
    ]);

    let (roots, document) = extract(&temp_dir);
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].path, "/orders");
    assert_eq!(document.resources[0].methods.len(), 2);
    assert!(document.diagnostics.errors.is_empty());
}

#[test]
fn test_serialized_output_round_trips() {
    let code = include_str!("fixtures/customer_service.rs");
    let temp_dir = create_test_project(vec![("src/service.rs", code)]);

    let (_, document) = extract(&temp_dir);

    let yaml = serialize_yaml(&document).unwrap();
    assert!(yaml.contains("path: /customers"));
    assert!(yaml.contains("servletPattern: /customers/*"));

    let json = serialize_json(&document).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["resources"][0]["path"], "/customers");
    assert_eq!(
        parsed["resources"][0]["subResources"][0]["locator"],
        "customer"
    );
}
