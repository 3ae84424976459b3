use std::collections::HashSet;
use std::path::PathBuf;

use contract_from_source::{
    adapter::DeclarationAdapter,
    declaration::{DeclarationGraph, TypeKind},
    model::RootResource,
    parser::ParsedFile,
    validation::{
        ContractValidator, DefaultValidator, ValidatorChain, RULE_XMLIDREF_REFERENCES_XMLID,
    },
};

fn lower(code: &str) -> DeclarationGraph {
    let parsed = ParsedFile {
        path: PathBuf::from("validation_test.rs"),
        syntax_tree: syn::parse_str(code).expect("fixture must parse"),
    };
    let mut adapter = DeclarationAdapter::new();
    adapter.lower_file(&parsed);
    adapter.finish()
}

fn build_roots(graph: &DeclarationGraph) -> Vec<RootResource> {
    graph
        .types()
        .filter(|t| {
            use contract_from_source::declaration::Annotated;
            t.path_value().is_some() && t.kind == TypeKind::Class
        })
        .map(|t| RootResource::build(graph, t).expect("root must build"))
        .collect()
}

#[test]
fn test_clean_endpoint_interface_passes() {
    let graph = lower(
        r#"
        #[web_service]
        trait AccountService {
            fn open(&self, owner: String) -> String;
            fn close(&self, number: String) -> String;
        }

        #[implements("AccountService")]
        struct AccountServiceImpl;
        "#,
    );

    let decl = graph.get("AccountService").unwrap();
    let result = DefaultValidator::new().validate_endpoint_interface(decl, &graph);
    assert!(!result.has_errors());
    assert!(!result.has_warnings());
}

#[test]
fn test_endpoint_interface_without_implementation_warns() {
    let graph = lower(
        r#"
        #[web_service]
        trait AccountService {
            fn open(&self, owner: String) -> String;
        }
        "#,
    );

    let decl = graph.get("AccountService").unwrap();
    let result = DefaultValidator::new().validate_endpoint_interface(decl, &graph);
    assert!(!result.has_errors());
    assert!(result
        .warnings()
        .iter()
        .any(|m| m.text.contains("no implementing class")));
}

#[test]
fn test_implementation_checked_against_its_interface() {
    let graph = lower(
        r#"
        #[web_service]
        trait AccountService {
            fn open(&self, owner: String) -> String;
        }

        #[web_service(endpoint_interface = "AccountService")]
        #[implements("AccountService")]
        struct AccountServiceImpl;

        #[web_service(endpoint_interface = "AccountService")]
        struct DetachedImpl;
        "#,
    );

    let validator = DefaultValidator::new();
    let interface = graph.get("AccountService").unwrap();

    let good = graph.get("AccountServiceImpl").unwrap();
    let result = validator.validate_endpoint_implementation(good, interface, &graph);
    assert!(!result.has_errors());

    let bad = graph.get("DetachedImpl").unwrap();
    let result = validator.validate_endpoint_implementation(bad, interface, &graph);
    assert!(result
        .errors()
        .iter()
        .any(|m| m.text.contains("does not implement")));
}

#[test]
fn test_resource_rules_run_over_nested_resources() {
    // The double-entity method sits behind a locator; the rule still fires.
    let graph = lower(
        r#"
        #[path("/accounts")]
        struct AccountResource;

        impl AccountResource {
            #[path("/{number}")]
            pub fn account(&self, #[path_param("number")] number: String) -> AccountDetail {
                unimplemented!()
            }
        }

        struct AccountDetail;

        impl AccountDetail {
            #[post]
            pub fn transfer(&self, source: Transfer, duplicate: Transfer) {
                unimplemented!()
            }
        }
        "#,
    );

    let roots = build_roots(&graph);
    let result = DefaultValidator::new().validate_root_resources(&roots, &graph);
    assert!(result
        .errors()
        .iter()
        .any(|m| m.text.contains("no more than one entity parameter")));
}

#[test]
fn test_disabled_rule_downgrades_error_to_warning() {
    let code = r#"
        struct Order;

        impl Order {
            #[xml_id_ref]
            pub fn get_owner(&self) -> Customer {
                unimplemented!()
            }

            pub fn set_owner(&mut self, owner: Customer) {
                unimplemented!()
            }
        }

        struct Customer {
            name: String,
        }
        "#;
    let graph = lower(code);
    let order = graph.get("Order").unwrap();
    let accessor = order
        .properties
        .iter()
        .find(|p| p.name == "owner")
        .unwrap();

    // Customer declares no id field, so the reference rule fires as an error.
    let strict = DefaultValidator::new().validate_accessor(accessor, &graph);
    assert_eq!(strict.errors().len(), 1);
    assert!(strict.errors()[0].text.contains("no id field"));

    // The same check downgrades to a warning when the rule is disabled; the
    // message text is unchanged.
    let mut disabled = HashSet::new();
    disabled.insert(RULE_XMLIDREF_REFERENCES_XMLID.to_string());
    let relaxed =
        DefaultValidator::with_disabled_rules(disabled).validate_accessor(accessor, &graph);
    assert!(relaxed.errors().is_empty());
    assert_eq!(relaxed.warnings().len(), 1);
    assert_eq!(relaxed.warnings()[0].text, strict.errors()[0].text);
}

#[test]
fn test_idref_satisfied_by_string_id_field() {
    let graph = lower(
        r#"
        struct Order;

        impl Order {
            #[xml_id_ref]
            pub fn get_owner(&self) -> Customer {
                unimplemented!()
            }

            pub fn set_owner(&mut self, owner: Customer) {
                unimplemented!()
            }
        }

        struct Customer {
            #[xml_id]
            id: String,
        }
        "#,
    );

    let order = graph.get("Order").unwrap();
    let accessor = order.properties.iter().find(|p| p.name == "owner").unwrap();
    let result = DefaultValidator::new().validate_accessor(accessor, &graph);
    assert!(!result.has_errors());
}

#[test]
fn test_root_element_rules() {
    let graph = lower(
        r#"
        #[root_element]
        struct Invoice;

        impl Invoice {
            pub fn new(total: i64) -> Self {
                unimplemented!()
            }
        }
        "#,
    );

    let decl = graph.get("Invoice").unwrap();
    let result = DefaultValidator::new().validate_root_element(decl, &graph);
    assert!(result
        .errors()
        .iter()
        .any(|m| m.text.contains("no-argument constructor")));
}

#[test]
fn test_chain_collects_from_all_members() {
    let graph = lower(
        r#"
        trait AccountService {
            fn open(&self) -> String;
        }
        "#,
    );

    let mut chain = ValidatorChain::new();
    chain.push(Box::new(DefaultValidator::new()));

    let decl = graph.get("AccountService").unwrap();
    // The trait lacks the web service marker; the chain surfaces the error.
    let result = chain.validate_endpoint_interface(decl, &graph);
    assert!(result
        .errors()
        .iter()
        .any(|m| m.text.contains("no web service annotation")));
}

#[test]
fn test_messages_carry_source_positions() {
    let graph = lower(
        r#"
        #[path("/accounts")]
        struct AccountResource;

        impl AccountResource {
            #[get]
            pub fn find(
                &self,
                #[query("q")]
                #[header("q")]
                q: String,
            ) -> String {
                unimplemented!()
            }
        }
        "#,
    );

    let roots = build_roots(&graph);
    let result = DefaultValidator::new().validate_root_resources(&roots, &graph);
    let error = result
        .errors()
        .iter()
        .find(|m| m.text.contains("binding annotations"))
        .expect("multi-binding error expected");
    let position = error.position.as_ref().expect("position expected");
    assert_eq!(position.file, "validation_test.rs");
    assert!(position.line > 1);
}
