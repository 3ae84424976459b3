//! Contract Extractor - A normalized, validated service contract from annotated source.
//!
//! This library builds a resource model from annotated interface declarations
//! by static analysis. Types annotated with a path become root resources;
//! their verb-annotated methods become resource methods with derived full
//! paths, dispatch patterns and content-type matrices; path-annotated methods
//! without a verb become sub-resource locators that chain into nested
//! resources. A rule engine then validates the model and the declarations it
//! was built from, aggregating errors and warnings with source positions.
//!
//! # Architecture
//!
//! The pipeline runs through these modules:
//!
//! 1. [`scanner`] - Recursively scans project directories for source files
//! 2. [`parser`] - Parses source files into Abstract Syntax Trees (AST)
//! 3. [`adapter`] - Lowers syntax trees into the declaration graph
//! 4. [`declaration`] - The annotation-level view of the scanned types
//! 5. [`model`] - Resource model building: inheritance, parameters, paths
//! 6. [`validation`] - The rule engine and its diagnostics
//! 7. [`document`] - The serializable projection of model and diagnostics
//! 8. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use contract_from_source::{
//!     adapter::DeclarationAdapter,
//!     document::ContractDocument,
//!     model::RootResource,
//!     parser::SourceParser,
//!     scanner::SourceScanner,
//!     serializer::serialize_yaml,
//!     validation::{ContractValidator, DefaultValidator, ValidationResult},
//! };
//! use contract_from_source::declaration::Annotated;
//! use std::path::PathBuf;
//!
//! // Scan and parse the project
//! let scanner = SourceScanner::new(PathBuf::from("./my-service"));
//! let scan_result = scanner.scan().unwrap();
//! let parsed: Vec<_> = SourceParser::parse_files(&scan_result.source_files)
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//!
//! // Lower into the declaration graph
//! let mut adapter = DeclarationAdapter::new();
//! for file in &parsed {
//!     adapter.lower_file(file);
//! }
//! let graph = adapter.finish();
//!
//! // Build and validate the resource model
//! let roots: Vec<_> = graph
//!     .types()
//!     .filter(|t| t.path_value().is_some())
//!     .filter_map(|t| RootResource::build(&graph, t).ok())
//!     .collect();
//! let validator = DefaultValidator::new();
//! let validation = validator.validate_root_resources(&roots, &graph);
//!
//! // Serialize the contract
//! let document = ContractDocument::from_model(&roots, &validation);
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete
//! CLI application.

pub mod adapter;
pub mod cli;
pub mod declaration;
pub mod document;
pub mod error;
pub mod model;
pub mod parser;
pub mod scanner;
pub mod serializer;
pub mod validation;
