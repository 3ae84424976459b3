use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// Contract Extractor - Build a normalized, validated service contract from annotated source
#[derive(Parser, Debug)]
#[command(name = "contract-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Downgrade a validation rule from error to warning (repeatable)
    #[arg(long = "disable-rule", value_name = "RULE_ID")]
    pub disabled_rules: Vec<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }
    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    for rule in &args.disabled_rules {
        info!("Disabled rule: {}", rule);
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::adapter::DeclarationAdapter;
    use crate::declaration::{Annotated, TypeKind};
    use crate::document::ContractDocument;
    use crate::model::RootResource;
    use crate::parser::{ParsedFile, SourceParser};
    use crate::scanner::SourceScanner;
    use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
    use crate::validation::{ContractValidator, DefaultValidator, ValidationResult, ValidatorChain};

    info!("Starting contract extraction...");
    info!("Project path: {}", args.project_path.display());

    // Step 1: Scan directory for source files
    info!("Scanning project directory...");
    let scanner = SourceScanner::new(args.project_path.clone());
    let scan_result = scanner.scan()?;

    info!("Found {} source files", scan_result.source_files.len());
    for warning in &scan_result.warnings {
        log::warn!("{}", warning);
    }

    if scan_result.source_files.is_empty() {
        anyhow::bail!("No source files found in the project directory");
    }

    // Step 2: Parse files into AST
    info!("Parsing source files...");
    let parse_results = SourceParser::parse_files(&scan_result.source_files);

    let parsed_files: Vec<ParsedFile> = parse_results
        .into_iter()
        .filter_map(|r| match r {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping file due to parse error: {}", e);
                None
            }
        })
        .collect();

    info!("Successfully parsed {} files", parsed_files.len());

    if parsed_files.is_empty() {
        anyhow::bail!("No files could be parsed successfully");
    }

    // Step 3: Lower the syntax trees into the declaration graph
    info!("Building declaration graph...");
    let mut adapter = DeclarationAdapter::new();
    for parsed in &parsed_files {
        adapter.lower_file(parsed);
    }
    let graph = adapter.finish();
    info!("Declaration graph holds {} types", graph.types().count());

    // Step 4: Build the resource model. A root resource that fails to build
    // is reported and skipped; the remaining roots still produce a contract.
    info!("Building resource model...");
    let mut roots: Vec<RootResource> = Vec::new();
    let mut validation = ValidationResult::new();
    for decl in graph.types() {
        if decl.path_value().is_none() || decl.kind != TypeKind::Class {
            continue;
        }
        match RootResource::build(&graph, decl) {
            Ok(root) => {
                debug!("Built root resource at {}", root.path);
                roots.push(root);
            }
            Err(e) => {
                log::warn!("Skipping root resource {}: {}", decl.qualified_name, e);
                validation.add_error(decl, e.to_string());
            }
        }
    }
    info!("Built {} root resources", roots.len());

    // Step 5: Validate
    info!("Validating contract...");
    let mut chain = ValidatorChain::new();
    chain.push(Box::new(DefaultValidator::with_disabled_rules(
        args.disabled_rules.iter().cloned().collect(),
    )));

    for decl in graph.types() {
        match decl.web_service() {
            Some(Some(interface_name)) => {
                if let Some(interface) = graph.get(interface_name) {
                    validation
                        .aggregate(chain.validate_endpoint_implementation(decl, interface, &graph));
                    validation.aggregate(chain.validate_endpoint_interface(interface, &graph));
                } else {
                    validation.add_error(
                        decl,
                        format!("cannot resolve endpoint interface {}", interface_name),
                    );
                }
            }
            Some(None) if decl.kind == TypeKind::Interface => {
                validation.aggregate(chain.validate_endpoint_interface(decl, &graph));
            }
            _ => {}
        }

        if decl.root_element().is_some() {
            validation.aggregate(chain.validate_root_element(decl, &graph));
            if decl.kind == TypeKind::Enum {
                validation.aggregate(chain.validate_enum_type(decl, &graph));
            } else {
                validation.aggregate(chain.validate_complex_type(decl, &graph));
            }
        }
    }

    validation.aggregate(chain.validate_root_resources(&roots, &graph));
    for package in graph.packages() {
        validation.aggregate(chain.validate_package(package));
    }

    info!(
        "Validation complete: {} errors, {} warnings",
        validation.errors().len(),
        validation.warnings().len()
    );

    // Step 6: Project the model into the contract document
    let document = ContractDocument::from_model(&roots, &validation);

    // Step 7: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    // Step 8: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote contract to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    // Step 9: Display summary. The document is written even when validation
    // failed, so errors surface both in the output and in the exit status.
    info!("Extraction complete!");
    info!("Summary:");
    info!("  - Files scanned: {}", scan_result.source_files.len());
    info!("  - Files parsed: {}", parsed_files.len());
    info!("  - Root resources: {}", roots.len());
    info!("  - Validation errors: {}", validation.errors().len());
    info!("  - Validation warnings: {}", validation.warnings().len());

    if validation.has_errors() {
        anyhow::bail!("Contract validation failed with {} errors", validation.errors().len());
    }

    Ok(())
}
