use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// goapidoc - Generate OpenAPI 2.0 documentation from comments in Go source code
#[derive(Parser, Debug)]
#[command(name = "goapidoc")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Go project directory (must contain go.mod)
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Locate imported packages with `go list` instead of go.mod mapping
    #[arg(long = "go-list")]
    pub go_list: bool,

    /// Document title
    #[arg(long = "title", default_value = "goapidoc")]
    pub title: String,

    /// Document version
    #[arg(long = "api-version", default_value = "1.0.0")]
    pub api_version: String,

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

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::comment::CommentParser;
    use crate::index::{SourceFile, SourceIndex};
    use crate::loader::{GoListLocator, GoModLocator, PackageLoader, PackageLocator};
    use crate::openapi_builder::{build_document, DocumentInfo};
    use crate::parser::GoParser;
    use crate::resolver::Resolver;
    use crate::scanner::FileScanner;
    use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
    use crate::translator::Translator;
    use std::rc::Rc;

    info!("Starting OpenAPI document generation...");

    // The go.mod mapping is always read: scanned files get their package
    // ids from it even when `go list` handles the lookups.
    let gomod = GoModLocator::new(&args.project_path)
        .context("Failed to read the project's go.mod")?;

    // Step 1: Scan directory for Go files
    info!("Scanning project directory...");
    let scanner = FileScanner::new(args.project_path.clone());
    let scan_result = scanner.scan()?;

    info!("Found {} Go files", scan_result.go_files.len());
    if scan_result.go_files.is_empty() {
        anyhow::bail!("No Go files found in the project directory");
    }

    // Step 2: Parse files and index them under their package ids
    info!("Parsing Go files...");
    let mut index = SourceIndex::new();
    let mut scanned: Vec<Rc<SourceFile>> = Vec::new();
    for result in GoParser::parse_files(&scan_result.go_files) {
        let parsed = match result {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Skipping file due to parse error: {}", e);
                continue;
            }
        };
        let dir = parsed.path.parent().unwrap_or(&args.project_path);
        let Some(pkg_id) = gomod.package_id_for_dir(dir) else {
            debug!("Skipping file outside the module: {}", parsed.path.display());
            continue;
        };
        scanned.push(index.index_file(&pkg_id, &parsed.path, parsed.ast));
    }

    info!("Successfully parsed {} files", scanned.len());
    if scanned.is_empty() {
        anyhow::bail!("No files could be parsed successfully");
    }

    // Step 3: Set up resolution with the chosen package locator
    let locator: Box<dyn PackageLocator> = if args.go_list {
        info!("Locating imported packages with go list");
        Box::new(GoListLocator::new(&args.project_path))
    } else {
        info!("Locating imported packages under module {}", gomod.module_path());
        Box::new(gomod)
    };
    let resolver = Resolver::new(index, PackageLoader::new(locator));
    let mut comment_parser = CommentParser::new(Translator::new(resolver));

    // Step 4: Extract documented operations from comments
    info!("Parsing comments...");
    let mut items = Vec::new();
    let mut order = 1usize;
    for file in &scanned {
        let file_items = comment_parser
            .parse_file(file, &mut order)
            .with_context(|| format!("Failed to parse comments in {}", file.path.display()))?;
        items.extend(file_items);
    }

    info!("Extracted {} documented operations", items.len());
    if items.is_empty() {
        log::warn!("No documented operations found in the project");
    }

    // Step 5: Build the document
    info!("Building OpenAPI document...");
    let doc_info = DocumentInfo {
        title: args.title.clone(),
        version: args.api_version.clone(),
        ..DocumentInfo::default()
    };
    let document = build_document(&doc_info, &items);

    // Step 6: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    // Step 7: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Files scanned: {}", scan_result.go_files.len());
    info!("  - Files parsed: {}", scanned.len());
    info!("  - Operations documented: {}", items.len());

    Ok(())
}
