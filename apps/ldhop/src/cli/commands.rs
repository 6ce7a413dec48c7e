//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use ldhop::{DirectoryFetcher, read_text_file};
use ldhop_core::{Engine, LdhopError, QueryConfig, Step, StepConfig, Term, traverse};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a query configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file path for security.
///
/// Canonicalizes the path, which resolves `..` and symlinks and fails when
/// the file does not exist, then rejects anything that is not a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, LdhopError> {
    let canonical = path.canonicalize().map_err(|e| {
        LdhopError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(LdhopError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Load a query configuration and apply command-line starting bindings.
pub fn load_config(path: &Path, start: &[String]) -> Result<QueryConfig, LdhopError> {
    let path = validate_file_path(path)?;
    let text = read_text_file(&path, MAX_CONFIG_FILE_SIZE)?;

    let mut config: QueryConfig = toml::from_str(&text)
        .map_err(|e| LdhopError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
    for assignment in start {
        config.add_start(assignment)?;
    }

    Ok(config)
}

fn render_terms<'a>(terms: impl IntoIterator<Item = &'a Term>) -> Vec<String> {
    terms.into_iter().map(Term::to_string).collect()
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Traverse a directory mirror until the query settles.
pub fn cmd_run(
    config_path: &Path,
    root: &Path,
    start: &[String],
    max_fetches: Option<usize>,
    json_mode: bool,
    verbose: bool,
) -> Result<(), LdhopError> {
    let config = load_config(config_path, start)?;
    let (query, bindings) = config.build()?;
    let mut engine = Engine::new(query, &bindings)?;
    let mut fetcher = DirectoryFetcher::new(root)?;

    let limit = max_fetches.or(config.traversal.max_fetches);
    let report = traverse(&mut engine, &mut fetcher, limit);

    let variables: BTreeMap<String, Vec<String>> = engine
        .get_all_variables()
        .iter()
        .map(|(variable, terms)| (variable.to_string(), render_terms(terms)))
        .collect();
    let graphs: BTreeMap<String, _> = engine
        .get_graphs(None)
        .into_iter()
        .filter_map(|uri| engine.graph_status(&uri).map(|status| (uri, status)))
        .collect();

    if json_mode {
        let mut output = serde_json::json!({
            "report": report,
            "variables": variables,
            "graphs": graphs,
            "missing": engine.get_missing_resources(),
        });
        if verbose {
            output["moves"] = serde_json::json!(engine.describe_moves());
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("ldhop Traversal");
    println!("===============");
    println!("Root:     {}", fetcher.root().display());
    println!("Fetched:  {}", report.fetched);
    println!("Failed:   {}", report.failed);
    println!("Complete: {}", report.complete);
    println!();

    println!("Variables");
    println!("---------");
    for (variable, terms) in &variables {
        println!("{} ({})", variable, terms.len());
        for term in terms {
            println!("  {}", term);
        }
    }
    println!();

    println!("Documents");
    println!("---------");
    for (uri, status) in &graphs {
        println!("  [{:?}] {}", status, uri);
    }

    if verbose {
        println!();
        println!("Moves");
        println!("-----");
        for line in engine.describe_moves() {
            println!("  {}", line);
        }
    }

    Ok(())
}

// =============================================================================
// MISSING COMMAND
// =============================================================================

/// Show the documents the starting bindings already require.
pub fn cmd_missing(config_path: &Path, start: &[String], json_mode: bool) -> Result<(), LdhopError> {
    let config = load_config(config_path, start)?;
    let (query, bindings) = config.build()?;
    let engine = Engine::new(query, &bindings)?;
    let missing = engine.get_missing_resources();

    if json_mode {
        let output = serde_json::json!({ "missing": missing });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Missing Documents ({})", missing.len());
    println!("=================");
    for uri in &missing {
        println!("  {}", uri);
    }

    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

fn describe_step(step: &StepConfig) -> String {
    let slot = |value: &Option<String>| value.clone().unwrap_or_else(|| "*".to_string());
    match step {
        StepConfig::Match {
            subject,
            predicate,
            object,
            graph,
            pick,
            target,
        } => format!(
            "match {} {} {} {} -> {} ({:?})",
            slot(subject),
            slot(predicate),
            slot(object),
            slot(graph),
            target,
            pick
        ),
        StepConfig::Transform {
            source,
            target,
            function,
        } => format!("transform {} -> {} ({:?})", source, target, function),
        StepConfig::AddResources { variable } => format!("add-resources {}", variable),
    }
}

/// Validate a query configuration.
pub fn cmd_check(config_path: &Path, json_mode: bool) -> Result<(), LdhopError> {
    let config = load_config(config_path, &[])?;
    let (query, bindings) = config.build()?;

    let needed: Vec<String> = query
        .steps()
        .iter()
        .filter_map(|step| match step {
            Step::AddResources { variable } => Some(variable.to_string()),
            _ => None,
        })
        .collect();
    let start: BTreeMap<String, Vec<String>> = bindings
        .iter()
        .map(|(variable, iris)| (variable.to_string(), iris.iter().cloned().collect()))
        .collect();

    if json_mode {
        let output = serde_json::json!({
            "valid": true,
            "steps": config.steps,
            "needed": needed,
            "start": start,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Query OK: {} steps", query.len());
    println!("=========");
    for (index, step) in config.steps.iter().enumerate() {
        println!("  #{} {}", index, describe_step(step));
    }
    println!();
    println!("Needed: {}", needed.join(", "));
    for (variable, iris) in &start {
        println!("Start:  {} = {}", variable, iris.join(", "));
    }

    Ok(())
}
