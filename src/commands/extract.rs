use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::debug;
use walkdir::WalkDir;

use crate::commands::config::read_config;
use crate::report;
use crate::sql_engine::{LineageExtractor, TableRegistry};
use crate::source::{FileLoader, SourceLoader};

/// Run the extract command: load the SQL body, build the lineage registry
/// and print it in the requested format.
///
/// Path and format fall back to the configuration file when given, then to
/// the built-in defaults.
pub fn extract_command(
    sql_path: Option<PathBuf>,
    format: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => Some(read_config(Some(path))?),
        None => None,
    };
    let sql_path = sql_path
        .or_else(|| config.as_ref().and_then(|c| c.sql_path.clone()))
        .context("no SQL source has been provided: pass --sql-path or set sql_path in sqlgate.yaml")?;
    let format = format
        .or_else(|| config.as_ref().map(|c| c.format.clone()))
        .unwrap_or_else(|| "text".to_string());

    let start_time = Instant::now();
    println!(
        "{}",
        format!("Scanning SQL in: {}", sql_path.display()).green()
    );

    let sql = load_sql_body(&sql_path)?;
    let registry = LineageExtractor::new().extract(&sql);
    println!(
        "Identified {} tables in {:.2?}",
        registry.len(),
        start_time.elapsed()
    );

    match format.as_str() {
        "text" => output_text_format(&registry),
        "json" => output_json_format(&registry)?,
        "csv" => {
            let rows = report::table_rows(&registry);
            report::write_table_csv(std::io::stdout(), &rows)
                .context("failed to write CSV output")?;
        }
        "dot" => println!("{}", report::to_dot_graph(&registry)),
        other => {
            println!(
                "Unsupported output format: {}. Using text format instead.",
                other
            );
            output_text_format(&registry);
        }
    }

    Ok(())
}

/// Load one SQL file, or every `*.sql` file under a directory as one batch
fn load_sql_body(path: &Path) -> Result<String> {
    if path.is_dir() {
        let files = find_sql_files(path);
        if files.is_empty() {
            bail!("no SQL files found under {}", path.display());
        }
        println!("Found {} SQL files", files.len());
        let mut body = String::new();
        for file in &files {
            debug!("loading {}", file.display());
            let text = fs::read_to_string(file)
                .with_context(|| format!("failed to read SQL file: {}", file.display()))?;
            body.push_str(&text);
            // each file ends its last statement
            body.push_str(";\n");
        }
        Ok(body)
    } else {
        let location = path
            .to_str()
            .with_context(|| format!("non-UTF-8 path: {}", path.display()))?;
        Ok(FileLoader.load(location)?)
    }
}

/// Find all SQL files in the given directory (recursively), sorted so the
/// batch order is deterministic
fn find_sql_files(dir: &Path) -> Vec<PathBuf> {
    let mut sql_files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            e.path().is_file() && e.path().extension().is_some_and(|ext| ext == "sql")
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    sql_files.sort();
    sql_files
}

/// Output the registry in text format
fn output_text_format(registry: &TableRegistry) {
    println!("\n--- {} ---", "Extracted Tables".green());

    for (id, table) in registry.iter() {
        println!("\nTable: {}", table.full_name().bold());

        let mut roles = Vec::new();
        if table.used {
            roles.push("used");
        }
        if table.created {
            roles.push("created");
        }
        if table.renamed {
            roles.push("renamed");
        }
        if table.populated {
            roles.push("populated");
        }
        println!("  Roles: {}", roles.join(", "));

        if !table.parent_tables.is_empty() {
            println!("  Derived from:");
            for parent in registry.parent_names(id) {
                println!("    • {}", parent);
            }
        }
        if !table.sql.is_empty() {
            println!("  Defined by: {}", table.sql.replace('\n', " "));
        }
    }
}

/// Output the registry in JSON format
fn output_json_format(registry: &TableRegistry) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonOutput {
        tables: Vec<report::TableRow>,
    }

    let output = JsonOutput {
        tables: report::table_rows(registry),
    };
    let json = serde_json::to_string_pretty(&output)?;
    println!("{}", json);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_sql_body_single_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("query.sql");
        fs::write(&path, "select 1 from sysibm.sysdummy1").unwrap();

        let body = load_sql_body(&path).unwrap();
        assert_eq!(body, "select 1 from sysibm.sysdummy1");
    }

    #[test]
    fn test_load_sql_body_directory_batches_in_path_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b_second.sql"), "insert into s.t select * from s.raw2").unwrap();
        fs::write(dir.path().join("a_first.sql"), "create table s.t as select * from s.raw").unwrap();
        fs::write(dir.path().join("notes.txt"), "not sql").unwrap();

        let body = load_sql_body(dir.path()).unwrap();
        let first = body.find("create table").unwrap();
        let second = body.find("insert into").unwrap();
        assert!(first < second);
        assert!(!body.contains("not sql"));

        let registry = LineageExtractor::new().extract(&body);
        let id = registry.id_of("S.T").unwrap();
        assert!(registry.get(id).created);
        assert!(registry.get(id).populated);
    }

    #[test]
    fn test_load_sql_body_empty_directory() {
        let dir = tempdir().unwrap();
        assert!(load_sql_body(dir.path()).is_err());
    }
}
