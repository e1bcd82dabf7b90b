//! Ninja manifest writer.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::graph::BuildGraph;

/// Version line written at the top of every manifest.
pub const NINJA_REQUIRED_VERSION: &str = "1.7.0";

/// Render `graph` as a ninja manifest.
///
/// Rules come first, sorted by name, then one build statement per edge in
/// graph order. The output depends only on the graph.
pub fn write_ninja(graph: &BuildGraph) -> String {
    let mut out = String::from("# Generated by suite-harness. Do not modify.\n");
    out.push_str(&format!(
        "ninja_required_version = {}\n",
        NINJA_REQUIRED_VERSION
    ));

    for rule in graph.rules() {
        out.push_str(&format!("\nrule {}\n", rule.name));
        out.push_str(&format!("    command = {}\n", rule.command));
        if !rule.description.is_empty() {
            out.push_str(&format!("    description = {}\n", rule.description));
        }
    }

    for edge in &graph.edges {
        out.push_str(&format!("\n# module: {}\n", edge.module));
        out.push_str(&format!(
            "build {}: {}",
            escape_path(&edge.output),
            edge.rule.name
        ));
        for input in &edge.inputs {
            out.push(' ');
            out.push_str(&escape_path(input));
        }
        if !edge.order_only.is_empty() {
            out.push_str(" ||");
            for input in &edge.order_only {
                out.push(' ');
                out.push_str(&escape_path(input));
            }
        }
        out.push('\n');
        for (key, value) in &edge.args {
            out.push_str(&format!("    {} = {}\n", key, escape_value(value)));
        }
    }

    out
}

/// Write the manifest for `graph` to `path`, creating parent directories.
pub fn write_ninja_file(graph: &BuildGraph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, write_ninja(graph))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Escape a path for use in a build line.
fn escape_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '$' => out.push_str("$$"),
            ' ' => out.push_str("$ "),
            ':' => out.push_str("$:"),
            '\n' => out.push_str("$\n"),
            c => out.push(c),
        }
    }
    out
}

/// Escape a variable value so ninja reproduces it verbatim.
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '$' => out.push_str("$$"),
            '\n' => out.push_str("$\n"),
            c => out.push(c),
        }
    }
    out
}
