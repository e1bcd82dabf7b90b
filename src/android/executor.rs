//! Runs a build graph.
//!
//! Staleness is content based. An edge's fingerprint covers its expanded
//! command and the bytes of every input and order-only input; the
//! edge reruns when an output is missing or the fingerprint changed since the
//! last successful run. Modification times are never consulted, so touching
//! a file without changing it rebuilds nothing, and an output regenerated
//! with identical bytes does not ripple into its consumers.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::graph::BuildGraph;
use super::rule::BuildEdge;
use crate::cache;
use crate::config::Config;
use crate::process;

/// Directory (under the output root) holding per-edge fingerprints.
pub const EDGE_HASH_DIR: &str = ".edge-hashes";

/// What happened to each edge during one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Outputs whose command ran.
    pub ran: Vec<PathBuf>,
    /// Outputs that were already current.
    pub up_to_date: Vec<PathBuf>,
}

impl ExecutionReport {
    pub fn was_rebuilt(&self, output: &Path) -> bool {
        self.ran.iter().any(|p| p == output)
    }
}

/// Execute every edge of `graph`, producers before consumers.
pub fn execute(graph: &BuildGraph, config: &Config) -> Result<ExecutionReport> {
    let order = edge_order(graph)?;
    let hash_dir = config.out_dir.join(EDGE_HASH_DIR);
    let mut report = ExecutionReport::default();

    for i in order {
        let edge = &graph.edges[i];
        if run_edge(edge, config, &hash_dir)? {
            report.ran.push(edge.output.clone());
        } else {
            report.up_to_date.push(edge.output.clone());
        }
    }

    tracing::info!(
        ran = report.ran.len(),
        up_to_date = report.up_to_date.len(),
        "build finished"
    );
    Ok(report)
}

/// Run one edge if it is stale. Returns whether the command ran.
fn run_edge(edge: &BuildEdge, config: &Config, hash_dir: &Path) -> Result<bool> {
    for input in edge.all_inputs() {
        if !input.exists() {
            bail!(
                "missing input {} needed by {} (module \"{}\")",
                input.display(),
                edge.output.display(),
                edge.module
            );
        }
    }

    let command = edge.command()?;
    let inputs: Vec<&Path> = edge.all_inputs().map(PathBuf::as_path).collect();
    let fingerprint = cache::fingerprint(&command, &inputs)?;
    let hash_file = hash_dir.join(format!(
        "{}.hash",
        cache::hash_str(&edge.output.to_string_lossy())
    ));

    if !cache::needs_rebuild(&fingerprint, &hash_file, &edge.output) {
        tracing::debug!(output = %edge.output.display(), "up to date");
        return Ok(false);
    }

    if let Some(parent) = edge.output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    tracing::info!(rule = edge.rule.name, output = %edge.output.display(), "running");
    process::shell_in(&command, &config.src_dir).with_context(|| {
        format!(
            "rule \"{}\" failed for {} (module \"{}\")",
            edge.rule.name,
            edge.output.display(),
            edge.module
        )
    })?;

    if !edge.output.exists() {
        bail!(
            "rule \"{}\" did not create {}",
            edge.rule.name,
            edge.output.display()
        );
    }

    cache::write_cached_hash(&hash_file, &fingerprint)?;
    Ok(true)
}

/// Edge indices with producers before consumers; ties keep graph order.
fn edge_order(graph: &BuildGraph) -> Result<Vec<usize>> {
    let producers: HashMap<&Path, usize> = graph
        .edges
        .iter()
        .enumerate()
        .map(|(i, e)| (e.output.as_path(), i))
        .collect();

    let n = graph.edges.len();
    let mut pending = vec![0usize; n];
    let mut consumers: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, edge) in graph.edges.iter().enumerate() {
        let sources: BTreeSet<usize> = edge
            .all_inputs()
            .filter_map(|p| producers.get(p.as_path()).copied())
            .collect();
        for s in sources {
            pending[i] += 1;
            consumers[s].push(i);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> =
        (0..n).filter(|&i| pending[i] == 0).map(Reverse).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &c in &consumers[i] {
            pending[c] -= 1;
            if pending[c] == 0 {
                ready.push(Reverse(c));
            }
        }
    }

    if order.len() != n {
        let stuck: Vec<String> = (0..n)
            .filter(|&i| pending[i] > 0)
            .map(|i| graph.edges[i].output.display().to_string())
            .collect();
        bail!("build edges form a cycle: {}", stuck.join(", "));
    }
    Ok(order)
}
