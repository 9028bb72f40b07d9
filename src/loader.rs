//! Vault loading pipeline.
//!
//! Loads and resolves the schema (fatal on failure), scans the vault for
//! documents with blocked-path filtering, fans per-file parsing out over a
//! bounded worker pool, then runs merge, reference resolution and
//! validation single-threaded on the closed graph. Workers return owned
//! per-file results over a channel; there is no shared mutable state. A
//! panic inside one file's parse becomes a located issue and never aborts
//! sibling workers.

use std::collections::BTreeMap;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use ignore::gitignore::GitignoreBuilder;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::VaultConfig;
use crate::doc::{BlockReader, DocumentParser, FileOutcome};
use crate::error::{IssueKind, ParseIssue, SchemaError, SchemaResult};
use crate::merge::merge_nodes;
use crate::model::{Collection, Node};
use crate::refs::resolve_references;
use crate::schema::{resolve, LoreSchema, RawSchema};
use crate::validate::{validate, ValidationReport};

/// Path prefixes never treated as vault content.
const SKIP_PREFIXES: &[&str] = &[".git/", "target/", "node_modules/"];

/// Everything a vault load produces.
#[derive(Debug)]
pub struct VaultLoadResult {
    pub schema: LoreSchema,
    pub nodes: Vec<Node>,
    pub collections: Vec<Collection>,
    pub issues: Vec<ParseIssue>,
    pub warnings: Vec<ParseIssue>,
    /// Blocks found before the first heading, per document
    pub orphans: BTreeMap<PathBuf, Vec<usize>>,
    pub report: ValidationReport,
    /// SHA-256 over the schema and every ingested document, in path order
    pub bundle_hash: String,
}

pub struct VaultLoader {
    config: VaultConfig,
}

struct FileParse {
    outcome: FileOutcome,
    digest: Vec<u8>,
}

impl VaultLoader {
    pub fn new(config: VaultConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline. Schema problems abort the load; document
    /// problems are collected and returned.
    pub fn load(&self) -> SchemaResult<VaultLoadResult> {
        let root = self.config.vault.root.clone();
        let schema_file = root.join(&self.config.vault.schema_path);
        if !schema_file.is_file() {
            return Err(SchemaError::FileNotFound(schema_file));
        }
        let schema_text = fs::read_to_string(&schema_file).map_err(|source| SchemaError::Io {
            path: schema_file.clone(),
            source,
        })?;
        let raw: RawSchema = serde_json::from_str(&schema_text)?;
        let schema = resolve(raw)?;
        info!(
            types = schema.type_names().count(),
            collections = schema.collection_names().count(),
            "schema resolved"
        );

        let files = self.scan(&root, &schema);
        info!(files = files.len(), "vault scanned");

        // The schema is frozen before any worker starts; workers only read it.
        let mut parses = self.parse_files(&root, &schema, &files);
        parses.sort_by(|a, b| a.outcome.path.cmp(&b.outcome.path));

        let mut hasher = Sha256::new();
        hasher.update(schema_text.as_bytes());

        let mut all_nodes = Vec::new();
        let mut collections = Vec::new();
        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        let mut orphans = BTreeMap::new();
        for parse in parses {
            hasher.update(&parse.digest);
            let outcome = parse.outcome;
            if outcome.nodes.is_empty()
                && outcome.collections.is_empty()
                && outcome.issues.is_empty()
                && outcome.orphan_blocks.is_empty()
            {
                warnings.push(ParseIssue::new(
                    outcome.path.clone(),
                    0,
                    0,
                    IssueKind::EmptyDocument,
                ));
            }
            if !outcome.orphan_blocks.is_empty() {
                orphans.insert(outcome.path.clone(), outcome.orphan_blocks);
            }
            all_nodes.extend(outcome.nodes);
            collections.extend(outcome.collections);
            issues.extend(outcome.issues);
        }

        let mut nodes = merge_nodes(all_nodes);
        debug!(nodes = nodes.len(), collections = collections.len(), "merge complete");

        resolve_references(&mut nodes, &mut collections);
        let report = validate(&nodes, &collections, &schema);
        info!(
            failed = report.failed_count(),
            warnings = report.warning_count(),
            "validation complete"
        );

        Ok(VaultLoadResult {
            schema,
            nodes,
            collections,
            issues,
            warnings,
            orphans,
            report,
            bundle_hash: format!("{:x}", hasher.finalize()),
        })
    }

    /// Enumerate vault documents, applying blocked-path patterns from both
    /// the schema settings and the local config. Paths come back relative
    /// to the root, sorted.
    fn scan(&self, root: &Path, schema: &LoreSchema) -> Vec<PathBuf> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in schema
            .settings
            .blocked_paths
            .iter()
            .chain(self.config.vault.blocked_paths.iter())
        {
            if builder.add_line(None, pattern).is_err() {
                warn!(pattern = %pattern, "ignoring malformed blocked-path pattern");
            }
        }
        let matcher = builder.build().ok();

        let mut files = Vec::new();
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().map(|e| e != "md").unwrap_or(true) {
                continue;
            }
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            let rel_str = rel.to_string_lossy();
            if SKIP_PREFIXES.iter().any(|p| rel_str.starts_with(p)) {
                continue;
            }
            if let Some(matcher) = &matcher {
                if matcher
                    .matched_path_or_any_parents(rel, false)
                    .is_ignore()
                {
                    continue;
                }
            }
            files.push(rel.to_path_buf());
        }
        files.sort();
        files
    }

    /// Fan per-file parsing out over a bounded worker pool. Each worker
    /// sends owned results over the channel; the single-threaded caller
    /// combines them after the join barrier.
    fn parse_files(&self, root: &Path, schema: &LoreSchema, files: &[PathBuf]) -> Vec<FileParse> {
        if files.is_empty() {
            return Vec::new();
        }
        let workers = self.config.effective_workers().min(files.len());
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            for worker in 0..workers {
                let tx = tx.clone();
                let lanes: Vec<&PathBuf> = files.iter().skip(worker).step_by(workers).collect();
                scope.spawn(move || {
                    for path in lanes {
                        let _ = tx.send(parse_one(root, schema, path));
                    }
                });
            }
            drop(tx);
        });

        rx.into_iter().collect()
    }
}

fn parse_one(root: &Path, schema: &LoreSchema, rel: &Path) -> FileParse {
    let full = root.join(rel);
    let text = match fs::read_to_string(&full) {
        Ok(text) => text,
        Err(err) => {
            return FileParse {
                outcome: failed_outcome(
                    rel,
                    IssueKind::ReadFailed {
                        detail: err.to_string(),
                    },
                ),
                digest: Vec::new(),
            };
        }
    };
    let digest = Sha256::digest(text.as_bytes()).to_vec();

    let parsed = catch_unwind(AssertUnwindSafe(|| {
        let blocks = BlockReader::new().read(&text);
        DocumentParser::new(schema, rel).parse(&blocks)
    }));
    match parsed {
        Ok(outcome) => FileParse { outcome, digest },
        Err(panic) => {
            let detail = panic
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(path = %rel.display(), detail = %detail, "parse worker panicked");
            FileParse {
                outcome: failed_outcome(rel, IssueKind::WorkerPanic { detail }),
                digest,
            }
        }
    }
}

fn failed_outcome(rel: &Path, kind: IssueKind) -> FileOutcome {
    FileOutcome {
        path: rel.to_path_buf(),
        nodes: Vec::new(),
        collections: Vec::new(),
        orphan_blocks: Vec::new(),
        issues: vec![ParseIssue::new(rel, 0, 0, kind)],
    }
}
