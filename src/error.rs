//! Error types for schema resolution and document parsing

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type for schema loading and resolution
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Schema-semantic errors. Any of these aborts the load before a single
/// document is parsed.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate {kind} definition: '{name}'")]
    DuplicateDefinition { kind: &'static str, name: String },

    #[error("Duplicate {kind} '{child}' in definition '{owner}'")]
    DuplicateChild {
        kind: &'static str,
        owner: String,
        child: String,
    },

    #[error("Type '{name}' extends unknown type '{base}'")]
    UnknownBase { name: String, base: String },

    #[error("Cyclic inheritance involving type '{name}'")]
    InheritanceCycle { name: String },

    #[error("Embedded slot {slot} of type '{owner}' targets unknown type '{target}'")]
    UnknownEmbeddedTarget {
        owner: String,
        slot: String,
        target: String,
    },

    #[error("Type '{owner}' declares two embedded slots titled '{title}'")]
    DuplicateEmbeddedTitle { owner: String, title: String },

    #[error(
        "Type '{owner}' has more than one untitled embedded slot with related \
         target types ('{first}' and '{second}')"
    )]
    AmbiguousUntitledEmbedded {
        owner: String,
        first: String,
        second: String,
    },

    #[error("Collection '{name}' names unknown entry type '{target}'")]
    UnknownEntryType { name: String, target: String },

    #[error("Collection '{name}' names unknown entry collection '{target}'")]
    UnknownEntryCollection { name: String, target: String },

    #[error("Collection '{name}' declares more than one entry kind")]
    AmbiguousEntryKind { name: String },

    #[error("Collection '{name}' declares no entry kind")]
    MissingEntryKind { name: String },

    #[error("Collection '{name}' is contained in itself")]
    CollectionCycle { name: String },

    #[error("Field '{field}' of '{owner}' names unknown picklist '{picklist}'")]
    UnknownPicklist {
        owner: String,
        field: String,
        picklist: String,
    },
}

/// A located problem found while parsing one document.
///
/// Issues never abort a load; they are collected per file and reported
/// together once every file has been parsed.
#[derive(Debug, Clone, Serialize)]
pub struct ParseIssue {
    /// Path of the document, relative to the vault root
    pub path: PathBuf,
    /// Index of the offending block within the document
    pub block: usize,
    /// 1-based source line of the offending block
    pub line: usize,
    /// What went wrong
    pub kind: IssueKind,
}

impl ParseIssue {
    pub fn new(path: impl Into<PathBuf>, block: usize, line: usize, kind: IssueKind) -> Self {
        Self {
            path: path.into(),
            block,
            line,
            kind,
        }
    }
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} (block {}): {}",
            self.path.display(),
            self.line,
            self.block,
            self.kind
        )?;
        if let Some(hint) = self.kind.hint() {
            write!(f, " ({})", hint)?;
        }
        Ok(())
    }
}

/// The specific cause of a [`ParseIssue`].
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    #[error("definition not found: '{name}'")]
    DefinitionNotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("the first heading of a document must carry a tag")]
    RootTagMissing,

    #[error("a section cannot be the root of a document")]
    SectionAtRoot,

    #[error("unknown field '{name}' on type '{owner}'")]
    UnknownField {
        name: String,
        owner: String,
        suggestion: Option<String>,
    },

    #[error("field '{field}' takes a single value but {count} nested items were given")]
    ExtraNestedValues { field: String, count: usize },

    #[error("'{name}' is not a declared subsection of '{owner}'")]
    UnknownSubsection { name: String, owner: String },

    #[error("type '{type_name}' is not allowed as an embedded node of '{owner}'")]
    EmbeddedTypeNotAllowed { type_name: String, owner: String },

    #[error("embedded node title '{title}' does not match any declared slot of '{owner}'")]
    EmbeddedTitleMismatch { title: String, owner: String },

    #[error("embedded slot for '{type_name}' in '{owner}' is already filled")]
    EmbeddedSlotOccupied { type_name: String, owner: String },

    #[error("entry type '{type_name}' is not '{expected}' or one of its subtypes")]
    EntryTypeMismatch {
        type_name: String,
        expected: String,
    },

    #[error("document contains no blocks")]
    EmptyDocument,

    #[error("document could not be read: {detail}")]
    ReadFailed { detail: String },

    #[error("parser worker panicked: {detail}")]
    WorkerPanic { detail: String },
}

impl IssueKind {
    /// An optional "did you mean" hint for display.
    pub fn hint(&self) -> Option<String> {
        match self {
            IssueKind::DefinitionNotFound {
                suggestion: Some(s),
                ..
            }
            | IssueKind::UnknownField {
                suggestion: Some(s),
                ..
            } => Some(format!("did you mean '{}'?", s)),
            _ => None,
        }
    }
}
