//! The typed block sequence a document is parsed from.
//!
//! Blocks are a closed set; the parser dispatches with exhaustive matches
//! and never inspects raw text again once the reader has produced them.

use serde::Serialize;

/// One block of a document, with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub line: usize,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Heading {
        level: u8,
        tag: Option<Tag>,
        text: InlineText,
    },
    Paragraph(InlineText),
    List(Vec<ListItem>),
    Quote(Vec<InlineText>),
    /// Code fences, thematic breaks, anything the vault format does not
    /// assign meaning to
    Other,
}

impl Block {
    /// Heading level, if this block is a heading.
    pub fn heading_level(&self) -> Option<u8> {
        match &self.kind {
            BlockKind::Heading { level, .. } => Some(*level),
            _ => None,
        }
    }
}

/// A list item with its nested children.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub line: usize,
    pub text: InlineText,
    pub children: Vec<ListItem>,
}

/// Inline runs with emphasis fidelity. `rendered()` yields the plain text
/// with markers stripped; backslash escapes are preserved for the parser
/// to honor.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InlineText {
    pub runs: Vec<InlineRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineRun {
    pub text: String,
    pub emphasis: bool,
    pub strong: bool,
}

impl InlineText {
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            runs: vec![InlineRun {
                text,
                emphasis: false,
                strong: false,
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    /// Plain text with emphasis markers stripped.
    pub fn rendered(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            out.push_str(&run.text);
        }
        out
    }
}

/// An inline heading tag: `{node type="Character" id="alice"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub kind: TagKind,
    pub type_name: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Node,
    Collection,
    Section,
}

impl Tag {
    /// A collection tag's type may be a chain
    /// `collection:collection:...:Leaf`; the extra `collection:` prefixes
    /// count nesting levels around the leaf type.
    pub fn collection_chain(&self) -> Option<(usize, &str)> {
        let type_name = self.type_name.as_deref()?;
        let mut depth = 0;
        let mut rest = type_name;
        while let Some(stripped) = rest.strip_prefix("collection:") {
            depth += 1;
            rest = stripped;
        }
        Some((depth, rest))
    }
}
