//! Recursive-descent document parser.
//!
//! Walks a document's block sequence with a single forward cursor, keyed
//! on heading level: a subroutine returns control exactly when it meets a
//! heading at the same or a shallower level than the one that opened it,
//! or the sequence ends. Issues are collected, never thrown; a bad
//! subtree is skipped and parsing continues after it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use super::block::{Block, BlockKind, InlineText, ListItem, Tag, TagKind};
use crate::error::{IssueKind, ParseIssue};
use crate::model::value::{LiteralParser, Reference, Value};
use crate::model::{
    Attribute, Collection, CollectionEntries, Node, NodeIdentity, Provenance, Section,
};
use crate::schema::{
    CollectionDefinition, ContainedType, FieldDefinition, FieldShape, LoreSchema,
    SectionDefinition, TypeDefinition,
};

/// Everything parsed out of one document.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub nodes: Vec<Node>,
    pub collections: Vec<Collection>,
    /// Indices of blocks before the first heading (not an error by itself)
    pub orphan_blocks: Vec<usize>,
    pub issues: Vec<ParseIssue>,
}

/// Parses one document against an immutable schema. Pure function of its
/// inputs; safe to run fanned out per file.
pub struct DocumentParser<'a> {
    schema: &'a LoreSchema,
    path: &'a Path,
    literals: LiteralParser,
    matcher: SkimMatcherV2,
}

impl<'a> DocumentParser<'a> {
    pub fn new(schema: &'a LoreSchema, path: &'a Path) -> Self {
        Self {
            schema,
            path,
            literals: LiteralParser::new(),
            matcher: SkimMatcherV2::default(),
        }
    }

    pub fn parse(&self, blocks: &[Block]) -> FileOutcome {
        let mut run = ParseRun {
            parser: self,
            blocks,
            nodes: Vec::new(),
            collections: Vec::new(),
            orphans: Vec::new(),
            issues: Vec::new(),
        };
        run.parse_top();
        FileOutcome {
            path: self.path.to_path_buf(),
            nodes: run.nodes,
            collections: run.collections,
            orphan_blocks: run.orphans,
            issues: run.issues,
        }
    }

    fn suggest<'x>(
        &self,
        target: &str,
        candidates: impl IntoIterator<Item = &'x str>,
    ) -> Option<String> {
        let mut best: Option<(i64, &str)> = None;
        for candidate in candidates {
            if let Some(score) = self.matcher.fuzzy_match(candidate, target) {
                if best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, candidate));
                }
            }
        }
        best.map(|(_, c)| c.to_string())
    }
}

struct ParseRun<'a, 'b> {
    parser: &'b DocumentParser<'a>,
    blocks: &'b [Block],
    nodes: Vec<Node>,
    collections: Vec<Collection>,
    orphans: Vec<usize>,
    issues: Vec<ParseIssue>,
}

impl<'a, 'b> ParseRun<'a, 'b> {
    fn schema(&self) -> &'a LoreSchema {
        self.parser.schema
    }

    fn prov(&self, block: usize) -> Provenance {
        Provenance {
            path: self.parser.path.to_path_buf(),
            block,
            line: self.blocks[block].line,
        }
    }

    fn issue(&mut self, block: usize, kind: IssueKind) {
        self.issues.push(ParseIssue::new(
            self.parser.path,
            block,
            self.blocks[block].line,
            kind,
        ));
    }

    /// Advance past every block of a subtree opened at `level`.
    fn skip_subtree(&self, mut i: usize, level: u8) -> usize {
        while i < self.blocks.len() {
            if let Some(l) = self.blocks[i].heading_level() {
                if l <= level {
                    break;
                }
            }
            i += 1;
        }
        i
    }

    // --- top level ---

    fn parse_top(&mut self) {
        let mut i = 0;
        while i < self.blocks.len() {
            match &self.blocks[i].kind {
                BlockKind::Heading { level, tag, text } => {
                    let level = *level;
                    let title = text.rendered();
                    match tag.clone() {
                        None => {
                            self.issue(i, IssueKind::RootTagMissing);
                            i = self.skip_subtree(i + 1, level);
                        }
                        Some(tag) => i = self.parse_root(i, level, &tag, &title),
                    }
                }
                _ => {
                    self.orphans.push(i);
                    i += 1;
                }
            }
        }
    }

    fn parse_root(&mut self, i: usize, level: u8, tag: &Tag, title: &str) -> usize {
        match tag.kind {
            TagKind::Section => {
                self.issue(i, IssueKind::SectionAtRoot);
                self.skip_subtree(i + 1, level)
            }
            TagKind::Collection => match self.collection_def_for(i, tag, title) {
                Some(def) => {
                    let (collection, next) = self.parse_collection(i, def);
                    self.collections.push(collection);
                    next
                }
                None => self.skip_subtree(i + 1, level),
            },
            TagKind::Node => {
                let name = tag.type_name.clone().unwrap_or_default();
                if let Some(def) = self.schema().collection_def(&name) {
                    let def = (**def).clone();
                    let (collection, next) = self.parse_collection(i, def);
                    self.collections.push(collection);
                    next
                } else if let Some(ty) = self.schema().type_def(&name) {
                    let ty = ty.clone();
                    let (node, next) = self.parse_node(i, &ty);
                    self.nodes.push(node);
                    next
                } else {
                    let suggestion = self.parser.suggest(
                        &name,
                        self.schema()
                            .type_names()
                            .chain(self.schema().collection_names()),
                    );
                    self.issue(i, IssueKind::DefinitionNotFound { name, suggestion });
                    self.skip_subtree(i + 1, level)
                }
            }
        }
    }

    /// Resolve the definition for a collection-tagged heading: an explicit
    /// type chain builds anonymous nested definitions on the fly; an
    /// untyped tag falls back to the heading title as a standalone
    /// collection name.
    fn collection_def_for(
        &mut self,
        i: usize,
        tag: &Tag,
        title: &str,
    ) -> Option<CollectionDefinition> {
        if let Some((depth, leaf)) = tag.collection_chain() {
            if depth == 0 {
                if let Some(def) = self.schema().collection_def(leaf) {
                    return Some((**def).clone());
                }
            }
            if self.schema().type_def(leaf).is_some() {
                return Some(anonymous_collection(title, depth, leaf));
            }
            let suggestion = self.parser.suggest(
                leaf,
                self.schema()
                    .type_names()
                    .chain(self.schema().collection_names()),
            );
            self.issue(
                i,
                IssueKind::DefinitionNotFound {
                    name: leaf.to_string(),
                    suggestion,
                },
            );
            return None;
        }
        if let Some(def) = self.schema().collection_def(title) {
            return Some((**def).clone());
        }
        let suggestion = self.parser.suggest(title, self.schema().collection_names());
        self.issue(
            i,
            IssueKind::DefinitionNotFound {
                name: title.to_string(),
                suggestion,
            },
        );
        None
    }

    // --- nodes ---

    fn parse_node(&mut self, start: usize, ty: &TypeDefinition) -> (Node, usize) {
        let level = self.blocks[start]
            .heading_level()
            .expect("parse_node starts at a heading");
        let (tag, title) = heading_parts(&self.blocks[start]);
        let identity = NodeIdentity::from_tag(tag.and_then(|t| t.id.as_deref()), &title);
        let mut node = Node::new(title, ty.name.clone(), identity, self.prov(start));

        let mut fields_mode = true;
        let mut occupied: HashSet<usize> = HashSet::new();
        let mut i = start + 1;

        while i < self.blocks.len() {
            match &self.blocks[i].kind {
                BlockKind::Heading { level: l, .. } if *l <= level => break,
                BlockKind::Heading { level: l, tag, text } => {
                    fields_mode = false;
                    let l = *l;
                    let tag = tag.clone();
                    let title = text.rendered();
                    i = self.parse_node_child(i, l, tag, &title, ty, &mut node, &mut occupied);
                }
                BlockKind::List(items) if fields_mode => {
                    let attrs = self.parse_list_attributes(i, items, &ty.fields, &ty.name);
                    node.attributes.extend(attrs);
                    i += 1;
                }
                BlockKind::List(items) => {
                    node.push_summary(&flatten_list(items));
                    i += 1;
                }
                BlockKind::Paragraph(text) => {
                    fields_mode = false;
                    node.push_summary(&text.rendered());
                    i += 1;
                }
                BlockKind::Quote(rows) => {
                    fields_mode = false;
                    node.push_summary(&quote_text(rows));
                    i += 1;
                }
                BlockKind::Other => {
                    fields_mode = false;
                    i += 1;
                }
            }
        }
        (node, i)
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_node_child(
        &mut self,
        i: usize,
        level: u8,
        tag: Option<Tag>,
        title: &str,
        ty: &TypeDefinition,
        node: &mut Node,
        occupied: &mut HashSet<usize>,
    ) -> usize {
        match tag {
            Some(tag) if tag.kind == TagKind::Collection => {
                let def = match ty.collection(title) {
                    Some(declared) => {
                        // An explicit type may narrow the declared contained
                        // type to one of its descendants.
                        match tag.collection_chain() {
                            Some((_, leaf)) if !leaf.is_empty() => {
                                let expected = declared.contained.leaf_type_name();
                                if self.schema().is_same_or_subtype(leaf, expected) {
                                    Some(narrow_leaf(declared.clone(), leaf))
                                } else {
                                    self.issue(
                                        i,
                                        IssueKind::EntryTypeMismatch {
                                            type_name: leaf.to_string(),
                                            expected: expected.to_string(),
                                        },
                                    );
                                    None
                                }
                            }
                            _ => Some(declared.clone()),
                        }
                    }
                    None => self.collection_def_for(i, &tag, title),
                };
                match def {
                    Some(def) => {
                        let (collection, next) = self.parse_collection(i, def);
                        node.collections.push(collection);
                        next
                    }
                    None => self.skip_subtree(i + 1, level),
                }
            }
            Some(tag) if tag.kind == TagKind::Section => {
                let (section, next) = self.parse_section(i, ty.section(title));
                node.sections.push(section);
                next
            }
            Some(tag) => self.parse_embedded(i, level, &tag, title, ty, node, occupied),
            None => {
                if let Some(declared) = ty.section(title) {
                    let (section, next) = self.parse_section(i, Some(declared));
                    node.sections.push(section);
                    next
                } else if let Some(declared) = ty.collection(title).cloned() {
                    let (collection, next) = self.parse_collection(i, declared);
                    node.collections.push(collection);
                    next
                } else {
                    let suggestion = self.parser.suggest(
                        title,
                        ty.sections
                            .iter()
                            .map(|s| s.name.as_str())
                            .chain(ty.collections.iter().map(|c| c.name.as_str())),
                    );
                    self.issue(
                        i,
                        IssueKind::DefinitionNotFound {
                            name: title.to_string(),
                            suggestion,
                        },
                    );
                    self.skip_subtree(i + 1, level)
                }
            }
        }
    }

    /// A node-capable tag inside a node body is an embedded node. It must
    /// fit a declared slot: target type the same or an ancestor of the new
    /// node's type, title constraint satisfied, slot not yet filled.
    #[allow(clippy::too_many_arguments)]
    fn parse_embedded(
        &mut self,
        i: usize,
        level: u8,
        tag: &Tag,
        title: &str,
        ty: &TypeDefinition,
        node: &mut Node,
        occupied: &mut HashSet<usize>,
    ) -> usize {
        let Some(type_name) = tag.type_name.clone() else {
            self.issue(
                i,
                IssueKind::DefinitionNotFound {
                    name: title.to_string(),
                    suggestion: None,
                },
            );
            return self.skip_subtree(i + 1, level);
        };
        let Some(child_ty) = self.schema().type_def(&type_name).cloned() else {
            let suggestion = self.parser.suggest(&type_name, self.schema().type_names());
            self.issue(
                i,
                IssueKind::DefinitionNotFound {
                    name: type_name,
                    suggestion,
                },
            );
            return self.skip_subtree(i + 1, level);
        };

        let allowed: Vec<usize> = ty
            .embedded
            .iter()
            .enumerate()
            .filter(|(_, slot)| self.schema().is_same_or_subtype(&type_name, &slot.type_name))
            .map(|(idx, _)| idx)
            .collect();
        if allowed.is_empty() {
            self.issue(
                i,
                IssueKind::EmbeddedTypeNotAllowed {
                    type_name,
                    owner: ty.name.clone(),
                },
            );
            return self.skip_subtree(i + 1, level);
        }

        let slot = allowed
            .iter()
            .find(|&&idx| ty.embedded[idx].title.as_deref() == Some(title))
            .or_else(|| allowed.iter().find(|&&idx| ty.embedded[idx].title.is_none()))
            .copied();
        let Some(slot) = slot else {
            self.issue(
                i,
                IssueKind::EmbeddedTitleMismatch {
                    title: title.to_string(),
                    owner: ty.name.clone(),
                },
            );
            return self.skip_subtree(i + 1, level);
        };
        if !occupied.insert(slot) {
            self.issue(
                i,
                IssueKind::EmbeddedSlotOccupied {
                    type_name,
                    owner: ty.name.clone(),
                },
            );
            return self.skip_subtree(i + 1, level);
        }

        let (child, next) = self.parse_node(i, &child_ty);
        node.embedded.push(child);
        next
    }

    // --- collections ---

    fn parse_collection(
        &mut self,
        start: usize,
        def: CollectionDefinition,
    ) -> (Collection, usize) {
        let level = self.blocks[start]
            .heading_level()
            .expect("parse_collection starts at a heading");
        let (_, title) = heading_parts(&self.blocks[start]);
        let name = if title.is_empty() {
            def.name.clone()
        } else {
            title
        };
        let entries = match &def.contained {
            ContainedType::Nodes { .. } => CollectionEntries::Nodes(Vec::new()),
            ContainedType::Collections(_) => CollectionEntries::Collections(Vec::new()),
        };
        let mut collection = Collection::new(name, def, entries, self.prov(start));

        let mut i = start + 1;
        while i < self.blocks.len() {
            match &self.blocks[i].kind {
                BlockKind::Heading { level: l, .. } if *l <= level => break,
                BlockKind::Heading { level: l, tag, .. } => {
                    let l = *l;
                    let tag = tag.clone();
                    i = self.parse_collection_entry(i, l, tag, &mut collection);
                }
                BlockKind::Paragraph(text) => {
                    collection.push_summary(&text.rendered());
                    i += 1;
                }
                BlockKind::Quote(rows) => {
                    collection.push_summary(&quote_text(rows));
                    i += 1;
                }
                BlockKind::List(items) => {
                    collection.push_summary(&flatten_list(items));
                    i += 1;
                }
                BlockKind::Other => i += 1,
            }
        }
        (collection, i)
    }

    fn parse_collection_entry(
        &mut self,
        i: usize,
        level: u8,
        tag: Option<Tag>,
        collection: &mut Collection,
    ) -> usize {
        let contained = collection.definition.contained.clone();
        match contained {
            ContainedType::Collections(inner) => {
                let (sub, next) = self.parse_collection(i, *inner);
                if let CollectionEntries::Collections(entries) = &mut collection.entries {
                    entries.push(sub);
                }
                next
            }
            ContainedType::Nodes { type_name } => {
                let declared = type_name;
                let effective = match tag.as_ref().and_then(|t| t.type_name.as_deref()) {
                    Some(explicit) => {
                        if self.schema().is_same_or_subtype(explicit, &declared) {
                            explicit.to_string()
                        } else {
                            self.issue(
                                i,
                                IssueKind::EntryTypeMismatch {
                                    type_name: explicit.to_string(),
                                    expected: declared,
                                },
                            );
                            return self.skip_subtree(i + 1, level);
                        }
                    }
                    // Untagged entries take the collection's declared type;
                    // that is inference, not a missing tag.
                    None => declared,
                };
                let Some(ty) = self.schema().type_def(&effective).cloned() else {
                    let suggestion = self.parser.suggest(&effective, self.schema().type_names());
                    self.issue(
                        i,
                        IssueKind::DefinitionNotFound {
                            name: effective,
                            suggestion,
                        },
                    );
                    return self.skip_subtree(i + 1, level);
                };
                let (entry, next) = self.parse_node(i, &ty);
                if let CollectionEntries::Nodes(entries) = &mut collection.entries {
                    entries.push(entry);
                }
                next
            }
        }
    }

    // --- sections ---

    fn parse_section(
        &mut self,
        start: usize,
        def: Option<&SectionDefinition>,
    ) -> (Section, usize) {
        let level = self.blocks[start]
            .heading_level()
            .expect("parse_section starts at a heading");
        let (_, title) = heading_parts(&self.blocks[start]);
        let mut section = Section::new(title, def.is_some(), self.prov(start));

        let mut i = start + 1;
        while i < self.blocks.len() {
            match &self.blocks[i].kind {
                BlockKind::Heading { level: l, .. } if *l <= level => break,
                BlockKind::Heading { level: l, tag, text } => {
                    let l = *l;
                    let sub_title = text.rendered();
                    let sub_def = def.and_then(|d| d.section(&sub_title));
                    if let Some(sub_def) = sub_def {
                        let (sub, next) = self.parse_section(i, Some(sub_def));
                        section.sections.push(sub);
                        i = next;
                    } else if tag.as_ref().map(|t| t.kind) == Some(TagKind::Section) {
                        // Ad hoc free subsection
                        let (sub, next) = self.parse_section(i, None);
                        section.sections.push(sub);
                        i = next;
                    } else {
                        self.issue(
                            i,
                            IssueKind::UnknownSubsection {
                                name: sub_title,
                                owner: section.name.clone(),
                            },
                        );
                        i = self.skip_subtree(i + 1, l);
                    }
                }
                BlockKind::List(items) => {
                    let fields: &[FieldDefinition] =
                        def.map(|d| d.fields.as_slice()).unwrap_or(&[]);
                    if fields.is_empty() {
                        section.push_summary(&flatten_list(items));
                    } else {
                        let owner = section.name.clone();
                        let attrs = self.parse_list_attributes(i, items, fields, &owner);
                        section.attributes.extend(attrs);
                    }
                    i += 1;
                }
                BlockKind::Paragraph(text) => {
                    section.push_summary(&text.rendered());
                    i += 1;
                }
                BlockKind::Quote(rows) => {
                    section.push_summary(&quote_text(rows));
                    i += 1;
                }
                BlockKind::Other => i += 1,
            }
        }
        (section, i)
    }

    // --- attributes ---

    fn parse_list_attributes(
        &mut self,
        block: usize,
        items: &[ListItem],
        fields: &[FieldDefinition],
        owner: &str,
    ) -> Vec<Attribute> {
        let mut out = Vec::new();
        for item in items {
            let rendered = item.text.rendered();
            let (name, inline) = split_field_item(&rendered);
            let Some(field) = fields.iter().find(|f| f.name == name) else {
                let suggestion = self
                    .parser
                    .suggest(&name, fields.iter().map(|f| f.name.as_str()));
                self.issues.push(ParseIssue::new(
                    self.parser.path,
                    block,
                    item.line,
                    IssueKind::UnknownField {
                        name,
                        owner: owner.to_string(),
                        suggestion,
                    },
                ));
                continue;
            };
            out.push(self.attribute_for(block, item, field, inline));
        }
        out
    }

    fn attribute_for(
        &mut self,
        block: usize,
        item: &ListItem,
        field: &FieldDefinition,
        inline: Option<String>,
    ) -> Attribute {
        if !item.children.is_empty() {
            return match field.shape {
                FieldShape::Nested => {
                    let children =
                        self.parse_list_attributes(block, &item.children, &field.fields, &field.name);
                    Attribute::nested(field.name.clone(), children)
                }
                FieldShape::Multi | FieldShape::References => {
                    let mut values = Vec::new();
                    if let Some(inline) = inline {
                        values.extend(self.inline_values(field, &inline));
                    }
                    for child in &item.children {
                        let text = unescape(&child.text.rendered());
                        values.push(self.typed_value(field, text.trim()));
                    }
                    Attribute::many(field.name.clone(), values)
                }
                FieldShape::Text => {
                    let mut lines = Vec::new();
                    if let Some(inline) = inline {
                        lines.push(inline);
                    }
                    collect_item_text(&item.children, &mut lines);
                    Attribute::single(
                        field.name.clone(),
                        Value::Text {
                            text: lines.join("\n"),
                        },
                    )
                }
                FieldShape::Single | FieldShape::Picklist => {
                    if item.children.len() > 1 {
                        self.issues.push(ParseIssue::new(
                            self.parser.path,
                            block,
                            item.line,
                            IssueKind::ExtraNestedValues {
                                field: field.name.clone(),
                                count: item.children.len(),
                            },
                        ));
                    }
                    let raw = match inline {
                        Some(v) => v,
                        None => unescape(&item.children[0].text.rendered())
                            .trim()
                            .to_string(),
                    };
                    Attribute::single(field.name.clone(), self.typed_value(field, &raw))
                }
            };
        }

        match field.shape {
            FieldShape::Multi | FieldShape::References => {
                let values = inline
                    .map(|v| self.inline_values(field, &v))
                    .unwrap_or_default();
                Attribute::many(field.name.clone(), values)
            }
            FieldShape::Nested => Attribute::nested(field.name.clone(), Vec::new()),
            _ => {
                let raw = inline.unwrap_or_default();
                Attribute::single(field.name.clone(), self.typed_value(field, &raw))
            }
        }
    }

    /// An inline flat value for a list-shaped field; reference lists split
    /// on commas, everything else is one value.
    fn inline_values(&self, field: &FieldDefinition, inline: &str) -> Vec<Value> {
        if field.shape == FieldShape::References {
            inline
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| Value::Reference(Reference::unresolved(t)))
                .collect()
        } else {
            vec![self.typed_value(field, inline)]
        }
    }

    fn typed_value(&self, field: &FieldDefinition, raw: &str) -> Value {
        match field.shape {
            FieldShape::Picklist => Value::Pick {
                option: raw.to_string(),
            },
            FieldShape::References => Value::Reference(Reference::unresolved(raw)),
            FieldShape::Text => Value::Text {
                text: raw.to_string(),
            },
            _ => self.parser.literals.detect(raw),
        }
    }
}

// --- helpers ---

fn heading_parts(block: &Block) -> (Option<&Tag>, String) {
    match &block.kind {
        BlockKind::Heading { tag, text, .. } => (tag.as_ref(), text.rendered()),
        _ => (None, String::new()),
    }
}

/// Split an item's rendered text on the first unescaped colon. A colon at
/// the very end yields a name with no value.
fn split_field_item(text: &str) -> (String, Option<String>) {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i] == ':' {
            let name: String = chars[..i].iter().collect();
            let value: String = chars[i + 1..].iter().collect();
            let value = unescape(&value).trim().to_string();
            return (
                unescape(&name).trim().to_string(),
                if value.is_empty() { None } else { Some(value) },
            );
        }
        i += 1;
    }
    (unescape(text).trim().to_string(), None)
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn flatten_list(items: &[ListItem]) -> String {
    let mut lines = Vec::new();
    collect_item_text(items, &mut lines);
    lines.join("\n")
}

fn collect_item_text(items: &[ListItem], out: &mut Vec<String>) {
    for item in items {
        out.push(unescape(&item.text.rendered()));
        collect_item_text(&item.children, out);
    }
}

fn quote_text(rows: &[InlineText]) -> String {
    rows.iter()
        .map(|r| r.rendered())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build an anonymous collection definition for a `collection:...:Leaf`
/// chain: `depth` extra nesting levels around a collection of `leaf`.
fn anonymous_collection(name: &str, depth: usize, leaf: &str) -> CollectionDefinition {
    let mut contained = ContainedType::Nodes {
        type_name: leaf.to_string(),
    };
    for _ in 0..depth {
        contained = ContainedType::Collections(Box::new(CollectionDefinition {
            name: name.to_string(),
            required: false,
            contained,
            local: true,
            inherited: false,
        }));
    }
    CollectionDefinition {
        name: name.to_string(),
        required: false,
        contained,
        local: true,
        inherited: false,
    }
}

/// Replace the leaf node type of a contained-type nesting with a subtype,
/// preserving the nesting shape.
fn narrow_leaf(mut def: CollectionDefinition, leaf: &str) -> CollectionDefinition {
    fn narrow(contained: &mut ContainedType, leaf: &str) {
        match contained {
            ContainedType::Nodes { type_name } => *type_name = leaf.to_string(),
            ContainedType::Collections(inner) => narrow(&mut inner.contained, leaf),
        }
    }
    narrow(&mut def.contained, leaf);
    def
}
