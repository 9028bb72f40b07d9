//! Markdown-subset block reader.
//!
//! Turns document text into the typed [`Block`] sequence the parser
//! consumes. The subset is deliberately small: ATX headings with optional
//! trailing `{...}` tag payloads, dash/star lists with indent nesting,
//! `>` quotes, fenced code (opaque), and paragraphs. Inline emphasis is
//! kept as runs so rendered text drops the markers; backslash escapes
//! pass through untouched for the attribute grammar to honor.

use regex::Regex;

use super::block::{Block, BlockKind, InlineRun, InlineText, ListItem, Tag, TagKind};

pub struct BlockReader {
    heading: Regex,
    tag_payload: Regex,
    tag_head: Regex,
    tag_pair: Regex,
    list_item: Regex,
}

impl Default for BlockReader {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockReader {
    pub fn new() -> Self {
        Self {
            heading: Regex::new(r"^(#{1,6})\s+(.*)$").unwrap(),
            tag_payload: Regex::new(r"\{([^{}]*)\}\s*$").unwrap(),
            tag_head: Regex::new(r"^\s*(node|collection|section)\b").unwrap(),
            tag_pair: Regex::new(r#"(\w+)\s*=\s*"([^"]*)""#).unwrap(),
            list_item: Regex::new(r"^(\s*)[-*]\s+(.*)$").unwrap(),
        }
    }

    /// Read a whole document into blocks.
    pub fn read(&self, text: &str) -> Vec<Block> {
        let mut blocks = Vec::new();
        let lines: Vec<&str> = text.lines().collect();

        let mut paragraph: Vec<&str> = Vec::new();
        let mut paragraph_line = 0usize;
        let mut i = 0usize;

        macro_rules! flush_paragraph {
            () => {
                if !paragraph.is_empty() {
                    let joined = paragraph.join("\n");
                    blocks.push(Block {
                        line: paragraph_line,
                        kind: BlockKind::Paragraph(parse_inline(&joined)),
                    });
                    paragraph.clear();
                }
            };
        }

        while i < lines.len() {
            let line = lines[i];
            let line_no = i + 1;

            if line.trim().is_empty() {
                flush_paragraph!();
                i += 1;
                continue;
            }

            if let Some(caps) = self.heading.captures(line) {
                flush_paragraph!();
                let level = caps[1].len() as u8;
                let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                let (title, tag) = self.split_heading(rest);
                blocks.push(Block {
                    line: line_no,
                    kind: BlockKind::Heading {
                        level,
                        tag,
                        text: parse_inline(&title),
                    },
                });
                i += 1;
                continue;
            }

            if line.trim_start().starts_with("```") {
                flush_paragraph!();
                let fence_line = line_no;
                i += 1;
                while i < lines.len() && !lines[i].trim_start().starts_with("```") {
                    i += 1;
                }
                i += 1; // closing fence, if any
                blocks.push(Block {
                    line: fence_line,
                    kind: BlockKind::Other,
                });
                continue;
            }

            if let Some(stripped) = strip_quote(line) {
                flush_paragraph!();
                let quote_line = line_no;
                let mut rows = vec![parse_inline(stripped)];
                i += 1;
                while i < lines.len() {
                    match strip_quote(lines[i]) {
                        Some(s) => {
                            rows.push(parse_inline(s));
                            i += 1;
                        }
                        None => break,
                    }
                }
                blocks.push(Block {
                    line: quote_line,
                    kind: BlockKind::Quote(rows),
                });
                continue;
            }

            if self.list_item.is_match(line) {
                flush_paragraph!();
                let list_line = line_no;
                let mut rows: Vec<(usize, usize, String)> = Vec::new();
                while i < lines.len() {
                    match self.list_item.captures(lines[i]) {
                        Some(caps) => {
                            let indent = indent_width(&caps[1]);
                            rows.push((indent, i + 1, caps[2].to_string()));
                            i += 1;
                        }
                        None => break,
                    }
                }
                blocks.push(Block {
                    line: list_line,
                    kind: BlockKind::List(build_items(&rows)),
                });
                continue;
            }

            if paragraph.is_empty() {
                paragraph_line = line_no;
            }
            paragraph.push(line.trim_end());
            i += 1;
        }

        flush_paragraph!();
        blocks
    }

    /// Split a heading rest into title text and an optional trailing tag.
    /// An unparseable payload stays part of the title.
    fn split_heading(&self, rest: &str) -> (String, Option<Tag>) {
        if let Some(m) = self.tag_payload.captures(rest) {
            let payload = &m[1];
            if let Some(tag) = self.parse_tag(payload) {
                let title = rest[..m.get(0).unwrap().start()].trim().to_string();
                return (title, Some(tag));
            }
        }
        (rest.trim().to_string(), None)
    }

    fn parse_tag(&self, payload: &str) -> Option<Tag> {
        let head = self.tag_head.captures(payload)?;
        let kind = match &head[1] {
            "node" => TagKind::Node,
            "collection" => TagKind::Collection,
            "section" => TagKind::Section,
            _ => return None,
        };
        let mut type_name = None;
        let mut id = None;
        for pair in self.tag_pair.captures_iter(payload) {
            match &pair[1] {
                "type" => type_name = Some(pair[2].to_string()),
                "id" => id = Some(pair[2].to_string()),
                _ => {}
            }
        }
        Some(Tag {
            kind,
            type_name,
            id,
        })
    }
}

fn strip_quote(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("> ")
        .or_else(|| trimmed.strip_prefix('>'))
}

fn indent_width(ws: &str) -> usize {
    ws.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

/// Build the item tree from (indent, line, text) rows; rows deeper than
/// the first row of a slice nest under the item that precedes them.
fn build_items(rows: &[(usize, usize, String)]) -> Vec<ListItem> {
    let mut items = Vec::new();
    let mut i = 0;
    let Some(&(base, _, _)) = rows.first() else {
        return items;
    };
    while i < rows.len() {
        let (_, line, text) = &rows[i];
        let start = i;
        i += 1;
        while i < rows.len() && rows[i].0 > base {
            i += 1;
        }
        let children = if i > start + 1 {
            build_items(&rows[start + 1..i])
        } else {
            Vec::new()
        };
        items.push(ListItem {
            line: *line,
            text: parse_inline(text),
            children,
        });
    }
    items
}

/// Minimal inline parser: `**strong**`, `*emphasis*` / `_emphasis_`,
/// backslash escapes preserved verbatim. Unmatched markers stay literal.
pub fn parse_inline(text: &str) -> InlineText {
    let chars: Vec<char> = text.chars().collect();
    let mut runs = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    let flush = |buf: &mut String, runs: &mut Vec<InlineRun>| {
        if !buf.is_empty() {
            runs.push(InlineRun {
                text: std::mem::take(buf),
                emphasis: false,
                strong: false,
            });
        }
    };

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            buf.push('\\');
            buf.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if c == '*' && chars.get(i + 1) == Some(&'*') {
            if let Some(end) = find_marker(&chars, i + 2, &['*', '*']) {
                flush(&mut buf, &mut runs);
                runs.push(InlineRun {
                    text: chars[i + 2..end].iter().collect(),
                    emphasis: false,
                    strong: true,
                });
                i = end + 2;
                continue;
            }
        }
        if c == '*' || c == '_' {
            if let Some(end) = find_marker(&chars, i + 1, &[c]) {
                if end > i + 1 {
                    flush(&mut buf, &mut runs);
                    runs.push(InlineRun {
                        text: chars[i + 1..end].iter().collect(),
                        emphasis: true,
                        strong: false,
                    });
                    i = end + 1;
                    continue;
                }
            }
        }
        buf.push(c);
        i += 1;
    }
    flush(&mut buf, &mut runs);
    InlineText { runs }
}

fn find_marker(chars: &[char], from: usize, marker: &[char]) -> Option<usize> {
    let mut i = from;
    while i + marker.len() <= chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i..i + marker.len()] == *marker {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_with_tag_payload() {
        let reader = BlockReader::new();
        let blocks = reader.read("# Alice {node type=\"Character\" id=\"alice\"}\n");
        assert_eq!(blocks.len(), 1);
        match &blocks[0].kind {
            BlockKind::Heading { level, tag, text } => {
                assert_eq!(*level, 1);
                assert_eq!(text.rendered(), "Alice");
                let tag = tag.as_ref().unwrap();
                assert_eq!(tag.kind, TagKind::Node);
                assert_eq!(tag.type_name.as_deref(), Some("Character"));
                assert_eq!(tag.id.as_deref(), Some("alice"));
            }
            other => panic!("expected heading, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_payload_stays_in_title() {
        let reader = BlockReader::new();
        let blocks = reader.read("# Alice {wip}\n");
        match &blocks[0].kind {
            BlockKind::Heading { tag, text, .. } => {
                assert!(tag.is_none());
                assert_eq!(text.rendered(), "Alice {wip}");
            }
            other => panic!("expected heading, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_list_builds_item_tree() {
        let reader = BlockReader::new();
        let blocks = reader.read("- Aliases:\n  - V\n  - Orion Ghost\n  - Silent Flame\n");
        match &blocks[0].kind {
            BlockKind::List(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].text.rendered(), "Aliases:");
                let kids: Vec<String> =
                    items[0].children.iter().map(|c| c.text.rendered()).collect();
                assert_eq!(kids, vec!["V", "Orion Ghost", "Silent Flame"]);
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_emphasis_markers_are_stripped_in_rendered_text() {
        let text = parse_inline("**Name**: Alice");
        assert_eq!(text.rendered(), "Name: Alice");
        assert!(text.runs[0].strong);
    }

    #[test]
    fn test_escaped_colon_survives_rendering() {
        let text = parse_inline(r"Motto\: onward");
        assert_eq!(text.rendered(), r"Motto\: onward");
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let reader = BlockReader::new();
        let blocks = reader.read("First line.\nSecond line.\n\nNext paragraph.\n");
        assert_eq!(blocks.len(), 2);
        match &blocks[0].kind {
            BlockKind::Paragraph(text) => {
                assert_eq!(text.rendered(), "First line.\nSecond line.")
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
        assert_eq!(blocks[1].line, 4);
    }

    #[test]
    fn test_quote_block_collects_lines() {
        let reader = BlockReader::new();
        let blocks = reader.read("> The storm came at dusk.\n> Nobody saw it leave.\n");
        match &blocks[0].kind {
            BlockKind::Quote(rows) => assert_eq!(rows.len(), 2),
            other => panic!("expected quote, got {:?}", other),
        }
    }

    #[test]
    fn test_code_fence_is_opaque() {
        let reader = BlockReader::new();
        let blocks = reader.read("```\n# not a heading\n```\nAfter.\n");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0].kind, BlockKind::Other));
    }
}
