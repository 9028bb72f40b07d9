//! Shared helpers for integration tests.

use std::path::Path;

use loreweave::doc::{BlockReader, DocumentParser, FileOutcome};
use loreweave::schema::{resolve, LoreSchema, RawSchema};

/// The fixture schema: an `Entity` base with a required `Name`, a
/// `Character` type with fields of every shape, a `Hero` subtype, plus
/// creatures, events, a standalone `Cast` collection and two picklists.
pub fn fixture_schema() -> LoreSchema {
    let raw: RawSchema = serde_json::from_str(include_str!("../fixtures/schema.json")).unwrap();
    resolve(raw).unwrap()
}

/// Read and parse one document against the schema.
pub fn parse_doc(schema: &LoreSchema, text: &str) -> FileOutcome {
    let blocks = BlockReader::new().read(text);
    DocumentParser::new(schema, Path::new("test.md")).parse(&blocks)
}
