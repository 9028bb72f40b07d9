//! Document ingestion: block model, markdown-subset reader, and the
//! recursive-descent parser that turns one document's blocks into typed
//! entities under the resolved schema.

pub mod block;
pub mod parser;
pub mod reader;

pub use block::{Block, BlockKind, InlineRun, InlineText, ListItem, Tag, TagKind};
pub use parser::{DocumentParser, FileOutcome};
pub use reader::BlockReader;
