mod content;
mod document;
mod error;
mod model;
mod package;
mod parts;
mod picture;
mod rels;
mod report;
mod search;
mod sequence;
pub mod xml;

pub use content::{
    Border, Borders, ColumnStyle, Paragraph, Run, Table, caption, figure_caption, heading,
    linebreak, page_break, page_break_named,
};
pub use document::Document;
pub use error::Error;
pub use model::{Alignment, BreakKind, Content, Language, Orientation, RunFormat, WidthUnit};
pub use package::{Origin, Package, list_parts, read_text};
pub use parts::CoreProperties;
pub use picture::{EMU_PER_PIXEL, Picture};
pub use rels::{IMAGE_REL, RelId, Relationship, Relationships};
pub use report::{Block, build_report};
pub use search::{DEFAULT_WINDOW, advanced_replace, advanced_search, replace, search};
pub use sequence::{FileCounter, MemoryCounter, SequenceCounter};
pub use xml::{Element, ElementBuilder, Namespace};
