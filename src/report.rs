use std::path::Path;

use log::info;

use crate::content::{self, Paragraph, Table};
use crate::error::Error;
use crate::model::{BreakKind, Language, Orientation};
use crate::package::Package;
use crate::parts::CoreProperties;
use crate::picture::Picture;
use crate::sequence::SequenceCounter;
use crate::xml::Element;

/// One item of a report, in output order.
#[derive(Clone, Debug)]
pub enum Block {
    Heading { text: String, level: u8, language: Language },
    Paragraph(Paragraph),
    Break { kind: BreakKind, orientation: Orientation },
    Table(Table),
    Picture(Picture),
    FigureCaption { text: String, language: Language },
    Raw(Element),
}

impl Block {
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Block::Heading { text: text.into(), level, language: Language::English }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph(Paragraph::new(text))
    }

    pub fn page_break() -> Self {
        Block::Break { kind: BreakKind::Page, orientation: Orientation::Portrait }
    }
}

/// Build a package from `blocks` and write it to `output`.
///
/// Without a template the built-in skeleton is used. Every block is built
/// before the output is touched, so a bad block never yields a file.
pub fn build_report(
    blocks: Vec<Block>,
    template: Option<&Path>,
    properties: &CoreProperties,
    counter: &mut dyn SequenceCounter,
    output: &Path,
) -> Result<(), Error> {
    if blocks.is_empty() {
        return Err(Error::EmptyContent);
    }
    let mut package = match template {
        Some(path) => Package::open(path)?,
        None => Package::new()?,
    };
    let mut relationships = package.relationships();

    let total = blocks.len();
    for block in blocks {
        let element = match block {
            Block::Heading { text, level, language } => content::heading(&text, level, language),
            Block::Paragraph(paragraph) => paragraph.build(),
            Block::Break { kind, orientation } => content::page_break(kind, orientation),
            Block::Table(table) => table.build()?,
            Block::Picture(picture) => {
                let (next, element) = package.embed(&picture, relationships)?;
                relationships = next;
                element
            }
            Block::FigureCaption { text, language } => {
                content::figure_caption(&text, language, counter)?
            }
            Block::Raw(element) => element,
        };
        package.document_mut().append(element);
    }
    info!("assembled {total} blocks, {} relationships", relationships.len());

    package.save(properties, &relationships, output)
}
