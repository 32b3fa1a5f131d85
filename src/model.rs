use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::xml::Element;

/// Paragraph justification, written as `w:jc/@w:val`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Locale of the template's built-in style names.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Language {
    #[default]
    English,
    Dutch,
}

impl Language {
    pub fn heading_style(self) -> &'static str {
        match self {
            Language::English => "Heading",
            Language::Dutch => "Kop",
        }
    }

    pub fn caption_style(self) -> &'static str {
        match self {
            Language::English => "Caption",
            Language::Dutch => "Bijschrift",
        }
    }

    pub fn figure_label(self) -> &'static str {
        match self {
            Language::English => "Figure ",
            Language::Dutch => "Afbeelding ",
        }
    }
}

/// A cell body or replacement payload: plain text, one built node, or several.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Text(String),
    Node(Element),
    Nodes(Vec<Element>),
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Element> for Content {
    fn from(node: Element) -> Self {
        Content::Node(node)
    }
}

impl From<Vec<Element>> for Content {
    fn from(nodes: Vec<Element>) -> Self {
        Content::Nodes(nodes)
    }
}

/// Character formatting toggled by the letters `b`, `i` and `u`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl RunFormat {
    pub fn parse(flags: &str) -> Self {
        RunFormat {
            bold: flags.contains('b'),
            italic: flags.contains('i'),
            underline: flags.contains('u'),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BreakKind {
    Page,
    Section,
}

impl FromStr for BreakKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "page" => Ok(BreakKind::Page),
            "section" => Ok(BreakKind::Section),
            other => Err(Error::InvalidBreak(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Width unit for `w:tblW` and `w:tcW`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum WidthUnit {
    /// Fiftieths of a percent.
    Pct,
    /// Twentieths of a point.
    #[default]
    Dxa,
    Nil,
    Auto,
}

impl fmt::Display for WidthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WidthUnit::Pct => "pct",
            WidthUnit::Dxa => "dxa",
            WidthUnit::Nil => "nil",
            WidthUnit::Auto => "auto",
        })
    }
}
