use std::fmt;
use std::path::Path;

use log::{debug, warn};

use crate::error::Error;
use crate::xml::{Element, PKG_REL_NS, PR};

const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Relative location of the document relationships part inside a package.
pub const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";

const BUILTIN: &[(&str, &str)] = &[
    ("numbering", "numbering.xml"),
    ("styles", "styles.xml"),
    ("settings", "settings.xml"),
    ("webSettings", "webSettings.xml"),
    ("fontTable", "fontTable.xml"),
    ("theme", "theme/theme1.xml"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelId(u32);

impl RelId {
    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rId{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    pub id: RelId,
    pub kind: String,
    pub target: String,
    pub external: bool,
}

/// Ordered relationships of `word/document.xml`.
///
/// Ids are dense and follow insertion order: the n-th entry is `rId{n}`.
#[derive(Clone, Debug, PartialEq)]
pub struct Relationships {
    entries: Vec<Relationship>,
    next_id: u32,
}

impl Relationships {
    fn empty() -> Self {
        Relationships { entries: Vec::new(), next_id: 1 }
    }

    /// The six parts every skeleton-built package carries.
    pub fn builtin() -> Self {
        BUILTIN.iter().fold(Relationships::empty(), |rels, (kind, target)| {
            rels.append(format!("{REL_TYPE_BASE}/{kind}"), *target).0
        })
    }

    /// Seed from an extracted template directory, or the built-in set when none is given.
    pub fn create(template_dir: Option<&Path>) -> Result<Self, Error> {
        let Some(dir) = template_dir else {
            return Ok(Relationships::builtin());
        };
        let xml = std::fs::read_to_string(dir.join(DOCUMENT_RELS))?;
        Ok(Relationships::from_xml(&xml)?.0)
    }

    /// Parse a relationships part, ordering entries by the numeric suffix of
    /// their original ids and renumbering them densely.
    ///
    /// Also returns every `(old id, new id)` pair that changed, so references
    /// in the owning part can be rewritten.
    pub fn from_xml(xml: &str) -> Result<(Self, Vec<(String, RelId)>), Error> {
        let doc = roxmltree::Document::parse(xml)?;
        let mut parsed = Vec::new();
        for node in doc.root_element().children() {
            if node.tag_name().name() != "Relationship"
                || node.tag_name().namespace() != Some(PKG_REL_NS)
            {
                continue;
            }
            let id = node
                .attribute("Id")
                .ok_or_else(|| Error::InvalidDocx("relationship without Id".into()))?;
            let kind = node.attribute("Type").unwrap_or_default();
            let target = node.attribute("Target").unwrap_or_default();
            let external = node.attribute("TargetMode") == Some("External");
            let order = id
                .split_once("Id")
                .and_then(|(_, n)| n.parse::<u32>().ok())
                .unwrap_or_else(|| {
                    warn!("relationship id {id} has no numeric suffix, sorting it last");
                    u32::MAX
                });
            parsed.push((order, id.to_string(), kind.to_string(), target.to_string(), external));
        }
        parsed.sort_by_key(|(order, ..)| *order);

        let mut rels = Relationships::empty();
        let mut renamed = Vec::new();
        for (_, old_id, kind, target, external) in parsed {
            let (next, id) = rels.append(kind, target);
            rels = next;
            if let Some(entry) = rels.entries.last_mut() {
                entry.external = external;
            }
            if old_id != id.to_string() {
                renamed.push((old_id, id));
            }
        }
        if !renamed.is_empty() {
            warn!("template relationship ids were not contiguous, renumbered {} of them", renamed.len());
        }
        debug!("loaded {} template relationships", rels.len());
        Ok((rels, renamed))
    }

    /// The id the next [`Relationships::append`] will hand out.
    pub fn next_id(&self) -> RelId {
        RelId(self.next_id)
    }

    /// Add an entry at the end, returning the extended registry and the new id.
    pub fn append(mut self, kind: impl Into<String>, target: impl Into<String>) -> (Self, RelId) {
        let id = RelId(self.next_id);
        self.next_id += 1;
        self.entries.push(Relationship { id, kind: kind.into(), target: target.into(), external: false });
        (self, id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    pub fn get(&self, id: RelId) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.id == id)
    }

    pub fn to_element(&self) -> Element {
        let ns = PR.as_default();
        Element::new(ns.clone(), "Relationships").with_children(self.entries.iter().map(|r| {
            let el = Element::new(ns.clone(), "Relationship")
                .with_attr("Id", r.id.to_string())
                .with_attr("Type", &r.kind)
                .with_attr("Target", &r.target);
            if r.external { el.with_attr("TargetMode", "External") } else { el }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_dense() {
        let rels = Relationships::builtin();
        let ids: Vec<String> = rels.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["rId1", "rId2", "rId3", "rId4", "rId5", "rId6"]);
        assert_eq!(rels.get(RelId(6)).unwrap().target, "theme/theme1.xml");
    }

    #[test]
    fn append_returns_next_id() {
        let (rels, id) = Relationships::builtin().append(IMAGE_REL, "media/a.png");
        assert_eq!(id.to_string(), "rId7");
        assert_eq!(rels.len(), 7);
    }

    #[test]
    fn template_rels_sort_by_numeric_id() {
        let xml = format!(
            r#"<?xml version="1.0"?>
<Relationships xmlns="{PKG_REL_NS}">
  <Relationship Id="rId10" Type="t/image" Target="media/x.png"/>
  <Relationship Id="rId2" Type="t/styles" Target="styles.xml"/>
  <Relationship Id="rId1" Type="t/numbering" Target="numbering.xml"/>
  <Relationship Id="rId3" Type="t/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#
        );
        let (rels, renamed) = Relationships::from_xml(&xml).unwrap();
        let targets: Vec<&str> = rels.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["numbering.xml", "styles.xml", "https://example.com", "media/x.png"]);
        assert_eq!(renamed, vec![("rId10".to_string(), RelId(4))]);
        assert!(rels.get(RelId(3)).unwrap().external);

        let out = rels.to_element().to_xml();
        assert!(out.contains(r#"Id="rId4" Type="t/image" Target="media/x.png""#));
        assert!(out.contains(r#"TargetMode="External""#));
    }
}
