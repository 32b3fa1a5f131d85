use crate::error::Error;
use crate::xml::{Element, W};

/// In-memory `word/document.xml`.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    root: Element,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document { root: Element::new(W, "document").with_child(Element::w("body")) }
    }

    pub fn parse(xml: &str) -> Result<Self, Error> {
        let root = Element::parse(xml)?;
        if !root.is_w("document") || root.child_w("body").is_none() {
            return Err(Error::InvalidDocx("Missing w:body".into()));
        }
        Ok(Document { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn body(&self) -> &Element {
        // `new` and `parse` both guarantee a body
        self.root.child_w("body").unwrap_or(&self.root)
    }

    pub fn body_mut(&mut self) -> &mut Element {
        let index = self.root.children.iter().position(|c| c.is_w("body"));
        match index {
            Some(i) => &mut self.root.children[i],
            None => {
                self.root.push(Element::w("body"));
                let last = self.root.children.len() - 1;
                &mut self.root.children[last]
            }
        }
    }

    /// Append a block to the body, keeping a trailing `w:sectPr` last.
    pub fn append(&mut self, block: Element) {
        let body = self.body_mut();
        match body.children.last() {
            Some(last) if last.is_w("sectPr") => {
                let at = body.children.len() - 1;
                body.children.insert(at, block);
            }
            _ => body.push(block),
        }
    }

    pub fn extend(&mut self, blocks: impl IntoIterator<Item = Element>) {
        for block in blocks {
            self.append(block);
        }
    }

    pub fn to_xml(&self) -> String {
        self.root.to_xml()
    }

    /// Text of every non-empty paragraph in document order, tabs as `\t`.
    pub fn text(&self) -> Vec<String> {
        let mut paragraphs = Vec::new();
        self.root.visit(&mut |node| {
            if !node.is_w("p") {
                return;
            }
            let mut text = String::new();
            node.visit(&mut |inner| {
                if inner.is_w("t") {
                    text.push_str(inner.text.as_deref().unwrap_or(""));
                } else if inner.is_w("tab") {
                    text.push('\t');
                }
            });
            if !text.is_empty() {
                paragraphs.push(text);
            }
        });
        paragraphs
    }

    /// Drop text nodes without text, then runs left without content.
    pub fn clean(&mut self) {
        for name in ["t", "r"] {
            self.root.visit_mut(&mut |node| {
                node.children.retain(|c| {
                    !(c.is_w(name) && c.text.as_deref().unwrap_or("").is_empty() && c.children.is_empty())
                });
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Paragraph, heading};
    use crate::model::Language;

    #[test]
    fn append_keeps_section_properties_last() {
        let xml = format!(
            r#"<w:document xmlns:w="{}"><w:body><w:p><w:r><w:t>old</w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#,
            crate::xml::WML_NS
        );
        let mut doc = Document::parse(&xml).unwrap();
        doc.append(Paragraph::new("new").build());
        let names: Vec<&str> = doc.body().children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["p", "p", "sectPr"]);
        assert_eq!(doc.text(), vec!["old", "new"]);
    }

    #[test]
    fn text_joins_runs_and_tabs() {
        let mut doc = Document::new();
        doc.append(heading("Title", 1, Language::English));
        let mut p = Paragraph::new("a").build();
        p.push(Element::w("r").with_child(Element::w("tab")));
        p.push(Element::w("r").with_child(Element::w("t").with_text("b")));
        doc.append(p);
        doc.append(Element::w("p"));
        assert_eq!(doc.text(), vec!["Title", "a\tb"]);
    }

    #[test]
    fn clean_removes_empty_text_and_runs() {
        let mut doc = Document::new();
        doc.append(
            Element::w("p")
                .with_child(Element::w("r").with_child(Element::w("t")))
                .with_child(Element::w("r").with_child(Element::w("t").with_text("kept"))),
        );
        doc.clean();
        let p = &doc.body().children[0];
        assert_eq!(p.children.len(), 1);
        assert_eq!(doc.text(), vec!["kept"]);
    }

    #[test]
    fn rejects_document_without_body() {
        let xml = format!(r#"<w:document xmlns:w="{}"/>"#, crate::xml::WML_NS);
        assert!(matches!(Document::parse(&xml), Err(Error::InvalidDocx(_))));
    }
}
