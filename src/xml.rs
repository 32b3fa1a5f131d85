use std::borrow::Cow;

use crate::error::Error;

pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    prefix: Cow<'static, str>,
    uri: Cow<'static, str>,
}

impl Namespace {
    const fn known(prefix: &'static str, uri: &'static str) -> Self {
        Namespace { prefix: Cow::Borrowed(prefix), uri: Cow::Borrowed(uri) }
    }

    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Namespace { prefix: Cow::Owned(prefix.into()), uri: Cow::Owned(uri.into()) }
    }

    /// Look a prefix up in the fixed registry.
    pub fn resolve(prefix: &str) -> Result<Namespace, Error> {
        REGISTRY
            .iter()
            .find(|ns| ns.prefix == prefix)
            .cloned()
            .ok_or_else(|| Error::UnknownNamespace(prefix.to_string()))
    }

    /// Same URI, declared as the default (unprefixed) namespace.
    pub fn as_default(&self) -> Namespace {
        Namespace { prefix: Cow::Borrowed(""), uri: self.uri.clone() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

pub const MO: Namespace = Namespace::known("mo", "http://schemas.microsoft.com/office/mac/office/2008/main");
pub const O: Namespace = Namespace::known("o", "urn:schemas-microsoft-com:office:office");
pub const VE: Namespace = Namespace::known("ve", "http://schemas.openxmlformats.org/markup-compatibility/2006");
pub const W: Namespace = Namespace::known("w", WML_NS);
pub const W10: Namespace = Namespace::known("w10", "urn:schemas-microsoft-com:office:word");
pub const WNE: Namespace = Namespace::known("wne", "http://schemas.microsoft.com/office/word/2006/wordml");
pub const A: Namespace = Namespace::known("a", DML_NS);
pub const M: Namespace = Namespace::known("m", "http://schemas.openxmlformats.org/officeDocument/2006/math");
pub const MV: Namespace = Namespace::known("mv", "urn:schemas-microsoft-com:mac:vml");
pub const PIC: Namespace = Namespace::known("pic", PIC_NS);
pub const V: Namespace = Namespace::known("v", "urn:schemas-microsoft-com:vml");
pub const WP: Namespace = Namespace::known("wp", WPD_NS);
pub const CP: Namespace = Namespace::known("cp", "http://schemas.openxmlformats.org/package/2006/metadata/core-properties");
pub const DC: Namespace = Namespace::known("dc", "http://purl.org/dc/elements/1.1/");
pub const EP: Namespace = Namespace::known("ep", "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties");
pub const VT: Namespace = Namespace::known("vt", "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes");
pub const XSI: Namespace = Namespace::known("xsi", "http://www.w3.org/2001/XMLSchema-instance");
pub const CT: Namespace = Namespace::known("ct", CT_NS);
pub const R: Namespace = Namespace::known("r", REL_NS);
pub const PR: Namespace = Namespace::known("pr", PKG_REL_NS);
pub const DCMITYPE: Namespace = Namespace::known("dcmitype", "http://purl.org/dc/dcmitype/");
pub const DCTERMS: Namespace = Namespace::known("dcterms", "http://purl.org/dc/terms/");
pub const XML: Namespace = Namespace::known("xml", XML_NS);

const REGISTRY: &[Namespace] = &[
    MO, O, VE, W, W10, WNE, A, M, MV, PIC, V, WP, CP, DC, EP, VT, XSI, CT, R, PR, DCMITYPE,
    DCTERMS, XML,
];

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub ns: Option<Namespace>,
    pub name: String,
    pub value: String,
}

/// One node of an in-memory XML part.
///
/// Mixed content is not modelled: an element carries either text or children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub ns: Option<Namespace>,
    pub name: String,
    /// Namespace declarations carried on this node.
    pub namespaces: Vec<Namespace>,
    pub attributes: Vec<Attribute>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(ns: Namespace, name: impl Into<String>) -> Self {
        Element { ns: Some(ns), name: name.into(), ..Default::default() }
    }

    /// An element without namespace.
    pub fn local(name: impl Into<String>) -> Self {
        Element { ns: None, name: name.into(), ..Default::default() }
    }

    /// Shorthand for a WordprocessingML element.
    pub fn w(name: impl Into<String>) -> Self {
        Element::new(W, name)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_attr_ns(mut self, ns: Namespace, name: &str, value: impl Into<String>) -> Self {
        self.set_attr_ns(Some(ns), name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Attributes without an explicit namespace follow the element's own
    /// namespace only for WordprocessingML nodes; everything else gets none.
    fn default_attr_ns(&self) -> Option<Namespace> {
        match &self.ns {
            Some(ns) if ns.uri() == WML_NS => Some(ns.clone()),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let ns = self.default_attr_ns();
        self.set_attr_ns(ns, name, value);
    }

    pub fn set_attr_ns(&mut self, ns: Option<Namespace>, name: &str, value: impl Into<String>) {
        let value = value.into();
        let uri = ns.as_ref().map(|n| n.uri().to_string());
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.name == name && a.ns.as_ref().map(|n| n.uri()) == uri.as_deref())
        {
            existing.value = value;
            return;
        }
        self.attributes.push(Attribute { ns, name: name.to_string(), value });
    }

    /// First attribute with the given local name, regardless of namespace.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn is(&self, uri: &str, name: &str) -> bool {
        self.name == name && self.ns.as_ref().map(|n| n.uri()) == Some(uri)
    }

    pub fn is_w(&self, name: &str) -> bool {
        self.is(WML_NS, name)
    }

    pub fn qualified_name(&self) -> String {
        qualify(self.ns.as_ref(), &self.name)
    }

    /// First direct WordprocessingML child with the given local name.
    pub fn child_w(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is_w(name))
    }

    pub fn child_w_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.is_w(name))
    }

    /// Depth-first pre-order visit of this node and all descendants.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    /// Serialize as a standalone part, declaring every namespace in use on the root.
    pub fn to_xml(&self) -> String {
        let mut declared = Vec::new();
        for ns in &self.namespaces {
            declare(&mut declared, ns);
        }
        self.collect_namespaces(&mut declared);

        let mut out = String::from(XML_DECL);
        self.write(&mut out, &declared);
        out
    }

    fn collect_namespaces(&self, acc: &mut Vec<Namespace>) {
        if let Some(ns) = &self.ns {
            declare(acc, ns);
        }
        for attr in &self.attributes {
            if let Some(ns) = &attr.ns {
                declare(acc, ns);
            }
        }
        for child in &self.children {
            child.collect_namespaces(acc);
        }
    }

    fn write(&self, out: &mut String, declarations: &[Namespace]) {
        let name = self.qualified_name();
        out.push('<');
        out.push_str(&name);
        for ns in declarations {
            if ns.prefix().is_empty() {
                out.push_str(" xmlns=\"");
            } else {
                out.push_str(" xmlns:");
                out.push_str(ns.prefix());
                out.push_str("=\"");
            }
            out.push_str(&escape(ns.uri()));
            out.push('"');
        }
        for attr in &self.attributes {
            let ns = attr.ns.as_ref().filter(|n| !n.prefix().is_empty());
            out.push(' ');
            out.push_str(&qualify(ns, &attr.name));
            out.push_str("=\"");
            out.push_str(&escape(&attr.value));
            out.push('"');
        }

        let text = self.text.as_deref().unwrap_or("");
        if text.is_empty() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        out.push_str(&escape(text));
        for child in &self.children {
            child.write(out, &[]);
        }
        out.push_str("</");
        out.push_str(&name);
        out.push('>');
    }

    /// Parse a part into an element tree.
    pub fn parse(xml: &str) -> Result<Element, Error> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();
        let mut element = convert(root);
        element.namespaces = root
            .namespaces()
            .filter(|ns| ns.name() != Some("xml"))
            .map(|ns| Namespace::new(ns.name().unwrap_or(""), ns.uri()))
            .collect();
        Ok(element)
    }
}

/// Contract-level constructor working on registry prefixes.
///
/// The node's namespace defaults to `w`. Passing several prefixes through
/// [`ElementBuilder::nsmap`] declares all of them on the node and uses the
/// first one for the tag itself.
#[derive(Clone, Debug)]
pub struct ElementBuilder<'a> {
    name: String,
    text: Option<String>,
    prefixes: Vec<&'a str>,
    attributes: Vec<(String, String)>,
    attr_prefix: Option<&'a str>,
}

impl<'a> ElementBuilder<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        ElementBuilder {
            name: name.into(),
            text: None,
            prefixes: vec!["w"],
            attributes: Vec::new(),
            attr_prefix: None,
        }
    }

    pub fn ns(mut self, prefix: &'a str) -> Self {
        self.prefixes = vec![prefix];
        self
    }

    pub fn nsmap(mut self, prefixes: &[&'a str]) -> Self {
        self.prefixes = prefixes.to_vec();
        self
    }

    pub fn no_ns(mut self) -> Self {
        self.prefixes.clear();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn attr_ns(mut self, prefix: &'a str) -> Self {
        self.attr_prefix = Some(prefix);
        self
    }

    pub fn build(self) -> Result<Element, Error> {
        let namespaces = self
            .prefixes
            .iter()
            .map(|p| Namespace::resolve(p))
            .collect::<Result<Vec<_>, _>>()?;
        let attr_ns = self.attr_prefix.map(Namespace::resolve).transpose()?;

        let mut element = match namespaces.first() {
            Some(ns) => Element::new(ns.clone(), self.name),
            None => Element::local(self.name),
        };
        if namespaces.len() > 1 {
            element.namespaces = namespaces;
        }
        for (name, value) in self.attributes {
            match &attr_ns {
                Some(ns) => element.set_attr_ns(Some(ns.clone()), &name, value),
                None => element.set_attr(&name, value),
            }
        }
        element.text = self.text;
        Ok(element)
    }
}

fn convert(node: roxmltree::Node) -> Element {
    let ns_of = |uri: &str| Namespace::new(node.lookup_prefix(uri).unwrap_or(""), uri);

    let children: Vec<Element> = node
        .children()
        .filter(|n| n.is_element())
        .map(convert)
        .collect();
    let text = if children.is_empty() {
        let text: String = node
            .children()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        (!text.is_empty()).then_some(text)
    } else {
        None
    };

    Element {
        ns: node.tag_name().namespace().map(ns_of),
        name: node.tag_name().name().to_string(),
        namespaces: Vec::new(),
        attributes: node
            .attributes()
            .map(|a| Attribute {
                ns: a.namespace().map(ns_of),
                name: a.name().to_string(),
                value: a.value().to_string(),
            })
            .collect(),
        text,
        children,
    }
}

fn declare(acc: &mut Vec<Namespace>, ns: &Namespace) {
    if ns.prefix() == "xml" || acc.iter().any(|d| d.prefix() == ns.prefix()) {
        return;
    }
    acc.push(ns.clone());
}

fn qualify(ns: Option<&Namespace>, name: &str) -> String {
    match ns {
        Some(ns) if !ns.prefix().is_empty() => format!("{}:{}", ns.prefix(), name),
        _ => name.to_string(),
    }
}

/// Fail on the first character outside the XML 1.0 `Char` production.
/// Escaping cannot help here: even `&#11;` is rejected by parsers.
pub(crate) fn check_chars(s: &str) -> Result<(), Error> {
    match s.chars().find(|&c| {
        matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
    }) {
        Some(c) => Err(Error::InvalidChar(c)),
        None => Ok(()),
    }
}

pub(crate) fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_follow_wordml_namespace_only() {
        let jc = ElementBuilder::new("jc").attr("val", "left").build().unwrap();
        assert_eq!(jc.attributes[0].ns, Some(W));

        let off = ElementBuilder::new("off").ns("a").attr("x", "0").build().unwrap();
        assert_eq!(off.attributes[0].ns, None);

        let blip = ElementBuilder::new("blip")
            .ns("a")
            .attr_ns("r")
            .attr("embed", "rId7")
            .build()
            .unwrap();
        assert_eq!(blip.attributes[0].ns, Some(R));
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        let err = ElementBuilder::new("p").ns("nope").build().unwrap_err();
        assert!(matches!(err, Error::UnknownNamespace(p) if p == "nope"));

        let err = ElementBuilder::new("p").attr_ns("zz").attr("a", "b").build().unwrap_err();
        assert!(matches!(err, Error::UnknownNamespace(_)));
    }

    #[test]
    fn nsmap_declares_all_and_uses_first() {
        let el = ElementBuilder::new("document").nsmap(&["w", "r", "wp"]).build().unwrap();
        assert_eq!(el.qualified_name(), "w:document");
        assert_eq!(el.namespaces.len(), 3);
        let xml = el.to_xml();
        assert!(xml.contains(&format!("xmlns:wp=\"{WPD_NS}\"")));
    }

    #[test]
    fn serializes_and_reparses() {
        let el = Element::w("p").with_child(
            Element::w("r").with_child(
                Element::w("t")
                    .with_attr_ns(XML, "space", "preserve")
                    .with_text(" a < b & c "),
            ),
        );
        let xml = el.to_xml();
        assert!(xml.contains("xml:space=\"preserve\""));
        assert!(!xml.contains("xmlns:xml"));

        let back = Element::parse(&xml).unwrap();
        let t = &back.children[0].children[0];
        assert!(t.is_w("t"));
        assert_eq!(t.text.as_deref(), Some(" a < b & c "));
        assert_eq!(t.attributes[0].ns.as_ref().map(|n| n.uri()), Some(XML_NS));
    }

    #[test]
    fn default_namespace_renders_unprefixed() {
        let types = Element::new(CT.as_default(), "Types")
            .with_child(Element::new(CT.as_default(), "Default").with_attr("Extension", "png"));
        let xml = types.to_xml();
        assert!(xml.contains(&format!("<Types xmlns=\"{CT_NS}\"><Default Extension=\"png\"/>")));
    }

    #[test]
    fn control_characters_are_not_xml() {
        assert!(check_chars("tab\tnewline\n\r fine ünïcode").is_ok());
        assert!(matches!(check_chars("line\u{0B}break"), Err(Error::InvalidChar('\u{0B}'))));
        assert!(matches!(check_chars("nul\0"), Err(Error::InvalidChar('\0'))));
        assert!(matches!(check_chars("\u{FFFF}"), Err(Error::InvalidChar('\u{FFFF}'))));
    }
}
