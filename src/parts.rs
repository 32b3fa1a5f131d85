use chrono::{DateTime, Utc};

use crate::xml::{CP, CT, DC, DCTERMS, EP, Element, VT, XSI};

const OVERRIDES: &[(&str, &str)] = &[
    ("/word/theme/theme1.xml", "application/vnd.openxmlformats-officedocument.theme+xml"),
    ("/word/fontTable.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.fontTable+xml"),
    ("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml"),
    ("/docProps/app.xml", "application/vnd.openxmlformats-officedocument.extended-properties+xml"),
    ("/word/document.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"),
    ("/word/settings.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"),
    ("/word/numbering.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"),
    ("/word/styles.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"),
    ("/word/webSettings.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.webSettings+xml"),
];

const DEFAULTS: &[(&str, &str)] = &[
    ("bmp", "image/bmp"),
    ("emf", "image/x-emf"),
    ("gif", "image/gif"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("wmf", "image/x-wmf"),
    ("rels", "application/vnd.openxmlformats-package.relationships+xml"),
    ("xml", "application/xml"),
];

const APP_PROPERTIES: &[(&str, &str)] = &[
    ("Template", "Normal.dotm"),
    ("TotalTime", "0"),
    ("Application", "Microsoft Word 12.0.0"),
    ("DocSecurity", "0"),
    ("ScaleCrop", "false"),
    ("LinksUpToDate", "false"),
    ("SharedDoc", "false"),
    ("HyperlinksChanged", "false"),
    ("AppVersion", "12.0000"),
];

/// Dublin Core document properties written to `docProps/core.xml`.
#[derive(Clone, Debug, PartialEq)]
pub struct CoreProperties {
    pub title: String,
    pub subject: String,
    pub creator: String,
    pub keywords: Vec<String>,
    /// Falls back to `creator` when unset.
    pub last_modified_by: Option<String>,
    pub category: String,
    pub description: String,
}

impl Default for CoreProperties {
    fn default() -> Self {
        CoreProperties {
            title: String::new(),
            subject: String::new(),
            creator: env!("CARGO_PKG_NAME").to_string(),
            keywords: Vec::new(),
            last_modified_by: None,
            category: String::new(),
            description: String::new(),
        }
    }
}

impl CoreProperties {
    pub fn to_element(&self, now: DateTime<Utc>) -> Element {
        let timestamp = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let last_modified_by = self.last_modified_by.as_deref().unwrap_or(&self.creator);
        let w3cdtf = |name: &str| {
            Element::new(DCTERMS, name)
                .with_attr_ns(XSI, "type", "dcterms:W3CDTF")
                .with_text(&timestamp)
        };

        Element::new(CP, "coreProperties").with_children([
            Element::new(DC, "title").with_text(&self.title),
            Element::new(DC, "subject").with_text(&self.subject),
            Element::new(DC, "creator").with_text(&self.creator),
            Element::new(CP, "keywords").with_text(self.keywords.join(",")),
            Element::new(CP, "lastModifiedBy").with_text(last_modified_by),
            Element::new(CP, "revision").with_text("1"),
            Element::new(CP, "category").with_text(&self.category),
            Element::new(DC, "description").with_text(&self.description),
            w3cdtf("created"),
            w3cdtf("modified"),
        ])
    }
}

pub fn app_properties() -> Element {
    let ns = EP.as_default();
    let mut props = Element::new(ns.clone(), "Properties");
    props.namespaces.push(VT);
    props.with_children(
        APP_PROPERTIES
            .iter()
            .map(|(name, value)| Element::new(ns.clone(), *name).with_text(*value)),
    )
}

pub fn content_types() -> Element {
    let ns = CT.as_default();
    let overrides = OVERRIDES.iter().map(|(part, kind)| {
        Element::new(ns.clone(), "Override")
            .with_attr("PartName", *part)
            .with_attr("ContentType", *kind)
    });
    let defaults = DEFAULTS.iter().map(|(ext, kind)| {
        Element::new(ns.clone(), "Default")
            .with_attr("Extension", *ext)
            .with_attr("ContentType", *kind)
    });
    Element::new(ns.clone(), "Types")
        .with_children(defaults)
        .with_children(overrides)
}

pub fn web_settings() -> Element {
    Element::w("webSettings")
        .with_child(Element::w("allowPNG"))
        .with_child(Element::w("doNotSaveAsSingleFile"))
}
