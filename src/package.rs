use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::{NamedTempFile, TempDir};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::document::Document;
use crate::error::Error;
use crate::parts::{self, CoreProperties};
use crate::picture::Picture;
use crate::rels::{DOCUMENT_RELS, RelId, Relationships};
use crate::xml::{self, Element, REL_NS};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const CORE_PART: &str = "docProps/core.xml";
pub const APP_PART: &str = "docProps/app.xml";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const WEB_SETTINGS_PART: &str = "word/webSettings.xml";

const MEDIA_DIR: &str = "word/media";
const IGNORED_FILES: &[&str] = &[".DS_Store"];

const SKELETON: &[(&str, &[u8])] = &[
    ("_rels/.rels", include_bytes!("../skeleton/_rels/.rels")),
    ("word/fontTable.xml", include_bytes!("../skeleton/word/fontTable.xml")),
    ("word/numbering.xml", include_bytes!("../skeleton/word/numbering.xml")),
    ("word/settings.xml", include_bytes!("../skeleton/word/settings.xml")),
    ("word/styles.xml", include_bytes!("../skeleton/word/styles.xml")),
    ("word/theme/theme1.xml", include_bytes!("../skeleton/word/theme/theme1.xml")),
];

/// Where the package parts came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Origin {
    /// Built from the compiled-in skeleton.
    Fresh,
    /// Extracted from an existing .docx.
    Templated,
}

/// A .docx under construction.
///
/// Parts live in a private scratch directory until [`Package::save`], which
/// consumes the package. The scratch directory is removed when the package is
/// dropped, whichever way that happens.
pub struct Package {
    origin: Origin,
    scratch: TempDir,
    document: Document,
    relationships: Relationships,
}

impl Package {
    /// Start a blank package from the built-in skeleton.
    pub fn new() -> Result<Self, Error> {
        let scratch = tempfile::tempdir()?;
        for (name, bytes) in SKELETON {
            let path = scratch.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, bytes)?;
        }
        debug!("fresh package in {}", scratch.path().display());
        Ok(Package {
            origin: Origin::Fresh,
            scratch,
            document: Document::new(),
            relationships: Relationships::builtin(),
        })
    }

    /// Open a template. The archive and its main document are fully
    /// validated before anything is extracted.
    pub fn open(template: &Path) -> Result<Self, Error> {
        if !template.is_file() {
            return Err(Error::InvalidDocx(format!("template not found: {}", template.display())));
        }
        let file = File::open(template)?;
        let mut zip = zip::ZipArchive::new(file)?;

        let mut xml_content = String::new();
        zip.by_name(DOCUMENT_PART)
            .map_err(|_| Error::InvalidDocx(format!("missing {DOCUMENT_PART}")))?
            .read_to_string(&mut xml_content)?;
        let mut document = Document::parse(&xml_content)?;

        let scratch = tempfile::tempdir()?;
        zip.extract(scratch.path())?;
        debug!("extracted {} into {}", template.display(), scratch.path().display());

        let rels_path = scratch.path().join(DOCUMENT_RELS);
        let relationships = if rels_path.is_file() {
            let (relationships, renamed) = Relationships::from_xml(&std::fs::read_to_string(&rels_path)?)?;
            rewrite_rel_refs(document.root_mut(), &renamed);
            relationships
        } else {
            return Err(Error::InvalidDocx(format!("missing {DOCUMENT_RELS}")));
        };

        Ok(Package { origin: Origin::Templated, scratch, document, relationships })
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// The registry matching this package's origin, to be threaded through
    /// picture embedding and handed back to [`Package::save`].
    pub fn relationships(&self) -> Relationships {
        self.relationships.clone()
    }

    pub fn media_dir(&self) -> PathBuf {
        self.scratch.path().join(MEDIA_DIR)
    }

    pub fn embed(
        &self,
        picture: &Picture,
        relationships: Relationships,
    ) -> Result<(Relationships, Element), Error> {
        picture.embed(relationships, &self.media_dir())
    }

    fn generated_parts(
        &self,
        properties: &CoreProperties,
        relationships: &Relationships,
    ) -> Vec<(&'static str, String)> {
        let core = properties.to_element(chrono::Utc::now()).to_xml();
        let mut generated = Vec::new();
        if self.origin == Origin::Fresh {
            generated.push((CONTENT_TYPES_PART, parts::content_types().to_xml()));
        }
        generated.push((DOCUMENT_PART, self.document.to_xml()));
        generated.push((CORE_PART, core));
        if self.origin == Origin::Fresh {
            generated.push((APP_PART, parts::app_properties().to_xml()));
            generated.push((WEB_SETTINGS_PART, parts::web_settings().to_xml()));
        }
        generated.push((DOCUMENT_RELS, relationships.to_element().to_xml()));
        generated
    }

    /// Every scratch file that is not regenerated, `[Content_Types].xml` first.
    fn passthrough_parts(&self, generated: &[(&str, String)]) -> Result<Vec<(String, PathBuf)>, Error> {
        let mut files = Vec::new();
        for entry in WalkDir::new(self.scratch.path()).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if IGNORED_FILES.contains(&&*file_name) {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(self.scratch.path())
                .map_err(|e| Error::InvalidDocx(e.to_string()))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if generated.iter().any(|(part, _)| *part == name) {
                continue;
            }
            files.push((name, entry.into_path()));
        }
        files.sort_by_key(|(name, _)| name.as_str() != CONTENT_TYPES_PART);
        Ok(files)
    }

    /// Write the finished package to `output`.
    ///
    /// Generated parts are checked for characters XML cannot carry before
    /// anything is written. The archive is staged next to `output` and
    /// renamed into place once complete, so a failure never leaves a partial
    /// file at `output`.
    pub fn save(
        self,
        properties: &CoreProperties,
        relationships: &Relationships,
        output: &Path,
    ) -> Result<(), Error> {
        let generated = self.generated_parts(properties, relationships);
        for (part, content) in &generated {
            xml::check_chars(content).map_err(|e| e.in_part(*part))?;
        }
        if self.origin == Origin::Templated {
            for (part, _) in &generated {
                match std::fs::remove_file(self.scratch.path().join(part)) {
                    Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
                    _ => {}
                }
            }
        }
        let passthrough = self.passthrough_parts(&generated)?;

        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut staged = NamedTempFile::new_in(dir)?;
        {
            let mut zip = zip::ZipWriter::new(staged.as_file_mut());
            let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

            for (part, xml) in &generated {
                info!("Saving: {part}");
                zip.start_file(*part, deflated)
                    .map_err(|e| Error::from(e).in_part(*part))?;
                zip.write_all(xml.as_bytes())
                    .map_err(|e| Error::from(e).in_part(*part))?;
            }
            for (name, path) in &passthrough {
                info!("Saving: {name}");
                let opts = if name.starts_with(MEDIA_DIR) { stored } else { deflated };
                let copy = |zip: &mut zip::ZipWriter<&mut File>| -> Result<(), Error> {
                    zip.start_file(name.as_str(), opts)?;
                    std::io::copy(&mut File::open(path)?, zip)?;
                    Ok(())
                };
                copy(&mut zip).map_err(|e| e.in_part(name.as_str()))?;
            }
            zip.finish()?;
        }
        staged.persist(output)?;
        info!("Saved new file to: {}", output.display());
        Ok(())
    }
}

fn rewrite_rel_refs(root: &mut Element, renamed: &[(String, RelId)]) {
    if renamed.is_empty() {
        return;
    }
    let map: HashMap<&str, String> =
        renamed.iter().map(|(old, new)| (old.as_str(), new.to_string())).collect();
    root.visit_mut(&mut |node| {
        for attr in &mut node.attributes {
            if attr.ns.as_ref().map(|n| n.uri()) != Some(REL_NS) {
                continue;
            }
            if let Some(new) = map.get(attr.value.as_str()) {
                attr.value = new.clone();
            }
        }
    });
}

/// Plain text of a saved package, one entry per non-empty paragraph.
pub fn read_text(path: &Path) -> Result<Vec<String>, Error> {
    let file = File::open(path)?;
    let mut zip = zip::ZipArchive::new(file)?;
    let mut xml_content = String::new();
    zip.by_name(DOCUMENT_PART)?.read_to_string(&mut xml_content)?;
    Ok(Document::parse(&xml_content)?.text())
}

/// Names and uncompressed sizes of every entry in a package.
pub fn list_parts(path: &Path) -> Result<Vec<(String, u64)>, Error> {
    let file = File::open(path)?;
    let mut zip = zip::ZipArchive::new(file)?;
    let mut entries = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let entry = zip.by_index(i)?;
        if !entry.is_dir() {
            entries.push((entry.name().to_string(), entry.size()));
        }
    }
    Ok(entries)
}
