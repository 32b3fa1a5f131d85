use std::path::{Path, PathBuf};

use log::info;

use crate::error::Error;
use crate::model::Alignment;
use crate::rels::{IMAGE_REL, Relationships};
use crate::xml::{A, Element, PIC, PIC_NS, R, WP};

/// English Metric Units per screen pixel at 72 dpi.
pub const EMU_PER_PIXEL: u64 = 12700;

/// An image to embed as an inline drawing.
#[derive(Clone, Debug)]
pub struct Picture {
    path: PathBuf,
    description: String,
    width: Option<u32>,
    height: Option<u32>,
    no_change_aspect: bool,
    no_change_arrowheads: bool,
    alignment: Alignment,
}

impl Picture {
    pub fn new(path: impl Into<PathBuf>, description: impl Into<String>) -> Self {
        Picture {
            path: path.into(),
            description: description.into(),
            width: None,
            height: None,
            no_change_aspect: true,
            no_change_arrowheads: true,
            alignment: Alignment::Left,
        }
    }

    /// Display width in pixels; height follows the source aspect ratio.
    pub fn width(mut self, pixels: u32) -> Self {
        self.width = Some(pixels);
        self
    }

    pub fn height(mut self, pixels: u32) -> Self {
        self.height = Some(pixels);
        self
    }

    pub fn size(self, width: u32, height: u32) -> Self {
        self.width(width).height(height)
    }

    pub fn locks(mut self, no_change_aspect: bool, no_change_arrowheads: bool) -> Self {
        self.no_change_aspect = no_change_aspect;
        self.no_change_arrowheads = no_change_arrowheads;
        self
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Display size in pixels. The source file is only read when a dimension is missing.
    pub fn dimensions(&self) -> Result<(u32, u32), Error> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Ok((w, h)),
            (Some(w), None) => {
                let (w0, h0) = image::image_dimensions(&self.path)?;
                Ok((w, scale(h0, w, w0)))
            }
            (None, Some(h)) => {
                let (w0, h0) = image::image_dimensions(&self.path)?;
                Ok((scale(w0, h, h0), h))
            }
            (None, None) => Ok(image::image_dimensions(&self.path)?),
        }
    }

    fn file_name(&self) -> Result<String, Error> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a file: {}", self.path.display()),
                ))
            })
    }

    /// Copy the image into `media_dir` and build its drawing paragraph.
    ///
    /// The registry is consumed and handed back with the image relationship
    /// appended. The media file is named `{rId}-{file name}` so images sharing
    /// a file name never overwrite each other.
    pub fn embed(
        &self,
        relationships: Relationships,
        media_dir: &Path,
    ) -> Result<(Relationships, Element), Error> {
        let name = self.file_name()?;
        let (width_px, height_px) = self.dimensions()?;

        let media_name = format!("{}-{}", relationships.next_id(), name);
        std::fs::create_dir_all(media_dir).map_err(|e| Error::from(e).in_part("media"))?;
        std::fs::copy(&self.path, media_dir.join(&media_name))
            .map_err(|e| Error::from(e).in_part(format!("word/media/{media_name}")))?;
        info!("embedded {} as {} ({}x{} px)", name, media_name, width_px, height_px);

        let (relationships, rel_id) =
            relationships.append(IMAGE_REL, format!("media/{media_name}"));
        let cx = (u64::from(width_px) * EMU_PER_PIXEL).to_string();
        let cy = (u64::from(height_px) * EMU_PER_PIXEL).to_string();
        let picture_name = format!("Picture {}", rel_id.number());

        let blip_fill = Element::new(PIC, "blipFill")
            .with_child(Element::new(A, "blip").with_attr_ns(R, "embed", rel_id.to_string()))
            .with_child(Element::new(A, "srcRect"))
            .with_child(Element::new(A, "stretch").with_child(Element::new(A, "fillRect")));

        let nv_pic_pr = Element::new(PIC, "nvPicPr")
            .with_child(
                Element::new(PIC, "cNvPr")
                    .with_attr("id", "0")
                    .with_attr("name", &picture_name)
                    .with_attr("descr", &name),
            )
            .with_child(
                Element::new(PIC, "cNvPicPr").with_child(
                    Element::new(A, "picLocks")
                        .with_attr("noChangeAspect", flag(self.no_change_aspect))
                        .with_attr("noChangeArrowheads", flag(self.no_change_arrowheads)),
                ),
            );

        let sp_pr = Element::new(PIC, "spPr")
            .with_attr("bwMode", "auto")
            .with_child(
                Element::new(A, "xfrm")
                    .with_child(Element::new(A, "off").with_attr("x", "0").with_attr("y", "0"))
                    .with_child(Element::new(A, "ext").with_attr("cx", &cx).with_attr("cy", &cy)),
            )
            .with_child(
                Element::new(A, "prstGeom")
                    .with_attr("prst", "rect")
                    .with_child(Element::new(A, "avLst")),
            );

        let graphic = Element::new(A, "graphic").with_child(
            Element::new(A, "graphicData")
                .with_attr("uri", PIC_NS)
                .with_child(
                    Element::new(PIC, "pic")
                        .with_child(nv_pic_pr)
                        .with_child(blip_fill)
                        .with_child(sp_pr),
                ),
        );

        let inline = Element::new(WP, "inline")
            .with_attr("distT", "0")
            .with_attr("distB", "0")
            .with_attr("distL", "0")
            .with_attr("distR", "0")
            .with_child(Element::new(WP, "extent").with_attr("cx", &cx).with_attr("cy", &cy))
            .with_child(
                Element::new(WP, "effectExtent")
                    .with_attr("l", "25400")
                    .with_attr("t", "0")
                    .with_attr("r", "0")
                    .with_attr("b", "0"),
            )
            .with_child(
                Element::new(WP, "docPr")
                    .with_attr("id", rel_id.number().to_string())
                    .with_attr("name", &picture_name)
                    .with_attr("descr", &self.description),
            )
            .with_child(
                Element::new(WP, "cNvGraphicFramePr").with_child(
                    Element::new(A, "graphicFrameLocks").with_attr("noChangeAspect", "1"),
                ),
            )
            .with_child(graphic);

        let paragraph = Element::w("p")
            .with_child(
                Element::w("pPr")
                    .with_child(Element::w("jc").with_attr("val", self.alignment.as_str())),
            )
            .with_child(Element::w("r").with_child(Element::w("drawing").with_child(inline)));

        Ok((relationships, paragraph))
    }
}

fn flag(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

/// `round(source * target / reference)`, half away from zero.
fn scale(source: u32, target: u32, reference: u32) -> u32 {
    if reference == 0 {
        return 0;
    }
    (f64::from(source) * f64::from(target) / f64::from(reference)).round() as u32
}
