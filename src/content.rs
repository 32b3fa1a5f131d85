use crate::error::Error;
use crate::model::{Alignment, BreakKind, Content, Language, Orientation, RunFormat, WidthUnit};
use crate::sequence::SequenceCounter;
use crate::xml::{Element, XML};

const DEFAULT_GRID_COL: &str = "2390";

fn text_node(text: &str) -> Element {
    let t = Element::w("t").with_text(text);
    if text.trim().len() < text.len() {
        t.with_attr_ns(XML, "space", "preserve")
    } else {
        t
    }
}

fn styled_paragraph(style: &str) -> Element {
    Element::w("p").with_child(
        Element::w("pPr").with_child(Element::w("pStyle").with_attr("val", style)),
    )
}

/// Heading paragraph styled `Heading{level}` (or the localized equivalent).
pub fn heading(text: &str, level: u8, language: Language) -> Element {
    let style = format!("{}{}", language.heading_style(), level);
    styled_paragraph(&style).with_child(Element::w("r").with_child(Element::w("t").with_text(text)))
}

/// One run of a paragraph with its character formatting.
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub text: String,
    pub format: RunFormat,
}

impl Run {
    pub fn new(text: impl Into<String>, flags: &str) -> Self {
        Run { text: text.into(), format: RunFormat::parse(flags) }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Run { text: text.into(), format: RunFormat::default() }
    }
}

/// Paragraph constructor.
#[derive(Clone, Debug)]
pub struct Paragraph {
    runs: Vec<Run>,
    style: String,
    break_before: bool,
    alignment: Alignment,
    color: String,
    size: Option<u32>,
    indent: Option<u32>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Paragraph::from_runs(vec![Run::plain(text)])
    }

    pub fn from_runs(runs: Vec<Run>) -> Self {
        Paragraph {
            runs,
            style: "BodyText".to_string(),
            break_before: false,
            alignment: Alignment::Left,
            color: "auto".to_string(),
            size: None,
            indent: None,
        }
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Mark a rendered page break before the content for assistive readers.
    pub fn break_before(mut self, yes: bool) -> Self {
        self.break_before = yes;
        self
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Font size in points.
    pub fn size(mut self, points: u32) -> Self {
        self.size = Some(points);
        self
    }

    /// Left indent in twentieths of a point.
    pub fn indent(mut self, twips: u32) -> Self {
        self.indent = Some(twips);
        self
    }

    pub fn build(&self) -> Element {
        let mut ppr = Element::w("pPr")
            .with_child(Element::w("pStyle").with_attr("val", &self.style))
            .with_child(Element::w("jc").with_attr("val", self.alignment.as_str()));
        if let Some(ind) = self.indent {
            ppr.push(Element::w("ind").with_attr("left", ind.to_string()));
        }

        let mut paragraph = Element::w("p").with_child(ppr);
        for run in &self.runs {
            let mut rpr = Element::w("rPr");
            if run.format.bold {
                rpr.push(Element::w("b"));
            }
            if run.format.italic {
                rpr.push(Element::w("i"));
            }
            if run.format.underline {
                rpr.push(Element::w("u").with_attr("val", "single"));
            }
            if let Some(size) = self.size {
                // half-points
                rpr.push(Element::w("sz").with_attr("val", (size * 2).to_string()));
            }
            rpr.push(Element::w("color").with_attr("val", &self.color));

            let mut r = Element::w("r").with_child(rpr);
            if self.break_before {
                r.push(Element::w("lastRenderedPageBreak"));
            }
            r.push(text_node(&run.text));
            paragraph.push(r);
        }
        paragraph
    }
}

/// Page break paragraph, or a section break carrying its own page size.
pub fn page_break(kind: BreakKind, orientation: Orientation) -> Element {
    match kind {
        BreakKind::Page => Element::w("p").with_child(
            Element::w("r").with_child(Element::w("br").with_attr("type", "page")),
        ),
        BreakKind::Section => {
            let pg_sz = match orientation {
                Orientation::Portrait => {
                    Element::w("pgSz").with_attr("w", "12240").with_attr("h", "15840")
                }
                Orientation::Landscape => Element::w("pgSz")
                    .with_attr("h", "12240")
                    .with_attr("w", "15840")
                    .with_attr("orient", "landscape"),
            };
            Element::w("p").with_child(
                Element::w("pPr").with_child(Element::w("sectPr").with_child(pg_sz)),
            )
        }
    }
}

/// String-keyed variant of [`page_break`] for callers holding raw kind names.
pub fn page_break_named(kind: &str, orientation: Orientation) -> Result<Element, Error> {
    Ok(page_break(kind.parse()?, orientation))
}

pub fn linebreak() -> Element {
    Element::w("br")
}

/// Plain caption paragraph.
pub fn caption(text: &str, language: Language) -> Element {
    styled_paragraph(language.caption_style())
        .with_child(Element::w("r").with_child(Element::w("t").with_text(text)))
}

/// Caption numbered through a `SEQ Figure` field.
///
/// The number captured now is the field's cached result; Word recomputes it
/// when fields are updated.
pub fn figure_caption(
    text: &str,
    language: Language,
    counter: &mut dyn SequenceCounter,
) -> Result<Element, Error> {
    let number = counter.next()?;
    let run = |child: Element| Element::w("r").with_child(child);
    let fld_char = |kind: &str| Element::w("fldChar").with_attr("fldCharType", kind);

    Ok(styled_paragraph(language.caption_style()).with_children([
        run(text_node(language.figure_label())),
        run(fld_char("begin")),
        run(Element::w("instrText")
            .with_attr_ns(XML, "space", "preserve")
            .with_text(" SEQ Figure \\* ARABIC ")),
        run(fld_char("separate")),
        run(Element::w("t").with_text(number.to_string())),
        run(fld_char("end")),
        run(Element::w("t").with_text(":")),
        run(text_node(&format!(" {text}"))),
    ]))
}

/// Attributes of one table border edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Border {
    pub val: String,
    pub sz: String,
    pub space: String,
    pub color: String,
}

impl Default for Border {
    fn default() -> Self {
        Border {
            val: "single".to_string(),
            sz: "4".to_string(),
            space: "0".to_string(),
            color: "auto".to_string(),
        }
    }
}

/// Per-side table borders. `all`, when set, wins over every named side.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Borders {
    pub all: Option<Border>,
    pub top: Option<Border>,
    pub left: Option<Border>,
    pub bottom: Option<Border>,
    pub right: Option<Border>,
    pub inside_h: Option<Border>,
    pub inside_v: Option<Border>,
}

impl Borders {
    pub fn all(border: Border) -> Self {
        Borders { all: Some(border), ..Default::default() }
    }

    pub fn none() -> Self {
        Borders::default()
    }

    fn sides(&self) -> Vec<(&'static str, &Border)> {
        let named = [
            ("top", &self.top),
            ("left", &self.left),
            ("bottom", &self.bottom),
            ("right", &self.right),
            ("insideH", &self.inside_h),
            ("insideV", &self.inside_v),
        ];
        named
            .into_iter()
            .filter_map(|(name, side)| self.all.as_ref().or(side.as_ref()).map(|b| (name, b)))
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnStyle {
    pub align: Option<Alignment>,
}

/// Table constructor. Every row must have as many cells as the first one.
#[derive(Clone, Debug)]
pub struct Table {
    rows: Vec<Vec<Content>>,
    heading: bool,
    column_widths: Option<Vec<u32>>,
    width_unit: WidthUnit,
    table_width: u32,
    table_width_unit: WidthUnit,
    borders: Borders,
    column_styles: Vec<ColumnStyle>,
    heading_fill: String,
    first_column_fill: String,
}

impl Table {
    pub fn new(rows: Vec<Vec<Content>>) -> Self {
        Table {
            rows,
            heading: true,
            column_widths: None,
            width_unit: WidthUnit::Dxa,
            table_width: 0,
            table_width_unit: WidthUnit::Auto,
            borders: Borders::all(Border::default()),
            column_styles: Vec::new(),
            heading_fill: "auto".to_string(),
            first_column_fill: "auto".to_string(),
        }
    }

    /// Convenience for all-text tables.
    pub fn from_text<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        Table::new(
            rows.iter()
                .map(|row| row.iter().map(|c| Content::from(c.as_ref())).collect())
                .collect(),
        )
    }

    pub fn heading(mut self, yes: bool) -> Self {
        self.heading = yes;
        self
    }

    pub fn column_widths(mut self, widths: Vec<u32>, unit: WidthUnit) -> Self {
        self.column_widths = Some(widths);
        self.width_unit = unit;
        self
    }

    pub fn width(mut self, width: u32, unit: WidthUnit) -> Self {
        self.table_width = width;
        self.table_width_unit = unit;
        self
    }

    pub fn borders(mut self, borders: Borders) -> Self {
        self.borders = borders;
        self
    }

    pub fn column_styles(mut self, styles: Vec<ColumnStyle>) -> Self {
        self.column_styles = styles;
        self
    }

    pub fn heading_fill(mut self, color: impl Into<String>) -> Self {
        self.heading_fill = color.into();
        self
    }

    pub fn first_column_fill(mut self, color: impl Into<String>) -> Self {
        self.first_column_fill = color.into();
        self
    }

    fn validate(&self) -> Result<usize, Error> {
        let columns = self
            .rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| Error::InvalidTable("table has no rows".into()))?;
        if columns == 0 {
            return Err(Error::InvalidTable("first row has no cells".into()));
        }
        if let Some((i, row)) = self.rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
            return Err(Error::InvalidTable(format!(
                "row {i} has {} cells, expected {columns}",
                row.len()
            )));
        }
        if let Some(widths) = &self.column_widths
            && widths.len() != columns
        {
            return Err(Error::InvalidTable(format!(
                "{} column widths given for {columns} columns",
                widths.len()
            )));
        }
        Ok(columns)
    }

    fn cell_width(&self, column: usize) -> Element {
        match &self.column_widths {
            Some(widths) => Element::w("tcW")
                .with_attr("w", widths[column].to_string())
                .with_attr("type", self.width_unit.to_string()),
            None => Element::w("tcW").with_attr("w", "0").with_attr("type", "auto"),
        }
    }

    fn cell_body(cell: &mut Element, content: &Content, text_paragraph: impl Fn(&str) -> Element) {
        match content {
            Content::Text(text) => cell.push(text_paragraph(text)),
            Content::Node(node) => cell.push(node.clone()),
            Content::Nodes(nodes) => cell.children.extend(nodes.iter().cloned()),
        }
    }

    pub fn build(&self) -> Result<Element, Error> {
        let columns = self.validate()?;

        let mut tbl_pr = Element::w("tblPr")
            .with_child(Element::w("tblStyle").with_attr("val", ""))
            .with_child(
                Element::w("tblW")
                    .with_attr("w", self.table_width.to_string())
                    .with_attr("type", self.table_width_unit.to_string()),
            );
        let sides = self.borders.sides();
        if !sides.is_empty() {
            let borders = sides.into_iter().map(|(name, b)| {
                Element::w(name)
                    .with_attr("val", &b.val)
                    .with_attr("sz", &b.sz)
                    .with_attr("space", &b.space)
                    .with_attr("color", &b.color)
            });
            tbl_pr.push(Element::w("tblBorders").with_children(borders));
        }
        tbl_pr.push(Element::w("tblLook").with_attr("val", "0400"));

        let grid = (0..columns).map(|i| {
            let w = match &self.column_widths {
                Some(widths) => widths[i].to_string(),
                None => DEFAULT_GRID_COL.to_string(),
            };
            Element::w("gridCol").with_attr("w", w)
        });

        let mut table = Element::w("tbl")
            .with_child(tbl_pr)
            .with_child(Element::w("tblGrid").with_children(grid));

        let mut body_rows = self.rows.iter();
        if self.heading
            && let Some(first) = body_rows.next()
        {
            let mut row = Element::w("tr").with_child(
                Element::w("trPr")
                    .with_child(Element::w("cnfStyle").with_attr("val", "000000100000")),
            );
            for (i, content) in first.iter().enumerate() {
                let tc_pr = Element::w("tcPr").with_child(self.cell_width(i)).with_child(
                    Element::w("shd")
                        .with_attr("val", "clear")
                        .with_attr("color", "FFFFFF")
                        .with_attr("fill", &self.heading_fill),
                );
                let mut cell = Element::w("tc").with_child(tc_pr);
                Self::cell_body(&mut cell, content, |text| {
                    Paragraph::new(text).color("FFFFFF").build()
                });
                row.push(cell);
            }
            table.push(row);
        }

        for content_row in body_rows {
            let mut row = Element::w("tr");
            for (i, content) in content_row.iter().enumerate() {
                let mut tc_pr = Element::w("tcPr").with_child(self.cell_width(i));
                if i == 0 {
                    tc_pr.push(
                        Element::w("shd")
                            .with_attr("val", "clear")
                            .with_attr("color", "auto")
                            .with_attr("fill", &self.first_column_fill),
                    );
                }
                let align = self
                    .column_styles
                    .get(i)
                    .and_then(|s| s.align)
                    .unwrap_or(Alignment::Left);
                let mut cell = Element::w("tc").with_child(tc_pr);
                Self::cell_body(&mut cell, content, |text| Paragraph::new(text).align(align).build());
                row.push(cell);
            }
            table.push(row);
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::MemoryCounter;
    use crate::xml::WML_NS;

    fn texts(el: &Element) -> Vec<String> {
        let mut out = Vec::new();
        el.visit(&mut |n| {
            if n.is_w("t") {
                out.push(n.text.clone().unwrap_or_default());
            }
        });
        out
    }

    #[test]
    fn heading_style_is_localized() {
        let en = heading("Summary", 2, Language::English);
        let pstyle = &en.children[0].children[0];
        assert_eq!(pstyle.attr("val"), Some("Heading2"));

        let nl = heading("Samenvatting", 1, Language::Dutch);
        assert_eq!(nl.children[0].children[0].attr("val"), Some("Kop1"));
        assert_eq!(texts(&nl), vec!["Samenvatting"]);
    }

    #[test]
    fn run_flags_combine_independently() {
        let p = Paragraph::from_runs(vec![Run::new("x", "bu"), Run::new("y", "")]).build();
        let runs: Vec<&Element> = p.children.iter().filter(|c| c.is_w("r")).collect();
        let rpr_names = |r: &Element| -> Vec<String> {
            r.child_w("rPr").unwrap().children.iter().map(|c| c.name.clone()).collect()
        };
        assert_eq!(rpr_names(runs[0]), vec!["b", "u", "color"]);
        assert_eq!(rpr_names(runs[1]), vec!["color"]);
    }

    #[test]
    fn padded_text_preserves_space() {
        let p = Paragraph::new(" padded").size(12).indent(720).build();
        let r = p.child_w("r").unwrap();
        let t = r.child_w("t").unwrap();
        assert_eq!(t.attr("space"), Some("preserve"));
        assert_eq!(r.child_w("rPr").unwrap().child_w("sz").unwrap().attr("val"), Some("24"));
        assert_eq!(p.child_w("pPr").unwrap().child_w("ind").unwrap().attr("left"), Some("720"));

        let tight = Paragraph::new("tight").build();
        assert_eq!(tight.child_w("r").unwrap().child_w("t").unwrap().attr("space"), None);
    }

    #[test]
    fn break_before_marks_every_run() {
        let p = Paragraph::new("after break").break_before(true).build();
        let r = p.child_w("r").unwrap();
        assert!(r.child_w("lastRenderedPageBreak").is_some());
    }

    #[test]
    fn section_break_swaps_page_size_for_landscape() {
        let el = page_break(BreakKind::Section, Orientation::Landscape);
        let pg_sz = el.children[0].children[0].child_w("pgSz").unwrap();
        assert_eq!(pg_sz.attr("w"), Some("15840"));
        assert_eq!(pg_sz.attr("h"), Some("12240"));
        assert_eq!(pg_sz.attr("orient"), Some("landscape"));
    }

    #[test]
    fn unknown_break_kind_fails() {
        assert!(matches!(
            page_break_named("column", Orientation::Portrait),
            Err(Error::InvalidBreak(k)) if k == "column"
        ));
        assert!(page_break_named("page", Orientation::Portrait).is_ok());
    }

    #[test]
    fn ragged_table_is_rejected() {
        let table = Table::from_text(&[vec!["a", "b"], vec!["c"]]);
        assert!(matches!(table.build(), Err(Error::InvalidTable(_))));

        let empty: Vec<Vec<&str>> = Vec::new();
        assert!(Table::from_text(&empty).build().is_err());

        let widths = Table::from_text(&[vec!["a", "b"]]).column_widths(vec![100], WidthUnit::Dxa);
        assert!(widths.build().is_err());
    }

    #[test]
    fn table_heading_and_first_column_fill() {
        let table = Table::from_text(&[vec!["H1", "H2"], vec!["a", "b"]])
            .heading_fill("336699")
            .first_column_fill("EEEEEE")
            .build()
            .unwrap();
        assert_eq!(texts(&table), vec!["H1", "H2", "a", "b"]);

        let rows: Vec<&Element> = table.children.iter().filter(|c| c.is_w("tr")).collect();
        let header_shd = rows[0].children[1].child_w("tcPr").unwrap().child_w("shd").unwrap();
        assert_eq!(header_shd.attr("fill"), Some("336699"));
        assert_eq!(header_shd.attr("color"), Some("FFFFFF"));

        let data_cells: Vec<&Element> = rows[1].children.iter().collect();
        let first = data_cells[0].child_w("tcPr").unwrap();
        assert_eq!(first.child_w("shd").unwrap().attr("fill"), Some("EEEEEE"));
        assert!(data_cells[1].child_w("tcPr").unwrap().child_w("shd").is_none());
    }

    #[test]
    fn all_border_takes_precedence() {
        let thick = Border { sz: "12".into(), ..Default::default() };
        let borders = Borders {
            all: Some(Border::default()),
            top: Some(thick),
            ..Default::default()
        };
        let sides = borders.sides();
        assert_eq!(sides.len(), 6);
        assert!(sides.iter().all(|(_, b)| b.sz == "4"));

        let only_top = Borders { top: Some(Border::default()), ..Default::default() };
        let names: Vec<&str> = only_top.sides().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["top"]);
    }

    #[test]
    fn mixed_cell_content_is_merged() {
        let extra = Paragraph::new("second").build();
        let table = Table::new(vec![vec![Content::Nodes(vec![
            Paragraph::new("first").build(),
            extra,
        ])]])
        .heading(false)
        .build()
        .unwrap();
        assert_eq!(texts(&table), vec!["first", "second"]);
    }

    #[test]
    fn figure_caption_numbers_through_field() {
        let mut counter = MemoryCounter::starting_at(4);
        let first = figure_caption("Load", Language::English, &mut counter).unwrap();
        let second = figure_caption("Disk", Language::English, &mut counter).unwrap();
        assert_eq!(texts(&first), vec!["Figure ", "4", ":", " Load"]);
        assert_eq!(texts(&second)[1], "5");

        let mut instr = None;
        first.visit(&mut |n| {
            if n.is(WML_NS, "instrText") {
                instr = n.text.clone();
            }
        });
        assert_eq!(instr.as_deref(), Some(" SEQ Figure \\* ARABIC "));
    }
}
