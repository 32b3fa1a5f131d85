use std::path::Path;

use docxside_writer::{
    Block, Content, CoreProperties, DEFAULT_WINDOW, Element, FileCounter, MemoryCounter, Package,
    Paragraph, Picture, Run, advanced_replace, advanced_search, build_report, read_text, search,
};
use regex::Regex;

fn letter(out: &Path) {
    let greeting = Paragraph::from_runs(vec![
        Run::plain("Dear {{na"),
        Run::new("me}}", "b"),
        Run::plain(","),
    ]);
    let blocks = vec![
        Block::Paragraph(greeting),
        Block::paragraph("Your order {{order}} has shipped."),
    ];
    build_report(blocks, None, &CoreProperties::default(), &mut MemoryCounter::default(), out)
        .unwrap();
}

#[test]
fn split_placeholder_is_replaced_in_saved_package() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("letter.docx");
    letter(&template);

    let name = Regex::new(r"\{\{name\}\}").unwrap();
    let mut package = Package::open(&template).unwrap();
    assert!(search(package.document(), &name));
    let found = advanced_search(package.document(), &Regex::new(r"\{\{\w+\}\}").unwrap(), DEFAULT_WINDOW);
    assert_eq!(
        found.into_iter().collect::<Vec<_>>(),
        vec!["{{name}}".to_string(), "{{order}}".to_string()]
    );

    let count = advanced_replace(package.document_mut(), &name, &Content::from("Alice"), DEFAULT_WINDOW);
    assert_eq!(count, 1);
    assert!(!search(package.document(), &name));

    let out = dir.path().join("filled.docx");
    let rels = package.relationships();
    package.save(&CoreProperties::default(), &rels, &out).unwrap();
    assert_eq!(
        read_text(&out).unwrap(),
        vec!["Dear Alice,", "Your order {{order}} has shipped."]
    );

    let reopened = Package::open(&out).unwrap();
    assert!(!search(reopened.document(), &name));
}

#[test]
fn placeholder_replaced_by_table_lands_after_paragraph() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("letter.docx");
    letter(&template);

    let mut package = Package::open(&template).unwrap();
    let table = docxside_writer::Table::from_text(&[vec!["item", "qty"], vec!["bolts", "12"]])
        .heading(true)
        .build()
        .unwrap();
    let order = Regex::new(r"\{\{order\}\}").unwrap();
    let count = advanced_replace(package.document_mut(), &order, &Content::Node(table), DEFAULT_WINDOW);
    assert_eq!(count, 1);

    let body: Vec<&Element> = package.document().body().children.iter().collect();
    let position = body.iter().position(|n| n.is_w("tbl")).unwrap();
    assert!(body[position - 1].is_w("p"));
    assert_eq!(
        package.document().text(),
        vec!["Dear {{name}},", "Your order  has shipped.", "item", "qty", "bolts", "12"]
    );
}

#[test]
fn figure_numbers_continue_across_reports() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("load.png");
    image::RgbImage::new(64, 32).save(&png).unwrap();
    let seq = dir.path().join("docx_seq");

    for name in ["first.docx", "second.docx"] {
        let blocks = vec![
            Block::Picture(Picture::new(&png, "load").width(32)),
            Block::FigureCaption { text: "load".into(), language: Default::default() },
        ];
        let mut counter = FileCounter::new(&seq);
        build_report(blocks, None, &CoreProperties::default(), &mut counter, &dir.path().join(name))
            .unwrap();
    }

    assert_eq!(read_text(&dir.path().join("first.docx")).unwrap(), vec!["Figure 1: load"]);
    assert_eq!(read_text(&dir.path().join("second.docx")).unwrap(), vec!["Figure 2: load"]);
    assert_eq!(std::fs::read_to_string(&seq).unwrap(), "3");
}
