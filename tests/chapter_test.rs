//! Tests for chapter normalization

use std::sync::Arc;

use rstest::rstest;

use tipitree::domain::chapter::{
    extract_numbers_from_titles, lift_numbers, merge_verses, normalize_chapter_headings,
};
use tipitree::domain::{ChapterNormalizer, DomainError, RuleStylesheet, XmlTree};
use tipitree::infrastructure::xml::parse_str;
use tipitree::util::testing::{compact, init_test_setup};

fn parse(source: &str) -> XmlTree {
    parse_str(source).expect("fixture parses")
}

const RAW_CHAPTER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI.2>
  <teiHeader/>
  <text>
    <body>
      <p rend="nikaya">Dīghanikāyo</p>
      <head rend="book">Sīlakkhandhavaggapāḷi</head>
      <head rend="chapter">1. Brahmajālasuttaṃ</head>
      <p rend="subhead">Paribbājakakathā</p>
      <p rend="bodytext" n="1"><hi rend="paranum">1</hi><hi rend="dot">.</hi> Evaṃ me sutaṃ</p>
      <p rend="gatha1">line one,</p>
      <p rend="gathalast">line two.</p>
    </body>
  </text>
</TEI.2>
"#;

#[test]
fn given_raw_chapter_when_normalizing_then_produces_nested_canonical_tree() {
    // Arrange
    init_test_setup();
    let stylesheet = Arc::new(RuleStylesheet::builtin().unwrap());
    let normalizer = ChapterNormalizer::new(stylesheet);
    let fragment = parse(RAW_CHAPTER);

    // Act
    let chapter = normalizer.normalize(&fragment).unwrap();

    // Assert
    assert_eq!(
        compact(&chapter),
        concat!(
            r#"<body><subsection title="Paribbājakakathā">"#,
            r#"<p nr="1">Evaṃ me sutaṃ</p>"#,
            r#"<verse>line one,line two.</verse>"#,
            r#"</subsection></body>"#
        )
    );
    // the input is not modified
    assert_eq!(fragment[fragment.root()].tag, "TEI.2");
}

#[test]
fn given_verse_groups_when_merging_then_first_marks_start_new_groups() {
    let mut tree = parse(concat!(
        "<r>",
        r#"<verse idx="first">1</verse><verse>2</verse>"#,
        r#"<verse idx="first">3</verse><verse>4</verse>"#,
        "</r>"
    ));

    merge_verses(&mut tree).unwrap();

    assert_eq!(compact(&tree), "<r><verse>12</verse><verse>34</verse></r>");
}

#[test]
fn given_separated_verses_when_merging_then_both_survive_without_markers() {
    let mut tree = parse(r#"<r><verse idx="x">a</verse><p/><verse idx="y">b</verse></r>"#);

    merge_verses(&mut tree).unwrap();

    assert_eq!(compact(&tree), "<r><verse>a</verse><p></p><verse>b</verse></r>");
}

#[test]
fn given_verse_with_markup_when_merging_then_children_are_reparented() {
    let mut tree = parse("<r><verse>a<b>x</b>y</verse><verse>c<i/></verse></r>");

    merge_verses(&mut tree).unwrap();

    assert_eq!(
        compact(&tree),
        "<r><verse>a<b>x</b>yc<i></i></verse></r>"
    );
}

#[test]
fn given_number_in_paragraph_when_lifting_then_paragraph_is_numbered() {
    let mut tree = parse(r#"<r><p><number nr="7"/> text</p></r>"#);

    lift_numbers(&mut tree).unwrap();

    assert_eq!(compact(&tree), r#"<r><p nr="7"> text</p></r>"#);
}

#[test]
fn given_number_before_verse_when_lifting_then_verse_is_numbered() {
    let mut tree = parse(r#"<r><number nr="5"/><verse>x</verse></r>"#);

    lift_numbers(&mut tree).unwrap();

    assert_eq!(compact(&tree), r#"<r><verse nr="5">x</verse></r>"#);
}

#[test]
fn given_number_without_nr_when_lifting_then_fails_as_malformed() {
    let mut tree = parse("<r><p><number/>x</p></r>");

    let result = lift_numbers(&mut tree);

    assert!(matches!(result, Err(DomainError::MalformedInput { .. })));
}

#[rstest]
#[case("12. Introduction", Some("12"), "Introduction")]
#[case("1-3. Range", Some("1-3"), "Range")]
#[case("Introduction", None, "Introduction")]
#[case("12.Introduction", None, "12.Introduction")]
fn given_title_when_extracting_numbers_then_splits_only_matching_prefix(
    #[case] title: &str,
    #[case] nr: Option<&str>,
    #[case] rest: &str,
) {
    let mut tree = XmlTree::new("r");
    let root = tree.root();
    let node = tree.append_element(root, "section").unwrap();
    tree[node].set_attr("title", title);

    extract_numbers_from_titles(&mut tree);

    assert_eq!(tree[node].attr("nr"), nr);
    assert_eq!(tree[node].attr("title"), Some(rest));
}

#[test]
fn given_chapter_headings_when_normalizing_then_number_and_title_are_split() {
    let mut tree = parse("<r><chapter>12. Name</chapter><chapter>Intro</chapter></r>");

    normalize_chapter_headings(&mut tree).unwrap();

    assert_eq!(
        compact(&tree),
        r#"<r><chapter nr="12" title="Name"></chapter><chapter title="Intro"></chapter></r>"#
    );
}

#[test]
fn given_chapter_with_children_when_normalizing_headings_then_reports_malformed() {
    let mut tree = parse("<r><chapter>1. A<p/></chapter></r>");

    let result = normalize_chapter_headings(&mut tree);

    assert!(matches!(result, Err(DomainError::MalformedInput { .. })));
}

#[test]
fn given_custom_stylesheet_when_normalizing_then_rules_drive_the_transform() {
    let stylesheet = RuleStylesheet::from_toml(
        r#"
root = "content"

[[rule]]
match = "h"
action = "rename"
to = "section"
text_to = "title"

[[rule]]
match = "l"
action = "rename"
to = "verse"
"#,
    )
    .unwrap();
    let normalizer = ChapterNormalizer::new(Arc::new(stylesheet));
    let fragment = parse("<doc><h>2. Second</h><l>a</l><l>b</l></doc>");

    let chapter = normalizer.normalize(&fragment).unwrap();

    assert_eq!(
        compact(&chapter),
        r#"<content><section nr="2" title="Second"><verse>ab</verse></section></content>"#
    );
}
