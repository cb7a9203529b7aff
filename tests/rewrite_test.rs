//! Tests for the structural rewrite primitives

use rstest::rstest;

use tipitree::domain::{rewrite, DomainError, XmlTree};
use tipitree::infrastructure::xml::parse_str;
use tipitree::util::testing::compact;

fn parse(source: &str) -> XmlTree {
    parse_str(source).expect("fixture parses")
}

#[test]
fn given_same_tag_nodes_when_merging_then_text_and_children_are_conserved() {
    // Arrange
    let mut tree = parse(r#"<r><a k="1">x<c/>y</a><a k="2">z<d/>w</a></r>"#);
    let found = tree.find_all(&["a"]);
    let (a, b) = (found[0], found[1]);
    let expected_text = tree.text_content(a) + &tree.text_content(b);
    let expected_children = tree.children(a).len() + tree.children(b).len();

    // Act
    rewrite::merge(&mut tree, a, b).unwrap();

    // Assert
    assert_eq!(tree.text_content(a), expected_text);
    assert_eq!(tree.children(a).len(), expected_children);
    assert_eq!(tree[a].attr("k"), Some("1"));
    assert!(tree[b].attrs.is_empty());
    assert!(tree.children(b).is_empty());
}

#[test]
fn given_childless_target_when_merging_then_text_is_concatenated() {
    let mut tree = parse("<r><v>one </v><v>two</v></r>");
    let found = tree.find_all(&["v"]);

    rewrite::absorb(&mut tree, found[0], found[1]).unwrap();

    assert_eq!(compact(&tree), "<r><v>one two</v></r>");
    assert!(!tree.contains(found[1]));
}

#[test]
fn given_different_tags_when_merging_then_fails_as_malformed() {
    let mut tree = parse("<r><a/><b/></r>");
    let a = tree.find_all(&["a"])[0];
    let b = tree.find_all(&["b"])[0];

    let result = rewrite::merge(&mut tree, a, b);

    assert!(matches!(result, Err(DomainError::MalformedInput { .. })));
}

#[test]
fn given_tag_set_when_neighbor_to_child_then_stops_at_next_member() {
    let mut tree = parse("<r><a/><b/><c/></r>");

    rewrite::neighbor_to_child(&mut tree, &["a", "b"]).unwrap();

    assert_eq!(compact(&tree), "<r><a></a><b><c></c></b></r>");
}

#[rstest]
#[case("<r><chapter/><p>1</p><p>2</p><chapter/><p>3</p></r>")]
#[case("<r><p>0</p><section/><p>1</p><section/></r>")]
#[case("<r><x><chapter/><p>1</p></x><chapter/></r>")]
fn given_flat_run_when_siblings_to_child_twice_then_same_as_once(#[case] source: &str) {
    let mut once = parse(source);
    for tag in ["chapter", "section"] {
        rewrite::siblings_to_child(&mut once, tag).unwrap();
    }
    let mut twice = once.clone();
    for tag in ["chapter", "section"] {
        rewrite::siblings_to_child(&mut twice, tag).unwrap();
    }

    assert_eq!(compact(&once), compact(&twice));
}

#[test]
fn given_flat_chapters_when_siblings_to_child_then_nests_following_markup() {
    let mut tree = parse("<r><chapter/><p>1</p><p>2</p><chapter/><p>3</p></r>");

    rewrite::siblings_to_child(&mut tree, "chapter").unwrap();

    assert_eq!(
        compact(&tree),
        "<r><chapter><p>1</p><p>2</p></chapter><chapter><p>3</p></chapter></r>"
    );
}

#[test]
fn given_tags_when_removing_then_subtrees_are_dropped_and_root_survives() {
    let mut tree = parse("<book><book>t<x/></book><p>keep</p></book>");

    rewrite::remove(&mut tree, &["book"]);

    assert_eq!(compact(&tree), "<book><p>keep</p></book>");
}

#[test]
fn given_single_redundant_wrapper_when_remove_empty_then_one_level_is_removed() {
    // Arrange
    let mut tree = parse(r#"<r><tree t="x"><tree><a/><b/><c/></tree></tree></r>"#);
    let before = tree.depth();

    // Act
    rewrite::remove_empty(&mut tree, &["tree"]).unwrap();

    // Assert
    assert_eq!(tree.depth(), before - 1);
    assert_eq!(
        compact(&tree),
        r#"<r><tree t="x"><a></a><b></b><c></c></tree></r>"#
    );
}

#[test]
fn given_wrapper_with_attributes_when_remove_empty_then_is_kept() {
    let source = r#"<r><tree t="x"><tree t="y"><a/></tree></tree></r>"#;
    let mut tree = parse(source);

    rewrite::remove_empty(&mut tree, &["tree"]).unwrap();

    assert_eq!(compact(&tree), compact(&parse(source)));
}

#[test]
fn given_wrapper_between_siblings_when_remove_empty_then_order_is_preserved() {
    let mut tree = parse("<t><a/><t>x<b/>y<c/></t>z<d/></t>");

    rewrite::remove_empty(&mut tree, &["t"]).unwrap();

    assert_eq!(compact(&tree), "<t><a></a>x<b></b>y<c></c>z<d></d></t>");
}

#[test]
fn given_childless_nodes_when_text_to_attr_then_text_moves() {
    let mut tree = parse("<r><book>Dīgha</book><book/></r>");

    rewrite::text_to_attr(&mut tree, "book", "title").unwrap();

    assert_eq!(
        compact(&tree),
        r#"<r><book title="Dīgha"></book><book title=""></book></r>"#
    );
}

#[test]
fn given_node_with_children_when_text_to_attr_then_fails() {
    let mut tree = parse("<r><book>x<i/></book></r>");

    let result = rewrite::text_to_attr(&mut tree, "book", "title");

    assert!(matches!(result, Err(DomainError::MalformedInput { .. })));
}

#[test]
fn given_inline_wrapper_when_lift_up_then_content_stays_in_place() {
    let mut tree = parse("<a><x/><b>hel<c/>lo</b>!<y/></a>");

    rewrite::lift_up(&mut tree, "b").unwrap();

    assert_eq!(compact(&tree), "<a><x></x>hel<c></c>lo!<y></y></a>");
}

#[test]
fn given_adjacent_same_tags_when_combining_then_runs_merge() {
    let mut tree = parse("<r><b>1</b><b>2</b><a/><b>3</b></r>");

    rewrite::combine_siblings(&mut tree, "b").unwrap();

    assert_eq!(compact(&tree), "<r><b>12</b><a></a><b>3</b></r>");
}

#[test]
fn given_tag_when_renaming_then_all_matches_change() {
    let mut tree = parse("<r><old/><x><old/></x></r>");

    rewrite::rename(&mut tree, "old", "new");

    assert_eq!(tree.find_all(&["new"]).len(), 2);
    assert!(tree.find_all(&["old"]).is_empty());
}

#[test]
fn given_padded_text_when_trimming_then_empty_fragments_disappear() {
    let mut tree = parse("<r><p> a <b> b </b> tail </p><p>   x</p></r>");

    rewrite::trim_text(&mut tree);

    assert_eq!(compact(&tree), "<r><p>a<b>b</b>tail</p><p>x</p></r>");
}
