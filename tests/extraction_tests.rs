//! Extraction module tests
//!
//! These tests verify selector-scoped conversion of rendered HTML to text.

use pretty_assertions::assert_eq;
use react_scrape::extraction::DEFAULT_WRAPPER_ID;
use react_scrape::{SelectorSpec, TextConverter};

fn convert(html: &str, selector: &SelectorSpec) -> String {
    TextConverter::new().convert(html, selector).unwrap().text
}

#[test]
fn test_default_selector_targets_wrapper() {
    let html = format!(
        r#"<html><body>
            <header>Site header</header>
            <div id="{DEFAULT_WRAPPER_ID}"><h2>Overview</h2><p>The content.</p></div>
            <footer>Copyright</footer>
        </body></html>"#
    );

    let text = convert(&html, &SelectorSpec::default());

    assert!(text.contains("Overview"));
    assert!(text.contains("The content."));
    assert!(!text.contains("Site header"));
    assert!(!text.contains("Copyright"));
}

#[test]
fn test_structure_survives_as_text() {
    let html = r#"<div id="x"><h2>Steps</h2><ul><li>One</li><li>Two</li></ul><p>Done.</p></div>"#;
    let text = convert(html, &SelectorSpec::tag("div").with_attr("id", "x"));

    let steps = text.find("Steps").unwrap();
    let one = text.find("One").unwrap();
    let two = text.find("Two").unwrap();
    let done = text.find("Done.").unwrap();
    assert!(steps < one && one < two && two < done);
    assert!(text.ends_with('\n'));
    assert!(!text.contains("\n\n\n"));
}

#[test]
fn test_scripts_and_styles_removed() {
    let html = r#"<div id="x"><style>.a{color:red}</style><p>Visible</p><script>var hidden = 1;</script></div>"#;
    let text = convert(html, &SelectorSpec::tag("div").with_attr("id", "x"));

    assert_eq!(text, "Visible\n");
}

#[test]
fn test_prose_punctuation_is_not_escaped() {
    let html = r#"<div id="x"><h2>Title</h2><p>snake_case_name and 2*3 = 6 [note]</p><p>1. not a list</p></div>"#;
    let text = convert(html, &SelectorSpec::tag("div").with_attr("id", "x"));

    assert_eq!(text, "## Title\n\nsnake_case_name and 2*3 = 6 [note]\n\n1. not a list\n");
}

#[test]
fn test_entities_round_trip_as_characters() {
    let html = r#"<div id="x"><p>Fish &amp; chips &lt;today&gt;</p></div>"#;
    let text = convert(html, &SelectorSpec::tag("div").with_attr("id", "x"));

    assert!(text.contains("Fish & chips"));
    assert!(!text.contains("&amp;"));
}

#[test]
fn test_attribute_only_selector() {
    let html = r#"<section data-role="main"><p>Kept</p></section><section><p>Dropped</p></section>"#;
    let text = convert(html, &SelectorSpec::any().with_attr("data-role", "main"));

    assert_eq!(text, "Kept\n");
}

#[test]
fn test_attribute_values_compared_verbatim() {
    let html = r#"<div id="a.b"><p>Dotted id</p></div><div id="a"><p>Plain</p></div>"#;
    let text = convert(html, &SelectorSpec::tag("div").with_attr("id", "a.b"));

    assert_eq!(text, "Dotted id\n");
}

#[test]
fn test_no_match_is_empty_not_error() {
    let result = TextConverter::new()
        .convert("<p>nothing</p>", &SelectorSpec::tag("article"))
        .unwrap();

    assert_eq!(result.matches, 0);
    assert!(result.is_empty());
    assert_eq!(result.text, "");
}

#[test]
fn test_word_count() {
    let result = TextConverter::new()
        .convert("<main><p>three little words</p></main>", &SelectorSpec::tag("main"))
        .unwrap();

    assert_eq!(result.matches, 1);
    assert_eq!(result.word_count, 3);
}
