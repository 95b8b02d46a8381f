use serde_json::json;
use sl24_augment::matching::{compare, compare_values, ComparisonResult};

use ComparisonResult::{Identical, Indeterminate, NoMatch, PartialMatch};

#[test]
fn test_empty_or_non_string_is_indeterminate() {
    assert_eq!(compare("foo", ""), Indeterminate);
    assert_eq!(compare(" ", "   "), Indeterminate);
    assert_eq!(compare("", "tak"), Indeterminate);
    assert_eq!(compare_values(&json!(3), &json!("foo")), Indeterminate);
    assert_eq!(compare_values(&json!("foo"), &json!(null)), Indeterminate);
    assert_eq!(compare_values(&json!("tak"), &json!("tak")), Identical);
}

#[test]
fn test_identical_after_trim() {
    assert_eq!(compare("tak", "tak"), Identical);
    assert_eq!(compare("tak ", " tak"), Identical);
    assert_eq!(compare("Hvorfra?", "Hvorfra?"), Identical);
    assert_eq!(compare("dag, -en", "dag, -en"), Identical);
    assert_eq!(compare("at lave", "at lave"), Identical);
}

#[test]
fn test_plural_marker_is_ignored() {
    assert_eq!(compare("de her", "de her (pl.)"), Identical);
}

#[test]
fn test_single_word_has_no_partial_credit() {
    assert_eq!(compare("godaften", "godaften"), Identical);
    assert_eq!(compare("godmorgen ", " godmorgen"), Identical);
    assert_eq!(compare("godaften", "godmorgen"), NoMatch);
    assert_eq!(compare("Godaften", "godaften"), NoMatch);
    assert_eq!(compare("fooäöü", "fooäöübar"), NoMatch);
}

#[test]
fn test_sentence_leading_case_and_trailing_punctuation() {
    assert_eq!(compare("lovely day, isn't it?", "Lovely day, isn't it?"), PartialMatch);
    assert_eq!(compare("Lovely day, isn't it", "Lovely day, isn't it?"), PartialMatch);
    assert_eq!(compare("undskyld", "Undskyld, ..."), PartialMatch);
}

#[test]
fn test_sentence_interior_differences() {
    assert_eq!(compare("Lovely day isnt it?", "Lovely day, isn't it?"), NoMatch);
    assert_eq!(compare("Lovely Day isn't it?", "Lovely day, isn't it?"), NoMatch);
    assert_eq!(compare("Lovly day, isn't it?", "Lovely day, isn't it?"), NoMatch);
}

#[test]
fn test_phrase_list_is_order_and_delimiter_independent() {
    assert_eq!(compare("at spille, at lege", "at lege, at spille"), Identical);
    assert_eq!(compare("at spille, at lege", "at lege,at spille"), Identical);
    assert_eq!(compare("at spille, at lege", "at lege / at spille"), Identical);
}

#[test]
fn test_phrase_list_subsets() {
    assert_eq!(compare("bar, foo", "foo, bar, baz"), PartialMatch);
    assert_eq!(compare("foo, bar, baz", "foo, bar"), NoMatch);
    assert_eq!(compare("foo, qux", "foo, bar, baz"), NoMatch);
}

#[test]
fn test_parenthetical_alternatives() {
    assert_eq!(compare("god, godt", "god(t)"), Identical);
    assert_eq!(compare("gammel, gammelt, gamle", "gammel(t), gamle (pl.)"), Identical);
    assert_eq!(compare("gammel, gamle", "gammel(t), gamle (pl.)"), PartialMatch);
}

#[test]
fn test_hyphen_suffixes() {
    assert_eq!(compare("nat, natten", "nat, -ten"), Identical);
    assert_eq!(
        compare("frokost, frokosten, middag, middagen", "frokost, - en, middag, -en"),
        Identical
    );
    assert_eq!(compare("middag, frokosten", "frokost, - en, middag, -en"), PartialMatch);
}

#[test]
fn test_ddel_dlen_spelling() {
    assert_eq!(compare("pengeseddel, pengesedlen", "pengeseddel, -sedlen"), Identical);
    assert_eq!(compare("vaskemiddel, vaskemidlen", "vaskemiddel, -midlen"), Identical);
}

#[test]
fn test_css_classes_follow_verdicts() {
    assert_eq!(compare("tak", "tak").css_class(), Some("correct"));
    assert_eq!(compare("bar", "foo, bar").css_class(), Some("partially-correct"));
    assert_eq!(compare("tack", "tak").css_class(), Some("incorrect"));
    assert_eq!(compare("", "tak").css_class(), None);
}
