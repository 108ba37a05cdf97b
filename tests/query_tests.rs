//! Query DSL properties exercised through the public API: parse → compile
//! behavior, escaping policy, and pagination math.

use sitesearch::search::{Page, ParsedQuery, SortOrder, compile, escape_term};

#[test]
fn plain_terms_conjoin_with_wildcards() {
    let compiled = compile(&ParsedQuery::parse("foo bar"));
    assert_eq!(compiled.as_deref(), Some("foo* AND bar*"));
}

#[test]
fn or_anywhere_groups_all_plain_terms() {
    let compiled = compile(&ParsedQuery::parse("foo OR bar"));
    assert_eq!(compiled.as_deref(), Some("(foo* OR bar*)"));

    // OR detected anywhere applies to the whole term group
    let compiled = compile(&ParsedQuery::parse("foo bar OR baz"));
    assert_eq!(compiled.as_deref(), Some("(foo* OR bar* OR baz*)"));
}

#[test]
fn full_dsl_compiles_field_phrase_term_in_order() {
    let parsed = ParsedQuery::parse(r#"title:rust "exact phrase" after:2024-01-01 guide"#);
    assert_eq!(parsed.after.as_deref(), Some("2024-01-01"));

    let compiled = compile(&parsed);
    assert_eq!(
        compiled.as_deref(),
        Some("title:rust* AND \"exact phrase\" AND guide*")
    );
}

#[test]
fn unrecognized_field_prefix_stays_literal() {
    // "tag" is not in the field set, so the whole token becomes a term
    // and compiles quoted (it contains a colon)
    let parsed = ParsedQuery::parse("tag:foo");
    assert!(parsed.field_searches.is_empty());
    assert_eq!(compile(&parsed).as_deref(), Some("\"tag:foo\""));
}

#[test]
fn operator_only_queries_compile_to_nothing() {
    assert_eq!(compile(&ParsedQuery::parse("AND OR NOT")), None);
    assert_eq!(compile(&ParsedQuery::parse("")), None);
}

#[test]
fn escaping_policy() {
    assert_eq!(escape_term("AND"), "\"AND\"");
    assert_eq!(escape_term("cat"), "cat*");
    assert_eq!(escape_term("cat*"), "cat*");
    assert_eq!(escape_term("a:b"), "\"a:b\"");
    assert_eq!(escape_term("quo\"te"), "\"quo\"\"te\"");
}

#[test]
fn pagination_metadata() {
    let page = Page::new(1, None, 20);
    assert_eq!(page.total_pages(47), 3);

    let beyond = Page::new(4, None, 20);
    assert_eq!(beyond.offset(), 60); // past the 47 results, page comes back empty
    assert_eq!(beyond.total_pages(47), 3);
}

#[test]
fn sort_param_fallback() {
    assert_eq!(SortOrder::from_param(Some("nonsense")), SortOrder::Relevance);
    assert_eq!(SortOrder::from_param(Some("date_asc")), SortOrder::DateAsc);
}
