//! Filter-expression helpers for the relational endpoint's query grammar.
//!
//! The grammar is positional (`column=op.value`), with `or=(...)`/`and=(...)`
//! for composites; user-supplied terms must not carry grammar characters.

use domains::models::GeoBounds;
use uuid::Uuid;

/// `eq.` predicate value.
pub fn eq(value: impl ToString) -> String {
    format!("eq.{}", value.to_string())
}

/// `in.(a,b,c)` predicate value for id batches.
pub fn in_ids(ids: &[Uuid]) -> String {
    let joined = ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({joined})")
}

/// A `*term*` pattern for `ilike`, with grammar characters stripped from
/// the user-supplied term.
pub fn ilike_term(term: &str) -> String {
    let cleaned: String = term
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '%'))
        .collect();
    format!("*{}*", cleaned.trim())
}

/// `or=(...)` disjunction over name and username for profile search.
pub fn profile_search(term: &str) -> String {
    let pattern = ilike_term(term);
    format!("(name.ilike.{pattern},username.ilike.{pattern})")
}

/// `or=(...)` disjunction over restaurant name and cuisine tags.
pub fn restaurant_search(term: &str) -> String {
    let pattern = ilike_term(term);
    let cleaned = pattern.trim_matches('*');
    format!("(name.ilike.{pattern},cuisines.cs.{{{cleaned}}})")
}

/// `and=(...)` conjunction boxing a map viewport.
pub fn bounds_filter(bounds: GeoBounds) -> String {
    format!(
        "(lat.gte.{},lat.lte.{},lng.gte.{},lng.lte.{})",
        bounds.south, bounds.north, bounds.west, bounds.east
    )
}
