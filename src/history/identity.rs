//! Identity Resolver
//!
//! Single source of truth for deciding whether two spellings name the same
//! trackable concept. Comparison is exact after trimming and case folding;
//! substring matching belongs to text search, not identity.

use super::types::SurfaceForms;

fn same_text(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// True when `typed` is the occurrence form or the canonical form.
pub fn matches(forms: &SurfaceForms, typed: &str) -> bool {
    if same_text(&forms.occurrence_form, typed) {
        return true;
    }
    forms.canonical().is_some_and(|canonical| same_text(canonical, typed))
}

/// Same rules as [`matches`], applied to a persisted record key. The key may
/// hold either form depending on which one was written first.
pub fn key_matches(stored_key: &str, forms: &SurfaceForms) -> bool {
    matches(forms, stored_key)
}

/// Exact match against the inflected form used in one example context.
pub fn matches_usage(usage_form: &str, typed: &str) -> bool {
    same_text(usage_form, typed)
}

pub fn same_concept(a: &SurfaceForms, b: &SurfaceForms) -> bool {
    if same_text(&a.occurrence_form, &b.occurrence_form) {
        return true;
    }
    if let Some(canonical) = b.canonical() {
        if same_text(&a.occurrence_form, canonical) {
            return true;
        }
    }
    match (a.canonical(), b.canonical()) {
        (Some(ca), _) if same_text(ca, &b.occurrence_form) => true,
        (Some(ca), Some(cb)) => same_text(ca, cb),
        _ => false,
    }
}

/// Persisted key: the canonical form when present so duplicates collapse
/// onto one record.
pub fn record_key(forms: &SurfaceForms) -> &str {
    forms
        .canonical()
        .unwrap_or_else(|| forms.occurrence_form.trim())
}

/// Case-insensitive equality of two stored keys.
pub fn same_key(a: &str, b: &str) -> bool {
    same_text(a, b)
}

pub fn is_canonical_key(stored_key: &str, forms: &SurfaceForms) -> bool {
    same_text(stored_key, record_key(forms))
}
