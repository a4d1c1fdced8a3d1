//! Projection normalisation for annotation fields.
//!
//! Callers may project annotation data with the nested field names of the
//! entity (`annotationSets.annotations.age`). The persistence layer expects
//! the flat annotation names instead.

use crate::params::RequestOptions;

const REWRITES: [(&str, &str); 3] = [
    ("annotationSets.annotations.", "annotation."),
    ("annotationSets.variableSetId.", "variableSet."),
    ("annotationSets.id.", "annotationSet."),
];

/// Rewrite one projection field.
#[must_use]
pub fn normalize_field(field: &str) -> String {
    REWRITES
        .iter()
        .find_map(|(from, to)| field.strip_prefix(from).map(|rest| format!("{to}{rest}")))
        .unwrap_or_else(|| field.to_string())
}

/// Rewrite the include and exclude lists of `options` in place.
pub fn normalize_projection(options: &mut RequestOptions) {
    for fields in [&mut options.include, &mut options.exclude] {
        for field in fields.iter_mut() {
            *field = normalize_field(field);
        }
    }
}
