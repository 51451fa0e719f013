//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod mock_publisher;

/// Catalogue with one direct publisher per delivery shape, rooted at `base`.
///
/// - `p1` (journal "J1"): primary only, `{base}/p1/{doi}`.
/// - `p2` (journal "J2", alias "J2 Abbrev"): primary `{base}/p2/{doi}/pdf`,
///   declared fallback-after-verification to `{base}/p2/{volume}/{first_page}`.
/// - `p3` (journal "J3"): primary needs `item_id`, fallback uses `doi`.
/// - `p4` (journal "J4"): form-post delivery, landing page `{base}/p4/{doi}`.
#[must_use]
pub fn catalogue_json(base: &str) -> String {
    serde_json::json!({
        "publishers": [
            {
                "id": "p1",
                "name": "Publisher One",
                "templates": [
                    { "role": "primary", "pattern": format!("{base}/p1/{{doi}}") }
                ]
            },
            {
                "id": "p2",
                "fallback_after_verification_failure": true,
                "templates": [
                    { "role": "primary", "pattern": format!("{base}/p2/{{doi}}/pdf") },
                    { "role": "fallback", "pattern": format!("{base}/p2/{{volume}}/{{first_page}}") }
                ]
            },
            {
                "id": "p3",
                "templates": [
                    { "role": "primary", "pattern": format!("{base}/p3/item/{{item_id}}") },
                    { "role": "fallback", "pattern": format!("{base}/p3/doi/{{doi}}") }
                ]
            },
            {
                "id": "p4",
                "delivery": "form_post",
                "templates": [
                    { "role": "primary", "pattern": format!("{base}/p4/{{doi}}") }
                ]
            }
        ],
        "journals": [
            { "key": "J1", "publisher": "p1" },
            { "key": "J2", "publisher": "p2", "aliases": ["J2 Abbrev"] },
            { "key": "J3", "publisher": "p3" },
            { "key": "J4", "publisher": "p4" }
        ]
    })
    .to_string()
}
