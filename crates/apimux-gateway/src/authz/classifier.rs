//! Path classification
//!
//! Pure predicates deciding which paths bypass authorization entirely.
//! No I/O; the public pattern set is compiled once.

use apimux_core::PathPatternSet;
use lazy_static::lazy_static;

/// Paths served without authentication or authorization, first match wins
const PUBLIC_PATTERNS: [&str; 4] = [
    "/widget/**",
    "/api/auth/**",
    "/api/internal/**",
    "/files/**",
];

/// Marker identifying provider webhook callbacks on proxied routes.
///
/// These skip the team permission checks; providers cannot carry a team
/// credential when they call back.
pub const WEBHOOK_CALLBACK_MARKER: &str = "/webhook/callback";

lazy_static! {
    static ref PUBLIC_SET: PathPatternSet =
        PathPatternSet::new(PUBLIC_PATTERNS).expect("public path patterns are valid");
}

/// Classifies request paths ahead of any authorization work.
pub struct PathClassifier;

impl PathClassifier {
    /// Whether the path is served to anyone, valid credentials or not.
    pub fn is_public(path: &str) -> bool {
        PUBLIC_SET.matches(path)
    }

    /// Whether the path is a health probe.
    pub fn is_health_endpoint(path: &str) -> bool {
        path.ends_with("/health") || path.ends_with("/health/")
    }
}
