//! Principal discovery from a `current-user-principal` PROPFIND response.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::tree::find_xml_values;
use crate::error::{ProviderError, ProviderResult};

/// Principal ids on iCloud are exactly ten digits.
pub const ICLOUD_PRINCIPAL_PATTERN: &str = "^[0-9]{10}$";

const PRINCIPAL_HREF_PATH: &[&str] = &[
    "multistatus",
    "response",
    "propstat",
    "prop",
    "current-user-principal",
    "href",
];

const PRINCIPAL_MARKER: &str = "/principal";

static ICLOUD_PRINCIPAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(ICLOUD_PRINCIPAL_PATTERN).expect("Invalid principal regex")
});

/// Decides which href path segment is the principal id.
#[derive(Debug, Clone)]
pub struct PrincipalMatcher {
    pattern: Regex,
}

impl PrincipalMatcher {
    /// Creates a matcher from a regular expression. The expression is
    /// applied to single path segments, so anchor it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the expression does not compile.
    pub fn new(pattern: &str) -> ProviderResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            ProviderError::configuration(format!("invalid principal pattern {pattern:?}: {e}"))
                .with_source(e)
        })?;
        Ok(Self { pattern })
    }

    /// The iCloud rule: ten ASCII digits.
    pub fn icloud() -> Self {
        Self {
            pattern: ICLOUD_PRINCIPAL_REGEX.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn is_match(&self, segment: &str) -> bool {
        self.pattern.is_match(segment)
    }

    /// First segment of `href` accepted by this matcher.
    pub fn find_in<'a>(&self, href: &'a str) -> Option<&'a str> {
        href.split('/').find(|segment| self.is_match(segment))
    }
}

impl Default for PrincipalMatcher {
    fn default() -> Self {
        Self::icloud()
    }
}

/// Resolves the principal id of the authenticated user.
///
/// Takes the first `current-user-principal/href` that contains
/// `/principal` and returns its first segment accepted by `matcher`.
///
/// # Errors
///
/// Returns a parse error for malformed XML, and
/// [`PrincipalNotFound`](crate::ProviderErrorCode::PrincipalNotFound) when
/// there is no principal href or none of its segments match.
pub fn resolve_principal(xml: &str, matcher: &PrincipalMatcher) -> ProviderResult<String> {
    let hrefs = find_xml_values(xml, PRINCIPAL_HREF_PATH)?;

    let href = hrefs
        .iter()
        .find(|href| href.contains(PRINCIPAL_MARKER))
        .ok_or_else(|| {
            ProviderError::principal_not_found(format!(
                "no current-user-principal href among {} candidate(s)",
                hrefs.len()
            ))
        })?;

    let principal = matcher.find_in(href).ok_or_else(|| {
        ProviderError::principal_not_found(format!(
            "href {href:?} has no segment matching {}",
            matcher.as_str()
        ))
    })?;

    debug!(principal = %principal, "Resolved principal");
    Ok(principal.to_string())
}
