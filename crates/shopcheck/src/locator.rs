//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a lazily evaluated reference to zero or more elements on
//! the current page. Nothing is resolved until a driver is asked about it,
//! and the selector never changes after the locator is built.
//!
//! The storefront exposes a closed set of [`LocatorName`]s. Scenario files
//! refer to them by their kebab-case name and are rejected at load time when
//! a name is not part of the set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::{CheckError, CheckResult};

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "#nav-logo-sprites")
    Css(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// CSS form of the selector, usable with `querySelectorAll`
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::Css(s) => s.clone(),
            Self::TestId(id) => format!("[data-testid=\"{id}\"]"),
        }
    }

    /// JavaScript expression yielding the number of matching elements
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!(
            "document.querySelectorAll({}).length",
            js_string(&self.to_css())
        )
    }

    /// JavaScript expression yielding whether any match is rendered visibly
    #[must_use]
    pub fn to_visible_query(&self) -> String {
        format!(
            "Array.from(document.querySelectorAll({})).some(el => {{ \
             const s = window.getComputedStyle(el); \
             return s.display !== 'none' && s.visibility !== 'hidden' \
             && s.opacity !== '0' && (el.offsetWidth > 0 || el.offsetHeight > 0); }})",
            js_string(&self.to_css())
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Quote a string as a JavaScript literal
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// The closed set of elements the storefront home page exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorName {
    /// Header search box
    SearchInput,
    /// Autocomplete suggestion panel under the search box
    SearchSuggestions,
    /// "All" hamburger button opening the category menu
    MenuToggle,
    /// Site logo in the header
    Logo,
    /// Marker class present while the category menu is open
    MenuVisible,
}

impl LocatorName {
    /// Every name, in declaration order
    pub const ALL: [Self; 5] = [
        Self::SearchInput,
        Self::SearchSuggestions,
        Self::MenuToggle,
        Self::Logo,
        Self::MenuVisible,
    ];

    /// Kebab-case name used in scenario files and reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SearchInput => "search-input",
            Self::SearchSuggestions => "search-suggestions",
            Self::MenuToggle => "menu-toggle",
            Self::Logo => "logo",
            Self::MenuVisible => "menu-visible",
        }
    }

    /// Comma-separated list of all names, for error messages
    #[must_use]
    pub fn known_names() -> String {
        Self::ALL
            .iter()
            .map(Self::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for LocatorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocatorName {
    type Err = CheckError;

    fn from_str(s: &str) -> CheckResult<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| CheckError::UnknownLocator {
                name: s.to_string(),
                known: Self::known_names(),
            })
    }
}

/// A named reference to elements on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    name: LocatorName,
    selector: Selector,
}

impl Locator {
    /// Create a locator with a CSS selector
    #[must_use]
    pub fn new(name: LocatorName, css: impl Into<String>) -> Self {
        Self::from_selector(name, Selector::Css(css.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(name: LocatorName, selector: Selector) -> Self {
        Self { name, selector }
    }

    /// Name the locator is registered under
    #[must_use]
    pub const fn name(&self) -> LocatorName {
        self.name
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.selector)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_passthrough() {
            let sel = Selector::css(".s-suggestion-container");
            assert_eq!(sel.to_css(), ".s-suggestion-container");
            assert_eq!(sel.to_string(), ".s-suggestion-container");
        }

        #[test]
        fn test_test_id_to_css() {
            let sel = Selector::test_id("cart");
            assert_eq!(sel.to_css(), "[data-testid=\"cart\"]");
        }

        #[test]
        fn test_count_query_escapes_quotes() {
            let sel = Selector::test_id("cart");
            assert_eq!(
                sel.to_count_query(),
                r#"document.querySelectorAll("[data-testid=\"cart\"]").length"#
            );
        }

        #[test]
        fn test_visible_query_checks_style() {
            let query = Selector::css("#nav-logo-sprites").to_visible_query();
            assert!(query.contains(r##"querySelectorAll("#nav-logo-sprites")"##));
            assert!(query.contains("visibility"));
            assert!(query.contains("display"));
        }
    }

    mod locator_name_tests {
        use super::*;

        #[test]
        fn test_round_trip_every_name() {
            for name in LocatorName::ALL {
                assert_eq!(name.as_str().parse::<LocatorName>().unwrap(), name);
            }
        }

        #[test]
        fn test_unknown_name_fails_fast() {
            let err = "menuAll".parse::<LocatorName>().unwrap_err();
            match err {
                CheckError::UnknownLocator { name, known } => {
                    assert_eq!(name, "menuAll");
                    assert!(known.contains("menu-toggle"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_names_are_unique() {
            let mut names: Vec<_> = LocatorName::ALL.iter().map(LocatorName::as_str).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), LocatorName::ALL.len());
        }

        #[test]
        fn test_serde_uses_kebab_case() {
            let json = serde_json::to_string(&LocatorName::SearchSuggestions).unwrap();
            assert_eq!(json, "\"search-suggestions\"");
        }
    }

    #[test]
    fn test_locator_display() {
        let loc = Locator::new(LocatorName::Logo, "#nav-logo-sprites");
        assert_eq!(loc.to_string(), "logo (#nav-logo-sprites)");
        assert_eq!(loc.name(), LocatorName::Logo);
    }
}
