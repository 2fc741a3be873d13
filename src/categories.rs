//! Category sets: the names a rule is tested against.
use std::collections::BTreeSet;
use std::fmt;

/// The set of active categories for a render.
///
/// Categories are opaque names (host facts, roles, tags) compared for
/// membership only. The set is ordered so that listings and log output are
/// deterministic.
///
/// # Examples
///
/// ```
/// use uconf_cli::categories::CategorySet;
///
/// let active: CategorySet = ["web", "prod"].into_iter().collect();
/// assert!(active.contains("web"));
/// assert!(!active.contains("db"));
/// assert_eq!(active.to_string(), "prod, web");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    names: BTreeSet<String>,
}

impl CategorySet {
    /// Create an empty category set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Parse a list of categories separated by commas and/or whitespace.
    ///
    /// Empty items are ignored.
    ///
    /// ```
    /// use uconf_cli::categories::CategorySet;
    ///
    /// let set = CategorySet::parse_list("web, prod  db,,");
    /// assert_eq!(set.len(), 3);
    /// ```
    #[must_use]
    pub fn parse_list(text: &str) -> Self {
        text.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Return `true` if `name` is an active category.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Add a category, returning `true` if it was not already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Number of active categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Return `true` if no category is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over the categories in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CategorySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for CategorySet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for name in &self.names {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_accepts_commas_and_spaces() {
        let set = CategorySet::parse_list("web,prod db");
        assert!(set.contains("web"));
        assert!(set.contains("prod"));
        assert!(set.contains("db"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn parse_list_of_blank_text_is_empty() {
        assert!(CategorySet::parse_list(" , ,").is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let mut set: CategorySet = ["a", "a"].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(!set.insert("a"));
        assert!(set.insert("b"));
    }

    #[test]
    fn display_is_sorted() {
        let set: CategorySet = ["zeta", "alpha"].into_iter().collect();
        assert_eq!(set.to_string(), "alpha, zeta");
    }

    #[test]
    fn extend_adds_names() {
        let mut set = CategorySet::new();
        set.extend(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(set.iter().collect::<Vec<_>>(), ["x", "y"]);
    }
}
