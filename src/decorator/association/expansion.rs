//! Expand paths and their validation
//!
//! An expand path is a dot-delimited chain of association names starting at
//! the decorated root (e.g. `customer.company`). A request carries a set of
//! such paths; [`ExpansionValidator`] checks the set against a decorator's
//! declared associations before anything is rendered.

use crate::core::error::ExpansionError;
use crate::decorator::DecoratorType;
use indexmap::IndexSet;

/// Normalized set of expand paths
///
/// Entries are trimmed, blank entries are dropped and duplicates collapse.
/// Iteration follows first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandSet {
    paths: IndexSet<String>,
}

impl ExpandSet {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = paths
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        Self { paths }
    }

    /// Parse a comma separated list (e.g. a query parameter)
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Narrow the set for the nested render of association `name`
    ///
    /// `name` itself is removed and `name.` is stripped from every path below
    /// it. Paths outside the `name` subtree do not concern the nested
    /// decorator and are dropped, rather than carried along unchanged; a
    /// sibling such as `receipt` would otherwise fail the nested decorator's
    /// existence check.
    pub fn flatten(&self, name: &str) -> ExpandSet {
        let prefix = format!("{}.", name);

        Self::new(
            self.paths
                .iter()
                .filter_map(|path| path.strip_prefix(prefix.as_str())),
        )
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExpandSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Parent path of a dotted path (`a.b.c` → `a.b`)
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(parent, _)| parent)
}

/// Validates a requested expand set against a decorator's associations
pub struct ExpansionValidator<'a> {
    decorator: &'a DecoratorType,
}

impl<'a> ExpansionValidator<'a> {
    pub fn new(decorator: &'a DecoratorType) -> Self {
        Self { decorator }
    }

    /// Run every check, parents first
    ///
    /// Dotted paths are only checked for their parent here; whether their
    /// last segment exists is decided by the nested decorator's own
    /// validation.
    pub fn validate(&self, expand: &ExpandSet) -> Result<(), ExpansionError> {
        self.check_parents_are_expanded(expand)?;
        self.check_associations_exist(expand)
    }

    fn check_parents_are_expanded(&self, expand: &ExpandSet) -> Result<(), ExpansionError> {
        for path in expand.iter() {
            let Some(parent) = parent_path(path) else {
                continue;
            };

            if !expand.contains(parent) {
                return Err(ExpansionError::UnexpandedAssociationParent {
                    child: path.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        Ok(())
    }

    fn check_associations_exist(&self, expand: &ExpandSet) -> Result<(), ExpansionError> {
        for path in expand.iter() {
            if path.contains('.') || self.decorator.association(path).is_some() {
                continue;
            }

            return Err(ExpansionError::AssociationNotFound {
                property: path.to_string(),
            });
        }

        Ok(())
    }
}
