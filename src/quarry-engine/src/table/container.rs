//! Frontend-to-backend column mapping.

use indexmap::IndexMap;

use common_error::{QuarryError, QuarryResult};

/// Ordered mapping from frontend (logical) column names to backend column
/// names inside a [`Frame`](super::Frame).
///
/// Frontend names are unique. Several frontend names may share one backend
/// column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnContainer {
    columns: IndexMap<String, String>,
}

impl ColumnContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map each name to a backend column of the same name.
    pub fn identity<I, S>(names: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_pairs(names.into_iter().map(|name| {
            let name = name.into();
            (name.clone(), name)
        }))
    }

    /// Build from `(frontend, backend)` pairs, in order.
    pub fn from_pairs<I, F, B>(pairs: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = (F, B)>,
        F: Into<String>,
        B: Into<String>,
    {
        let mut container = Self::new();
        for (frontend, backend) in pairs {
            container.insert(frontend, backend)?;
        }
        Ok(container)
    }

    /// Append a mapping. Fails with `DuplicateColumn` if `frontend` is taken.
    pub fn insert(
        &mut self,
        frontend: impl Into<String>,
        backend: impl Into<String>,
    ) -> QuarryResult<()> {
        let frontend = frontend.into();
        if self.columns.contains_key(&frontend) {
            return Err(QuarryError::DuplicateColumn(frontend));
        }
        self.columns.insert(frontend, backend.into());
        Ok(())
    }

    /// Point an existing frontend name at another backend column.
    pub fn remap(&mut self, frontend: &str, backend: impl Into<String>) -> QuarryResult<()> {
        let slot = self
            .columns
            .get_mut(frontend)
            .ok_or_else(|| QuarryError::ColumnNotFound(frontend.to_string()))?;
        *slot = backend.into();
        Ok(())
    }

    /// Backend name of a frontend column.
    pub fn backend(&self, frontend: &str) -> QuarryResult<&str> {
        self.columns
            .get(frontend)
            .map(String::as_str)
            .ok_or_else(|| QuarryError::ColumnNotFound(frontend.to_string()))
    }

    /// Whether a frontend name is present.
    pub fn contains(&self, frontend: &str) -> bool {
        self.columns.contains_key(frontend)
    }

    /// Frontend names in order.
    pub fn frontend_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Distinct backend names in first-use order.
    pub fn backend_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.columns.len());
        for backend in self.columns.values() {
            if !names.contains(&backend.as_str()) {
                names.push(backend);
            }
        }
        names
    }

    /// Number of frontend names sharing `backend`.
    pub fn references(&self, backend: &str) -> usize {
        self.columns.values().filter(|b| *b == backend).count()
    }

    /// Iterate `(frontend, backend)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(f, b)| (f.as_str(), b.as_str()))
    }

    /// Number of frontend columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the container is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Rename the first `names.len()` columns positionally and drop the rest.
    pub fn rename_prefix(&self, names: &[String]) -> QuarryResult<Self> {
        if names.len() > self.columns.len() {
            return Err(QuarryError::schema_error(format!(
                "cannot name {} columns with {} available: {:?}",
                names.len(),
                self.columns.len(),
                self.frontend_names()
            )));
        }
        Self::from_pairs(
            names
                .iter()
                .zip(self.columns.values())
                .map(|(name, backend)| (name.clone(), backend.clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_duplicate_frontend_rejected() {
        let err = ColumnContainer::identity(["a", "a"]).unwrap_err();
        assert!(matches!(err, QuarryError::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn test_shared_backend() {
        let container =
            ColumnContainer::from_pairs([("a", "c0"), ("b", "c0"), ("c", "c1")]).unwrap();
        assert_eq!(container.backend("b").unwrap(), "c0");
        assert_eq!(container.references("c0"), 2);
        assert_eq!(container.backend_names(), vec!["c0", "c1"]);
    }

    #[test]
    fn test_rename_prefix() {
        let container = ColumnContainer::identity(["x", "y", "z"]).unwrap();
        let renamed = container.rename_prefix(&names(&["a", "b"])).unwrap();
        assert_eq!(renamed.frontend_names(), names(&["a", "b"]));
        assert_eq!(renamed.backend("b").unwrap(), "y");

        assert!(matches!(
            container.rename_prefix(&names(&["a", "b", "c", "d"])),
            Err(QuarryError::SchemaError(_))
        ));
        assert!(matches!(
            container.rename_prefix(&names(&["a", "a"])),
            Err(QuarryError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_remap() {
        let mut container = ColumnContainer::identity(["x"]).unwrap();
        container.remap("x", "x_1").unwrap();
        assert_eq!(container.backend("x").unwrap(), "x_1");
        assert!(container.remap("nope", "z").is_err());
    }
}
