//! Dataset registry: every canonical table collected during one run

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::table::CanonicalTable;

/// Ordered collection of named, non-empty tables
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DatasetRegistry {
    tables: Vec<CanonicalTable>,
    #[serde(skip)]
    names: HashSet<String>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table, returning the name it was stored under.
    ///
    /// Empty tables are refused. When the name is already taken the table is
    /// stored as `<name>_2`, `<name>_3`, ... in arrival order.
    pub fn register(&mut self, mut table: CanonicalTable) -> Option<String> {
        if table.is_empty() {
            debug!(table = table.name(), "Refusing empty table");
            return None;
        }

        if self.names.contains(table.name()) {
            let base = table.name().to_string();
            let mut n = 2;
            let mut unique = format!("{base}_{n}");
            while self.names.contains(&unique) {
                n += 1;
                unique = format!("{base}_{n}");
            }
            debug!(table = %unique, "Disambiguated colliding table name");
            table.rename(unique);
        }

        let name = table.name().to_string();
        debug!(table = %name, rows = table.len(), "Registered table");
        self.names.insert(name.clone());
        self.tables.push(table);
        Some(name)
    }

    pub fn get(&self, name: &str) -> Option<&CanonicalTable> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Table names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalTable> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Rows across all registered tables
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(CanonicalTable::len).sum()
    }
}

impl<'a> IntoIterator for &'a DatasetRegistry {
    type Item = &'a CanonicalTable;
    type IntoIter = std::slice::Iter<'a, CanonicalTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}
