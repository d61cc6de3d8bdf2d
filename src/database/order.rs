//! Table load order
//!
//! Parent tables must be created and populated before the tables whose
//! foreign keys reference them. A [`LoadOrder`] is either declared by the
//! operator or derived from the schemas' foreign keys.

use crate::database::schema::Schema;
use crate::error::{DeckError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Ordered list of tables, parents first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOrder {
    tables: Vec<String>,
}

impl LoadOrder {
    /// Use an operator-declared order as is
    pub fn declared<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    /// Derive the order from foreign keys with a topological sort
    ///
    /// Ties are broken by table name so the result is deterministic.
    /// References to tables outside `schemas` and self-references are
    /// ignored.
    ///
    /// # Returns
    /// `Err(DeckError::CyclicDependency)` naming the tables left on a cycle
    pub fn from_schemas(schemas: &[Schema]) -> Result<Self> {
        let names: BTreeSet<&str> = schemas.iter().map(|s| s.table_name.as_str()).collect();

        // child -> parents still to be placed
        let mut pending: BTreeMap<&str, BTreeSet<&str>> =
            names.iter().map(|name| (*name, BTreeSet::new())).collect();
        for schema in schemas {
            let child = schema.table_name.as_str();
            for parent in schema.referenced_tables() {
                if parent != child && names.contains(parent) {
                    if let Some(parents) = pending.get_mut(child) {
                        parents.insert(parent);
                    }
                }
            }
        }

        let mut tables = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending
                .iter()
                .find(|(_, parents)| parents.is_empty())
                .map(|(name, _)| *name);

            let Some(next) = ready else {
                return Err(DeckError::CyclicDependency {
                    tables: pending.keys().map(|name| name.to_string()).collect(),
                });
            };

            pending.remove(next);
            for parents in pending.values_mut() {
                parents.remove(next);
            }
            tables.push(next.to_string());
        }

        Ok(Self { tables })
    }

    /// Tables in load order
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Tables in drop order (reverse of load order)
    pub fn drop_order(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().rev().map(String::as_str)
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the order is empty
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
