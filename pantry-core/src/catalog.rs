//! The category catalog — the single ownership point for category
//! lifecycle.
//!
//! Every place that needs a category goes through here: explicit
//! registration, get-or-create on first reference, soft deletion, and
//! bulk configuration updates. No other component creates categories.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::category::{Category, PRIORITY_MAX, PRIORITY_MIN};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("category {0} already exists and is active")]
    AlreadyActive(String),

    #[error("category not found: {0}")]
    NotFound(String),

    #[error("emergency priority {value} for {category} outside {min}..={max}")]
    PriorityRange {
        category: String,
        value: u8,
        min: u8,
        max: u8,
    },
}

/// Outcome of [`CategoryCatalog::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registered {
    Created,
    /// An inactive entry with the same name was reactivated and updated.
    Reactivated,
}

/// One entry of a [`CategoryCatalog::bulk_update`] call.
#[derive(Clone, Debug)]
pub struct CategoryUpdate {
    pub name: String,
    pub ideal_count: Option<u32>,
    pub emergency_priority: Option<u8>,
}

/// Result of a bulk update: which names were applied, which were skipped
/// because no such category exists, and which were rejected outright.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BulkUpdateOutcome {
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
    pub rejected: Vec<String>,
}

/// Registry of category configurations, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct CategoryCatalog {
    entries: BTreeMap<String, Category>,
}

impl CategoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from pre-made categories. Later duplicates replace
    /// earlier ones.
    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut catalog = Self::new();
        for c in categories {
            catalog.entries.insert(c.name.clone(), c);
        }
        catalog
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.entries.get(name)
    }

    /// Look up a category, creating it with defaults on first reference.
    ///
    /// This is the only implicit creation point in the system; callers
    /// that want custom configuration use [`register`](Self::register).
    pub fn get_or_create(&mut self, name: &str) -> &Category {
        if !self.entries.contains_key(name) {
            log::debug!("creating category on first reference: {name}");
        }
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| Category::new(name))
    }

    /// Register a category with explicit configuration.
    ///
    /// An inactive entry with the same name is reactivated and updated in
    /// place; an active one is an error.
    pub fn register(
        &mut self,
        name: &str,
        ideal_count: u32,
        emergency_priority: u8,
    ) -> Result<Registered, CatalogError> {
        validate_priority(name, emergency_priority)?;

        match self.entries.get_mut(name) {
            Some(existing) if existing.active => Err(CatalogError::AlreadyActive(name.to_string())),
            Some(existing) => {
                existing.active = true;
                existing.ideal_count = ideal_count;
                existing.emergency_priority = emergency_priority;
                Ok(Registered::Reactivated)
            }
            None => {
                self.entries.insert(
                    name.to_string(),
                    Category {
                        name: name.to_string(),
                        ideal_count,
                        emergency_priority,
                        active: true,
                    },
                );
                Ok(Registered::Created)
            }
        }
    }

    /// Soft-delete a category. The entry stays in the catalog so that
    /// historical reports keep resolving it.
    pub fn deactivate(&mut self, name: &str) -> Result<(), CatalogError> {
        match self.entries.get_mut(name) {
            Some(category) => {
                category.active = false;
                Ok(())
            }
            None => Err(CatalogError::NotFound(name.to_string())),
        }
    }

    /// Apply configuration updates to existing categories.
    ///
    /// Unknown names are skipped rather than created; out-of-range
    /// priorities are rejected per entry. Neither aborts the batch.
    pub fn bulk_update(&mut self, updates: &[CategoryUpdate]) -> BulkUpdateOutcome {
        let mut outcome = BulkUpdateOutcome::default();

        for update in updates {
            if let Some(value) = update.emergency_priority {
                if validate_priority(&update.name, value).is_err() {
                    log::warn!(
                        "rejecting update for {}: priority {value} out of range",
                        update.name
                    );
                    outcome.rejected.push(update.name.clone());
                    continue;
                }
            }

            match self.entries.get_mut(&update.name) {
                Some(category) => {
                    if let Some(ideal) = update.ideal_count {
                        category.ideal_count = ideal;
                    }
                    if let Some(priority) = update.emergency_priority {
                        category.emergency_priority = priority;
                    }
                    outcome.updated.push(update.name.clone());
                }
                None => outcome.skipped.push(update.name.clone()),
            }
        }

        outcome
    }

    /// Active categories in name order.
    pub fn active(&self) -> impl Iterator<Item = &Category> {
        self.entries.values().filter(|c| c.active)
    }

    /// All categories, active or not, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_priority(name: &str, value: u8) -> Result<(), CatalogError> {
    if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&value) {
        return Err(CatalogError::PriorityRange {
            category: name.to_string(),
            value,
            min: PRIORITY_MIN,
            max: PRIORITY_MAX,
        });
    }
    Ok(())
}
