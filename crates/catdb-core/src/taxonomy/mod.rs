//! Keyword-rule taxonomy classifier.
//!
//! Rules map a category name to lowercase substring patterns. Categories are
//! tried longest-pattern-first, so "Mini Dresses" (`"mini dress"`) is checked
//! before "Dresses" (`"dress"`). A category only resolves when the registry
//! knows its taxonomy id and path.

mod rules;

use std::collections::HashMap;

use crate::products::Classification;

/// Separator between ancestor names in a taxonomy path.
pub const PATH_SEPARATOR: &str = " > ";

/// A resolved taxonomy category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub path: String,
    pub depth: u8,
    pub patterns: Vec<String>,
}

impl Category {
    #[must_use]
    pub fn to_classification(&self) -> Classification {
        Classification {
            category_id: self.id.clone(),
            category_name: self.name.clone(),
            taxonomy_path: self.path.clone(),
            depth: self.depth,
        }
    }
}

/// Taxonomy id and full path registered for a category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyEntry {
    pub id: String,
    pub path: String,
}

#[derive(Debug, Clone)]
struct Rule {
    name: String,
    patterns: Vec<String>,
}

impl Rule {
    fn longest_pattern(&self) -> usize {
        self.patterns.iter().map(String::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    /// Sorted by longest pattern, descending; ties keep declaration order.
    rules: Vec<Rule>,
    registry: HashMap<String, TaxonomyEntry>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::apparel()
    }
}

impl Classifier {
    /// Builds a classifier from `(category name, patterns)` rules and a
    /// registry of category name to taxonomy entry.
    pub fn new<R, P>(rules: R, registry: HashMap<String, TaxonomyEntry>) -> Self
    where
        R: IntoIterator<Item = (String, P)>,
        P: IntoIterator<Item = String>,
    {
        let mut rules: Vec<Rule> = rules
            .into_iter()
            .map(|(name, patterns)| Rule {
                name,
                patterns: patterns
                    .into_iter()
                    .map(|p| p.to_lowercase())
                    .filter(|p| !p.trim().is_empty())
                    .collect(),
            })
            .collect();
        // `sort_by` is stable, so equal lengths keep declaration order.
        rules.sort_by(|a, b| b.longest_pattern().cmp(&a.longest_pattern()));
        Self { rules, registry }
    }

    /// The built-in apparel & accessories taxonomy.
    #[must_use]
    pub fn apparel() -> Self {
        let rule_list = rules::CATEGORY_RULES.iter().map(|(name, patterns)| {
            (
                (*name).to_string(),
                patterns.iter().map(|p| (*p).to_string()).collect::<Vec<_>>(),
            )
        });
        let registry = rules::TAXONOMY
            .iter()
            .map(|(name, id, path)| {
                (
                    (*name).to_string(),
                    TaxonomyEntry {
                        id: (*id).to_string(),
                        path: (*path).to_string(),
                    },
                )
            })
            .collect();
        Self::new(rule_list, registry)
    }

    /// Classifies free-text product identity into a taxonomy category.
    ///
    /// Returns `None` when nothing matches; callers treat that as
    /// "unclassified", not as an error.
    #[must_use]
    pub fn classify(
        &self,
        name: &str,
        type_hint: Option<&str>,
        description: Option<&str>,
    ) -> Option<Category> {
        let haystack = format!(
            " {} {} {} ",
            name,
            type_hint.unwrap_or_default(),
            description.unwrap_or_default()
        )
        .to_lowercase();

        for rule in &self.rules {
            if !rule.patterns.iter().any(|p| haystack.contains(p.as_str())) {
                continue;
            }

            // A rule without a registry entry can never resolve; fall through
            // to shorter rules instead of reporting a half-built category.
            let Some(entry) = self.registry.get(&rule.name) else {
                continue;
            };

            return Some(Category {
                id: entry.id.clone(),
                name: rule.name.clone(),
                path: entry.path.clone(),
                depth: depth_of(&entry.id),
                patterns: rule.patterns.clone(),
            });
        }

        None
    }

    /// Names of rules that have no registry entry and therefore never match.
    #[must_use]
    pub fn unregistered_categories(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| !self.registry.contains_key(&r.name))
            .map(|r| r.name.as_str())
            .collect()
    }
}

/// Hierarchy depth implied by a dash-nested id: `"aa"` is 1, `"aa-1-4"` is 3.
#[must_use]
pub fn depth_of(id: &str) -> u8 {
    let segments = id.split('-').filter(|s| !s.is_empty()).count();
    u8::try_from(segments).unwrap_or(u8::MAX)
}

#[cfg(test)]
#[path = "taxonomy_test.rs"]
mod tests;
