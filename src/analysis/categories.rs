// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use crate::models::Category;
use crate::utils::fold_turkish;
use std::collections::BTreeMap;

pub const EARNING_TYPE: &str = "earning";

/// A user's categories split into name lookup and typed id sets.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    pub names: BTreeMap<i64, String>,
    pub spending: Vec<i64>,
    pub earning: Vec<i64>,
}

impl CategoryIndex {
    /// Records missing an id or a name are ignored.
    pub fn from_categories(categories: &[Category], spending_type: &str) -> Self {
        let mut idx = CategoryIndex::default();
        for cat in categories {
            let (Some(id), Some(name)) = (cat.id, cat.name.as_deref()) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            idx.names.insert(id, name.to_string());
            match cat.kind.as_deref() {
                Some(k) if k == spending_type => idx.spending.push(id),
                Some(EARNING_TYPE) => idx.earning.push(id),
                _ => {}
            }
        }
        idx
    }

    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn is_earning(&self, id: Option<i64>) -> bool {
        id.is_some_and(|id| self.earning.contains(&id))
    }

    pub fn resolve_by_id(&self, id: i64) -> Result<(i64, &str)> {
        self.name_of(id)
            .map(|name| (id, name))
            .ok_or_else(|| Error::validation(format!("invalid or unauthorized category id {}", id)))
    }

    /// Case-insensitive; Turkish letters match their ASCII look-alikes.
    pub fn resolve_by_name(&self, name: &str) -> Result<(i64, &str)> {
        let wanted = fold_turkish(&name.trim().to_lowercase());
        if wanted.is_empty() {
            return Err(Error::validation("category name is required"));
        }
        self.names
            .iter()
            .find(|(_, n)| fold_turkish(&n.to_lowercase()) == wanted)
            .map(|(id, n)| (*id, n.as_str()))
            .ok_or_else(|| {
                let available: Vec<&str> = self.names.values().map(String::as_str).collect();
                Error::validation(format!(
                    "category '{}' not found; available: {}",
                    name,
                    available.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: i64, name: &str, kind: &str) -> Category {
        Category {
            id: Some(id),
            name: Some(name.to_string()),
            kind: Some(kind.to_string()),
            user_id: "u1".into(),
        }
    }

    #[test]
    fn splits_by_type_and_skips_incomplete_records() {
        let mut nameless = cat(9, "x", "spending");
        nameless.name = None;
        let idx = CategoryIndex::from_categories(
            &[
                cat(1, "Market", "spending"),
                cat(2, "Maaş", "earning"),
                cat(3, "Birikim", "saving"),
                nameless,
            ],
            "spending",
        );
        assert_eq!(idx.spending, vec![1]);
        assert_eq!(idx.earning, vec![2]);
        assert_eq!(idx.names.len(), 3);
        assert!(idx.is_earning(Some(2)));
        assert!(!idx.is_earning(None));
    }

    #[test]
    fn resolves_names_with_folding() {
        let idx = CategoryIndex::from_categories(&[cat(4, "Ulaşım", "spending")], "spending");
        assert_eq!(idx.resolve_by_name("  ULASIM ").unwrap().0, 4);
        assert!(idx.resolve_by_name("Food").is_err());
        assert!(idx.resolve_by_id(5).is_err());
    }
}
