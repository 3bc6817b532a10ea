use crate::domain::model::{Category, Organization};
use crate::utils::error::Result;
use std::collections::BTreeSet;

/// Active category subset. An empty selection shows nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySelection {
    active: BTreeSet<Category>,
}

impl CategorySelection {
    pub fn all() -> Self {
        Self {
            active: Category::ALL.iter().copied().collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            active: BTreeSet::new(),
        }
    }

    /// 解析以 `|` 或 `,` 分隔的類別名稱
    pub fn parse_list(raw: &str) -> Result<Self> {
        let mut active = BTreeSet::new();
        for name in raw.split(['|', ',']).filter(|s| !s.trim().is_empty()) {
            active.insert(name.parse::<Category>()?);
        }
        Ok(Self { active })
    }

    pub fn contains(&self, category: Category) -> bool {
        self.active.contains(&category)
    }

    /// Flips one category, like ticking a checkbox.
    pub fn toggle(&mut self, category: Category) -> bool {
        if !self.active.remove(&category) {
            self.active.insert(category);
            return true;
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.active.iter().copied()
    }
}

impl Default for CategorySelection {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Category> for CategorySelection {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        Self {
            active: iter.into_iter().collect(),
        }
    }
}

pub fn apply_category_filter(
    orgs: &[Organization],
    active: &CategorySelection,
) -> Vec<Organization> {
    orgs.iter()
        .filter(|org| active.contains(org.category))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Coordinate, OrgId};

    fn org(id: &str, category: Category) -> Organization {
        Organization {
            id: OrgId::new(id),
            name: format!("Org {}", id),
            category,
            coordinate: Coordinate::new(40.71, -74.0),
            description: String::new(),
            address: String::new(),
            phone: String::new(),
            hours: String::new(),
            services: vec![],
        }
    }

    #[test]
    fn test_filter_keeps_members_in_order() {
        let orgs = vec![
            org("1", Category::Boutique),
            org("2", Category::Supermarket),
            org("3", Category::Boutique),
            org("4", Category::RetailStore),
        ];
        let active: CategorySelection = [Category::Boutique, Category::RetailStore]
            .into_iter()
            .collect();

        let ids: Vec<String> = apply_category_filter(&orgs, &active)
            .into_iter()
            .map(|o| o.id.0)
            .collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
    }

    #[test]
    fn test_empty_selection_shows_nothing() {
        let orgs = vec![org("1", Category::Boutique), org("2", Category::Supermarket)];
        assert!(apply_category_filter(&orgs, &CategorySelection::none()).is_empty());
    }

    #[test]
    fn test_all_selection_shows_everything() {
        let orgs: Vec<Organization> = Category::ALL
            .iter()
            .enumerate()
            .map(|(i, c)| org(&i.to_string(), *c))
            .collect();
        assert_eq!(apply_category_filter(&orgs, &CategorySelection::all()), orgs);
    }

    #[test]
    fn test_toggle_and_parse() {
        let mut selection = CategorySelection::parse_list("Boutique|Shopping Mall").unwrap();
        assert_eq!(selection.len(), 2);
        assert!(!selection.toggle(Category::Boutique));
        assert!(selection.toggle(Category::Supermarket));
        assert!(selection.contains(Category::Supermarket));
        assert!(!selection.contains(Category::Boutique));

        assert!(CategorySelection::parse_list("").unwrap().is_empty());
        assert!(CategorySelection::parse_list("Boutique,Education").is_err());
    }
}
