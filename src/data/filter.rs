use super::model::{Category, MaintenanceDataset, MaintenanceRecord};

// ---------------------------------------------------------------------------
// Equipment selection
// ---------------------------------------------------------------------------

/// Records whose `Equipo` matches `equipo` exactly, in load order.
pub fn records_for_equipo<'a>(dataset: &'a MaintenanceDataset, equipo: &str) -> Vec<&'a MaintenanceRecord> {
    dataset
        .records()
        .iter()
        .filter(|r| r.equipo.as_deref() == Some(equipo))
        .collect()
}

// ---------------------------------------------------------------------------
// Category multi-selection
// ---------------------------------------------------------------------------

/// Which expenditure categories are compared, in the order they were picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySelection {
    selected: Vec<Category>,
}

impl Default for CategorySelection {
    fn default() -> Self {
        Self::from_categories([Category::Falla, Category::Preventivo])
    }
}

impl CategorySelection {
    /// Keeps the given order; repeated categories count once.
    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut selected = Vec::new();
        for category in categories {
            if !selected.contains(&category) {
                selected.push(category);
            }
        }
        CategorySelection { selected }
    }

    pub fn contains(&self, category: Category) -> bool {
        self.selected.contains(&category)
    }

    /// Deselect if present, otherwise append at the end.
    pub fn toggle(&mut self, category: Category) {
        match self.selected.iter().position(|c| *c == category) {
            Some(pos) => {
                self.selected.remove(pos);
            }
            None => self.selected.push(category),
        }
    }

    /// Add the categories not yet picked, in canonical order after the current ones.
    pub fn select_all(&mut self) {
        for category in Category::ALL {
            if !self.contains(category) {
                self.selected.push(category);
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.selected.iter().copied()
    }
}
