//! First-run setup
//!
//! Seeds `hierarchy.json` with a starter set of sectors and categories.

use crate::config::paths::TandemPaths;
use crate::error::TandemResult;
use crate::models::{Category, Sector};

use super::file_io::write_json_atomic;
use super::hierarchy::HierarchyData;

const DEFAULT_HIERARCHY: &[(&str, &[&str])] = &[
    ("Home", &["Rent", "Utilities", "Internet"]),
    ("Food", &["Groceries", "Dining Out"]),
    ("Transport", &["Fuel", "Public Transit"]),
    ("Lifestyle", &["Entertainment", "Subscriptions", "Travel"]),
];

/// Categories that start outside any sector
const DEFAULT_UNASSIGNED: &[&str] = &["Gifts", "Medical"];

/// Create directories and the starter hierarchy if it doesn't exist yet
pub fn initialize_storage(paths: &TandemPaths) -> TandemResult<()> {
    paths.ensure_directories()?;

    if needs_initialization(paths) {
        write_json_atomic(paths.hierarchy_file(), &default_hierarchy())?;
    }

    Ok(())
}

pub fn needs_initialization(paths: &TandemPaths) -> bool {
    !paths.hierarchy_file().exists()
}

fn default_hierarchy() -> HierarchyData {
    let mut data = HierarchyData::default();

    for (sector_name, category_names) in DEFAULT_HIERARCHY {
        let categories: Vec<Category> = category_names.iter().map(|n| Category::new(*n)).collect();
        data.sectors
            .push(Sector::with_categories(*sector_name, categories.iter().map(|c| c.id)));
        data.categories.extend(categories);
    }
    data.categories
        .extend(DEFAULT_UNASSIGNED.iter().map(|n| Category::new(*n)));

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::hierarchy::{assign, unassigned_categories};
    use crate::storage::file_io::read_json;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_creates_hierarchy() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TandemPaths::with_base_dir(temp_dir.path().to_path_buf());
        assert!(needs_initialization(&paths));

        initialize_storage(&paths).unwrap();

        assert!(!needs_initialization(&paths));
        let data: HierarchyData = read_json(paths.hierarchy_file()).unwrap();
        assert_eq!(data.sectors.len(), DEFAULT_HIERARCHY.len());

        let unassigned = unassigned_categories(&data.sectors, &data.categories);
        let names: Vec<_> = unassigned.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Gifts", "Medical"]);

        // no category is claimed twice
        let assignment = assign(&data.sectors, &data.categories);
        let assigned: usize = assignment.sectors.iter().map(|(_, c)| c.len()).sum();
        assert_eq!(assigned + unassigned.len(), data.categories.len());
    }

    #[test]
    fn test_does_not_overwrite_existing_hierarchy() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TandemPaths::with_base_dir(temp_dir.path().to_path_buf());
        let custom = HierarchyData {
            sectors: vec![Sector::new("Custom")],
            categories: vec![],
        };
        write_json_atomic(paths.hierarchy_file(), &custom).unwrap();

        initialize_storage(&paths).unwrap();

        let data: HierarchyData = read_json(paths.hierarchy_file()).unwrap();
        assert_eq!(data.sectors.len(), 1);
        assert_eq!(data.sectors[0].name, "Custom");
    }
}
