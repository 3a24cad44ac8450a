//! Hierarchy display formatting
//!
//! Formats sectors and categories for terminal output in tree and list views.

use crate::models::{Category, CategoryId, Sector, SectorId};
use crate::services::HierarchyTree;

/// Format the hierarchy as a tree, unassigned categories last
pub fn format_hierarchy_tree(tree: &HierarchyTree) -> String {
    if tree.sectors.is_empty() && tree.unassigned.is_empty() {
        return "No sectors or categories found.\n\nRun 'tandem init' to create the defaults."
            .to_string();
    }

    let mut output = String::new();

    let groups = tree
        .sectors
        .iter()
        .map(|(sector, categories)| (sector.name.as_str(), categories));
    let unassigned = (!tree.unassigned.is_empty()).then_some(("(unassigned)", &tree.unassigned));

    for (i, (name, categories)) in groups.chain(unassigned).enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!("{}\n", name));

        if categories.is_empty() {
            output.push_str("  (no categories)\n");
            continue;
        }
        for (j, category) in categories.iter().enumerate() {
            let prefix = if j == categories.len() - 1 { "└── " } else { "├── " };
            output.push_str(&format!("  {}{}\n", prefix, category.name));
        }
    }

    if !tree.conflicts.is_empty() {
        let sector_name = |id: SectorId| {
            tree.sectors
                .iter()
                .find(|(s, _)| s.id == id)
                .map(|(s, _)| s.name.as_str())
                .unwrap_or("?")
        };
        let category_name = |id: CategoryId| {
            tree.sectors
                .iter()
                .flat_map(|(_, cats)| cats.iter())
                .find(|c| c.id == id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.to_string())
        };

        output.push_str("\nConflicts:\n");
        for conflict in &tree.conflicts {
            output.push_str(&format!(
                "  {} is also listed by {}; counted under {}\n",
                category_name(conflict.category_id),
                sector_name(conflict.ignored),
                sector_name(conflict.kept_by)
            ));
        }
    }

    output
}

/// Format a simple list of sectors
pub fn format_sector_list(sectors: &[Sector]) -> String {
    if sectors.is_empty() {
        return "No sectors found.".to_string();
    }

    let name_width = sectors
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(6)
        .max(6);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<width$}  {:>10}  {}\n",
        "Sector",
        "Categories",
        "ID",
        width = name_width
    ));
    output.push_str(&format!(
        "{:-<width$}  {:->10}  {:-<12}\n",
        "",
        "",
        "",
        width = name_width
    ));

    for sector in sectors {
        output.push_str(&format!(
            "{:<width$}  {:>10}  {}\n",
            sector.name,
            sector.category_ids.len(),
            sector.id,
            width = name_width
        ));
    }

    output
}

/// Format a simple list of categories
pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.".to_string();
    }

    let name_width = categories
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!("{:<width$}  {}\n", "Category", "ID", width = name_width));
    output.push_str(&format!("{:-<width$}  {:-<12}\n", "", "", width = name_width));

    for category in categories {
        output.push_str(&format!(
            "{:<width$}  {}\n",
            category.name,
            category.id,
            width = name_width
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_empty_tree() {
        let tree = HierarchyTree {
            sectors: vec![],
            unassigned: vec![],
            conflicts: vec![],
        };
        assert!(format_hierarchy_tree(&tree).contains("No sectors"));
    }

    #[test]
    fn test_format_tree() {
        let rent = Category::new("Rent");
        let utilities = Category::new("Utilities");
        let home = Sector::with_categories("Home", [rent.id, utilities.id]);
        let tree = HierarchyTree {
            sectors: vec![(home, vec![rent, utilities])],
            unassigned: vec![Category::new("Gifts")],
            conflicts: vec![],
        };

        let output = format_hierarchy_tree(&tree);
        assert!(output.contains("Home\n  ├── Rent\n  └── Utilities\n"));
        assert!(output.contains("(unassigned)\n  └── Gifts\n"));
        assert!(!output.contains("Conflicts"));
    }

    #[test]
    fn test_format_sector_list() {
        let home = Sector::with_categories("Home", [Category::new("Rent").id]);
        let output = format_sector_list(&[home]);
        assert!(output.starts_with("Sector"));
        assert!(output.contains("Home"));
        assert!(output.contains("sec-"));
    }
}
