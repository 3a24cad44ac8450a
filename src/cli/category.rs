//! Category CLI commands

use clap::Subcommand;

use crate::display::hierarchy::{format_category_list, format_hierarchy_tree};
use crate::error::TandemResult;
use crate::services::HierarchyService;
use crate::storage::Storage;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories
    List {
        /// Show a flat table instead of the tree
        #[arg(long)]
        flat: bool,
    },

    /// Create a new category
    Add {
        /// Category name
        name: String,
        /// Sector to place the category in
        #[arg(short, long)]
        sector: Option<String>,
        /// Image reference stored with the category
        #[arg(long)]
        image: Option<String>,
    },

    /// Delete a category and its budgets
    Delete {
        /// Category name or ID
        category: String,
    },
}

/// Handle a category command
pub fn handle_category_command(storage: &Storage, cmd: CategoryCommands) -> TandemResult<()> {
    let service = HierarchyService::new(storage);

    match cmd {
        CategoryCommands::List { flat } => {
            if flat {
                print!("{}", format_category_list(&service.list_categories()?));
            } else {
                print!("{}", format_hierarchy_tree(&service.tree()?));
            }
        }

        CategoryCommands::Add { name, sector, image } => {
            let sector = sector
                .map(|s| service.require_sector(&s))
                .transpose()?;
            let category = service.create_category(&name, image, sector.as_ref().map(|s| s.id))?;

            println!("Created category: {}", category.name);
            if let Some(sector) = sector {
                println!("  Sector: {}", sector.name);
            }
            println!("  ID: {}", category.id);
        }

        CategoryCommands::Delete { category } => {
            let category = service.require_category(&category)?;
            service.delete_category(category.id)?;
            println!("Deleted category: {}", category.name);
        }
    }

    Ok(())
}
