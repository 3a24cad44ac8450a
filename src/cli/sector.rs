//! Sector CLI commands
//!
//! Implements CLI commands for sectors and their category membership.

use clap::Subcommand;

use crate::display::hierarchy::{format_hierarchy_tree, format_sector_list};
use crate::error::TandemResult;
use crate::services::HierarchyService;
use crate::storage::Storage;

/// Sector subcommands
#[derive(Subcommand)]
pub enum SectorCommands {
    /// Show sectors with their categories
    List {
        /// Show a flat table instead of the tree
        #[arg(long)]
        flat: bool,
    },

    /// Create a new sector
    Add {
        /// Sector name
        name: String,
    },

    /// Move a category into a sector
    Assign {
        /// Sector name or ID
        sector: String,
        /// Category name or ID
        category: String,
    },

    /// Take a category out of its sector
    Unassign {
        /// Category name or ID
        category: String,
    },

    /// Delete a sector and its sector budgets (categories are kept)
    Delete {
        /// Sector name or ID
        sector: String,
    },
}

/// Handle a sector command
pub fn handle_sector_command(storage: &Storage, cmd: SectorCommands) -> TandemResult<()> {
    let service = HierarchyService::new(storage);

    match cmd {
        SectorCommands::List { flat } => {
            if flat {
                print!("{}", format_sector_list(&service.list_sectors()?));
            } else {
                print!("{}", format_hierarchy_tree(&service.tree()?));
            }
        }

        SectorCommands::Add { name } => {
            let sector = service.create_sector(&name)?;
            println!("Created sector: {}", sector.name);
            println!("  ID: {}", sector.id);
        }

        SectorCommands::Assign { sector, category } => {
            let sector = service.require_sector(&sector)?;
            let category = service.require_category(&category)?;
            service.assign_category(sector.id, category.id)?;
            println!("Assigned '{}' to sector '{}'", category.name, sector.name);
        }

        SectorCommands::Unassign { category } => {
            let category = service.require_category(&category)?;
            match service.unassign_category(category.id)? {
                Some(sector) => println!("Removed '{}' from sector '{}'", category.name, sector.name),
                None => println!("'{}' is not in any sector", category.name),
            }
        }

        SectorCommands::Delete { sector } => {
            let sector = service.require_sector(&sector)?;
            service.delete_sector(sector.id)?;
            println!("Deleted sector: {}", sector.name);
        }
    }

    Ok(())
}
