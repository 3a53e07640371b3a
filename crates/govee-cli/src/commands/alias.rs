//! Alias command - manage friendly device names in the store.
//!
//! Display names resolve alias → detected name → address, so a user label
//! always wins over whatever the device last advertised.

use anyhow::{Result, bail};
use govee_store::Store;

use crate::cli::AliasAction;

/// Execute the alias command.
pub fn cmd_alias(action: &AliasAction, store: &Store, quiet: bool) -> Result<()> {
    match action {
        AliasAction::List => {
            let rows = store.list_aliases()?;

            if rows.is_empty() {
                if !quiet {
                    println!("No devices known yet.");
                    println!();
                    println!("Add a label with: govee alias set <address> <name>");
                }
                return Ok(());
            }

            println!("{:<20} {:<20} {}", "Address", "Alias", "Detected name");
            for row in rows {
                println!(
                    "{:<20} {:<20} {}",
                    row.address,
                    row.alias.as_deref().unwrap_or("-"),
                    row.detected_name,
                );
            }
        }
        AliasAction::Set { address, alias } => {
            let alias = alias.trim();
            if alias.is_empty() {
                bail!("Alias must not be empty; use 'alias remove' to clear one.");
            }

            store.set_alias(address, alias)?;
            if !quiet {
                println!("Set alias '{alias}' for {}", address.to_lowercase());
            }
        }
        AliasAction::Remove { address } => {
            if store.remove_alias(address)? {
                if !quiet {
                    println!("Removed alias for {}", address.to_lowercase());
                }
            } else {
                bail!("No alias set for {}", address.to_lowercase());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_remove_round_trip() {
        let store = Store::open_in_memory().unwrap();

        cmd_alias(
            &AliasAction::Set {
                address: "AA:BB:CC:DD:EE:FF".to_string(),
                alias: "Bedroom".to_string(),
            },
            &store,
            true,
        )
        .unwrap();
        assert_eq!(store.display_name("aa:bb:cc:dd:ee:ff").unwrap(), "Bedroom");

        cmd_alias(
            &AliasAction::Remove {
                address: "aa:bb:cc:dd:ee:ff".to_string(),
            },
            &store,
            true,
        )
        .unwrap();
        assert_eq!(
            store.display_name("aa:bb:cc:dd:ee:ff").unwrap(),
            "aa:bb:cc:dd:ee:ff"
        );
    }

    #[test]
    fn test_empty_alias_rejected() {
        let store = Store::open_in_memory().unwrap();
        let result = cmd_alias(
            &AliasAction::Set {
                address: "aa:bb".to_string(),
                alias: "   ".to_string(),
            },
            &store,
            true,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_remove_missing_alias_fails() {
        let store = Store::open_in_memory().unwrap();
        let result = cmd_alias(
            &AliasAction::Remove {
                address: "aa:bb".to_string(),
            },
            &store,
            true,
        );
        assert!(result.is_err());
    }
}
