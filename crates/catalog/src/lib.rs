//! `forgemfg-catalog` — collaborator interfaces consumed by the BOM core.
//!
//! The item master and the customer/supplier directory are owned by external
//! subsystems. This crate defines the record types and lookup seams the core
//! reads through; the only field the core ever writes back is
//! `ItemRecord::current_stock`, and only via the production store.

pub mod directory;
pub mod item;

pub use directory::{CustomerDirectory, DirectoryLookup};
pub use item::{ItemCatalog, ItemForm, ItemKind, ItemRecord, Procurement};
