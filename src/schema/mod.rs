//! Schema discovery and reconciliation.
//!
//! - [`infer()`]: host type → column kind
//! - [`reconcile()`]: which columns a sample record needs that the list lacks
//! - [`provision()`]: create those columns through a [`crate::store::StoreSession`]

pub mod infer;
pub mod reconcile;

pub use infer::{infer, infer_value};
pub use reconcile::{provision, reconcile, Provisioned};
