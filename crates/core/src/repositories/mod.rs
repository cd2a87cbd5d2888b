//! Data-access services over the storage backends.
//!
//! - [`collection`]: the generic CRUD contract shared by every entity collection.
//! - [`auth`]: the admin login gate and cached session.

pub mod auth;
pub mod collection;

pub use auth::AdminAuthService;
pub use collection::{load_collection, save_collection, Collection};
