//! The transport parameters this crate produces, currently only the server's
//! preferred address which binds one of the locally issued connection IDs.

mod preferred_address;
pub use preferred_address::{PreferredAddress, WritePreferredAddress};
