//! The endpoint side of connection IDs: the table routing inbound packets to the
//! connections by their destination connection ID.
pub mod router;

pub use router::{CidRouter, ConnHandle, RouterRegistry};
