pub mod cid;
pub mod config;
pub mod error;
pub mod frame;
pub mod param;
pub mod role;
pub mod space;
pub mod token;
pub mod varint;
