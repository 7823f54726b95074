//! Network module.
//!
//! Contains the Connection, its inbound and outbound workers, and outbound
//! flood control.

mod connection;
pub mod flood;
mod reader;
pub mod writer;

pub use connection::{
    Connection, IDENTIFY_GRACE, JOIN_PAUSE, Messages, POLL_TIMEOUT, QUEUE_CAPACITY,
};
pub use reader::READ_CHUNK;
pub use writer::Writer;
