//! This library provides the shared code of the mesh lab tooling.
//!
//! It contains the [wire format](wire) and [message definitions](msg) of the mesh control
//! network, the [types] to build them from, the [address book](address_book) of the known
//! installations, the [heartbeat tracker](tracker) and the UDP [transport].

#[macro_use]
mod impl_macros;

pub mod address_book;
pub mod error;
pub mod journald_logger;
pub mod msg;
pub mod parser;
pub mod tracker;
pub mod transport;
pub mod types;
pub mod wire;
