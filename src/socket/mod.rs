//! Socket handling for the default transport.
//!
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`client`]: the connected socket type handed to hyper
//!
//! Every exchange opens a fresh connection; there is no pool.

pub mod client;
pub mod connectjob;
