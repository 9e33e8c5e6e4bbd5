//! Serial session layer for MeshCore companion radios.
//!
//! Sits between the pure codec in `meshstats-protocol` and the polling
//! loops: owns the serial handle, serializes exchanges, absorbs push
//! notifications, classifies transport faults, and resolves short node
//! identifiers to names via the contact directory.

mod directory;
mod error;
mod link;
mod transport;

pub use directory::ContactDirectory;
pub use error::LinkError;
pub use link::{RadioLink, DIRECT_SENDER};
pub use transport::{Connector, SerialConnector, Transport, DEFAULT_READ_TIMEOUT};
