// Application layer: the ledger service that every front end talks to.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
