//! Wire models for the hosted backend's collections.
//!
//! Field names follow the backend's snake_case column names; the client
//! never renames them in flight.

mod challenge;
mod community;
mod identity;
mod post;
mod profile;
mod settings;

pub use challenge::*;
pub use community::*;
pub use identity::*;
pub use post::*;
pub use profile::*;
pub use settings::*;
