//! Credential, audience, and identity token models.

pub mod audience;
pub mod credentials;
pub mod token;

pub use audience::*;
pub use credentials::*;
pub use token::{record::*, secret::*};
