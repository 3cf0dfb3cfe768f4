//! Identity token records and their redacted secret wrapper.

pub mod record;
pub mod secret;
