//! Core encoding layer shared by every protocol component.

pub mod wire;
