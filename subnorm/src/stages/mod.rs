//! Pipeline stages, applied strictly in order over the working root.

pub mod clean;
pub mod convert;
pub mod expand;
pub mod repair;
