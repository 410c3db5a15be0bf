//! Client side of the trainer: HTTP access, admin session, catalog loading.

pub mod api;
pub mod catalog;
pub mod session;
