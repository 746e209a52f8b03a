//! Plugin host: the API plugins implement and the manager that drives them

pub mod api;
pub mod manager;
