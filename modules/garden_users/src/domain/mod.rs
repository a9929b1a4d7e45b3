pub mod error;
pub mod lifecycle;
pub mod repo;
pub mod service;
