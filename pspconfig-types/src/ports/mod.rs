//! Port traits implemented by outer-layer adapters.

pub mod repository;

pub use repository::ConfigRepository;
