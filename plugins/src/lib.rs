pub mod backend;
pub mod experiments;
pub mod factory;
