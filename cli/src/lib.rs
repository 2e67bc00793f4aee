//! expgrid command line library, exposed for tests.

pub mod commands;
