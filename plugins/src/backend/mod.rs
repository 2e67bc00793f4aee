mod dry_run;
mod local;
mod qsub;

pub use dry_run::DryRunBackend;
pub use local::LocalBackend;
pub use qsub::QsubBackend;
