pub mod expdir;
pub mod shell;

pub use expdir::create_numbered_dir;
