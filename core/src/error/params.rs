use thiserror::Error;

/// Errors raised while reading or writing serialized parameter sets.
#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("malformed parameter record at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("parameter '{key}' cannot be serialized: {reason}")]
    Unencodable { key: String, reason: String },

    #[error("cannot access parameter file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum NamingError {
    #[error("configurations {first} and {second} share the name '{name}'")]
    Collision {
        name: String,
        first: usize,
        second: usize,
    },
}
