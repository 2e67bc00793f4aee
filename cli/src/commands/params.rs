use expgrid_core::api::{CliError, ParameterSet};
use expgrid_plugins::experiments::catalog;

use super::cli::ParamsArgs;

/// Print a saved set: derived name, argument string, then one line per key.
pub fn params(args: &ParamsArgs) -> Result<i32, CliError> {
    let set = ParameterSet::load(&args.file)
        .map_err(|e| CliError::Config(format!("{}: {}", args.file.display(), e)))?;

    println!("name\t{}", set.name());
    println!("args\t{}", set.arguments());
    for (key, value) in set.iter() {
        let mut flags = Vec::new();
        if set.excluded_from_name().contains(key) {
            flags.push("no-name");
        }
        if set.excluded_from_args().contains(key) {
            flags.push("no-args");
        }
        println!("{key}\t{value}\t{}", flags.join(","));
    }
    Ok(0)
}

pub fn list() -> Result<i32, CliError> {
    for exp in catalog() {
        println!("{}\t{}", exp.name(), exp.description());
    }
    Ok(0)
}
