//! Numbered top-level experiment directories.
use std::path::{Path, PathBuf};

/// Create `<root>/<expname>_<NNN>` using the next free number.
pub fn create_numbered_dir(root: &Path, expname: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    let prefix = format!("{expname}_");
    let mut next = 0u32;
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(num) = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.parse::<u32>().ok())
        {
            next = next.max(num + 1);
        }
    }

    loop {
        let candidate = root.join(format!("{prefix}{next:03}"));
        match std::fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => next += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_increase() {
        let dir = tempfile::tempdir().unwrap();
        let a = create_numbered_dir(dir.path(), "dp-grid").unwrap();
        let b = create_numbered_dir(dir.path(), "dp-grid").unwrap();
        assert!(a.ends_with("dp-grid_000"));
        assert!(b.ends_with("dp-grid_001"));
        let other = create_numbered_dir(dir.path(), "srl-grid").unwrap();
        assert!(other.ends_with("srl-grid_000"));
    }
}
