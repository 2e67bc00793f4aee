//! Tab-separated persistence for parameter sets.
//!
//! One record per line: `key`, value, excluded-from-name flag,
//! excluded-from-args flag.

use std::path::Path;

use crate::error::ParamsError;

use super::set::ParameterSet;
use super::value::Value;

const FIELD_SEP: char = '\t';

fn flag(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

fn parse_flag(raw: &str, line: usize) -> Result<bool, ParamsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ParamsError::Malformed {
            line,
            reason: format!("invalid flag '{other}'"),
        }),
    }
}

fn check_encodable(key: &str, text: &str) -> Result<(), ParamsError> {
    if text.contains(FIELD_SEP) || text.contains('\n') || text.contains('\r') {
        return Err(ParamsError::Unencodable {
            key: key.to_string(),
            reason: "contains a tab or line break".to_string(),
        });
    }
    Ok(())
}

impl ParameterSet {
    pub fn to_records(&self) -> Result<String, ParamsError> {
        let mut out = String::new();
        for (key, value) in self.iter() {
            let text = value.to_string();
            check_encodable(key, key)?;
            check_encodable(key, &text)?;
            out.push_str(key);
            out.push(FIELD_SEP);
            out.push_str(&text);
            out.push(FIELD_SEP);
            out.push_str(flag(self.excluded_from_name().contains(key)));
            out.push(FIELD_SEP);
            out.push_str(flag(self.excluded_from_args().contains(key)));
            out.push('\n');
        }
        Ok(out)
    }

    pub fn from_records(input: &str) -> Result<ParameterSet, ParamsError> {
        let mut set = ParameterSet::new();
        for (idx, raw) in input.lines().enumerate() {
            let line = idx + 1;
            if raw.is_empty() {
                continue;
            }
            let fields: Vec<&str> = raw.split(FIELD_SEP).collect();
            if fields.len() != 4 {
                return Err(ParamsError::Malformed {
                    line,
                    reason: format!("expected 4 fields, found {}", fields.len()),
                });
            }
            let key = fields[0];
            if key.is_empty() {
                return Err(ParamsError::Malformed {
                    line,
                    reason: "empty key".to_string(),
                });
            }
            let excluded_name = parse_flag(fields[2], line)?;
            let excluded_args = parse_flag(fields[3], line)?;
            set.set(
                key,
                Value::parse_record(fields[1]),
                !excluded_name,
                !excluded_args,
            );
        }
        Ok(set)
    }

    pub fn save(&self, path: &Path) -> Result<(), ParamsError> {
        let records = self.to_records()?;
        std::fs::write(path, records).map_err(|source| ParamsError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<ParameterSet, ParamsError> {
        let s = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_records(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_values_and_exclusions() {
        let mut p = ParameterSet::new()
            .with("lr", 0.05)
            .with("reg", "L2")
            .with("threads", 4);
        p.set("seed", 7, false, true);
        p.set("model", "/data/m.gz", true, false);
        p.set_value("unset", Value::None);

        let back = ParameterSet::from_records(&p.to_records().unwrap()).unwrap();
        assert_eq!(back.values(), p.values());
        assert_eq!(back.excluded_from_name(), p.excluded_from_name());
        assert_eq!(back.excluded_from_args(), p.excluded_from_args());
    }

    #[test]
    fn records_have_four_fields() {
        let p = ParameterSet::new().with_hidden("seed", 7);
        assert_eq!(p.to_records().unwrap(), "seed\t7\tTrue\tFalse\n");
    }

    #[test]
    fn rejects_tabs_in_values() {
        let p = ParameterSet::new().with("bad", "a\tb");
        assert!(matches!(
            p.to_records(),
            Err(ParamsError::Unencodable { .. })
        ));
    }

    #[test]
    fn rejects_short_records() {
        let err = ParameterSet::from_records("lr\t0.1\n").unwrap_err();
        assert!(matches!(err, ParamsError::Malformed { line: 1, .. }));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expparams.txt");
        let p = ParameterSet::new().with("feats", "1st-order");
        p.save(&path).unwrap();
        assert_eq!(ParameterSet::load(&path).unwrap(), p);
    }
}
