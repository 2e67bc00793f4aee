//! Deterministic experiment names derived from parameter sets.
//!
//! Everything here is a pure function of the sets passed in; the only
//! stateful piece is [`NameSequence`], which callers own explicitly.

mod sequence;

use std::collections::HashMap;

use crate::error::NamingError;
use crate::params::{ParameterSet, Value};

pub use sequence::NameSequence;

/// Separator placed between value fragments of a name.
pub const NAME_SEPARATOR: &str = "_";

/// Keys that contribute to the name, preferred keys first, then the rest in
/// lexicographic order.
pub fn name_keys<'a>(params: &'a ParameterSet, preferred: &[String]) -> Vec<&'a str> {
    let named = |k: &str| {
        params.is_named(k) && params.get(k).map(|v| !v.is_none()).unwrap_or(false)
    };

    let mut keys: Vec<&'a str> = Vec::new();
    for want in preferred {
        if let Some((k, _)) = params.values().get_key_value(want.as_str()) {
            if named(k) && !keys.contains(&k.as_str()) {
                keys.push(k.as_str());
            }
        }
    }
    // BTreeMap iteration is already lexicographic.
    for k in params.keys() {
        if named(k) && !keys.contains(&k) {
            keys.push(k);
        }
    }
    keys
}

/// Join the cleaned values of every named key.
pub fn canonical_name(params: &ParameterSet, preferred: &[String]) -> String {
    name_keys(params, preferred)
        .into_iter()
        .filter_map(|k| params.get(k))
        .map(|v| clean_name(&v.to_string()))
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

/// Replace characters that do not belong in a directory or job name with `-`
/// and collapse runs of them.
pub fn clean_name(raw: &str) -> String {
    let mut cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();

    while cleaned.contains("--") {
        cleaned = cleaned.replace("--", "-");
    }
    cleaned.trim_matches('-').to_string()
}

/// Drop keys whose value is the same across the whole batch from naming.
///
/// Keys listed in a set's initial keys are always kept. Arguments are never
/// affected. Batches with fewer than two sets are left unchanged.
pub fn shorten_names(batch: &mut [ParameterSet]) {
    if batch.len() < 2 {
        return;
    }

    let mut shared: Vec<String> = Vec::new();
    for (key, value) in batch[0].iter() {
        if value.is_none() {
            continue;
        }
        let same_everywhere = batch[1..]
            .iter()
            .all(|p| p.get(key).map(|v| values_equal(v, value)).unwrap_or(false));
        if same_everywhere {
            shared.push(key.to_string());
        }
    }

    for params in batch.iter_mut() {
        for key in &shared {
            if !params.initial_keys().iter().any(|k| k == key) {
                params.exclude_from_name(key.clone());
            }
        }
    }
}

// Compare by rendered form so 4 and 4.0 count as the same value.
fn values_equal(a: &Value, b: &Value) -> bool {
    a == b || a.to_string() == b.to_string()
}

/// Report the first pair of sets in `batch` that derive the same name.
pub fn check_unique_names(batch: &[ParameterSet]) -> Result<(), NamingError> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (idx, params) in batch.iter().enumerate() {
        let name = params.name();
        if let Some(first) = seen.insert(name.clone(), idx) {
            return Err(NamingError::Collision {
                name,
                first,
                second: idx,
            });
        }
    }
    Ok(())
}
