use std::collections::{BTreeMap, BTreeSet};

use crate::naming;
use crate::util::shell::quote;

use super::value::Value;

/// A composable bundle of named experiment parameters.
///
/// Sets are combined with [`merge`]; the right-hand operand wins on key
/// collisions and exclusion sets are unioned. Only [`ParameterSet::set`] and
/// [`ParameterSet::update`] mutate a set in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: BTreeMap<String, Value>,
    excluded_from_name: BTreeSet<String>,
    excluded_from_args: BTreeSet<String>,
    initial_keys: Vec<String>,
}

/// Right-biased merge: values of `overrides` replace those of `base`.
pub fn merge(base: &ParameterSet, overrides: &ParameterSet) -> ParameterSet {
    let mut out = base.clone();
    out.update(overrides);
    out
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut set = Self::new();
        for (k, v) in pairs {
            set.set_value(k, v);
        }
        set
    }

    /// Builder form of [`ParameterSet::set_value`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_value(key, value);
        self
    }

    /// Builder form of [`ParameterSet::set_hidden`].
    pub fn with_hidden(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_hidden(key, value);
        self
    }

    /// Declare keys that always lead the derived name and survive shortening.
    pub fn with_initial_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        for key in keys {
            let key = key.into();
            if !self.initial_keys.contains(&key) {
                self.initial_keys.push(key);
            }
        }
        self
    }

    /// Store `value` under `key`. A `false` flag adds the key to the matching
    /// exclusion set; a `true` flag leaves existing exclusions alone.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        include_in_name: bool,
        include_in_args: bool,
    ) {
        let key = key.into();
        if !include_in_name {
            self.excluded_from_name.insert(key.clone());
        }
        if !include_in_args {
            self.excluded_from_args.insert(key.clone());
        }
        self.values.insert(key, value.into());
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.set(key, value, true, true);
    }

    /// Store a value that is passed as an argument but kept out of the name.
    pub fn set_hidden(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.set(key, value, false, true);
    }

    /// In-place right-biased merge.
    pub fn update(&mut self, other: &ParameterSet) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
        self.excluded_from_name
            .extend(other.excluded_from_name.iter().cloned());
        self.excluded_from_args
            .extend(other.excluded_from_args.iter().cloned());
        for key in &other.initial_keys {
            if !self.initial_keys.contains(key) {
                self.initial_keys.push(key.clone());
            }
        }
    }

    /// New set equal to `self` overridden by `other`.
    pub fn merged(&self, other: &ParameterSet) -> ParameterSet {
        merge(self, other)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.values.get(key) {
            None | Some(Value::None) => None,
            Some(v) => Some(v.to_string()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.excluded_from_name.remove(key);
        self.excluded_from_args.remove(key);
        self.values.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn excluded_from_name(&self) -> &BTreeSet<String> {
        &self.excluded_from_name
    }

    pub fn excluded_from_args(&self) -> &BTreeSet<String> {
        &self.excluded_from_args
    }

    pub fn initial_keys(&self) -> &[String] {
        &self.initial_keys
    }

    pub fn exclude_from_name(&mut self, key: impl Into<String>) {
        self.excluded_from_name.insert(key.into());
    }

    pub fn is_named(&self, key: &str) -> bool {
        !self.excluded_from_name.contains(key)
    }

    /// Keys contributing to [`ParameterSet::name`], in naming order.
    pub fn name_keys(&self) -> Vec<&str> {
        naming::name_keys(self, &self.initial_keys)
    }

    pub fn name(&self) -> String {
        naming::canonical_name(self, &self.initial_keys)
    }

    pub fn name_with(&self, preferred: &[String]) -> String {
        naming::canonical_name(self, preferred)
    }

    fn argument_pairs(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values
            .iter()
            .filter(|(k, v)| !v.is_none() && !self.excluded_from_args.contains(*k))
    }

    /// `--key value` tokens, unquoted, for building an argv.
    pub fn argument_list(&self) -> Vec<String> {
        self.argument_pairs()
            .flat_map(|(k, v)| [format!("--{k}"), v.to_string()])
            .collect()
    }

    /// `--key value` pairs joined for a shell command line.
    pub fn arguments(&self) -> String {
        self.argument_pairs()
            .map(|(k, v)| format!("--{} {}", k, quote(&v.to_string())))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_right_biased() {
        let a = ParameterSet::new().with("lr", 0.1).with("reg", "L2");
        let b = ParameterSet::new().with("lr", 0.05);
        let c = merge(&a, &b);
        assert_eq!(c.get("lr"), Some(&Value::Number(0.05)));
        assert_eq!(c.get("reg"), Some(&Value::Text("L2".into())));
        // operands untouched
        assert_eq!(a.get("lr"), Some(&Value::Number(0.1)));

        let reversed = merge(&b, &a);
        assert_eq!(reversed.get("lr"), Some(&Value::Number(0.1)));
    }

    #[test]
    fn merge_unions_exclusions() {
        let mut a = ParameterSet::new();
        a.set("seed", 1, false, true);
        a.set("dir", "/tmp", true, false);
        let mut b = ParameterSet::new();
        b.set("threads", 4, false, true);

        let c = a.merged(&b);
        let expected: BTreeSet<String> =
            ["seed", "threads"].iter().map(|s| s.to_string()).collect();
        assert_eq!(c.excluded_from_name(), &expected);
        assert!(c.excluded_from_args().contains("dir"));
    }

    #[test]
    fn chained_merge_is_associative() {
        let a = ParameterSet::new().with("x", 1).with("y", 1);
        let b = ParameterSet::new().with("y", 2).with("z", 2);
        let c = ParameterSet::new().with("z", 3);
        assert_eq!(merge(&merge(&a, &b), &c), merge(&a, &merge(&b, &c)));
    }

    #[test]
    fn arguments_skip_excluded_and_none() {
        let mut p = ParameterSet::new().with("lr", 0.05).with("reg", "L2");
        p.set("note", "x", true, false);
        p.set_value("unset", Value::None);
        let args = p.arguments();
        assert!(args.contains("--lr 0.05"));
        assert!(args.contains("--reg L2"));
        assert!(!args.contains("note"));
        assert!(!args.contains("unset"));
        assert_eq!(args, p.arguments());
    }

    #[test]
    fn arguments_quote_unsafe_values() {
        let p = ParameterSet::new().with("feats", "a b");
        assert_eq!(p.arguments(), "--feats 'a b'");
        assert_eq!(p.argument_list(), vec!["--feats".to_string(), "a b".to_string()]);
    }

    #[test]
    fn remove_clears_exclusions() {
        let mut p = ParameterSet::new().with_hidden("seed", 3);
        assert!(!p.is_named("seed"));
        p.remove("seed");
        assert!(p.is_named("seed"));
        assert!(p.is_empty());
    }
}
