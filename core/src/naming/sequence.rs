/// Hands out `prefix1`, `prefix2`, ... for stages created without a name.
#[derive(Debug, Clone)]
pub struct NameSequence {
    prefix: String,
    next: usize,
}

impl NameSequence {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    pub fn next_name(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        name
    }
}

impl Default for NameSequence {
    fn default() -> Self {
        Self::new("stage")
    }
}
