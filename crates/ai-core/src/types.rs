use std::collections::BTreeMap;

/// Type-name reflection used for blackboard assignability.
///
/// Types are identified by name. A type may declare a single base type; assignability is either a
/// nominal match or a (transitive) derived-to-base relation.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    bases: BTreeMap<String, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `derived` extends `base`. Re-registering replaces the previous base.
    pub fn register(&mut self, derived: impl Into<String>, base: impl Into<String>) {
        self.bases.insert(derived.into(), base.into());
    }

    pub fn with(mut self, derived: impl Into<String>, base: impl Into<String>) -> Self {
        self.register(derived, base);
        self
    }

    pub fn base_of(&self, type_name: &str) -> Option<&str> {
        self.bases.get(type_name).map(|s| s.as_str())
    }

    /// `true` when a value of type `from` may be used where `to` is expected.
    pub fn is_assignable(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut current = from;
        // Bounded walk: a malformed registry with cycles must not hang the caller.
        for _ in 0..=self.bases.len() {
            match self.base_of(current) {
                Some(base) if base == to => return true,
                Some(base) => current = base,
                None => return false,
            }
        }
        false
    }
}
