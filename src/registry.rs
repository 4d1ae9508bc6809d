//! Registry of advisors keyed by dialect and rule type.
//!
//! The registry is assembled once with a [`RegistryBuilder`] and never
//! mutated afterwards, so lookups need no synchronization. Dispatch is exact:
//! a rule type registered for MySQL is not available to TiDB unless it was
//! registered for TiDB as well.

use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::{
    advisor::{Advisor, register_builtin},
    error::ReviewError,
    rule::{Dialect, RuleType}
};

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| {
    let mut builder = RegistryBuilder::new();
    register_builtin(&mut builder);
    let registry = builder.build();
    tracing::debug!(advisors = registry.len(), "built-in advisors registered");
    registry
});

/// Collects advisor registrations before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    advisors: IndexMap<(Dialect, RuleType), Box<dyn Advisor>>
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an advisor for one dialect and rule type.
    ///
    /// # Panics
    ///
    /// Panics if an advisor is already registered for the same key. Duplicate
    /// registration is a programming error detected at startup.
    pub fn register(&mut self, dialect: Dialect, rule_type: RuleType, advisor: Box<dyn Advisor>) {
        let key = (dialect, rule_type);
        if self.advisors.contains_key(&key) {
            panic!(
                "advisor for rule {} is already registered for {}",
                key.1, key.0
            );
        }
        self.advisors.insert(key, advisor);
    }

    pub fn build(self) -> Registry {
        Registry {
            advisors: self.advisors
        }
    }
}

/// Immutable advisor table.
pub struct Registry {
    advisors: IndexMap<(Dialect, RuleType), Box<dyn Advisor>>
}

impl Registry {
    /// Registry holding every built-in advisor, built on first use.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn lookup(&self, dialect: Dialect, rule_type: &RuleType) -> Result<&dyn Advisor, ReviewError> {
        self.advisors
            .get(&(dialect, rule_type.clone()))
            .map(|advisor| &**advisor)
            .ok_or_else(|| ReviewError::NotSupported {
                dialect,
                rule_type: rule_type.clone()
            })
    }

    /// Rule types available for a dialect, in registration order.
    pub fn rule_types(&self, dialect: Dialect) -> impl Iterator<Item = &RuleType> {
        self.advisors
            .keys()
            .filter(move |(d, _)| *d == dialect)
            .map(|(_, rule_type)| rule_type)
    }

    pub fn len(&self) -> usize {
        self.advisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advisors.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.advisors.keys()).finish()
    }
}
