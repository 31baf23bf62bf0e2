use crate::rule::{CompiledRule, Rule};
use crate::RenameError;
use tracing::{debug, warn};
use uuid::Uuid;

/// A rule together with the result of compiling it. Compilation happens when the rule enters
/// the chain, so a bad pattern is known before any file is processed.
#[derive(Debug, Clone)]
pub struct ChainEntry {
    rule: Rule,
    compiled: Result<CompiledRule, RenameError>,
}

impl ChainEntry {
    fn new(rule: Rule) -> Self {
        let compiled = rule.compile();
        if let Err(e) = &compiled {
            warn!("Rule '{}' ({}) will fail: {}", rule.name, rule.id, e);
        }
        Self { rule, compiled }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn compiled(&self) -> Result<&CompiledRule, &RenameError> {
        self.compiled.as_ref()
    }
}

/// Ordered list of rules. Order is transform order.
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    entries: Vec<ChainEntry>,
}

impl RuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule and returns its id. A missing or already used id is replaced with a fresh
    /// one.
    pub fn add(&mut self, mut rule: Rule) -> String {
        if rule.id.is_empty() {
            rule.id = Uuid::new_v4().to_string();
        } else if self.contains(&rule.id) {
            let fresh = Uuid::new_v4().to_string();
            warn!("Rule id '{}' already in use, reassigning to '{}'", rule.id, fresh);
            rule.id = fresh;
        }
        debug!(
            "Adding rule '{}' ({}): /{}/ -> '{}'",
            rule.name, rule.id, rule.pattern, rule.replace
        );
        let id = rule.id.clone();
        self.entries.push(ChainEntry::new(rule));
        id
    }

    pub fn remove_by_id(&mut self, id: &str) -> bool {
        match self.entries.iter().position(|e| e.rule.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every rule with the given name and returns how many were removed.
    pub fn remove_by_name(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.rule.name != name);
        before - self.entries.len()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.entries.iter().map(|e| &e.rule).find(|r| r.id == id)
    }

    /// Swaps in a new rule at the position of `id`, keeping that id.
    pub fn replace(&mut self, id: &str, mut rule: Rule) -> bool {
        match self.entries.iter_mut().find(|e| e.rule.id == id) {
            Some(entry) => {
                rule.id = id.to_string();
                *entry = ChainEntry::new(rule);
                true
            }
            None => false,
        }
    }

    /// Drops every rule and adds `rules` in order.
    pub fn reset(&mut self, rules: Vec<Rule>) {
        self.entries.clear();
        for rule in rules {
            self.add(rule);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.rule.id == id)
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.entries.iter().map(|e| e.rule.clone()).collect()
    }

    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    /// Compile errors of every rule in the chain, in order.
    pub fn validate(&self) -> Vec<(String, RenameError)> {
        self.entries
            .iter()
            .filter_map(|e| e.compiled.as_ref().err().map(|err| (e.rule.id.clone(), err.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
