mod builder;
pub use builder::PolicyBuilder;

use std::collections::{btree_map::Entry, BTreeMap};

use crate::errors::{Error, Result};
use crate::matcher::{Conditions, Params};
use crate::validator::{validate_table, DefaultValidator};

/// Resource selector of the bucket that applies regardless of resource.
pub const ANY_RESOURCE: &str = "";

/// Decision engine. Represents a read-only rule table and can
/// evaluate `Request` based on it.
///
/// For a known entity two buckets are scanned as a single sequence:
/// rules registered under the requested resource, then rules registered
/// under `ANY_RESOURCE`. The first `RuleSet` whose conditions match decides.
/// If nothing matches, the default `Decision` is returned.
#[derive(Debug)]
pub struct Policy {
    default_decision: Decision,
    rules: RuleTable,
}

impl Policy {
    /// Validates `rules` and builds the engine.
    pub fn new(rules: RuleTable, default_decision: Decision) -> Result<Self> {
        validate_table(&rules, &DefaultValidator)?;
        Ok(Self::new_unchecked(rules, default_decision))
    }

    pub(crate) fn new_unchecked(rules: RuleTable, default_decision: Decision) -> Self {
        Self {
            default_decision,
            rules,
        }
    }

    /// Evaluates the provided `&Request` and produces the `Verdict`.
    pub fn evaluate<'a>(&self, request: &'a Request) -> Verdict<'a> {
        let decision = self
            .rules
            .get(request.entity())
            .and_then(|policy| {
                policy
                    .candidates(request.resource())
                    .find(|rule_set| rule_set.matches(request.params()))
            })
            .map_or(self.default_decision, |rule_set| rule_set.effect().into());

        Verdict { decision, request }
    }

    /// Same as `evaluate`, returning only whether the request is allowed.
    pub fn check(&self, request: &Request) -> bool {
        self.evaluate(request).is_allowed()
    }

    pub fn default_decision(&self) -> Decision {
        self.default_decision
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}

/// Entity identifier to its `EntityPolicy`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable(BTreeMap<String, EntityPolicy>);

impl RuleTable {
    pub fn new() -> Self {
        RuleTable(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, entity: &str) -> Option<&EntityPolicy> {
        self.0.get(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityPolicy)> {
        self.0.iter().map(|(entity, policy)| (entity.as_str(), policy))
    }

    /// Adds rules for `entity`. Rules of an already known entity are
    /// appended after the existing ones.
    pub fn insert(&mut self, entity: &str, policy: EntityPolicy) {
        match self.0.entry(entity.to_string()) {
            Entry::Vacant(item) => {
                item.insert(policy);
            }
            Entry::Occupied(mut item) => item.get_mut().merge(policy),
        }
    }
}

/// Resource selector to an ordered list of `RuleSet`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPolicy(BTreeMap<String, Vec<RuleSet>>);

impl EntityPolicy {
    pub fn new() -> Self {
        EntityPolicy(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, resource: &str) -> Option<&[RuleSet]> {
        self.0.get(resource).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RuleSet])> {
        self.0
            .iter()
            .map(|(resource, rule_sets)| (resource.as_str(), rule_sets.as_slice()))
    }

    /// Appends `rule_set` to the bucket of `resource`.
    pub fn push(&mut self, resource: &str, rule_set: RuleSet) {
        self.0
            .entry(resource.to_string())
            .or_insert_with(Vec::new)
            .push(rule_set);
    }

    pub fn merge(&mut self, policy: EntityPolicy) {
        for (resource, rule_sets) in policy.0 {
            self.0
                .entry(resource)
                .or_insert_with(Vec::new)
                .extend(rule_sets);
        }
    }

    /// Rule sets in scan order: the resource bucket, then the
    /// `ANY_RESOURCE` bucket. An empty resource only has the latter.
    pub fn candidates<'a>(&'a self, resource: &str) -> impl Iterator<Item = &'a RuleSet> + 'a {
        let specific = if resource == ANY_RESOURCE {
            None
        } else {
            self.0.get(resource)
        };

        specific
            .into_iter()
            .flatten()
            .chain(self.0.get(ANY_RESOURCE).into_iter().flatten())
    }
}

/// An effect and the conditions under which it applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    effect: Effect,
    conditions: Conditions,
}

impl RuleSet {
    pub fn new(effect: Effect, conditions: Conditions) -> Self {
        Self { effect, conditions }
    }

    pub fn allow(conditions: impl Into<Conditions>) -> Self {
        Self::new(Effect::Allow, conditions.into())
    }

    pub fn deny(conditions: impl Into<Conditions>) -> Self {
        Self::new(Effect::Deny, conditions.into())
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn matches(&self, params: &Params) -> bool {
        self.conditions.matches(params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    entity: String,
    resource: String,
    params: Params,
}

impl Request {
    pub fn new(entity: impl Into<String>, resource: impl Into<String>) -> Result<Self> {
        Self::with_params(entity, resource, Params::new())
    }

    pub fn with_params(
        entity: impl Into<String>,
        resource: impl Into<String>,
        params: Params,
    ) -> Result<Self> {
        let entity = entity.into();
        if entity.is_empty() {
            return Err(Error::BadRequest("Entity must be specified".into()));
        }

        Ok(Self {
            entity,
            resource: resource.into(),
            params,
        })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// Outcome of an evaluation together with the request it was made for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict<'a> {
    decision: Decision,
    request: &'a Request,
}

impl<'a> Verdict<'a> {
    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allowed
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }

    pub fn entity(&self) -> &'a str {
        self.request.entity()
    }

    pub fn resource(&self) -> &'a str {
        self.request.resource()
    }

    pub fn params(&self) -> &'a Params {
        self.request.params()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Decision {
    Allowed,
    #[default]
    Denied,
}

impl From<Effect> for Decision {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Allow => Decision::Allowed,
            Effect::Deny => Decision::Denied,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}
