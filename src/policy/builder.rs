use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    matcher::{Accepted, Condition, Conditions},
    policy::{Effect as CoreEffect, EntityPolicy, RuleSet, RuleTable, ANY_RESOURCE},
    validator::validate_table,
    Decision, DefaultValidator, Error, Policy, PolicyValidator, Result,
};

const WILDCARD: &str = "*";

enum Source {
    Json(String),
    Rules(RuleTable),
}

/// Builds a `Policy` from a json definition or an in-memory `RuleTable`.
///
/// Json definitions may describe an entity either as a flat ordered list of
/// rules, each naming its resource, or as a mapping from resource to an
/// ordered list of rules. Both are normalized into the resource keyed
/// `RuleTable` before the policy is validated and built.
pub struct PolicyBuilder<V> {
    validator: V,
    source: Source,
    default_decision: Decision,
}

impl PolicyBuilder<DefaultValidator> {
    pub fn from_json(json: &str) -> Self {
        Self::from_source(Source::Json(json.into()))
    }

    pub fn from_rules(rules: RuleTable) -> Self {
        Self::from_source(Source::Rules(rules))
    }

    fn from_source(source: Source) -> Self {
        Self {
            validator: DefaultValidator,
            source,
            default_decision: Decision::Denied,
        }
    }
}

impl<V> PolicyBuilder<V>
where
    V: PolicyValidator,
{
    pub fn with_validator<U>(self, validator: U) -> PolicyBuilder<U>
    where
        U: PolicyValidator,
    {
        PolicyBuilder {
            validator,
            source: self.source,
            default_decision: self.default_decision,
        }
    }

    pub fn with_default_decision(mut self, decision: Decision) -> Self {
        self.default_decision = decision;
        self
    }

    pub fn build(self) -> Result<Policy> {
        let rules = match self.source {
            Source::Json(json) => {
                let definition: PolicyDefinition = serde_json::from_str(&json)?;
                let rules = definition.rules.ok_or_else(|| {
                    Error::Configuration("a rule table must be supplied".into())
                })?;
                normalize(rules)?
            }
            Source::Rules(rules) => rules,
        };

        validate_table(&rules, &self.validator)?;

        debug!(
            entities = rules.len(),
            default_decision = ?self.default_decision,
            "built policy"
        );

        Ok(Policy::new_unchecked(rules, self.default_decision))
    }
}

fn normalize(definitions: BTreeMap<String, EntityDefinition>) -> Result<RuleTable> {
    let mut rules = RuleTable::new();
    for (entity, definition) in definitions {
        rules.insert(&entity, process_entity(definition)?);
    }
    Ok(rules)
}

fn process_entity(definition: EntityDefinition) -> Result<EntityPolicy> {
    let mut policy = EntityPolicy::new();
    match definition {
        EntityDefinition::Flat(statements) => {
            // declaration order is kept per resource bucket.
            for statement in statements {
                let resource = resource_selector(statement.resource.as_deref());
                let rule_set = into_rule_set(statement.effect, statement.conditions)?;
                policy.push(resource, rule_set);
            }
        }
        EntityDefinition::Keyed(resources) => {
            for (resource, rules) in resources {
                let resource = resource_selector(Some(resource.as_str()));
                for rule in rules {
                    policy.push(resource, into_rule_set(rule.effect, rule.conditions)?);
                }
            }
        }
    }
    Ok(policy)
}

fn resource_selector(resource: Option<&str>) -> &str {
    match resource {
        None | Some(WILDCARD) => ANY_RESOURCE,
        Some(resource) => resource,
    }
}

fn into_rule_set(effect: EffectDefinition, conditions: Option<Value>) -> Result<RuleSet> {
    Ok(RuleSet::new(effect.into(), process_conditions(conditions)?))
}

fn process_conditions(conditions: Option<Value>) -> Result<Conditions> {
    match conditions {
        None => Ok(Conditions::default()),
        Some(Value::String(ref marker)) if marker == WILDCARD => Ok(Conditions::MatchAll),
        Some(Value::Array(items)) => {
            let mut conditions = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(key) if key == WILDCARD => {
                        return Err(Error::Configuration(
                            "wildcard `*` must replace the whole condition list".into(),
                        ));
                    }
                    Value::String(key) => conditions.push(Condition::present(key)),
                    Value::Object(map) => conditions.extend(process_key_values(map)?),
                    other => return Err(invalid_condition(&other)),
                }
            }
            Ok(Conditions::All(conditions))
        }
        Some(other) => Err(Error::Configuration(format!(
            "conditions must be a list or `*`, found {other}"
        ))),
    }
}

fn process_key_values(map: Map<String, Value>) -> Result<Vec<Condition>> {
    if map.is_empty() {
        return Err(Error::Configuration(
            "key-value condition must name at least one key".into(),
        ));
    }

    let mut conditions = Vec::with_capacity(map.len());
    for (key, value) in map {
        let accepted = match value {
            Value::String(value) if value == WILDCARD => Accepted::Any,
            Value::String(value) => Accepted::OneOf(vec![value]),
            Value::Array(values) => process_accepted(&key, values)?,
            other => return Err(invalid_condition(&other)),
        };
        conditions.push(Condition::Equals { key, accepted });
    }
    Ok(conditions)
}

fn process_accepted(key: &str, values: Vec<Value>) -> Result<Accepted> {
    if values.is_empty() {
        return Err(Error::Configuration(format!(
            "condition on `{key}` accepts no values and can never match"
        )));
    }

    let mut accepted = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::String(value) if value == WILDCARD => return Ok(Accepted::Any),
            Value::String(value) => accepted.push(value),
            other => return Err(invalid_condition(&other)),
        }
    }
    Ok(Accepted::OneOf(accepted))
}

fn invalid_condition(value: &Value) -> Error {
    Error::Configuration(format!("unrecognized condition shape {value}"))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyDefinition {
    #[serde(default)]
    rules: Option<BTreeMap<String, EntityDefinition>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntityDefinition {
    Flat(Vec<FlatRuleDefinition>),
    Keyed(BTreeMap<String, Vec<RuleDefinition>>),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FlatRuleDefinition {
    #[serde(default)]
    resource: Option<String>,
    effect: EffectDefinition,
    #[serde(default, deserialize_with = "present")]
    conditions: Option<Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDefinition {
    effect: EffectDefinition,
    #[serde(default, deserialize_with = "present")]
    conditions: Option<Value>,
}

/// Keeps an explicit `null` as `Some(Value::Null)`, apart from a missing field.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Deserialize, Copy, Clone)]
#[serde(rename_all = "camelCase")]
enum EffectDefinition {
    Allow,
    Deny,
}

impl From<EffectDefinition> for CoreEffect {
    fn from(effect: EffectDefinition) -> Self {
        match effect {
            EffectDefinition::Allow => CoreEffect::Allow,
            EffectDefinition::Deny => CoreEffect::Deny,
        }
    }
}
