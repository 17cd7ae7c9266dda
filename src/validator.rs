use crate::errors::{Error, Result};
use crate::matcher::{Accepted, Condition, Conditions};
use crate::policy::RuleTable;

/// Validates names used in a rule table before a `Policy` is built.
pub trait PolicyValidator {
    fn validate(&self, field: Field, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Entity,
    Resource,
    ConditionKey,
    ConditionValue,
}

/// Rejects empty entity identifiers and empty condition keys.
#[derive(Debug)]
pub struct DefaultValidator;

impl PolicyValidator for DefaultValidator {
    fn validate(&self, field: Field, value: &str) -> Result<()> {
        match field {
            Field::Entity | Field::ConditionKey if value.is_empty() => Err(Error::Configuration(
                format!("{field:?} must not be empty"),
            )),
            _ => Ok(()),
        }
    }
}

/// Walks the whole table, so evaluation never meets an invalid rule.
pub(crate) fn validate_table<V>(rules: &RuleTable, validator: &V) -> Result<()>
where
    V: PolicyValidator,
{
    for (entity, policy) in rules.iter() {
        validator.validate(Field::Entity, entity)?;
        for (resource, rule_sets) in policy.iter() {
            validator.validate(Field::Resource, resource)?;
            for rule_set in rule_sets {
                validate_conditions(rule_set.conditions(), validator)?;
            }
        }
    }
    Ok(())
}

fn validate_conditions<V>(conditions: &Conditions, validator: &V) -> Result<()>
where
    V: PolicyValidator,
{
    let conditions = match conditions {
        Conditions::MatchAll => return Ok(()),
        Conditions::All(conditions) => conditions,
    };

    for condition in conditions {
        validator.validate(Field::ConditionKey, condition.key())?;
        if let Condition::Equals { key, accepted } = condition {
            match accepted {
                Accepted::Any => {}
                Accepted::OneOf(values) if values.is_empty() => {
                    return Err(Error::Configuration(format!(
                        "condition on `{key}` accepts no values and can never match"
                    )));
                }
                Accepted::OneOf(values) => {
                    for value in values {
                        validator.validate(Field::ConditionValue, value)?;
                    }
                }
            }
        }
    }
    Ok(())
}
