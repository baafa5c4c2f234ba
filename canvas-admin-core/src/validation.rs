//! Validation Engine - Rule Chains and the Error Map
//!
//! Each field runs its chain in order and the first failing rule wins.
//! The error map holds one message per failing field; the form is valid
//! exactly when the map is empty.

use std::collections::BTreeMap;

use tokio::sync::watch;

use crate::rules::{FieldInput, Rule};

pub type ErrorMap = BTreeMap<String, String>;

/// Value plus its ordered rule chain, bound for a single validation call.
pub struct FieldSpec<'a, V: ?Sized> {
    pub value: &'a V,
    pub rules: Vec<&'a dyn Rule<V>>,
}

impl<'a, V: ?Sized> FieldSpec<'a, V> {
    pub fn new(value: &'a V, rules: Vec<&'a dyn Rule<V>>) -> Self {
        Self { value, rules }
    }
}

/// Type-erased field so one form can mix value kinds.
trait FieldCheck {
    fn is_blank(&self) -> bool;
    fn first_failure(&self) -> Option<String>;
}

impl<V: FieldInput + ?Sized> FieldCheck for FieldSpec<'_, V> {
    fn is_blank(&self) -> bool {
        self.value.is_blank()
    }

    fn first_failure(&self) -> Option<String> {
        self.rules.iter().find_map(|rule| match rule.check(self.value) {
            Ok(()) => None,
            Err(message) => {
                tracing::trace!(rule = rule.name(), %message, "rule failed");
                Some(message)
            }
        })
    }
}

/// Named fields to validate together.
#[derive(Default)]
pub struct FormSpec<'a> {
    fields: Vec<(String, Box<dyn FieldCheck + 'a>)>,
}

impl<'a> FormSpec<'a> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field<V: FieldInput + ?Sized + 'a>(
        mut self,
        name: impl Into<String>,
        value: &'a V,
        rules: Vec<&'a dyn Rule<V>>,
    ) -> Self {
        self.fields.push((name.into(), Box::new(FieldSpec::new(value, rules))));
        self
    }
}

/// Holds the error map for one form.
pub struct FormValidator {
    errors: ErrorMap,
    skip_empty: bool,
    validity: watch::Sender<bool>,
}

impl FormValidator {
    pub fn new() -> Self {
        let (validity, _) = watch::channel(true);
        Self {
            errors: ErrorMap::new(),
            skip_empty: false,
            validity,
        }
    }

    /// Validate one field against its chain.
    ///
    /// In skip-empty mode a blank value is valid without running any rule.
    pub fn validate_field<V: FieldInput + ?Sized>(
        &mut self,
        field: &str,
        value: &V,
        rules: &[&dyn Rule<V>],
    ) -> bool {
        let spec = FieldSpec::new(value, rules.to_vec());
        self.apply(field, &spec)
    }

    /// Validate every field in `form`; fields not named keep their entries.
    pub fn validate_form(&mut self, form: &FormSpec<'_>) -> bool {
        form.fields
            .iter()
            .fold(true, |valid, (name, spec)| self.apply(name, spec.as_ref()) && valid)
    }

    pub fn clear_errors(&mut self, skip_required_on_empty: bool) {
        self.errors.clear();
        self.skip_empty = skip_required_on_empty;
        self.publish();
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn skip_empty(&self) -> bool {
        self.skip_empty
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Receiver that sees the form validity after every change to the map.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.validity.subscribe()
    }

    fn apply(&mut self, field: &str, spec: &dyn FieldCheck) -> bool {
        let failure = if self.skip_empty && spec.is_blank() {
            None
        } else {
            spec.first_failure()
        };

        let valid = match failure {
            Some(message) => {
                self.errors.insert(field.to_string(), message);
                false
            }
            None => {
                self.errors.remove(field);
                true
            }
        };
        self.publish();
        valid
    }

    fn publish(&self) {
        let valid = self.errors.is_empty();
        self.validity.send_if_modified(|current| {
            let changed = *current != valid;
            *current = valid;
            changed
        });
    }
}

impl Default for FormValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Email, FnRule, MinLength, Required, RequiredTags, REQUIRED_MESSAGE};

    #[test]
    fn test_first_failing_rule_wins() {
        let mut validator = FormValidator::new();
        let calls = std::cell::Cell::new(0);
        let counted = FnRule::new("counted", |_: &str| -> crate::rules::RuleResult {
            calls.set(calls.get() + 1);
            Err("never shown".to_string())
        });

        let valid = validator.validate_field("email", "", &[&Required, &Email, &counted]);

        assert!(!valid);
        assert_eq!(validator.error("email"), Some(REQUIRED_MESSAGE));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_passing_revalidation_clears_entry() {
        let mut validator = FormValidator::new();
        assert!(!validator.validate_field("password", "abc", &[&Required, &MinLength(6)]));
        assert!(!validator.is_valid());

        assert!(validator.validate_field("password", "abcdef", &[&Required, &MinLength(6)]));
        assert!(validator.errors().is_empty());
        assert!(validator.is_valid());
    }

    #[test]
    fn test_skip_empty_bypasses_every_rule() {
        let mut validator = FormValidator::new();
        let tags: Vec<String> = vec![];
        validator.validate_field("tags", &tags, &[&RequiredTags]);
        assert_eq!(validator.errors().len(), 1);

        validator.clear_errors(true);
        assert!(validator.skip_empty());
        let panicking = FnRule::new("unreachable", |_: &Vec<String>| -> crate::rules::RuleResult {
            panic!("rule must not run for blank input")
        });
        assert!(validator.validate_field("tags", &tags, &[&Required, &panicking]));
        assert!(validator.validate_field("name", "   ", &[&Required]));
        assert!(validator.is_valid());
    }

    #[test]
    fn test_skip_empty_still_checks_filled_values() {
        let mut validator = FormValidator::new();
        validator.clear_errors(true);
        assert!(!validator.validate_field("email", "nope", &[&Required, &Email]));
        assert!(validator.error("email").is_some());
    }

    #[test]
    fn test_subscriber_tracks_validity() {
        let mut validator = FormValidator::new();
        let rx = validator.subscribe();
        assert!(*rx.borrow());

        validator.validate_field("name", "", &[&Required]);
        assert!(!*rx.borrow());

        validator.clear_errors(false);
        assert!(*rx.borrow());
    }
}
