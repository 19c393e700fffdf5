//! Model definition validation errors and semantic validation.
//!
//! The filtering engine never checks that table rows sum to 1. Definition
//! files are checked here, before a model is built from them.

use std::collections::{BTreeMap, HashMap, HashSet};

use hmm_common::NO_OP_NAME;
use thiserror::Error;

use crate::model::ModelDefinition;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Model definition validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Row {row} of the {table} table sums to {sum}, expected 1")]
    RowSum { table: String, row: String, sum: f64 },

    #[error("No model found: {0}")]
    NotFound(String),
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
            ValidationError::RowSum { .. } => 67,
            ValidationError::NotFound(_) => 68,
        }
    }
}

impl From<ValidationError> for hmm_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::IoError(msg) | ValidationError::NotFound(msg) => {
                hmm_common::Error::Config(msg)
            }
            other => hmm_common::Error::InvalidModel(other.to_string()),
        }
    }
}

/// Validate a definition, returning the first problem found.
pub fn validate_model(def: &ModelDefinition, tolerance: f64) -> ValidationResult<()> {
    match model_issues(def, tolerance).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Collect every problem in a definition, in a stable order.
pub fn model_issues(def: &ModelDefinition, tolerance: f64) -> Vec<ValidationError> {
    let mut issues = Vec::new();

    if def.schema_version != crate::MODEL_SCHEMA_VERSION {
        issues.push(ValidationError::VersionMismatch {
            expected: crate::MODEL_SCHEMA_VERSION.to_string(),
            actual: def.schema_version.clone(),
        });
    }

    if def.states.is_empty() {
        issues.push(ValidationError::MissingField("states".to_string()));
    }
    if def.perceptions.is_empty() {
        issues.push(ValidationError::MissingField("perceptions".to_string()));
    }

    check_distinct("states", &def.states, &mut issues);
    check_distinct("perceptions", &def.perceptions, &mut issues);
    check_distinct("actions", &def.actions, &mut issues);

    if def.actions.iter().any(|a| a == NO_OP_NAME) {
        issues.push(ValidationError::InvalidValue {
            field: "actions".to_string(),
            message: format!("'{}' is reserved for the no-op action", NO_OP_NAME),
        });
    }

    let has_wait = def.has_wait_action();
    if def.actions.is_empty() && !has_wait {
        issues.push(ValidationError::SemanticError(
            "model has no actions and include_wait is false".to_string(),
        ));
    }

    let states: HashSet<&str> = def.states.iter().map(String::as_str).collect();
    let perceptions: HashSet<&str> = def.perceptions.iter().map(String::as_str).collect();
    let actions: HashSet<&str> = def.actions.iter().map(String::as_str).collect();

    if let Some(prior) = &def.prior {
        check_prior(prior, &states, tolerance, &mut issues);
    }

    // Transitions: (from, action) -> summed probability.
    let mut transition_rows: HashMap<(&str, Option<&str>), f64> = HashMap::new();
    let mut seen_transitions = HashSet::new();
    for (i, entry) in def.transitions.iter().enumerate() {
        let field = format!("transitions[{}]", i);
        check_member(&format!("{}.from", field), &entry.from, &states, "state", &mut issues);
        check_member(&format!("{}.to", field), &entry.to, &states, "state", &mut issues);
        match entry.action.as_deref() {
            Some(action) => {
                check_member(&format!("{}.action", field), action, &actions, "action", &mut issues)
            }
            None if !has_wait => issues.push(ValidationError::InvalidValue {
                field: format!("{}.action", field),
                message: "entry uses the no-op action but include_wait is false".to_string(),
            }),
            None => {}
        }
        check_probability(&format!("{}.probability", field), entry.probability, &mut issues);

        let key = (entry.from.as_str(), entry.action.as_deref(), entry.to.as_str());
        if !seen_transitions.insert(key) {
            issues.push(ValidationError::InvalidValue {
                field,
                message: "duplicate transition entry".to_string(),
            });
        }
        *transition_rows
            .entry((entry.from.as_str(), entry.action.as_deref()))
            .or_insert(0.0) += entry.probability;
    }

    let mut row_actions: Vec<Option<&str>> = def.actions.iter().map(|a| Some(a.as_str())).collect();
    if has_wait {
        row_actions.push(None);
    }
    for state in &def.states {
        for action in &row_actions {
            let sum = transition_rows
                .get(&(state.as_str(), *action))
                .copied()
                .unwrap_or(0.0);
            if (sum - 1.0).abs() > tolerance {
                issues.push(ValidationError::RowSum {
                    table: "transition".to_string(),
                    row: format!("({}, {})", state, action.unwrap_or(NO_OP_NAME)),
                    sum,
                });
            }
        }
    }

    let mut sensor_rows: HashMap<&str, f64> = HashMap::new();
    let mut seen_sensor = HashSet::new();
    for (i, entry) in def.sensor.iter().enumerate() {
        let field = format!("sensor[{}]", i);
        check_member(&format!("{}.state", field), &entry.state, &states, "state", &mut issues);
        check_member(
            &format!("{}.perception", field),
            &entry.perception,
            &perceptions,
            "perception",
            &mut issues,
        );
        check_probability(&format!("{}.probability", field), entry.probability, &mut issues);
        if !seen_sensor.insert((entry.state.as_str(), entry.perception.as_str())) {
            issues.push(ValidationError::InvalidValue {
                field,
                message: "duplicate sensor entry".to_string(),
            });
        }
        *sensor_rows.entry(entry.state.as_str()).or_insert(0.0) += entry.probability;
    }
    for state in &def.states {
        let sum = sensor_rows.get(state.as_str()).copied().unwrap_or(0.0);
        if (sum - 1.0).abs() > tolerance {
            issues.push(ValidationError::RowSum {
                table: "sensor".to_string(),
                row: state.clone(),
                sum,
            });
        }
    }

    issues
}

fn check_distinct(field: &str, ids: &[String], issues: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            issues.push(ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("duplicate '{}'", id),
            });
        }
    }
}

fn check_member(
    field: &str,
    id: &str,
    declared: &HashSet<&str>,
    kind: &str,
    issues: &mut Vec<ValidationError>,
) {
    if !declared.contains(id) {
        issues.push(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("unknown {} '{}'", kind, id),
        });
    }
}

fn check_probability(field: &str, p: f64, issues: &mut Vec<ValidationError>) {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        issues.push(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be in [0, 1], got {}", p),
        });
    }
}

fn check_prior(
    prior: &BTreeMap<String, f64>,
    states: &HashSet<&str>,
    tolerance: f64,
    issues: &mut Vec<ValidationError>,
) {
    for (state, &p) in prior {
        let field = format!("prior.{}", state);
        check_member(&field, state, states, "state", issues);
        check_probability(&field, p, issues);
    }
    let sum: f64 = prior.values().sum();
    if (sum - 1.0).abs() > tolerance {
        issues.push(ValidationError::SemanticError(format!(
            "Prior must sum to 1.0, got {}",
            sum
        )));
    }
}
