//! Identifier types for states, actions, and perceptions.
//!
//! Each identifier space gets its own newtype so a perception can never be
//! passed where a state is expected. Actions are an enum: the no-op action
//! is a variant of its own and cannot collide with any named action.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text spelling of [`Action::NoOp`] in step scripts and CLI output.
pub const NO_OP_NAME: &str = "noop";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                $name(id)
            }
        }
    };
}

string_id!(
    /// Hidden state identifier.
    StateId
);

string_id!(
    /// Observation identifier.
    PerceptionId
);

string_id!(
    /// Name of a deliberate action.
    ActionId
);

/// An action that advances the model one time step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// No deliberate action: time passes until the next perception.
    NoOp,
    /// A named action from the model's action list.
    Named(ActionId),
}

impl Action {
    pub fn named(name: impl Into<String>) -> Self {
        Action::Named(ActionId::new(name))
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self, Action::NoOp)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoOp => f.write_str(NO_OP_NAME),
            Action::Named(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for Action {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == NO_OP_NAME {
            Ok(Action::NoOp)
        } else {
            Ok(Action::named(s))
        }
    }
}

impl From<ActionId> for Action {
    fn from(id: ActionId) -> Self {
        Action::Named(id)
    }
}
