//! The parameter abstraction (spec's `P`): an attribute bag linked into an ordered
//! list via `next`, matching spec.md §6's "head with `nextSibling` links; length
//! counted by walking" parameter-node contract.
use std::collections::HashMap;

use crate::ctype::Type;

/// One parameter in a (possibly multi-argument) typemap signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub type_: Type,
    pub name: Option<String>,
    pub lname: Option<String>,
    pub value: Option<String>,
    extra: HashMap<String, String>,
}

impl Param {
    pub fn new(type_: impl Into<Type>) -> Self {
        Param {
            type_: type_.into(),
            name: None,
            lname: None,
            value: None,
            extra: HashMap::new(),
        }
    }

    pub fn named(type_: impl Into<Type>, name: impl Into<String>) -> Self {
        let mut p = Param::new(type_);
        p.name = Some(name.into());
        p
    }

    pub fn with_lname(mut self, lname: impl Into<String>) -> Self {
        self.lname = Some(lname.into());
        self
    }

    pub fn getattr(&self, key: &str) -> Option<&str> {
        match key {
            "type" => Some(self.type_.as_str()),
            "name" => self.name.as_deref(),
            "lname" => self.lname.as_deref(),
            "value" => self.value.as_deref(),
            other => self.extra.get(other).map(|s| s.as_str()),
        }
    }

    pub fn setattr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match key {
            "type" => self.type_ = Type::new(value),
            "name" => self.name = Some(value),
            "lname" => self.lname = Some(value),
            "value" => self.value = Some(value),
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    /// The name used as a substitution target: the declared parameter name if
    /// present, else the synthetic wrapper-local name (spec.md §4.5: "if `pname` is
    /// absent, substitute `lname` where `pname` would go").
    pub fn effective_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.lname.as_deref())
    }
}

/// An ordered, independently-owned list of parameters. Every insertion into the
/// scoped store deep-copies from a list like this one (spec.md §3 "Deep-copy on
/// insert"), so the caller's original list is never aliased.
pub type ParamList = Vec<Param>;
