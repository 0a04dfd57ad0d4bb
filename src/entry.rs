use std::collections::HashMap;

use crate::ctype::Type;

/// A local variable declaration carried by an entry (spec's locals). `type_` may
/// itself contain `$`-variables that get substituted in lockstep with `code`
/// (spec.md §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    pub name: String,
    pub type_: String,
}

impl Local {
    pub fn new(name: impl Into<String>, type_: impl Into<String>) -> Self {
        Local {
            name: name.into(),
            type_: type_.into(),
        }
    }
}

/// A registered rule (spec's `E`): the code template plus auxiliary declarations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    pub code: String,
    pub type_: Option<Type>,
    pub pname: Option<String>,
    pub typemap: String,
    pub locals: Vec<Local>,
    pub kwargs: Vec<(String, String)>,
    pub extra: HashMap<String, String>,
}

impl Entry {
    pub fn new(typemap: impl Into<String>, type_: Type, code: impl Into<String>) -> Self {
        Entry {
            code: code.into(),
            type_: Some(type_),
            pname: None,
            typemap: typemap.into(),
            locals: vec![],
            kwargs: vec![],
            extra: HashMap::new(),
        }
    }

    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }

    /// `%clear`: drop code/locals/kwargs but leave the shell (spec.md §4.3).
    pub fn clear_fields(&mut self) {
        self.code.clear();
        self.locals.clear();
        self.kwargs.clear();
    }
}
