//! The top-level engine value (spec.md §5, §9: "Model as a single owned engine
//! value constructed at startup and passed by reference, not as ambient globals.
//! Tests instantiate fresh engines.") — mirrors `Typechecker::from_ast`/`Scope::new`
//! being plain constructors rather than `once_cell`/`lazy_static` globals.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ctype::CTypeUtils;
use crate::scope::ScopeStack;

/// Owns the scope stack, the type-string utilities and the method-name interning
/// table for the lifetime of one wrapper-generation run.
pub struct Engine {
    pub(crate) scopes: ScopeStack,
    pub(crate) ctype: CTypeUtils,
    interned: RefCell<HashMap<String, Rc<str>>>,
    max_depth: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            scopes: ScopeStack::new(),
            ctype: CTypeUtils::new(),
            interned: RefCell::new(HashMap::new()),
            max_depth: ScopeStack::DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Engine {
            scopes: ScopeStack::with_max_depth(max_depth),
            ctype: CTypeUtils::new(),
            interned: RefCell::new(HashMap::new()),
            max_depth,
        }
    }

    /// Reset to a single empty global scope (spec.md §4.1 `init()`), preserving
    /// whatever `max_depth` the engine was constructed with.
    pub fn init(&mut self) {
        self.scopes = ScopeStack::with_max_depth(self.max_depth);
        self.interned.borrow_mut().clear();
    }

    pub fn push_scope(&mut self) {
        if !self.scopes.push_scope() {
            log::error!(target: "typemap_engine::engine", "push_scope: scope stack overflow");
            panic!("typemap engine: scope stack overflow (depth limit reached)");
        }
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop_scope();
    }

    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    pub fn add_typedef(&mut self, name: impl Into<String>, underlying: impl Into<String>) {
        self.ctype.add_typedef(name, underlying);
    }

    pub fn ctype(&self) -> &CTypeUtils {
        &self.ctype
    }

    pub fn set_except(&mut self, message: impl Into<String>) {
        self.scopes.set_except(message);
    }

    pub fn get_except(&self) -> Option<String> {
        self.scopes.get_except()
    }

    pub fn debug(&self) -> String {
        self.scopes.debug()
    }

    /// `op -> "tmap:" + op`, memoized for the life of the engine (spec.md §5).
    pub(crate) fn method_key(&self, op: &str) -> Rc<str> {
        if let Some(existing) = self.interned.borrow().get(op) {
            return existing.clone();
        }
        let key: Rc<str> = Rc::from(crate::codec::method_key(op));
        self.interned
            .borrow_mut()
            .insert(op.to_string(), key.clone());
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_resets_to_single_scope() {
        let mut engine = Engine::new();
        engine.push_scope();
        engine.push_scope();
        assert_eq!(engine.depth(), 3);
        engine.init();
        assert_eq!(engine.depth(), 1);
    }

    #[test]
    fn method_key_is_memoized() {
        let engine = Engine::new();
        let a = engine.method_key("in");
        let b = engine.method_key("in");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(&*a, "tmap:in");
    }
}
