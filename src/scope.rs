//! The scoped store (spec.md §3, §4.1): a stack of scopes, each scope a two-level
//! keyed map from `(type, name?)` to a dictionary of per-method entries.
//!
//! Grounded on `why_lib::typechecker::scope::Scope` and the legacy
//! `src/typechecker/typescope.rs::TypeScope`: both hold a `Vec` of frame handles and
//! walk it back-to-front on lookup. This store is simpler than either teacher
//! (there's no need for `Rc<RefCell<_>>` sharing — nothing outside the `ScopeStack`
//! ever holds a live reference into a frame) but keeps their "innermost at the back,
//! walk in reverse" shape.
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::ctype::Type;
use crate::entry::Entry;

/// One node in the per-scope type tree. Used both as a "type node" (its `names` map
/// populated) and as a "name node" (its `names` map always empty) — spec.md §3 gives
/// both the same shape, so one struct serves both roles.
#[derive(Debug, Clone, Default)]
pub struct Node {
    methods: HashMap<String, Entry>,
    names: HashMap<String, Node>,
}

impl Node {
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.methods.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.methods.get_mut(key)
    }

    pub fn entry(&mut self, key: &str) -> &mut Entry {
        self.methods.entry(key.to_string()).or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: Entry) {
        self.methods.insert(key.into(), entry);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.methods.contains_key(key)
    }

    pub fn name_node(&self, name: &str) -> Option<&Node> {
        self.names.get(name)
    }

    pub fn name_node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.names.get_mut(name)
    }

    /// Every method key in this node whose `count_args` matches `arity` and whose
    /// key begins with `prefix` (used by `apply_multi`/`clear_apply_multi`).
    pub fn matching_keys(&self, prefix: &str, arity: usize) -> Vec<String> {
        self.methods
            .keys()
            .filter(|k| k.starts_with(prefix) && crate::codec::count_args(k) == arity)
            .cloned()
            .collect()
    }

    pub fn remove(&mut self, key: &str) {
        self.methods.remove(key);
    }
}

/// One lexical frame: a `type -> type-node` map plus the `%except` side-channel
/// (spec.md §6: a single string under the well-known key `*except*`, read back with
/// top-down scope search — the same search every other lookup uses, so it lives next
/// to the node tree rather than in a separate structure).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    types: HashMap<Type, Node>,
    except: Option<String>,
}

impl Scope {
    pub fn type_node(&self, type_: &Type) -> Option<&Node> {
        self.types.get(type_)
    }

    pub fn type_node_mut(&mut self, type_: &Type) -> Option<&mut Node> {
        self.types.get_mut(type_)
    }

    pub fn types(&self) -> impl Iterator<Item = (&Type, &Node)> {
        self.types.iter()
    }
}

/// The stack of scopes (spec's `Σ`), bounded at `max_depth` frames; the bottom scope
/// (index 0) is created at `init()` and is never popped.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    max_depth: usize,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![Scope::default()],
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        ScopeStack {
            scopes: vec![Scope::default()],
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn top_index(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Push a fresh empty scope. Returns `false` on overflow (spec.md §4.1, §7:
    /// overflow is fatal and the engine layer panics on a `false` result).
    pub fn push_scope(&mut self) -> bool {
        if self.scopes.len() >= self.max_depth {
            log::error!(
                target: "typemap_engine::scope",
                "scope stack overflow: depth already at max ({})",
                self.max_depth
            );
            return false;
        }
        self.scopes.push(Scope::default());
        true
    }

    /// Pop and return the top scope. Returns `None` if only the bottom scope
    /// remains (spec.md: "bottom is sticky").
    pub fn pop_scope(&mut self) -> Option<Scope> {
        if self.scopes.len() <= 1 {
            log::trace!(target: "typemap_engine::scope", "pop_scope on bottom scope is a no-op");
            return None;
        }
        self.scopes.pop()
    }

    pub fn scope(&self, idx: usize) -> Option<&Scope> {
        self.scopes.get(idx)
    }

    pub fn scope_mut(&mut self, idx: usize) -> Option<&mut Scope> {
        self.scopes.get_mut(idx)
    }

    pub fn top_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }

    /// Fetch the `type-node` or (if `name` is non-empty) its `name-node`.
    pub fn get_node(&self, scope_idx: usize, type_: &Type, name: Option<&str>) -> Option<&Node> {
        let type_node = self.scope(scope_idx)?.type_node(type_)?;
        match name {
            Some(n) if !n.is_empty() => type_node.name_node(n),
            _ => Some(type_node),
        }
    }

    /// Fetch a mutable handle to an existing `(type, name)` node without creating one.
    pub fn get_node_mut(
        &mut self,
        scope_idx: usize,
        type_: &Type,
        name: Option<&str>,
    ) -> Option<&mut Node> {
        let type_node = self.scope_mut(scope_idx)?.type_node_mut(type_)?;
        match name {
            Some(n) if !n.is_empty() => type_node.name_node_mut(n),
            _ => Some(type_node),
        }
    }

    /// Locate or create the node for `(type, name)` in the given scope, creating the
    /// type-node and name-node as needed (registration never fails to find a home).
    pub fn get_or_create_node(
        &mut self,
        scope_idx: usize,
        type_: &Type,
        name: Option<&str>,
    ) -> &mut Node {
        let scope = self.scope_mut(scope_idx).expect("scope index in range");
        let type_node = scope.types.entry(type_.clone()).or_default();
        match name {
            Some(n) if !n.is_empty() => type_node.names.entry(n.to_string()).or_default(),
            _ => type_node,
        }
    }

    /// Scopes from top to bottom, as every lookup/copy walk requires.
    pub fn iter_top_down(&self) -> impl Iterator<Item = (usize, &Scope)> {
        self.scopes.iter().enumerate().rev()
    }

    pub fn set_except(&mut self, message: impl Into<String>) {
        self.top_mut().except = Some(message.into());
    }

    pub fn get_except(&self) -> Option<String> {
        self.iter_top_down()
            .find_map(|(_, scope)| scope.except.clone())
    }

    /// Human-readable dump of every scope's node tree, top-down (spec.md §6 "Debug
    /// surface"). Grounded in `why_lib::typechecker::scope::Frame`'s hand-written
    /// `Debug` impl, which renders a cleaned-up view rather than the raw derive.
    pub fn debug(&self) -> String {
        let mut out = String::new();
        for (idx, scope) in self.iter_top_down() {
            let _ = writeln!(out, "scope {idx}:");
            let mut types: Vec<_> = scope.types().collect();
            types.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
            for (type_, node) in types {
                let mut keys: Vec<_> = node.methods.keys().collect();
                keys.sort();
                if !keys.is_empty() {
                    let _ = writeln!(out, "  {type_}: {keys:?}");
                }
                let mut names: Vec<_> = node.names.keys().collect();
                names.sort();
                for name in names {
                    let name_node = &node.names[name];
                    let mut keys: Vec<_> = name_node.methods.keys().collect();
                    keys.sort();
                    let _ = writeln!(out, "  {type_} {name}: {keys:?}");
                }
            }
            if let Some(except) = &scope.except {
                let _ = writeln!(out, "  *except*: {except:?}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_has_single_scope() {
        let stack = ScopeStack::new();
        assert_eq!(stack.depth(), 1);
        assert!(stack
            .get_node(0, &Type::new("int"), None)
            .is_none());
    }

    #[test]
    fn push_and_pop() {
        let mut stack = ScopeStack::new();
        assert!(stack.push_scope());
        assert_eq!(stack.depth(), 2);
        assert!(stack.pop_scope().is_some());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn bottom_scope_is_sticky() {
        let mut stack = ScopeStack::new();
        assert!(stack.pop_scope().is_none());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn overflow_is_rejected() {
        let mut stack = ScopeStack::with_max_depth(2);
        assert!(stack.push_scope());
        assert!(!stack.push_scope());
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn get_or_create_roundtrip() {
        let mut stack = ScopeStack::new();
        let ty = Type::new("int");
        stack
            .get_or_create_node(0, &ty, Some("x"))
            .entry("tmap:in")
            .code = "body".into();
        let node = stack.get_node(0, &ty, Some("x")).unwrap();
        assert_eq!(node.get("tmap:in").unwrap().code, "body");
    }
}
