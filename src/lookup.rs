//! The specificity-ordered lookup engine (spec.md §4.4): `search` walks the scope
//! stack top-down, and within each scope runs the six-step candidate ladder (exact
//! name, type-only, array-ANY variants, qualifier-stripped, typedef-resolved,
//! default-for) before giving up on that scope and falling further down. Grounded on
//! `why_lib::typechecker::scope::Scope::get_type`/`get_variable`'s "walk frames
//! back-to-front, return on first hit" shape.
//!
//! Step 6 (`default_for`) is special: per spec.md §4.4 it "does not require a
//! non-empty code to win," so whatever it finds is this scope's (and the whole
//! search's) conclusive answer rather than a cross-scope fallback another scope's
//! code-bearing entry could still override — see `ScopeOutcome::Default`.
use crate::codec::encode_tail;
use crate::ctype::Type;
use crate::engine::Engine;
use crate::entry::Entry;
use crate::param::Param;

/// What a single candidate probe (one `(type, name)` pair, or its type-only
/// sibling) produced.
enum ProbeOutcome {
    /// A code-bearing entry — the walk stops here.
    Hit(Entry),
    /// An entry was found but carried no code; kept only as a fallback of last resort.
    Empty(Entry),
    Miss,
}

/// What a single scope's candidate ladder produced.
enum ScopeOutcome {
    /// A code-bearing entry — the walk stops here.
    Hit(Entry),
    /// An entry was found but carried no code; kept only as a fallback of last resort,
    /// possibly still overridden by a code-bearing entry in a different scope.
    Empty(Entry),
    /// The generic `default_for` candidate (step 6) matched, with or without code.
    /// Spec.md §4.4 step 6: "this step does not require a non-empty code to win" —
    /// unlike every earlier step, whatever step 6 finds is this scope's conclusive
    /// verdict, not a cross-scope fallback a later scope's code-bearing entry could
    /// still override.
    Default(Entry),
    Miss,
}

impl Engine {
    /// Find the best-matching entry for `(op, type, name)`, searching from the
    /// innermost scope outward. A code-bearing entry in any scope wins outright; if
    /// none is ever found, the shallowest-found empty-shell entry is returned instead
    /// (spec.md §4.4: "most specific code-bearing entry wins; empty-code entries are
    /// only a fallback of last resort").
    pub fn search(&self, op: &str, type_: &Type, name: Option<&str>) -> Option<Entry> {
        let key = self.method_key(op);
        let mut fallback: Option<Entry> = None;
        for scope_idx in (0..self.scopes.depth()).rev() {
            match self.search_scope(scope_idx, &key, type_, name) {
                ScopeOutcome::Hit(entry) => return Some(entry),
                // Step 6 already is this scope's (and the whole search's) final word —
                // see `ScopeOutcome::Default`.
                ScopeOutcome::Default(entry) => return Some(entry),
                ScopeOutcome::Empty(entry) => {
                    if fallback.is_none() {
                        fallback = Some(entry);
                    }
                }
                ScopeOutcome::Miss => {}
            }
        }
        fallback
    }

    /// Run the full candidate ladder against one scope.
    fn search_scope(&self, scope_idx: usize, key: &str, type_: &Type, name: Option<&str>) -> ScopeOutcome {
        let mut local_fallback: Option<Entry> = None;
        let mut current = type_.clone();
        loop {
            match self.probe_type(scope_idx, key, &current, name) {
                ProbeOutcome::Hit(entry) => return ScopeOutcome::Hit(entry),
                ProbeOutcome::Empty(entry) => {
                    if local_fallback.is_none() {
                        local_fallback = Some(entry);
                    }
                }
                ProbeOutcome::Miss => {}
            }

            let stripped = self.ctype.strip_qualifiers(&current);
            if stripped != current {
                current = stripped;
                continue;
            }
            if let Some(resolved) = self.ctype.typedef_resolve(&current) {
                current = resolved;
                continue;
            }
            break;
        }

        if let Some(default) = self.ctype.default_for(type_) {
            match self.probe_type(scope_idx, key, &default, name) {
                ProbeOutcome::Hit(entry) => return ScopeOutcome::Hit(entry),
                // Non-default steps beat default (specificity rule), so only step 6's
                // own find becomes authoritative when nothing earlier in this scope
                // already claimed the slot.
                ProbeOutcome::Empty(entry) => {
                    if local_fallback.is_none() {
                        return ScopeOutcome::Default(entry);
                    }
                }
                ProbeOutcome::Miss => {}
            }
        }

        match local_fallback {
            Some(entry) => ScopeOutcome::Empty(entry),
            None => ScopeOutcome::Miss,
        }
    }

    /// Steps 1-3 of the ladder for one candidate type: exact name, type-only, and (for
    /// arrays) the same two checks against the `[ANY]`-normalized shape.
    fn probe_type(&self, scope_idx: usize, key: &str, type_: &Type, name: Option<&str>) -> ProbeOutcome {
        if let outcome @ (ProbeOutcome::Hit(_) | ProbeOutcome::Empty(_)) = self.probe_node(scope_idx, key, type_, name) {
            return outcome;
        }
        if self.ctype.is_array(type_) {
            let any = self.ctype.with_any_dims(type_);
            if let outcome @ (ProbeOutcome::Hit(_) | ProbeOutcome::Empty(_)) = self.probe_node(scope_idx, key, &any, name) {
                return outcome;
            }
        }
        ProbeOutcome::Miss
    }

    /// Check `(type, name)` then `(type, None)` at one scope. An empty-code entry at
    /// the name-level node does not win outright — it is kept as a fallback so the
    /// type-only node still gets a chance to produce a code-bearing hit (spec.md
    /// §4.4: "the first candidate that yields an entry *with non-empty code* wins;
    /// otherwise the best entry found without code is recorded as a fallback").
    fn probe_node(&self, scope_idx: usize, key: &str, type_: &Type, name: Option<&str>) -> ProbeOutcome {
        let mut fallback: Option<Entry> = None;
        if let Some(n) = name {
            if !n.is_empty() {
                if let Some(node) = self.scopes.get_node(scope_idx, type_, Some(n)) {
                    if let Some(entry) = node.get(key) {
                        if entry.has_code() {
                            return ProbeOutcome::Hit(entry.clone());
                        }
                        fallback.get_or_insert_with(|| entry.clone());
                    }
                }
            }
        }
        if let Some(node) = self.scopes.get_node(scope_idx, type_, None) {
            if let Some(entry) = node.get(key) {
                if entry.has_code() {
                    return ProbeOutcome::Hit(entry.clone());
                }
                fallback.get_or_insert_with(|| entry.clone());
            }
        }
        match fallback {
            Some(entry) => ProbeOutcome::Empty(entry),
            None => ProbeOutcome::Miss,
        }
    }

    /// Find the best multi-argument rule starting at `parms[0]`, preferring the
    /// longest signature that resolves to a code-bearing entry (the spec's recursive
    /// walk is phrased front-to-back, but multi-argument rules are stored at the
    /// *last* consumed parameter's node under a suffix encoding the rest — see
    /// DESIGN.md for why this implementation tries the longest consumption first and
    /// shrinks, rather than literally recursing forward). Returns the winning entry
    /// together with how many leading parameters it consumed.
    pub fn search_multi(&self, op: &str, parms: &[Param]) -> (Option<Entry>, usize) {
        if parms.is_empty() {
            return (None, 0);
        }
        for take in (1..=parms.len()).rev() {
            let prefix_op = encode_tail(op, &parms[..take - 1]);
            let last = &parms[take - 1];
            if let Some(entry) = self.search(&prefix_op, &last.type_, last.name.as_deref()) {
                if entry.has_code() {
                    return (Some(entry), take);
                }
            }
        }
        (None, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Local;

    #[test]
    fn exact_match_wins() {
        let mut engine = Engine::new();
        engine.register(
            "in",
            &[Param::named("int", "x")],
            "exact",
            vec![],
            vec![],
        );
        let hit = engine.search("in", &Type::new("int"), Some("x")).unwrap();
        assert_eq!(hit.code, "exact");
    }

    #[test]
    fn falls_back_to_type_only_then_qualifier_strip() {
        let mut engine = Engine::new();
        engine.register("in", &[Param::new("int")], "generic", vec![], vec![]);
        let hit = engine
            .search("in", &Type::new("const int"), Some("y"))
            .unwrap();
        assert_eq!(hit.code, "generic");
    }

    #[test]
    fn array_any_fallback() {
        let mut engine = Engine::new();
        engine.register("in", &[Param::new("int[ANY]")], "array-rule", vec![], vec![]);
        let hit = engine.search("in", &Type::new("int[10]"), None).unwrap();
        assert_eq!(hit.code, "array-rule");
    }

    #[test]
    fn typedef_resolve_one_level() {
        let mut engine = Engine::new();
        engine.add_typedef("myint", "int");
        engine.register("in", &[Param::new("int")], "int-rule", vec![], vec![]);
        let hit = engine.search("in", &Type::new("myint"), None).unwrap();
        assert_eq!(hit.code, "int-rule");
    }

    #[test]
    fn pointer_default_fallback() {
        let mut engine = Engine::new();
        engine.register("in", &[Param::new("void *")], "generic-ptr", vec![], vec![]);
        let hit = engine.search("in", &Type::new("Foo *"), None).unwrap();
        assert_eq!(hit.code, "generic-ptr");
    }

    #[test]
    fn type_only_code_beats_cleared_name_specific_entry() {
        let mut engine = Engine::new();
        engine.register("in", &[Param::named("int", "x")], "named-rule", vec![], vec![]);
        engine.clear("in", &[Param::named("int", "x")]);
        engine.register("in", &[Param::new("int")], "type-only-rule", vec![], vec![]);
        let hit = engine.search("in", &Type::new("int"), Some("x")).unwrap();
        assert_eq!(hit.code, "type-only-rule");
    }

    #[test]
    fn cleared_pointer_default_is_conclusive_for_its_scope() {
        let mut engine = Engine::new();
        engine.register("in", &[Param::new("void *")], "outer-default", vec![], vec![]);
        engine.push_scope();
        engine.register("in", &[Param::new("void *")], "", vec![], vec![]);
        let found = engine.search("in", &Type::new("Foo *"), None);
        assert_eq!(found.map(|e| e.code), Some(String::new()));
    }

    #[test]
    fn code_bearing_entry_in_outer_scope_beats_empty_shell_in_inner_scope() {
        let mut engine = Engine::new();
        engine.register("in", &[Param::named("int", "x")], "outer-code", vec![], vec![]);
        engine.push_scope();
        engine.register("in", &[Param::named("int", "x")], "", vec![Local::new("a", "int")], vec![]);
        let hit = engine.search("in", &Type::new("int"), Some("x")).unwrap();
        assert_eq!(hit.code, "outer-code");
    }

    #[test]
    fn search_multi_finds_longest_signature() {
        let mut engine = Engine::new();
        let parms = vec![Param::named("int", "argc"), Param::named("char **", "argv")];
        engine.register("in", &parms, "argcv-rule", vec![], vec![]);
        let (hit, nmatch) = engine.search_multi("in", &parms);
        assert_eq!(hit.unwrap().code, "argcv-rule");
        assert_eq!(nmatch, 2);
    }

    #[test]
    fn search_multi_falls_back_to_single_arg() {
        let mut engine = Engine::new();
        engine.register("in", &[Param::named("int", "x")], "single", vec![], vec![]);
        let parms = vec![Param::named("int", "x"), Param::named("double", "y")];
        let (hit, nmatch) = engine.search_multi("in", &parms);
        assert_eq!(hit.unwrap().code, "single");
        assert_eq!(nmatch, 1);
    }
}
