//! The registrar (spec.md §4.3): `register`, `copy` (`%apply`), `clear` (`%clear`),
//! `apply_multi` and `clear_apply_multi`.
use crate::codec::{encode_tail, method_key};
use crate::engine::Engine;
use crate::entry::{Entry, Local};
use crate::error::{TResult, TypemapError};
use crate::param::Param;

impl Engine {
    /// Store a rule in the top scope under the (possibly signature-suffixed) method
    /// key for `(op, parms)`. `parms` empty is a no-op; re-registering the same key
    /// replaces all fields (spec.md §4.3, §8).
    pub fn register(
        &mut self,
        op: &str,
        parms: &[Param],
        code: impl Into<String>,
        locals: Vec<Local>,
        kwargs: Vec<(String, String)>,
    ) {
        if parms.is_empty() {
            return;
        }
        let top = self.scopes.top_index();
        let mut current_op = op.to_string();
        let last = parms.len() - 1;
        for (i, p) in parms.iter().enumerate() {
            let node = self
                .scopes
                .get_or_create_node(top, &p.type_, p.name.as_deref());
            if i == last {
                let key = method_key(&current_op);
                log::trace!(target: "typemap_engine::registrar", "registering {key} on {}", p.type_);
                let entry = node.entry(&key);
                entry.code = code.into();
                entry.type_ = Some(p.type_.clone());
                entry.pname = p.name.clone();
                entry.typemap = op.to_string();
                entry.locals = locals;
                entry.kwargs = kwargs;
                return;
            }
            current_op = encode_tail(&current_op, std::slice::from_ref(p));
        }
    }

    /// Walk `parms` against `op` in scope `scope_idx` without any specificity
    /// fallback — the literal node chain `register` would have built.
    fn find_registered(&self, scope_idx: usize, op: &str, parms: &[Param]) -> Option<Entry> {
        let mut current_op = op.to_string();
        let last = parms.len().checked_sub(1)?;
        for (i, p) in parms.iter().enumerate() {
            if i == last {
                let key = method_key(&current_op);
                return self
                    .scopes
                    .get_node(scope_idx, &p.type_, p.name.as_deref())?
                    .get(&key)
                    .cloned();
            }
            self.scopes
                .get_node(scope_idx, &p.type_, p.name.as_deref())?;
            current_op = encode_tail(&current_op, std::slice::from_ref(p));
        }
        None
    }

    /// `%apply`: find `(op, src_parms)` in the nearest scope that has it and
    /// re-register its fields under `(op, dst_parms)` in the top scope.
    pub fn copy(&mut self, op: &str, src_parms: &[Param], dst_parms: &[Param]) -> TResult<bool> {
        if src_parms.len() != dst_parms.len() {
            return Err(TypemapError::BadArity {
                expected: src_parms.len(),
                found: dst_parms.len(),
            });
        }
        for scope_idx in (0..self.scopes.depth()).rev() {
            if let Some(entry) = self.find_registered(scope_idx, op, src_parms) {
                log::trace!(
                    target: "typemap_engine::registrar",
                    "%apply: copying '{op}' from scope {scope_idx} to top scope"
                );
                self.register(op, dst_parms, entry.code, entry.locals, entry.kwargs);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `%clear`: blank out `code`/`locals`/`kwargs` on the entry matched by
    /// `(op, parms)` in the top scope. The shell node is left in place. Silent if
    /// no such entry exists.
    pub fn clear(&mut self, op: &str, parms: &[Param]) {
        if parms.is_empty() {
            return;
        }
        let top = self.scopes.top_index();
        let mut current_op = op.to_string();
        let last = parms.len() - 1;
        for (i, p) in parms.iter().enumerate() {
            if i == last {
                let key = method_key(&current_op);
                if let Some(node) = self.scopes.get_node_mut(top, &p.type_, p.name.as_deref()) {
                    if let Some(entry) = node.get_mut(&key) {
                        entry.clear_fields();
                    }
                }
                return;
            }
            if self
                .scopes
                .get_node_mut(top, &p.type_, p.name.as_deref())
                .is_none()
            {
                return;
            }
            current_op = encode_tail(&current_op, std::slice::from_ref(p));
        }
    }

    /// Stronger multi-argument form of `%apply`: every method (any `op`) registered
    /// under `src_parms`'s signature is re-registered under `dst_parms`'s signature,
    /// across every scope, without overwriting anything already present at the
    /// destination. As in upstream, the destination's last-parameter node is created
    /// even if no source rule ends up matching (an intentionally-preserved ambient
    /// side effect — see DESIGN.md).
    pub fn apply_multi(&mut self, src_parms: &[Param], dst_parms: &[Param]) -> TResult<()> {
        if src_parms.len() != dst_parms.len() {
            return Err(TypemapError::BadArity {
                expected: src_parms.len(),
                found: dst_parms.len(),
            });
        }
        if src_parms.is_empty() {
            return Ok(());
        }
        let arity = src_parms.len() - 1;
        let last_src = src_parms.last().unwrap();
        let last_dst = dst_parms.last().unwrap();
        let src_suffix = encode_tail("", &src_parms[..arity]);
        let dst_suffix = encode_tail("", &dst_parms[..arity]);

        let top = self.scopes.top_index();
        // Force the destination shell into existence regardless of match outcome.
        self.scopes
            .get_or_create_node(top, &last_dst.type_, last_dst.name.as_deref());

        let mut to_insert = vec![];
        for scope_idx in (0..self.scopes.depth()).rev() {
            let Some(src_node) =
                self.scopes
                    .get_node(scope_idx, &last_src.type_, last_src.name.as_deref())
            else {
                continue;
            };
            for key in src_node.matching_keys("tmap:", arity) {
                if !key.ends_with(&src_suffix) {
                    continue;
                }
                let op_part = &key["tmap:".len()..key.len() - src_suffix.len()];
                let new_key = format!("tmap:{op_part}{dst_suffix}");
                let entry = src_node.get(&key).cloned().expect("key just enumerated");
                to_insert.push((new_key, entry));
            }
        }

        let dst_node = self
            .scopes
            .get_or_create_node(top, &last_dst.type_, last_dst.name.as_deref());
        for (key, entry) in to_insert {
            if !dst_node.contains_key(&key) {
                dst_node.insert(key, entry);
            }
        }
        Ok(())
    }

    /// Remove every per-method entry (any `op`) under `parms`'s last-parameter node
    /// in the top scope whose key carries exactly `parms`'s tail signature.
    pub fn clear_apply_multi(&mut self, parms: &[Param]) {
        if parms.is_empty() {
            return;
        }
        let arity = parms.len() - 1;
        let last = parms.last().unwrap();
        let suffix = encode_tail("", &parms[..arity]);
        let top = self.scopes.top_index();
        if let Some(node) = self.scopes.get_node_mut(top, &last.type_, last.name.as_deref()) {
            let keys: Vec<String> = node
                .matching_keys("tmap:", arity)
                .into_iter()
                .filter(|k| k.ends_with(&suffix))
                .collect();
            for key in keys {
                node.remove(&key);
            }
        }
    }
}
