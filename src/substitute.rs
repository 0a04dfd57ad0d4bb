//! The variable substitution engine (spec.md §4.5): expand `$`-prefixed variables
//! inside a code template and, in lockstep, inside every local declaration's type
//! text. Single-pass (no fixpoint iteration, spec.md §9), grounded in the same
//! "clone then rewrite" discipline as `why_lib`'s formatter passes (`src/formatter`),
//! which build a new string per pass rather than mutating in place.
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::ctype::CTypeUtils;
use crate::ctype::Type;
use crate::entry::Local;

fn var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\$(?P<amp>[*&])?(?P<idx>\d+)(?:_(?P<suf>[A-Za-z][A-Za-z0-9]*))?|\$(?P<bamp>[*&])?(?P<bsuf>[A-Za-z][A-Za-z0-9]*)",
        )
        .unwrap()
    })
}

/// Expand every `$`-variable in `code` for parameter `index` (1-based), then perform
/// the identical expansion on every local whose declared type still contains a `$`.
/// Returns the rewritten code; `locals` is updated in place.
pub fn substitute(
    code: &str,
    locals: &mut [Local],
    type_: &Type,
    pname: Option<&str>,
    lname: Option<&str>,
    index: usize,
    ctype: &mut CTypeUtils,
) -> String {
    let new_code = substitute_str(code, type_, pname, lname, index, ctype);
    for local in locals.iter_mut() {
        if local.type_.contains('$') {
            local.type_ = substitute_str(&local.type_, type_, pname, lname, index, ctype);
        }
    }
    new_code
}

fn substitute_str(
    input: &str,
    type_: &Type,
    pname: Option<&str>,
    lname: Option<&str>,
    index: usize,
    ctype: &mut CTypeUtils,
) -> String {
    // `replace_all` takes `FnMut`, so `ctype` (needed for `remember`) can be
    // captured by mutable reference.
    let mut ctype = ctype;
    var_re()
        .replace_all(input, |caps: &Captures| -> String {
            expand_one(caps, type_, pname, lname, index, &mut ctype)
        })
        .into_owned()
}

fn expand_one(
    caps: &Captures,
    type_: &Type,
    pname: Option<&str>,
    lname: Option<&str>,
    index: usize,
    ctype: &mut CTypeUtils,
) -> String {
    let whole = caps.get(0).unwrap().as_str();

    if let Some(idx_m) = caps.name("idx") {
        let token_index: usize = match idx_m.as_str().parse() {
            Ok(n) => n,
            Err(_) => return whole.to_string(),
        };
        if token_index != index {
            // Not this call's parameter; a later `substitute` call (for that index)
            // will handle it.
            return whole.to_string();
        }
        let amp = caps.name("amp").map(|m| m.as_str());
        let suf = caps.name("suf").map(|m| m.as_str());
        return expand_suffix(whole, amp, suf, type_, pname, lname, ctype);
    }

    if let Some(bsuf_m) = caps.name("bsuf") {
        if index != 1 {
            // Bare forms are shorthand for parameter 1 only.
            return whole.to_string();
        }
        let amp = caps.name("bamp").map(|m| m.as_str());
        let suf = bsuf_m.as_str();
        // `$parmname` is the bare alias for the indexed `_name` suffix.
        let suf = if suf == "parmname" { "name" } else { suf };
        return expand_suffix(whole, amp, Some(suf), type_, pname, lname, ctype);
    }

    whole.to_string()
}

#[allow(clippy::too_many_arguments)]
fn expand_suffix(
    whole: &str,
    amp: Option<&str>,
    suf: Option<&str>,
    type_: &Type,
    pname: Option<&str>,
    lname: Option<&str>,
    ctype: &mut CTypeUtils,
) -> String {
    let eff_type = match amp {
        Some("*") => {
            if ctype.is_pointer(type_) {
                ctype.del_pointer(type_)
            } else {
                log::warn!(
                    target: "typemap_engine::substitute",
                    "ignoring '{whole}': $* used on non-pointer type {type_}"
                );
                return whole.to_string();
            }
        }
        Some("&") => ctype.add_pointer(type_),
        _ => type_.clone(),
    };

    match suf {
        // Bare `$<i>`: the wrapper-local name of parameter i.
        None => lname.unwrap_or_default().to_string(),
        Some("name") => pname.or(lname).unwrap_or_default().to_string(),
        Some("type") => ctype.str(&eff_type, None),
        Some("ltype") => ctype.str(&ctype.ltype(&eff_type), None),
        Some("mangle") => ctype.mangle(&eff_type),
        Some("descriptor") => {
            let descriptor = format!("SWIGTYPE{}", ctype.mangle(&eff_type));
            ctype.remember(&eff_type);
            descriptor
        }
        Some("basetype") => ctype.str(&ctype.base(&eff_type), None),
        Some("basemangle") => ctype.mangle(&ctype.base(&eff_type)),
        Some(s) if s.starts_with("dim") && s[3..].chars().all(|c| c.is_ascii_digit()) => {
            match s[3..].parse::<usize>().ok().and_then(|k| ctype.array_dim(type_, k)) {
                Some(d) => d,
                None => {
                    log::warn!(target: "typemap_engine::substitute", "ignoring '{whole}': no such array dimension on {type_}");
                    whole.to_string()
                }
            }
        }
        Some(_) => {
            log::warn!(target: "typemap_engine::substitute", "unrecognized template variable '{whole}'");
            whole.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctype() -> CTypeUtils {
        CTypeUtils::new()
    }

    #[test]
    fn bare_index_one_expands_lname() {
        let mut ct = ctype();
        let mut locals = vec![];
        let out = substitute(
            "$1 = PyInt_AsLong($input);",
            &mut locals,
            &Type::new("int"),
            Some("x"),
            Some("arg1"),
            1,
            &mut ct,
        );
        assert_eq!(out, "arg1 = PyInt_AsLong($input);");
    }

    #[test]
    fn indexed_form_only_touches_its_own_index() {
        let mut ct = ctype();
        let mut locals = vec![];
        let out = substitute(
            "$1 and $2_type stay",
            &mut locals,
            &Type::new("int"),
            Some("x"),
            Some("arg1"),
            1,
            &mut ct,
        );
        assert_eq!(out, "arg1 and $2_type stay");
    }

    #[test]
    fn array_dim_substitution() {
        let mut ct = ctype();
        let mut locals = vec![];
        let out = substitute(
            "memcpy($1, $input, sizeof(int)*$dim0);",
            &mut locals,
            &Type::new("int[10]"),
            None,
            Some("arg1"),
            1,
            &mut ct,
        );
        assert_eq!(out, "memcpy(arg1, $input, sizeof(int)*10);");
    }

    #[test]
    fn descriptor_expands_and_remembers() {
        let mut ct = ctype();
        let mut locals = vec![];
        let out = substitute(
            "$descriptor",
            &mut locals,
            &Type::new("Foo *"),
            None,
            Some("arg1"),
            1,
            &mut ct,
        );
        assert_eq!(out, "SWIGTYPE_p_Foo");
        assert_eq!(ct.remembered(), &[Type::new("Foo *")]);
    }

    #[test]
    fn star_on_non_pointer_is_tolerated() {
        let mut ct = ctype();
        let mut locals = vec![];
        let out = substitute("$*type", &mut locals, &Type::new("int"), None, Some("arg1"), 1, &mut ct);
        assert_eq!(out, "$*type");
    }

    #[test]
    fn local_type_templates_substitute_too() {
        let mut ct = ctype();
        let mut locals = vec![Local::new("temp", "$1_ltype")];
        let _ = substitute(
            "body",
            &mut locals,
            &Type::new("const int"),
            None,
            Some("arg1"),
            1,
            &mut ct,
        );
        assert_eq!(locals[0].type_, "int");
    }
}
