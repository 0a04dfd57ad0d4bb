//! The attach/lookup facade (spec.md §4.6, §4.7): the glue wrapper emission actually
//! calls — run a lookup or multi-argument attach, substitute, declare locals through
//! the wrapper builder, and (for `attach`) stamp the result back onto the parameter
//! list as attributes. Grounded on `why_lib::typechecker::context::Context`'s role as
//! the single façade other modules call into rather than touching `Scope` directly.
use regex::Regex;

use crate::ctype::Type;
use crate::engine::Engine;
use crate::param::Param;
use crate::substitute::substitute;
use crate::wrapper::WrapperBuilder;

impl Engine {
    /// Single-argument convenience (spec.md §4.6): look up `(op, type, pname)`,
    /// substitute at `index=1`, declare locals if a wrapper is supplied, then run the
    /// `$source`/`$target`/`$typemap`/`$parmname` post-pass. Returns `None` if no
    /// code-bearing rule matches.
    #[allow(clippy::too_many_arguments)]
    pub fn lookup(
        &mut self,
        op: &str,
        type_: &Type,
        pname: Option<&str>,
        lname: Option<&str>,
        source: &str,
        target: &str,
        wrapper: Option<&mut dyn WrapperBuilder>,
    ) -> Option<String> {
        let entry = self.search(op, type_, pname)?;
        if !entry.has_code() {
            return None;
        }
        let mut locals = entry.locals.clone();
        let mut code = substitute(&entry.code, &mut locals, type_, pname, lname, 1, &mut self.ctype);

        if let Some(w) = wrapper {
            if !locals.is_empty() {
                declare_locals(&mut code, &locals, None, w);
            }
        }

        code = code.replace("$source", source);
        code = code.replace("$target", target);
        code = code.replace("$typemap", &entry.typemap);
        if let Some(name) = pname.or(lname) {
            code = code.replace("$parmname", name);
        }
        Some(code)
    }

    /// Multi-argument wrapper-emission glue (spec.md §4.6): walks `parms` left to
    /// right, consuming as many as `search_multi` matches at each position and
    /// stamping the rendered result onto the first consumed parameter's attributes.
    pub fn attach(&mut self, op: &str, parms: &mut [Param], mut wrapper: Option<&mut dyn WrapperBuilder>) {
        let mut pos = 0;
        while pos < parms.len() {
            let (entry, nmatch) = self.search_multi(op, &parms[pos..]);
            let Some(entry) = entry else {
                pos += 1;
                continue;
            };

            let mut code = entry.code.clone();
            let mut locals = entry.locals.clone();
            for i in 0..nmatch {
                let p = &parms[pos + i];
                code = substitute(
                    &code,
                    &mut locals,
                    &p.type_,
                    p.name.as_deref(),
                    p.lname.as_deref(),
                    i + 1,
                    &mut self.ctype,
                );
            }

            let argnum = pos + 1;
            if let Some(w) = wrapper.as_deref_mut() {
                if !locals.is_empty() {
                    declare_locals(&mut code, &locals, Some(argnum), w);
                }
            }
            code = code.replace("$argnum", &argnum.to_string());

            let next_name = parms
                .get(pos + nmatch)
                .and_then(|p| p.effective_name())
                .unwrap_or("")
                .to_string();

            let first = &mut parms[pos];
            first.setattr(&format!("tmap:{op}"), code);
            first.setattr(&format!("tmap:{op}:next"), next_name);
            for (name, value) in &entry.kwargs {
                first.setattr(&format!("tmap:{op}:{name}"), value.clone());
            }

            pos += nmatch;
        }
    }
}

/// Local Declaration Rule (spec.md §4.7). `argnum` is `None` for `lookup` (candidate
/// name left unchanged) and `Some(position)` for `attach` (candidate name suffixed
/// with the 1-based position of the first consumed parameter).
fn declare_locals(
    code: &mut String,
    locals: &[crate::entry::Local],
    argnum: Option<usize>,
    wrapper: &mut dyn WrapperBuilder,
) {
    for local in locals {
        if local.name.is_empty() {
            continue;
        }
        let candidate = match argnum {
            Some(n) => format!("{}{n}", local.name),
            None => local.name.clone(),
        };
        let declaration = format!("{} {}", local.type_, candidate);
        let actual = wrapper.new_localv(&candidate, &declaration);
        *code = replace_identifier(code, &local.name, &actual);
    }
}

/// Replace every identifier-boundary occurrence of `needle` in `haystack` with
/// `replacement` (spec.md §4.7: "not arbitrary substring").
fn replace_identifier(haystack: &str, needle: &str, replacement: &str) -> String {
    identifier_re(needle).replace_all(haystack, replacement).into_owned()
}

fn identifier_re(needle: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b", regex::escape(needle))).expect("escaped literal is always a valid pattern")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Local;
    use crate::wrapper::NullWrapper;

    #[test]
    fn lookup_substitutes_and_leaves_input_token_alone() {
        let mut engine = Engine::new();
        engine.register(
            "in",
            &[Param::named("int", "x")],
            "$1 = PyInt_AsLong($input);",
            vec![],
            vec![],
        );
        let code = engine
            .lookup(
                "in",
                &Type::new("int"),
                Some("x"),
                Some("arg1"),
                "obj0",
                "result",
                None,
            )
            .unwrap();
        assert_eq!(code, "arg1 = PyInt_AsLong($input);");
    }

    #[test]
    fn lookup_runs_post_pass_replacements() {
        let mut engine = Engine::new();
        engine.register(
            "out",
            &[Param::new("int")],
            "$target = $source; // $typemap $parmname",
            vec![],
            vec![],
        );
        let code = engine
            .lookup(
                "out",
                &Type::new("int"),
                Some("ret"),
                Some("arg1"),
                "result",
                "resultobj",
                None,
            )
            .unwrap();
        assert_eq!(code, "resultobj = result; // out ret");
    }

    #[test]
    fn lookup_declares_locals_through_wrapper() {
        let mut engine = Engine::new();
        engine.register(
            "in",
            &[Param::new("int")],
            "temp = $1;",
            vec![Local::new("temp", "int")],
            vec![],
        );
        let mut wrapper = NullWrapper::new();
        let code = engine
            .lookup(
                "in",
                &Type::new("int"),
                None,
                Some("arg1"),
                "obj0",
                "result",
                Some(&mut wrapper),
            )
            .unwrap();
        assert_eq!(code, "temp = arg1;");
        assert_eq!(wrapper.declared, vec![("temp".to_string(), "int temp".to_string())]);
    }

    #[test]
    fn attach_consumes_multi_arg_rule_and_stamps_attributes() {
        let mut engine = Engine::new();
        let parms = vec![Param::named("int", "argc"), Param::named("char **", "argv")];
        engine.register("in", &parms, "wrap($1, $2);", vec![], vec![]);

        let mut live = vec![
            Param::named("int", "argc").with_lname("arg1"),
            Param::named("char **", "argv").with_lname("arg2"),
        ];
        engine.attach("in", &mut live, None);

        assert_eq!(live[0].getattr("tmap:in"), Some("wrap(arg1, arg2);"));
        assert_eq!(live[0].getattr("tmap:in:next"), Some(""));
    }

    #[test]
    fn attach_advances_past_unmatched_parameters() {
        let mut engine = Engine::new();
        engine.register("in", &[Param::named("double", "y")], "d($1);", vec![], vec![]);
        let mut live = vec![
            Param::named("int", "x").with_lname("arg1"),
            Param::named("double", "y").with_lname("arg2"),
        ];
        engine.attach("in", &mut live, None);
        assert!(live[0].getattr("tmap:in").is_none());
        assert_eq!(live[1].getattr("tmap:in"), Some("d(arg2);"));
    }
}
