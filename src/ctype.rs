//! Type string utilities.
//!
//! Spec marks the `SwigType_*` family as an external collaborator and only pins down
//! its interface (parse/manipulate a C/C++ type string). The upstream `swig` source
//! this crate was distilled from yielded no usable reference code, so this module is
//! a minimal, self-contained implementation of that interface: a `Type` is just text,
//! equality is textual, and every transform below is string surgery, not a real C
//! grammar parser.
use std::collections::HashMap;
use std::fmt::Display;

use self::array_pattern::array_re;

/// An opaque, textually-compared C/C++ type string (spec's `T`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Type(String);

impl Type {
    pub fn new(s: impl Into<String>) -> Self {
        Type(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Type {
    fn from(s: &str) -> Self {
        Type::new(s)
    }
}

impl From<String> for Type {
    fn from(s: String) -> Self {
        Type::new(s)
    }
}

const QUALIFIERS: [&str; 2] = ["const", "volatile"];

/// Owns the typedef table and the set of types a wrapper actually emitted a
/// descriptor for (spec's `SwigType_remember` side channel), and implements every
/// `SwigType_*` operation spec.md §3/§6 lists.
#[derive(Debug, Clone, Default)]
pub struct CTypeUtils {
    typedefs: HashMap<String, String>,
    remembered: Vec<Type>,
}

impl CTypeUtils {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_typedef(&mut self, name: impl Into<String>, underlying: impl Into<String>) {
        self.typedefs.insert(name.into(), underlying.into());
    }

    /// Split a type into its bracket-free "head" and its trailing `[dim]...` suffix.
    fn split_array(t: &Type) -> (String, Vec<String>) {
        let s = t.as_str();
        let mut dims = vec![];
        let mut rest = s;
        while let Some(caps) = array_re().captures(rest) {
            let whole = caps.get(0).unwrap();
            if whole.end() != rest.len() {
                break;
            }
            dims.push(caps[1].to_string());
            rest = &rest[..whole.start()];
        }
        dims.reverse();
        (rest.to_string(), dims)
    }

    pub fn is_array(&self, t: &Type) -> bool {
        !Self::split_array(t).1.is_empty()
    }

    pub fn array_ndim(&self, t: &Type) -> usize {
        Self::split_array(t).1.len()
    }

    pub fn array_dim(&self, t: &Type, i: usize) -> Option<String> {
        Self::split_array(t).1.get(i).cloned()
    }

    pub fn array_set_dim(&self, t: &Type, i: usize, value: &str) -> Type {
        let (head, mut dims) = Self::split_array(t);
        if let Some(slot) = dims.get_mut(i) {
            *slot = value.to_string();
        }
        let mut out = head;
        for d in dims {
            out.push('[');
            out.push_str(&d);
            out.push(']');
        }
        Type::new(out)
    }

    /// Replace every array dimension with the literal wildcard `ANY`.
    pub fn with_any_dims(&self, t: &Type) -> Type {
        let (head, dims) = Self::split_array(t);
        let mut out = head;
        for _ in dims {
            out.push_str("[ANY]");
        }
        Type::new(out)
    }

    pub fn strip_qualifiers(&self, t: &Type) -> Type {
        let mut s = t.as_str().trim();
        loop {
            let mut stripped = None;
            for q in QUALIFIERS {
                if let Some(rest) = s.strip_prefix(q) {
                    if let Some(rest) = rest.strip_prefix(' ') {
                        stripped = Some(rest.trim_start());
                        break;
                    }
                }
            }
            match stripped {
                Some(rest) => s = rest,
                None => break,
            }
        }
        Type::new(s)
    }

    /// Resolve exactly one typedef level on the type's base identifier, preserving
    /// any pointer/array suffix. Returns `None` if the base is not a registered
    /// typedef (the caller then knows to stop walking).
    pub fn typedef_resolve(&self, t: &Type) -> Option<Type> {
        let (head, dims) = Self::split_array(t);
        let (base, stars) = split_pointer(&head);
        let resolved = self.typedefs.get(base.trim())?;
        let mut out = resolved.clone();
        out.push_str(&stars);
        for d in dims {
            out.push('[');
            out.push_str(&d);
            out.push(']');
        }
        Some(Type::new(out))
    }

    pub fn is_pointer(&self, t: &Type) -> bool {
        t.as_str().trim_end().ends_with('*')
    }

    pub fn add_pointer(&self, t: &Type) -> Type {
        let s = t.as_str().trim_end();
        if s.ends_with('*') {
            Type::new(format!("{s}*"))
        } else {
            Type::new(format!("{s} *"))
        }
    }

    pub fn del_pointer(&self, t: &Type) -> Type {
        let s = t.as_str().trim_end();
        if let Some(rest) = s.strip_suffix('*') {
            Type::new(rest.trim_end().to_string())
        } else {
            t.clone()
        }
    }

    /// Strip every pointer, array suffix and qualifier, leaving the core identifier.
    pub fn base(&self, t: &Type) -> Type {
        let (head, _) = Self::split_array(t);
        let (base, _) = split_pointer(&head);
        self.strip_qualifiers(&Type::new(base.trim().to_string()))
    }

    /// SWIG-style textual mangling: `Foo *` -> `p.Foo`-ish becomes `_p_Foo`, array
    /// dims fold into `_aN_` / `_aANY_`, everything non-identifier becomes `_`.
    pub fn mangle(&self, t: &Type) -> String {
        let (head, dims) = Self::split_array(t);
        let (base, stars) = split_pointer(&head);
        let base = self.strip_qualifiers(&Type::new(base.trim().to_string()));
        let mut out = String::new();
        for _ in 0..stars.matches('*').count() {
            out.push_str("_p");
        }
        for d in &dims {
            out.push_str("_a");
            out.push_str(d);
        }
        out.push('_');
        for c in base.as_str().chars() {
            if c.is_alphanumeric() || c == '_' {
                out.push(c);
            } else if c == ':' {
                continue;
            } else {
                out.push('_');
            }
        }
        out
    }

    /// A generic fallback type used as a last-resort lookup key (spec.md §4.4 step 6).
    /// Only pointers have one in this implementation: every pointer type falls back to
    /// a rule registered under `void *`.
    pub fn default_for(&self, t: &Type) -> Option<Type> {
        if self.is_pointer(t) {
            Some(Type::new("void *"))
        } else {
            None
        }
    }

    /// Render a declarator: `str(int, "x")` -> `"int x"`, `str(int, None)` -> `"int"`.
    pub fn str(&self, t: &Type, name: Option<&str>) -> String {
        match name {
            Some(name) if !name.is_empty() => format!("{} {}", t.as_str(), name),
            _ => t.as_str().to_string(),
        }
    }

    /// The "local" variant of a type used when declaring wrapper-local variables.
    /// Qualifiers are dropped; pointer-ness and array shape are preserved.
    pub fn ltype(&self, t: &Type) -> Type {
        self.strip_qualifiers(t)
    }

    /// Record that a descriptor for `t` was actually emitted into generated code.
    pub fn remember(&mut self, t: &Type) {
        log::trace!(target: "typemap_engine::ctype", "remembering descriptor for {t}");
        self.remembered.push(t.clone());
    }

    pub fn remembered(&self) -> &[Type] {
        &self.remembered
    }
}

fn split_pointer(head: &str) -> (&str, String) {
    let trimmed = head.trim_end();
    let star_count = trimmed.chars().rev().take_while(|c| *c == '*').count();
    let split_at = trimmed.len() - star_count;
    let base = trimmed[..split_at].trim_end();
    (base, "*".repeat(star_count))
}

/// Small local module avoiding a second crate dependency just for a lazily-built regex.
mod array_pattern {
    use regex::Regex;
    use std::sync::OnceLock;

    pub fn array_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"\[([^\[\]]*)\]$").unwrap())
    }
}
