//! The key codec (spec.md §4.2): pure functions that fold a parameter-list tail into
//! a signature suffix so multi-argument rules can live in the same flat per-node
//! dictionary as single-argument ones.
use crate::param::Param;

/// Fold `parms` onto `op`, appending one `-T+n:` segment per parameter.
/// `encode_tail("in", [(int, "argc")])` -> `"in-int+argc:"`.
pub fn encode_tail(op: &str, parms: &[Param]) -> String {
    let mut out = op.to_string();
    for p in parms {
        out.push('-');
        out.push_str(p.type_.as_str());
        out.push('+');
        out.push_str(p.name.as_deref().unwrap_or(""));
        out.push(':');
    }
    out
}

/// Number of parameters a (possibly signature-suffixed) method key represents.
pub fn count_args(key: &str) -> usize {
    key.matches('+').count()
}

/// Build the full `tmap:...` method key for a terminal registration.
pub fn method_key(op: &str) -> String {
    format!("tmap:{op}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Param;

    #[test]
    fn encode_tail_single_param() {
        let parms = vec![Param::named("int", "argc")];
        assert_eq!(encode_tail("in", &parms), "in-int+argc:");
    }

    #[test]
    fn encode_tail_accumulates() {
        let parms = vec![Param::named("int", "argc")];
        let once = encode_tail("in", &parms);
        let parms2 = vec![Param::named("double", "scale")];
        let twice = encode_tail(&once, &parms2);
        assert_eq!(twice, "in-int+argc:-double+scale:");
    }

    #[test]
    fn count_args_counts_plus_signs() {
        assert_eq!(count_args("tmap:in-int+argc:-char+argv:"), 2);
        assert_eq!(count_args("tmap:in"), 0);
    }
}
