//! The wrapper-builder collaborator (spec.md §6): the only capability the facade
//! needs from the target-language wrapper-function builder is allocating a
//! collision-free local variable. Modeled as a trait (an external collaborator,
//! like `why_lib`'s `TypeInferrer` callback hooks) rather than a concrete struct, so
//! callers can plug in their own wrapper builder.
pub trait WrapperBuilder {
    /// Register a new local variable, declared by `declaration_text`, under the
    /// proposed name `proposed_name`. Returns the actual name assigned — the builder
    /// may rename to avoid a collision with an already-declared local.
    fn new_localv(&mut self, proposed_name: &str, declaration_text: &str) -> String;
}

/// A trivial `WrapperBuilder` for tests: no collision resolution, just echoes the
/// proposed name back, recording every declaration it was handed.
#[derive(Debug, Default)]
pub struct NullWrapper {
    pub declared: Vec<(String, String)>,
}

impl NullWrapper {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WrapperBuilder for NullWrapper {
    fn new_localv(&mut self, proposed_name: &str, declaration_text: &str) -> String {
        self.declared
            .push((proposed_name.to_string(), declaration_text.to_string()));
        proposed_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_wrapper_echoes_and_records() {
        let mut w = NullWrapper::new();
        let actual = w.new_localv("temp0", "int temp0");
        assert_eq!(actual, "temp0");
        assert_eq!(w.declared, vec![("temp0".to_string(), "int temp0".to_string())]);
    }
}
