//! A scoped typemap store, specificity-ordered lookup engine and `$`-variable
//! template substitution engine, as used by a C/C++ wrapper generator to turn
//! `%typemap` declarations into instantiated target-language code fragments.
//!
//! The three subsystems compose as: [`registrar`] inserts rules into the
//! [`scope`]-owned node tree; [`lookup`] walks that tree in specificity order;
//! [`substitute`] expands `$`-variables in a matched rule's code and locals;
//! [`facade`] is the glue wrapper emission actually calls.
mod codec;
mod ctype;
mod engine;
mod entry;
mod error;
mod facade;
mod lookup;
mod param;
mod registrar;
mod scope;
mod substitute;
mod wrapper;

pub use ctype::{CTypeUtils, Type};
pub use engine::Engine;
pub use entry::{Entry, Local};
pub use error::{TResult, TypemapError};
pub use param::{Param, ParamList};
pub use wrapper::{NullWrapper, WrapperBuilder};
