//! Per-target query compilers over the shared condition model.
//!
//! Every compiler is a pure function of its input query: it walks the
//! condition tree once, binds literals through a deterministic
//! [`params::ParamBinder`], and returns a backend-native artifact next to
//! the parameter map.

use model::query::{delete::DeleteQuery, select::SelectQuery, update::UpdateQuery};

use crate::{error::CompileError, params::ParamMap};

pub mod document;
pub mod error;
pub mod mango;
pub mod params;
pub mod pattern;
pub mod scan;
pub mod sql;

/// A compiled artifact plus the placeholder values it binds, in execution
/// order. Targets that embed literals inline carry an empty map.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled<A> {
    pub artifact: A,
    pub params: ParamMap,
}

impl<A> Compiled<A> {
    pub fn new(artifact: A, params: ParamMap) -> Self {
        Compiled { artifact, params }
    }
}

/// The contract every target grammar implements.
pub trait QueryCompiler {
    /// The backend-native output shape: statement text or a structured body.
    type Artifact;

    /// Identifier used in errors and logs, e.g. `"n1ql"`.
    fn target(&self) -> &'static str;

    fn compile_select(&self, query: &SelectQuery)
    -> Result<Compiled<Self::Artifact>, CompileError>;

    fn compile_delete(&self, query: &DeleteQuery)
    -> Result<Compiled<Self::Artifact>, CompileError>;

    fn compile_update(&self, query: &UpdateQuery)
    -> Result<Compiled<Self::Artifact>, CompileError>;
}
