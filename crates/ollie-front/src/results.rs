//! The external interface (component §6): everything a downstream code
//! generator needs out of a successful (or partially successful, since
//! parsing continues past non-fatal errors) front-end run.

use crate::ast::{AstArena, NodeId};
use crate::callgraph::CallGraph;
use crate::diagnostics::Diagnostics;
use crate::symbols::{ConstantTable, FunctionTable, ScopedTable, VarId, VariableStore};
use crate::types::{TypeId, TypeRegistry};

/// Everything the front end produces from one source file. Crosses the
/// process boundary to a separate code generator, which is why every type
/// reachable from here derives `Serialize`/`Deserialize`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FrontEndResults {
    pub ast: AstArena,
    pub root: NodeId,
    pub function_table: FunctionTable,
    pub variable_scopes: ScopedTable<VarId>,
    pub variables: VariableStore,
    pub type_scopes: ScopedTable<TypeId>,
    pub constant_table: ConstantTable,
    pub type_registry: TypeRegistry,
    pub call_graph: CallGraph,
    pub diagnostics: Diagnostics,
    pub num_errors: usize,
    pub num_warnings: usize,
    pub lines_processed: u32,
}

impl FrontEndResults {
    pub fn has_errors(&self) -> bool {
        self.num_errors > 0
    }
}
