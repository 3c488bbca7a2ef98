//! The function call graph built alongside the symbol tables: one node per
//! declared function plus a synthetic "os" node representing the runtime
//! entry point, with edges recorded every time the parser sees a call
//! expression. Used downstream (outside this crate) to find unreachable
//! functions and recursion cycles; the front end only records edges.

use ollie_core::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CallGraphNodeId(u32);

impl CallGraphNodeId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CallGraphNode {
    pub name: Symbol,
    pub calls: Vec<CallGraphNodeId>,
}

/// A function call graph with one synthetic root (`os`, standing in for the
/// operating system invoking the program's entry point).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CallGraph {
    nodes: Vec<CallGraphNode>,
    os: CallGraphNodeId,
}

impl CallGraph {
    pub fn new() -> Self {
        let os_name = Symbol::from_raw(u32::MAX);
        let nodes = vec![CallGraphNode { name: os_name, calls: Vec::new() }];
        Self { nodes, os: CallGraphNodeId(0) }
    }

    pub fn os(&self) -> CallGraphNodeId {
        self.os
    }

    pub fn add_function_node(&mut self, name: Symbol) -> CallGraphNodeId {
        let id = CallGraphNodeId(self.nodes.len() as u32);
        self.nodes.push(CallGraphNode { name, calls: Vec::new() });
        id
    }

    pub fn record_call(&mut self, caller: CallGraphNodeId, callee: CallGraphNodeId) {
        self.nodes[caller.as_u32() as usize].calls.push(callee);
    }

    pub fn get(&self, id: CallGraphNodeId) -> &CallGraphNode {
        &self.nodes[id.as_u32() as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for CallGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod callgraph_tests {
    use super::*;

    #[test]
    fn os_node_exists_at_construction() {
        let graph = CallGraph::new();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.get(graph.os()).calls.len(), 0);
    }

    #[test]
    fn records_edges_between_functions() {
        let mut graph = CallGraph::new();
        let main_fn = graph.add_function_node(Symbol::from_raw(0));
        let helper = graph.add_function_node(Symbol::from_raw(1));
        graph.record_call(graph.os(), main_fn);
        graph.record_call(main_fn, helper);
        assert_eq!(graph.get(graph.os()).calls, vec![main_fn]);
        assert_eq!(graph.get(main_fn).calls, vec![helper]);
    }
}
