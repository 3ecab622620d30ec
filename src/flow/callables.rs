//! Local functions and lambdas of one method body.
//!
//! Callables are walked after the enclosing body, in topological order of
//! the "invokes" relation, so that every invocation context of a callable
//! is known before its own walk starts.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::operations::{LocalId, Operation, OperationKind};
use crate::symbols::SymbolId;

/// Identity of a walk unit within a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallableKey {
    /// The method body itself.
    Body,
    LocalFunction(SymbolId),
    /// Lambda stored in a local.
    Lambda(LocalId),
    /// Lambda used directly as a value, numbered in source order.
    Anonymous(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct CallableDef<'b> {
    pub key: CallableKey,
    pub body: &'b Operation,
    /// Invoked from somewhere the walk cannot see.
    pub escapes: bool,
}

pub struct CallableIndex<'b> {
    defs: Vec<CallableDef<'b>>,
    by_key: HashMap<CallableKey, usize>,
    graph: DiGraph<CallableKey, ()>,
    nodes: HashMap<CallableKey, NodeIndex>,
}

impl<'b> CallableIndex<'b> {
    pub fn scan(body: &'b Operation) -> Self {
        let mut index = CallableIndex {
            defs: Vec::new(),
            by_key: HashMap::new(),
            graph: DiGraph::new(),
            nodes: HashMap::new(),
        };
        index.node(CallableKey::Body);

        let mut assignments: HashMap<LocalId, usize> = HashMap::new();
        let mut anonymous = 0;
        index.collect_definitions(body, &mut assignments, &mut anonymous);

        // a lambda local assigned more than once may hold some other delegate
        for def in &mut index.defs {
            if let CallableKey::Lambda(local) = def.key {
                if assignments.get(&local).copied().unwrap_or(0) > 1 {
                    def.escapes = true;
                }
            }
        }

        let units: Vec<(CallableKey, &'b Operation)> = std::iter::once((CallableKey::Body, body))
            .chain(index.defs.iter().map(|d| (d.key, d.body)))
            .collect();
        for (key, unit_body) in units {
            index.collect_uses(key, unit_body);
        }
        index
    }

    fn node(&mut self, key: CallableKey) -> NodeIndex {
        if let Some(node) = self.nodes.get(&key) {
            return *node;
        }
        let node = self.graph.add_node(key);
        self.nodes.insert(key, node);
        node
    }

    fn define(&mut self, key: CallableKey, body: &'b Operation, escapes: bool) {
        if self.by_key.contains_key(&key) {
            return;
        }
        self.node(key);
        self.by_key.insert(key, self.defs.len());
        self.defs.push(CallableDef { key, body, escapes });
    }

    fn collect_definitions(
        &mut self,
        op: &'b Operation,
        assignments: &mut HashMap<LocalId, usize>,
        anonymous: &mut usize,
    ) {
        match &op.kind {
            OperationKind::LocalFunction { symbol, body } => {
                self.define(CallableKey::LocalFunction(*symbol), body, false);
                self.collect_definitions(body, assignments, anonymous);
                return;
            }
            OperationKind::LocalAssignment { local, value: Some(value) } => {
                *assignments.entry(*local).or_insert(0) += 1;
                if let OperationKind::Lambda { body } = &value.kind {
                    self.define(CallableKey::Lambda(*local), body, false);
                    self.collect_definitions(body, assignments, anonymous);
                    return;
                }
            }
            OperationKind::Lambda { body } => {
                let key = CallableKey::Anonymous(*anonymous);
                *anonymous += 1;
                self.define(key, body, true);
                self.collect_definitions(body, assignments, anonymous);
                return;
            }
            _ => {}
        }
        for child in op.children() {
            self.collect_definitions(child, assignments, anonymous);
        }
    }

    /// Records invocation edges and escapes inside one unit, without
    /// descending into nested definitions.
    fn collect_uses(&mut self, unit: CallableKey, op: &'b Operation) {
        match &op.kind {
            OperationKind::LocalFunction { .. } | OperationKind::Lambda { .. } => return,
            OperationKind::LocalAssignment { value: Some(value), .. } if value.is_callable_definition() => {
                return;
            }
            OperationKind::Invocation { target, .. } => {
                let callee = CallableKey::LocalFunction(*target);
                if self.by_key.contains_key(&callee) {
                    self.add_edge(unit, callee);
                }
            }
            OperationKind::DelegateInvocation { target, arguments } => {
                if let Some(callee) = target.as_local().map(CallableKey::Lambda) {
                    if self.by_key.contains_key(&callee) {
                        self.add_edge(unit, callee);
                        for argument in arguments {
                            self.collect_uses(unit, argument);
                        }
                        return;
                    }
                }
            }
            OperationKind::MethodReference { method } => {
                self.mark_escaped(CallableKey::LocalFunction(*method));
            }
            OperationKind::LocalReference { local } => {
                self.mark_escaped(CallableKey::Lambda(*local));
            }
            _ => {}
        }
        for child in op.children() {
            self.collect_uses(unit, child);
        }
    }

    fn add_edge(&mut self, caller: CallableKey, callee: CallableKey) {
        let from = self.node(caller);
        let to = self.node(callee);
        self.graph.update_edge(from, to, ());
    }

    fn mark_escaped(&mut self, key: CallableKey) {
        if let Some(&index) = self.by_key.get(&key) {
            self.defs[index].escapes = true;
        }
    }

    pub fn get(&self, key: CallableKey) -> Option<&CallableDef<'b>> {
        self.by_key.get(&key).map(|&i| &self.defs[i])
    }

    pub fn is_local_function(&self, symbol: SymbolId) -> bool {
        self.by_key.contains_key(&CallableKey::LocalFunction(symbol))
    }

    pub fn lambda_local(&self, local: LocalId) -> Option<CallableKey> {
        let key = CallableKey::Lambda(local);
        self.by_key.contains_key(&key).then_some(key)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Callables in walk order, each flagged when it sits on an invocation
    /// cycle (self-recursion excluded).
    pub fn walk_order(&self) -> Vec<(CallableKey, bool)> {
        // tarjan_scc yields components in reverse topological order
        tarjan_scc(&self.graph)
            .into_iter()
            .rev()
            .flat_map(|component| {
                let cyclic = component.len() > 1;
                component
                    .into_iter()
                    .map(move |node| (self.graph[node], cyclic))
                    .collect::<Vec<_>>()
            })
            .filter(|(key, _)| *key != CallableKey::Body)
            .collect()
    }
}
