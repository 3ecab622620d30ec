//! Compute-or-fetch cache of merged contracts, shared by all body walks of
//! one compilation.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{AvailabilityContract, OwnAttributes};
use crate::diagnostics::{sort_diagnostics, PlatformDiagnostic};
use crate::platform::PlatformVocabulary;
use crate::symbols::{SymbolId, SymbolKind, SymbolTable};

/// Concurrent contract cache. Duplicate concurrent builds of the same symbol
/// are possible and harmless: the first insert wins.
pub struct ContractCache<'a> {
    symbols: &'a SymbolTable,
    vocabulary: &'a PlatformVocabulary,
    own: DashMap<SymbolId, Arc<OwnAttributes>>,
    contracts: DashMap<SymbolId, Arc<AvailabilityContract>>,
}

impl<'a> ContractCache<'a> {
    pub fn new(symbols: &'a SymbolTable, vocabulary: &'a PlatformVocabulary) -> Self {
        Self {
            symbols,
            vocabulary,
            own: DashMap::new(),
            contracts: DashMap::new(),
        }
    }

    pub fn symbols(&self) -> &'a SymbolTable {
        self.symbols
    }

    /// Attributes written directly on `id`.
    pub fn own_attributes(&self, id: SymbolId) -> Arc<OwnAttributes> {
        if let Some(own) = self.own.get(&id) {
            return Arc::clone(own.value());
        }
        let built = match self.symbols.get(id) {
            Some(symbol) => OwnAttributes::build(symbol, self.symbols, self.vocabulary),
            None => OwnAttributes::default(),
        };
        Arc::clone(self.own.entry(id).or_insert_with(|| Arc::new(built)).value())
    }

    /// Merged contract of `id`.
    pub fn contract(&self, id: SymbolId) -> Arc<AvailabilityContract> {
        let mut visiting = Vec::new();
        self.contract_inner(id, &mut visiting)
    }

    fn contract_inner(&self, id: SymbolId, visiting: &mut Vec<SymbolId>) -> Arc<AvailabilityContract> {
        if let Some(contract) = self.contracts.get(&id) {
            trace!(symbol = %id, "contract cache hit");
            return Arc::clone(contract.value());
        }
        if visiting.contains(&id) {
            // implements cycle in malformed input
            return Arc::new(AvailabilityContract::new());
        }
        visiting.push(id);
        let built = self.build(id, visiting);
        visiting.pop();

        debug!(symbol = %id, contract = %built, "contract built");
        Arc::clone(self.contracts.entry(id).or_insert_with(|| Arc::new(built)).value())
    }

    /// Folds layers from the outermost scope inwards: assembly, implemented
    /// interface members, containing types (and methods, for local
    /// functions), the associated property or event, then the symbol itself.
    fn build(&self, id: SymbolId, visiting: &mut Vec<SymbolId>) -> AvailabilityContract {
        let Some(symbol) = self.symbols.get(id) else {
            return AvailabilityContract::new();
        };

        let mut chain = self.symbols.containing_chain(id);
        chain.reverse();
        let mut contract = AvailabilityContract::new();
        let mut rest = chain.as_slice();
        if let Some((first, tail)) = chain.split_first() {
            if self.symbols.get(*first).map(|s| s.kind) == Some(SymbolKind::Assembly) {
                contract = contract.merge_child(&self.own_attributes(*first).layer);
                rest = tail;
            }
        }

        for implemented in &symbol.implements {
            if *implemented != id {
                contract = contract.merge_child(&self.contract_inner(*implemented, visiting));
            }
        }
        for scope in rest {
            contract = contract.merge_child(&self.own_attributes(*scope).layer);
        }
        if let Some(associated) = symbol.associated {
            contract = contract.merge_child(&self.own_attributes(associated).layer);
        }
        contract.merge_child(&self.own_attributes(id).layer)
    }

    /// CA1418 diagnostics for every symbol of the compilation.
    pub fn attribute_diagnostics(&self) -> Vec<PlatformDiagnostic> {
        let mut diagnostics: Vec<PlatformDiagnostic> = self
            .symbols
            .iter()
            .filter(|s| !s.attributes.is_empty())
            .flat_map(|s| self.own_attributes(s.id).diagnostics.clone())
            .collect();
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}
