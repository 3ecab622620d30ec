//! Forward, branch-sensitive walk of one method body.
//!
//! Statements are visited with [`BodyWalker::visit`], which returns the
//! context holding after the statement or `None` when control never falls
//! through (return, throw, break, continue). Boolean conditions are split
//! into their true and false contexts by [`BodyWalker::eval`].

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::callables::{CallableIndex, CallableKey};
use super::context::GuardContext;
use crate::checker::{CallSite, CompatibilityChecker};
use crate::contract::{AvailabilityContract, ContractCache};
use crate::core::{AnalysisError, CancellationToken, Span};
use crate::diagnostics::{Location, PlatformDiagnostic};
use crate::guards::{ExtractedGuard, GuardApi, GuardExtractor};
use crate::operations::{
    BinaryOperator, Constant, MethodBody, Operation, OperationKind, UnaryOperator,
};
use crate::platform::PlatformVocabulary;
use crate::symbols::well_known::{ASSERT, DEBUG_TYPE};
use crate::symbols::{SymbolId, SymbolTable};

type Flow = Result<Option<GuardContext>, AnalysisError>;
type Split = Result<(GuardContext, GuardContext), AnalysisError>;

/// Per-compilation analysis engine; shared by every body walk.
pub struct FlowEngine<'a> {
    symbols: &'a SymbolTable,
    vocabulary: &'a PlatformVocabulary,
    contracts: &'a ContractCache<'a>,
    checker: CompatibilityChecker<'a>,
    guard_api: Option<GuardApi>,
    debug_type: Option<SymbolId>,
}

impl<'a> FlowEngine<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        vocabulary: &'a PlatformVocabulary,
        contracts: &'a ContractCache<'a>,
    ) -> Self {
        Self {
            symbols,
            vocabulary,
            contracts,
            checker: CompatibilityChecker::new(symbols),
            guard_api: GuardApi::resolve(symbols),
            debug_type: symbols.find_type(DEBUG_TYPE),
        }
    }

    pub fn guard_recognition_enabled(&self) -> bool {
        self.guard_api.is_some()
    }

    /// Walks `body` and its local functions and lambdas. On cancellation the
    /// partial diagnostics of this body are discarded.
    pub fn analyze_body(
        &self,
        body: &MethodBody,
        cancellation: &CancellationToken,
    ) -> Result<Vec<PlatformDiagnostic>, AnalysisError> {
        let extractor = GuardExtractor::new(self.symbols, self.vocabulary, self.contracts, self.guard_api)
            .with_cached_locals(&body.body);
        let index = CallableIndex::scan(&body.body);
        let owner_contract = self.contracts.contract(body.owner);
        let seed = owner_contract.allowed_worlds();
        trace!(owner = %body.owner, seed = %seed, callables = index.len(), "walking body");

        let mut walker = BodyWalker {
            engine: self,
            extractor,
            index: &index,
            cancellation,
            file: &body.file,
            unit: CallableKey::Body,
            enclosing: Arc::clone(&owner_contract),
            invocations: HashMap::new(),
            diagnostics: Vec::new(),
        };

        let result = walker.visit(&body.body, &seed).and_then(|_| {
            for (key, cyclic) in index.walk_order() {
                walker.walk_callable(key, cyclic, &seed, &owner_contract)?;
            }
            Ok(())
        });
        if let Err(err) = result {
            debug!(owner = %body.owner, error = %err, "body walk aborted");
            return Err(err);
        }
        Ok(walker.diagnostics)
    }
}

struct BodyWalker<'w, 'a> {
    engine: &'w FlowEngine<'a>,
    extractor: GuardExtractor<'a>,
    index: &'w CallableIndex<'w>,
    cancellation: &'w CancellationToken,
    file: &'w str,
    /// Unit currently being walked.
    unit: CallableKey,
    enclosing: Arc<AvailabilityContract>,
    /// Join of every context a callable was invoked under.
    invocations: HashMap<CallableKey, GuardContext>,
    diagnostics: Vec<PlatformDiagnostic>,
}

impl<'w, 'a> BodyWalker<'w, 'a> {
    fn walk_callable(
        &mut self,
        key: CallableKey,
        cyclic: bool,
        body_seed: &GuardContext,
        owner_contract: &Arc<AvailabilityContract>,
    ) -> Result<(), AnalysisError> {
        let index = self.index;
        let Some(def) = index.get(key) else {
            return Ok(());
        };
        let (enclosing, seed) = match key {
            CallableKey::LocalFunction(symbol) => {
                let contract = self.engine.contracts.contract(symbol);
                let seed = contract.allowed_worlds();
                (contract, seed)
            }
            _ => (Arc::clone(owner_contract), body_seed.clone()),
        };
        let entry = match self.invocations.get(&key) {
            Some(invoked) if !def.escapes && !cyclic => invoked.intersect(&seed),
            _ => seed,
        };
        trace!(callable = ?key, escapes = def.escapes, cyclic, entry = %entry, "walking callable");

        self.unit = key;
        self.enclosing = enclosing;
        self.visit(def.body, &entry)?;
        Ok(())
    }

    fn record_invocation(&mut self, callee: CallableKey, context: &GuardContext) {
        if callee == self.unit {
            return;
        }
        self.invocations
            .entry(callee)
            .and_modify(|joined| *joined = joined.union(context))
            .or_insert_with(|| context.clone());
    }

    fn check_reference(&mut self, target: SymbolId, span: Span, context: &GuardContext) {
        let target_contract = self.engine.contracts.contract(target);
        if target_contract.is_empty() {
            return;
        }
        let site = CallSite {
            target,
            target_contract,
            active_context: context.clone(),
            enclosing_contract: Arc::clone(&self.enclosing),
            location: Location::new(self.file, span),
        };
        self.diagnostics.extend(self.engine.checker.check(&site));
    }

    fn is_assert(&self, target: SymbolId) -> bool {
        self.engine.debug_type.is_some()
            && self
                .engine
                .symbols
                .get(target)
                .is_some_and(|s| s.containing == self.engine.debug_type && s.name == ASSERT)
    }

    /// Visits `ops` in order, threading the context. Operations after a
    /// non-falling-through one are still visited, under the unreachable
    /// context.
    fn visit_sequence<'o>(&mut self, ops: impl IntoIterator<Item = &'o Operation>, context: &GuardContext) -> Flow {
        let mut current = context.clone();
        let mut falls_through = true;
        for op in ops {
            match self.visit(op, &current)? {
                Some(next) if falls_through => current = next,
                Some(_) => {}
                None => {
                    falls_through = false;
                    current = GuardContext::unreachable();
                }
            }
        }
        Ok(falls_through.then_some(current))
    }

    fn visit(&mut self, op: &Operation, context: &GuardContext) -> Flow {
        self.cancellation.check()?;
        let same = || Ok(Some(context.clone()));

        match &op.kind {
            OperationKind::Block { operations } => self.visit_sequence(operations, context),
            OperationKind::Other { children } => self.visit_sequence(children, context),

            OperationKind::Conditional { condition, when_true, when_false } => {
                let (on_true, on_false) = self.eval(condition, context, true)?;
                let after_true = self.visit(when_true, &on_true)?;
                let after_false = match when_false {
                    Some(branch) => self.visit(branch, &on_false)?,
                    None => Some(on_false),
                };
                Ok(match (after_true, after_false) {
                    (Some(a), Some(b)) => Some(a.union(&b)),
                    (a, b) => a.or(b),
                })
            }

            OperationKind::Loop { condition, body } => {
                let on_true = match condition {
                    Some(condition) => self.eval(condition, context, true)?.0,
                    None => context.clone(),
                };
                self.visit(body, &on_true)?;
                same()
            }

            OperationKind::Switch { value, cases } => {
                self.visit(value, context)?;
                for case in cases {
                    self.visit(case, context)?;
                }
                same()
            }

            OperationKind::Return { value } | OperationKind::Throw { value } => {
                if let Some(value) = value {
                    self.visit(value, context)?;
                }
                Ok(None)
            }
            OperationKind::Break | OperationKind::Continue => Ok(None),

            OperationKind::Invocation { target, instance, arguments } => {
                if let Some(instance) = instance {
                    self.visit(instance, context)?;
                }
                if self.is_assert(*target) {
                    if let Some((condition, rest)) = arguments.split_first() {
                        let (on_true, _) = self.eval(condition, context, true)?;
                        self.visit_sequence(rest, &on_true)?;
                        return Ok(Some(on_true));
                    }
                }
                self.visit_sequence(arguments, context)?;
                if self.index.is_local_function(*target) {
                    self.record_invocation(CallableKey::LocalFunction(*target), context);
                } else {
                    self.check_reference(*target, op.span, context);
                }
                same()
            }

            OperationKind::DelegateInvocation { target, arguments } => {
                match target.as_local().and_then(|local| self.index.lambda_local(local)) {
                    Some(callee) => self.record_invocation(callee, context),
                    None => {
                        self.visit(target, context)?;
                    }
                }
                self.visit_sequence(arguments, context)?;
                same()
            }

            OperationKind::MemberReference { member, instance } => {
                if let Some(instance) = instance {
                    self.visit(instance, context)?;
                }
                self.check_reference(*member, op.span, context);
                same()
            }

            OperationKind::MethodReference { method } => {
                if !self.index.is_local_function(*method) {
                    self.check_reference(*method, op.span, context);
                }
                same()
            }

            OperationKind::ObjectCreation { constructor, arguments } => {
                self.visit_sequence(arguments, context)?;
                self.check_reference(*constructor, op.span, context);
                same()
            }

            OperationKind::LocalAssignment { value, .. } => {
                if let Some(value) = value {
                    self.visit(value, context)?;
                }
                same()
            }

            OperationKind::Binary { .. } | OperationKind::Unary { .. } => {
                self.eval(op, context, true)?;
                same()
            }

            // walked separately, see `walk_callable`
            OperationKind::LocalFunction { .. } | OperationKind::Lambda { .. } => same(),

            OperationKind::Literal { .. } | OperationKind::LocalReference { .. } => same(),
        }
    }

    /// Splits `context` into the worlds where `condition` is true and where
    /// it is false. With `report` set, uses of annotated symbols inside the
    /// condition are checked under the context holding where they evaluate.
    fn eval(&mut self, condition: &Operation, context: &GuardContext, report: bool) -> Split {
        self.cancellation.check()?;

        match &condition.kind {
            OperationKind::Literal { value: Constant::Bool(true) } => {
                return Ok((context.clone(), GuardContext::unreachable()));
            }
            OperationKind::Literal { value: Constant::Bool(false) } => {
                return Ok((GuardContext::unreachable(), context.clone()));
            }
            OperationKind::Unary { operator: UnaryOperator::Not, operand } => {
                let (on_true, on_false) = self.eval(operand, context, report)?;
                return Ok((on_false, on_true));
            }
            OperationKind::Binary { operator: BinaryOperator::And, left, right } => {
                let (left_true, left_false) = self.eval(left, context, report)?;
                let (right_true, right_false) = self.eval(right, &left_true, report)?;
                return Ok((right_true, left_false.union(&right_false)));
            }
            OperationKind::Binary { operator: BinaryOperator::Or, left, right } => {
                let (left_true, left_false) = self.eval(left, context, report)?;
                let (right_true, right_false) = self.eval(right, &left_false, report)?;
                return Ok((left_true.union(&right_true), right_false));
            }
            OperationKind::Binary {
                operator: operator @ (BinaryOperator::Equals | BinaryOperator::NotEquals),
                left,
                right,
            } => {
                let compared = match (left.as_bool(), right.as_bool()) {
                    (_, Some(literal)) => Some((left, literal)),
                    (Some(literal), None) => Some((right, literal)),
                    (None, None) => None,
                };
                if let Some((operand, literal)) = compared {
                    let (on_true, on_false) = self.eval(operand, context, report)?;
                    let keeps_polarity = (*operator == BinaryOperator::Equals) == literal;
                    return Ok(if keeps_polarity { (on_true, on_false) } else { (on_false, on_true) });
                }
            }
            _ => {}
        }

        match self.extractor.try_extract_guard(condition) {
            Some(ExtractedGuard::Fact(fact)) => {
                if report {
                    self.visit(condition, context)?;
                }
                let world = GuardContext::from_fact(&fact);
                Ok((context.intersect(&world), context.difference(&world)))
            }
            Some(ExtractedGuard::Member(world)) => {
                if report {
                    self.visit(condition, context)?;
                }
                Ok((context.intersect(&world), context.difference(&world)))
            }
            Some(ExtractedGuard::PlatformLocal(local)) => {
                match self.extractor.cached_initializer(local).cloned() {
                    Some(initializer) => self.eval(&initializer, context, false),
                    None => Ok((context.clone(), context.clone())),
                }
            }
            None => {
                if report {
                    match &condition.kind {
                        // already split structurally; only the operands remain
                        OperationKind::Binary { .. } | OperationKind::Unary { .. } => {
                            self.visit_sequence(condition.children(), context)?;
                        }
                        _ => {
                            self.visit(condition, context)?;
                        }
                    }
                }
                Ok((context.clone(), context.clone()))
            }
        }
    }
}
