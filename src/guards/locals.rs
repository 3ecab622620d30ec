//! Locals that cache a guard result.
//!
//! `var isWindows = OperatingSystem.IsWindows(); if (isWindows) { ... }`
//!
//! A local qualifies when it has exactly one assignment with a value, that
//! value is a guard expression, and it is read exactly once anywhere in the
//! body. Locals read more than once are never substituted.

use std::collections::HashMap;

use super::{ExtractedGuard, GuardExtractor};
use crate::operations::{walk, BinaryOperator, LocalId, Operation, OperationKind, UnaryOperator, VisitControl, Visitor};

#[derive(Debug, Clone, Default)]
pub struct CachedGuardLocals {
    initializers: HashMap<LocalId, Operation>,
}

impl CachedGuardLocals {
    pub fn scan(body: &Operation, extractor: &GuardExtractor<'_>) -> Self {
        let mut usage = LocalUsage::default();
        walk(body, &mut usage);

        let initializers = usage
            .assignments
            .into_iter()
            .filter(|(local, (count, _))| *count == 1 && usage.reads.get(local) == Some(&1))
            .filter_map(|(local, (_, value))| {
                let value = value?;
                is_guard_expression(&value, extractor).then_some((local, value))
            })
            .collect();
        Self { initializers }
    }

    pub fn initializer(&self, local: LocalId) -> Option<&Operation> {
        self.initializers.get(&local)
    }

    pub fn len(&self) -> usize {
        self.initializers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.initializers.is_empty()
    }
}

#[derive(Default)]
struct LocalUsage {
    /// Assignment count and the first assigned value.
    assignments: HashMap<LocalId, (usize, Option<Operation>)>,
    reads: HashMap<LocalId, usize>,
}

impl Visitor for LocalUsage {
    fn enter(&mut self, op: &Operation) -> VisitControl {
        match &op.kind {
            OperationKind::LocalAssignment { local, value: Some(value) } => {
                let entry = self.assignments.entry(*local).or_insert((0, None));
                entry.0 += 1;
                if entry.1.is_none() {
                    entry.1 = Some(value.as_ref().clone());
                }
            }
            OperationKind::LocalReference { local } => {
                *self.reads.entry(*local).or_insert(0) += 1;
            }
            _ => {}
        }
        VisitControl::Continue
    }
}

/// Built only from recognised guards, boolean literals, `!`, `&&`, `||`
/// and comparisons against boolean literals.
fn is_guard_expression(op: &Operation, extractor: &GuardExtractor<'_>) -> bool {
    if matches!(
        extractor.try_extract_guard(op),
        Some(ExtractedGuard::Fact(_)) | Some(ExtractedGuard::Member(_))
    ) {
        return true;
    }
    match &op.kind {
        OperationKind::Unary { operator: UnaryOperator::Not, operand } => is_guard_expression(operand, extractor),
        OperationKind::Binary { operator: BinaryOperator::And | BinaryOperator::Or, left, right } => {
            let left_guard = is_guard_expression(left, extractor);
            let right_guard = is_guard_expression(right, extractor);
            (left_guard || left.as_bool().is_some())
                && (right_guard || right.as_bool().is_some())
                && (left_guard || right_guard)
        }
        OperationKind::Binary {
            operator: BinaryOperator::Equals | BinaryOperator::NotEquals,
            left,
            right,
        } => {
            (left.as_bool().is_some() && is_guard_expression(right, extractor))
                || (right.as_bool().is_some() && is_guard_expression(left, extractor))
        }
        _ => false,
    }
}
