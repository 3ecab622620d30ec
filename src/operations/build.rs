//! Shorthand constructors for operation trees, used by tests and demos.

use super::{BinaryOperator, Constant, LocalId, Operation, OperationKind, UnaryOperator};
use crate::core::Span;
use crate::symbols::SymbolId;

impl Operation {
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Places the operation at `line:column` with a zero length span.
    pub fn at(self, line: usize, column: usize) -> Self {
        self.with_span(Span::at(line, column, 0))
    }

    pub fn block(operations: Vec<Operation>) -> Self {
        Self::new(OperationKind::Block { operations })
    }

    pub fn if_then(condition: Operation, when_true: Operation) -> Self {
        Self::new(OperationKind::Conditional {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false: None,
        })
    }

    pub fn if_else(condition: Operation, when_true: Operation, when_false: Operation) -> Self {
        Self::new(OperationKind::Conditional {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false: Some(Box::new(when_false)),
        })
    }

    pub fn while_loop(condition: Operation, body: Operation) -> Self {
        Self::new(OperationKind::Loop {
            condition: Some(Box::new(condition)),
            body: Box::new(body),
        })
    }

    pub fn switch(value: Operation, cases: Vec<Operation>) -> Self {
        Self::new(OperationKind::Switch { value: Box::new(value), cases })
    }

    pub fn ret() -> Self {
        Self::new(OperationKind::Return { value: None })
    }

    pub fn ret_value(value: Operation) -> Self {
        Self::new(OperationKind::Return { value: Some(Box::new(value)) })
    }

    pub fn throw() -> Self {
        Self::new(OperationKind::Throw { value: None })
    }

    pub fn brk() -> Self {
        Self::new(OperationKind::Break)
    }

    pub fn cont() -> Self {
        Self::new(OperationKind::Continue)
    }

    pub fn call(target: SymbolId, arguments: Vec<Operation>) -> Self {
        Self::new(OperationKind::Invocation { target, instance: None, arguments })
    }

    pub fn call_on(instance: Operation, target: SymbolId, arguments: Vec<Operation>) -> Self {
        Self::new(OperationKind::Invocation {
            target,
            instance: Some(Box::new(instance)),
            arguments,
        })
    }

    pub fn invoke_delegate(target: Operation, arguments: Vec<Operation>) -> Self {
        Self::new(OperationKind::DelegateInvocation { target: Box::new(target), arguments })
    }

    pub fn member(member: SymbolId) -> Self {
        Self::new(OperationKind::MemberReference { member, instance: None })
    }

    pub fn method_ref(method: SymbolId) -> Self {
        Self::new(OperationKind::MethodReference { method })
    }

    pub fn new_object(constructor: SymbolId, arguments: Vec<Operation>) -> Self {
        Self::new(OperationKind::ObjectCreation { constructor, arguments })
    }

    pub fn bool(value: bool) -> Self {
        Self::new(OperationKind::Literal { value: Constant::Bool(value) })
    }

    pub fn int(value: i64) -> Self {
        Self::new(OperationKind::Literal { value: Constant::Int(value) })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(OperationKind::Literal { value: Constant::String(value.into()) })
    }

    pub fn local(local: u32) -> Self {
        Self::new(OperationKind::LocalReference { local: LocalId(local) })
    }

    pub fn assign(local: u32, value: Operation) -> Self {
        Self::new(OperationKind::LocalAssignment {
            local: LocalId(local),
            value: Some(Box::new(value)),
        })
    }

    pub fn declare(local: u32) -> Self {
        Self::new(OperationKind::LocalAssignment { local: LocalId(local), value: None })
    }

    fn binary(operator: BinaryOperator, left: Operation, right: Operation) -> Self {
        Self::new(OperationKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn and(left: Operation, right: Operation) -> Self {
        Self::binary(BinaryOperator::And, left, right)
    }

    pub fn or(left: Operation, right: Operation) -> Self {
        Self::binary(BinaryOperator::Or, left, right)
    }

    pub fn equals(left: Operation, right: Operation) -> Self {
        Self::binary(BinaryOperator::Equals, left, right)
    }

    pub fn not_equals(left: Operation, right: Operation) -> Self {
        Self::binary(BinaryOperator::NotEquals, left, right)
    }

    pub fn not(operand: Operation) -> Self {
        Self::new(OperationKind::Unary {
            operator: UnaryOperator::Not,
            operand: Box::new(operand),
        })
    }

    pub fn local_function(symbol: SymbolId, body: Operation) -> Self {
        Self::new(OperationKind::LocalFunction { symbol, body: Box::new(body) })
    }

    pub fn lambda(body: Operation) -> Self {
        Self::new(OperationKind::Lambda { body: Box::new(body) })
    }

    pub fn other(children: Vec<Operation>) -> Self {
        Self::new(OperationKind::Other { children })
    }
}
