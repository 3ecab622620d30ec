/*!
# Operation Tree

Method bodies as delivered by the front end: a nested tree of operations
with source spans. Only the node kinds that matter to guard analysis are
distinguished; anything else is [`OperationKind::Other`] and is walked for
its children.

The tree is serialisable so compilations can be fed to the CLI as JSON.
*/

pub mod build;
pub mod compilation;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::Span;
use crate::symbols::SymbolId;

pub use compilation::{Compilation, MethodBody};

/// Local variable identity within one method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(pub u32);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Constant {
    Bool(bool),
    Int(i64),
    String(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperator {
    /// Short-circuit `&&`.
    And,
    /// Short-circuit `||`.
    Or,
    Equals,
    NotEquals,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperator {
    Not,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OperationKind {
    Block {
        operations: Vec<Operation>,
    },
    /// `if`/`else`; an `else if` is a nested conditional in `when_false`.
    Conditional {
        condition: Box<Operation>,
        when_true: Box<Operation>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        when_false: Option<Box<Operation>>,
    },
    Loop {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<Box<Operation>>,
        body: Box<Operation>,
    },
    Switch {
        value: Box<Operation>,
        cases: Vec<Operation>,
    },
    Return {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Box<Operation>>,
    },
    Throw {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Box<Operation>>,
    },
    Break,
    Continue,
    /// Call of a method, constructor-less static or instance member.
    Invocation {
        target: SymbolId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instance: Option<Box<Operation>>,
        #[serde(default)]
        arguments: Vec<Operation>,
    },
    /// Call through a delegate value, e.g. a local holding a lambda.
    DelegateInvocation {
        target: Box<Operation>,
        #[serde(default)]
        arguments: Vec<Operation>,
    },
    /// Property, field or event access.
    MemberReference {
        member: SymbolId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instance: Option<Box<Operation>>,
    },
    /// Method group used as a value.
    MethodReference {
        method: SymbolId,
    },
    ObjectCreation {
        constructor: SymbolId,
        #[serde(default)]
        arguments: Vec<Operation>,
    },
    Literal {
        value: Constant,
    },
    LocalReference {
        local: LocalId,
    },
    /// Declaration with initializer or plain assignment.
    LocalAssignment {
        local: LocalId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Box<Operation>>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Operation>,
        right: Box<Operation>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Operation>,
    },
    LocalFunction {
        symbol: SymbolId,
        body: Box<Operation>,
    },
    Lambda {
        body: Box<Operation>,
    },
    Other {
        #[serde(default)]
        children: Vec<Operation>,
    },
}

impl Operation {
    pub fn new(kind: OperationKind) -> Self {
        Self { kind, span: Span::zero() }
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&Operation> {
        use OperationKind::*;
        let mut out: Vec<&Operation> = Vec::new();
        match &self.kind {
            Block { operations } => out.extend(operations),
            Conditional { condition, when_true, when_false } => {
                out.push(condition);
                out.push(when_true);
                out.extend(when_false.as_deref());
            }
            Loop { condition, body } => {
                out.extend(condition.as_deref());
                out.push(body);
            }
            Switch { value, cases } => {
                out.push(value);
                out.extend(cases);
            }
            Return { value } | Throw { value } => out.extend(value.as_deref()),
            Invocation { instance, arguments, .. } => {
                out.extend(instance.as_deref());
                out.extend(arguments);
            }
            DelegateInvocation { target, arguments } => {
                out.push(target);
                out.extend(arguments);
            }
            MemberReference { instance, .. } => out.extend(instance.as_deref()),
            ObjectCreation { arguments, .. } => out.extend(arguments),
            LocalAssignment { value, .. } => out.extend(value.as_deref()),
            Binary { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            Unary { operand, .. } => out.push(operand),
            LocalFunction { body, .. } | Lambda { body } => out.push(body),
            Other { children } => out.extend(children),
            Break | Continue | MethodReference { .. } | Literal { .. } | LocalReference { .. } => {}
        }
        out
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match &self.kind {
            OperationKind::Literal { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_constant() {
            Some(Constant::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_local(&self) -> Option<LocalId> {
        match &self.kind {
            OperationKind::LocalReference { local } => Some(*local),
            _ => None,
        }
    }

    /// Local function or lambda definition.
    pub fn is_callable_definition(&self) -> bool {
        matches!(self.kind, OperationKind::LocalFunction { .. } | OperationKind::Lambda { .. })
    }
}

/// Traversal control returned from [`Visitor::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    Continue,
    SkipChildren,
    Stop,
}

/// Pre/post-order visitor over an operation tree.
pub trait Visitor {
    fn enter(&mut self, _op: &Operation) -> VisitControl {
        VisitControl::Continue
    }
    fn leave(&mut self, _op: &Operation) {}
}

/// Walks `root` depth-first. Returns false when the visitor stopped early.
pub fn walk<V: Visitor>(root: &Operation, visitor: &mut V) -> bool {
    fn inner<V: Visitor>(op: &Operation, visitor: &mut V) -> Option<()> {
        match visitor.enter(op) {
            VisitControl::Continue => {
                for child in op.children() {
                    inner(child, visitor)?;
                }
            }
            VisitControl::SkipChildren => {}
            VisitControl::Stop => return None,
        }
        visitor.leave(op);
        Some(())
    }
    inner(root, visitor).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        entered: usize,
        skip_lambdas: bool,
    }

    impl Visitor for Counter {
        fn enter(&mut self, op: &Operation) -> VisitControl {
            self.entered += 1;
            if self.skip_lambdas && matches!(op.kind, OperationKind::Lambda { .. }) {
                VisitControl::SkipChildren
            } else {
                VisitControl::Continue
            }
        }
    }

    #[test]
    fn test_walk_counts_and_skips() {
        let tree = Operation::block(vec![
            Operation::call(SymbolId(1), vec![Operation::int(1)]),
            Operation::lambda(Operation::block(vec![Operation::call(SymbolId(2), vec![])])),
        ]);

        let mut all = Counter { entered: 0, skip_lambdas: false };
        assert!(walk(&tree, &mut all));
        assert_eq!(all.entered, 6);

        let mut skipping = Counter { entered: 0, skip_lambdas: true };
        walk(&tree, &mut skipping);
        assert_eq!(skipping.entered, 4);
    }

    #[test]
    fn test_operation_json_shape() {
        let json = r#"{
            "kind": {"op": "conditional",
                     "condition": {"kind": {"op": "literal", "value": {"type": "bool", "value": true}}},
                     "when_true": {"kind": {"op": "break"}}},
            "span": {"start": {"line": 3, "column": 5}, "end": {"line": 3, "column": 9}}
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(op.span.start.line, 3);
        match &op.kind {
            OperationKind::Conditional { condition, when_false, .. } => {
                assert_eq!(condition.as_bool(), Some(true));
                assert!(when_false.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
