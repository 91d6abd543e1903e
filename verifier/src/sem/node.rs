//! Resolved tree nodes
//!
//! A trimmed-down typed AST: every name is already bound to a `SymbolId` and
//! every expression carries its resolved `TypeId`. The verifiers walk these
//! variants with explicit context parameters; node kinds map one-to-one to
//! match arms, never to dynamic dispatch.

use crate::sem::{NodeId, SourceLocation, SymbolId, TypeId, Visibility};
use serde::{Deserialize, Serialize};

/// A class declaration with its members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedClass {
    pub symbol_id: SymbolId,
    pub name: String,
    pub type_id: TypeId,
    pub super_class: Option<TypeId>,
    #[serde(default)]
    pub interfaces: Vec<TypeId>,
    #[serde(default)]
    pub fields: Vec<TypedField>,
    #[serde(default)]
    pub constructors: Vec<TypedFunction>,
    #[serde(default)]
    pub methods: Vec<TypedFunction>,
    pub visibility: Visibility,
    pub location: SourceLocation,
}

/// A field declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedField {
    pub symbol_id: SymbolId,
    pub name: String,
    pub field_type: TypeId,
    pub is_static: bool,
    pub location: SourceLocation,
}

/// A function, method, or constructor with a resolved body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedFunction {
    pub symbol_id: SymbolId,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<TypedParameter>,
    pub return_type: TypeId,
    #[serde(default)]
    pub body: Vec<TypedStatement>,
    pub is_static: bool,
    pub location: SourceLocation,
}

/// A function or lambda parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedParameter {
    pub symbol_id: SymbolId,
    pub name: String,
    pub param_type: TypeId,
    pub location: SourceLocation,
}

/// One `catch` clause of a try statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedCatchClause {
    pub exception_variable: SymbolId,
    pub body: Box<TypedStatement>,
}

/// One `case` arm of a switch statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedSwitchCase {
    pub case_value: TypedExpression,
    pub body: Box<TypedStatement>,
}

/// Resolved statements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypedStatement {
    Expression {
        expression: TypedExpression,
        location: SourceLocation,
    },
    VarDeclaration {
        symbol_id: SymbolId,
        var_type: TypeId,
        initializer: Option<TypedExpression>,
        location: SourceLocation,
    },
    Assignment {
        target: TypedExpression,
        value: TypedExpression,
        location: SourceLocation,
    },
    If {
        condition: TypedExpression,
        then_branch: Box<TypedStatement>,
        else_branch: Option<Box<TypedStatement>>,
        location: SourceLocation,
    },
    While {
        condition: TypedExpression,
        body: Box<TypedStatement>,
        location: SourceLocation,
    },
    For {
        init: Option<Box<TypedStatement>>,
        condition: Option<TypedExpression>,
        update: Option<TypedExpression>,
        body: Box<TypedStatement>,
        location: SourceLocation,
    },
    /// Iterator loop; bounded by its iterable, so exempt from yield checks
    ForEach {
        value_var: SymbolId,
        iterable: TypedExpression,
        body: Box<TypedStatement>,
        location: SourceLocation,
    },
    Switch {
        discriminant: TypedExpression,
        cases: Vec<TypedSwitchCase>,
        default_case: Option<Box<TypedStatement>>,
        location: SourceLocation,
    },
    Try {
        body: Box<TypedStatement>,
        catch_clauses: Vec<TypedCatchClause>,
        finally_block: Option<Box<TypedStatement>>,
        location: SourceLocation,
    },
    Return {
        value: Option<TypedExpression>,
        location: SourceLocation,
    },
    Throw {
        exception: TypedExpression,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    Block {
        statements: Vec<TypedStatement>,
        location: SourceLocation,
    },
}

impl TypedStatement {
    pub fn location(&self) -> SourceLocation {
        match self {
            TypedStatement::Expression { location, .. }
            | TypedStatement::VarDeclaration { location, .. }
            | TypedStatement::Assignment { location, .. }
            | TypedStatement::If { location, .. }
            | TypedStatement::While { location, .. }
            | TypedStatement::For { location, .. }
            | TypedStatement::ForEach { location, .. }
            | TypedStatement::Switch { location, .. }
            | TypedStatement::Try { location, .. }
            | TypedStatement::Return { location, .. }
            | TypedStatement::Throw { location, .. }
            | TypedStatement::Break { location }
            | TypedStatement::Continue { location }
            | TypedStatement::Block { location, .. } => *location,
        }
    }
}

/// Literal constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Neg,
}

/// A resolved expression with its type and anchor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedExpression {
    pub id: NodeId,
    pub kind: TypedExpressionKind,
    pub expr_type: TypeId,
    pub location: SourceLocation,
}

/// Resolved expression kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypedExpressionKind {
    Literal {
        value: LiteralValue,
    },
    Null,
    This,
    Variable {
        symbol_id: SymbolId,
    },
    FieldAccess {
        object: Box<TypedExpression>,
        field_symbol: SymbolId,
    },
    StaticFieldAccess {
        class_symbol: SymbolId,
        field_symbol: SymbolId,
    },
    MethodCall {
        receiver: Box<TypedExpression>,
        method_symbol: SymbolId,
        arguments: Vec<TypedExpression>,
    },
    StaticMethodCall {
        class_symbol: SymbolId,
        method_symbol: SymbolId,
        arguments: Vec<TypedExpression>,
    },
    FunctionCall {
        function: Box<TypedExpression>,
        arguments: Vec<TypedExpression>,
    },
    /// Fresh construction: `new Class(...)`
    New {
        class_type: TypeId,
        arguments: Vec<TypedExpression>,
    },
    /// Closure literal. `symbol_id` is the closure's own declaration symbol,
    /// whose parent pointer anchors it in the lexical ancestry.
    Lambda {
        symbol_id: SymbolId,
        parameters: Vec<TypedParameter>,
        body: Vec<TypedStatement>,
    },
    BinaryOp {
        left: Box<TypedExpression>,
        operator: BinaryOperator,
        right: Box<TypedExpression>,
    },
    UnaryOp {
        operator: UnaryOperator,
        operand: Box<TypedExpression>,
    },
    Conditional {
        condition: Box<TypedExpression>,
        then_expr: Box<TypedExpression>,
        else_expr: Option<Box<TypedExpression>>,
    },
    Cast {
        expression: Box<TypedExpression>,
        target_type: TypeId,
    },
}

impl TypedExpression {
    /// The variable symbol this expression names, if it is a plain reference
    pub fn as_variable(&self) -> Option<SymbolId> {
        match self.kind {
            TypedExpressionKind::Variable { symbol_id } => Some(symbol_id),
            _ => None,
        }
    }

    /// Is this a fresh construction expression?
    pub fn is_new(&self) -> bool {
        matches!(self.kind, TypedExpressionKind::New { .. })
    }
}
