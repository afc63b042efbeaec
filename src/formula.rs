//! Formula expression builder.
//!
//! A small composite tree pretty-printed to formula text. Operands of
//! binary operators are always parenthesized, so composed expressions
//! never depend on host-application precedence. Nothing here parses or
//! evaluates formulas.

use std::fmt;

use crate::cell_ref::format_cell_ref;
use crate::types::CellValue;

/// One node of a formula expression tree. Build with the associated
/// constructors and render with [`Expr::to_formula`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Cell {
        row: u32,
        col: u32,
    },
    Range {
        start_row: u32,
        start_col: u32,
        end_row: u32,
        end_col: u32,
    },
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Equal(Box<Expr>, Box<Expr>),
    Multiply(Box<Expr>, Box<Expr>),
    Divide(Box<Expr>, Box<Expr>),
    Concat(Box<Expr>, Box<Expr>),
    TextFn {
        value: Box<Expr>,
        format: String,
    },
    Sin(Box<Expr>),
    Cos(Box<Expr>),
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// A relative reference to a cell, 0-based coordinates.
    pub fn cell(row: u32, col: u32) -> Self {
        Self::Cell { row, col }
    }

    pub fn range(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self::Range {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }

    pub fn if_else(condition: Expr, then: Expr, otherwise: Expr) -> Self {
        Self::If(Box::new(condition), Box::new(then), Box::new(otherwise))
    }

    pub fn equal(lhs: Expr, rhs: Expr) -> Self {
        Self::Equal(Box::new(lhs), Box::new(rhs))
    }

    pub fn multiply(lhs: Expr, rhs: Expr) -> Self {
        Self::Multiply(Box::new(lhs), Box::new(rhs))
    }

    pub fn divide(lhs: Expr, rhs: Expr) -> Self {
        Self::Divide(Box::new(lhs), Box::new(rhs))
    }

    pub fn concat(lhs: Expr, rhs: Expr) -> Self {
        Self::Concat(Box::new(lhs), Box::new(rhs))
    }

    /// `TEXT(value,"format")`.
    pub fn text_fn(value: Expr, format: impl Into<String>) -> Self {
        Self::TextFn {
            value: Box::new(value),
            format: format.into(),
        }
    }

    pub fn sin(arg: Expr) -> Self {
        Self::Sin(Box::new(arg))
    }

    pub fn cos(arg: Expr) -> Self {
        Self::Cos(Box::new(arg))
    }

    /// Percentage of `part` in `whole`, guarded against division by zero:
    /// `IF((whole)=(0),0,((part)/(whole))*(100))`.
    pub fn ratio(part: Expr, whole: Expr) -> Self {
        Self::if_else(
            Self::equal(whole.clone(), Self::number(0.0)),
            Self::number(0.0),
            Self::multiply(Self::divide(part, whole), Self::number(100.0)),
        )
    }

    /// Render the tree as formula text, without a leading `=`.
    #[must_use]
    pub fn to_formula(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Self::Cell { row, col } => f.write_str(&format_cell_ref(*row, *col)),
            Self::Range {
                start_row,
                start_col,
                end_row,
                end_col,
            } => write!(
                f,
                "{}:{}",
                format_cell_ref(*start_row, *start_col),
                format_cell_ref(*end_row, *end_col)
            ),
            Self::If(condition, then, otherwise) => {
                write!(f, "IF({condition},{then},{otherwise})")
            }
            Self::Equal(lhs, rhs) => write!(f, "({lhs})=({rhs})"),
            Self::Multiply(lhs, rhs) => write!(f, "({lhs})*({rhs})"),
            Self::Divide(lhs, rhs) => write!(f, "({lhs})/({rhs})"),
            Self::Concat(lhs, rhs) => write!(f, "({lhs})&({rhs})"),
            Self::TextFn { value, format } => {
                write!(f, "TEXT({value},\"{}\")", format.replace('"', "\"\""))
            }
            Self::Sin(arg) => write!(f, "SIN({arg})"),
            Self::Cos(arg) => write!(f, "COS({arg})"),
        }
    }
}

/// An expression drops into a cell as a formula with no cached result.
impl From<Expr> for CellValue {
    fn from(expr: Expr) -> Self {
        CellValue::Formula {
            expr: expr.to_formula(),
            cached: None,
        }
    }
}
