use serde::{Deserialize, Serialize};

/// A single cell: its value plus optional style and comment.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub value: CellValue,
    /// Index into the workbook style table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<Comment>,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        matches!(self.value, CellValue::Blank)
    }
}

/// The typed content of a cell.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum CellValue {
    #[default]
    Blank,
    Boolean(bool),
    Number(f64),
    Text(String),
    Formula {
        expr: String,
        /// Last evaluated result, when the producing application stored one.
        cached: Option<f64>,
    },
}

impl CellValue {
    /// The value as a number, the way a display layer would coerce it.
    ///
    /// Text parses as a decimal number when it can, otherwise 0. Formulas
    /// yield their cached result when present. Booleans are 1 or 0.
    pub fn numeric(&self) -> f64 {
        match self {
            Self::Blank => 0.0,
            Self::Boolean(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0.0),
            Self::Formula { cached, .. } => cached.unwrap_or(0.0),
        }
    }
}

/// A comment attached to a cell.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub text: String,
}
