use serde::{Deserialize, Serialize};

use super::{Cell, CellStyle, CellValue, Font, Row, Sheet};
use crate::cell_ref::{format_sheet_ref, parse_sheet_ref};

/// A workbook: sheets plus the shared font and style tables.
///
/// Cells reference styles by index into [`Workbook::styles`]; styles
/// reference fonts by index into [`Workbook::fonts`]. Index 0 of each
/// table is the workbook default and always present.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub fonts: Vec<Font>,
    pub styles: Vec<CellStyle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defined_names: Vec<DefinedName>,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            fonts: vec![Font::default()],
            styles: vec![CellStyle::default()],
            defined_names: Vec::new(),
        }
    }

    /// Append an empty sheet and return its index.
    pub fn add_sheet(&mut self, name: impl Into<String>) -> usize {
        self.sheets.push(Sheet::new(name));
        self.sheets.len() - 1
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn font(&self, id: u32) -> Option<&Font> {
        self.fonts.get(id as usize)
    }

    pub fn style(&self, id: u32) -> Option<&CellStyle> {
        self.styles.get(id as usize)
    }

    /// Append a font and return its table index.
    pub fn add_font(&mut self, font: Font) -> u32 {
        self.fonts.push(font);
        u32::try_from(self.fonts.len() - 1).unwrap_or(u32::MAX)
    }

    /// Append a style and return its table index.
    pub fn add_style(&mut self, style: CellStyle) -> u32 {
        self.styles.push(style);
        u32::try_from(self.styles.len() - 1).unwrap_or(u32::MAX)
    }

    /// Name a cell so it can be addressed without knowing its position.
    ///
    /// The cell is created if it does not exist yet, so the name always
    /// resolves afterwards. Re-using a name moves it to the new position.
    /// Returns false when no sheet with `sheet_name` exists.
    pub fn make_named_cell(&mut self, name: &str, sheet_name: &str, row: u32, col: u32) -> bool {
        let Some(index) = self.sheet_index(sheet_name) else {
            return false;
        };
        if let Some(sheet) = self.sheets.get_mut(index) {
            sheet.get_or_create_cell(row, col);
        }
        let reference = format_sheet_ref(sheet_name, row, col);
        if let Some(existing) = self.defined_names.iter_mut().find(|d| d.name == name) {
            existing.reference = reference;
        } else {
            self.defined_names.push(DefinedName {
                name: name.to_string(),
                reference,
            });
        }
        true
    }

    /// Resolve a defined name to a sheet index and cell position.
    ///
    /// `None` when the name is unknown, its reference does not parse as a
    /// single cell, or the referenced sheet is gone.
    pub fn named_cell_position(&self, name: &str) -> Option<NamedCellRef> {
        let defined = self.defined_names.iter().find(|d| d.name == name)?;
        let (sheet_name, row, col) = parse_sheet_ref(&defined.reference)?;
        let sheet = self.sheet_index(&sheet_name)?;
        Some(NamedCellRef { sheet, row, col })
    }

    pub fn named_cell(&self, name: &str) -> Option<&Cell> {
        let pos = self.named_cell_position(name)?;
        self.sheets.get(pos.sheet)?.cell(pos.row, pos.col)
    }

    /// The whole row holding a named cell.
    pub fn row_by_named_cell(&self, name: &str) -> Option<&Row> {
        let pos = self.named_cell_position(name)?;
        self.sheets.get(pos.sheet)?.row(pos.row)
    }

    /// Write a value into a named cell, creating the cell when needed.
    /// Returns false when the name does not resolve.
    pub fn set_named_cell_value(&mut self, name: &str, value: CellValue) -> bool {
        let Some(pos) = self.named_cell_position(name) else {
            return false;
        };
        let Some(sheet) = self.sheets.get_mut(pos.sheet) else {
            return false;
        };
        sheet.get_or_create_cell(pos.row, pos.col).value = value;
        true
    }
}

/// A defined name pointing at a sheet-qualified cell reference.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefinedName {
    pub name: String,
    /// Sheet-qualified reference like `Sheet1!B3` or `'My Sheet'!$A$1`.
    pub reference: String,
}

/// Resolved position of a named cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedCellRef {
    pub sheet: usize,
    pub row: u32,
    pub col: u32,
}
