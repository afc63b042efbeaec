use serde::{Deserialize, Serialize};

/// A font entry in a workbook's font table.
///
/// Cells reference fonts indirectly through [`CellStyle::font_id`]. Two fonts
/// are interchangeable exactly when every field here compares equal.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Font {
    pub name: String,
    /// Size in points.
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub strikeout: bool,
    pub underline: UnderlineStyle,
    /// Hex color like "#336699".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub vert_align: VertAlign,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size: 11.0,
            bold: false,
            italic: false,
            strikeout: false,
            underline: UnderlineStyle::None,
            color: None,
            vert_align: VertAlign::Baseline,
        }
    }
}

/// A cell style entry in a workbook's style table.
///
/// Cells reference styles by index (`Cell::style`). Structural equality is
/// field-by-field plus equality of the referenced font.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CellStyle {
    pub font_id: u32,
    pub align_h: HAlign,
    pub align_v: VAlign,
    pub border_top: BorderStyle,
    pub border_right: BorderStyle,
    pub border_bottom: BorderStyle,
    pub border_left: BorderStyle,
    /// Solid fill foreground color, hex like "#FFFF00".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_fg: Option<String>,
    /// Solid fill background color, hex like "#000000".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_bg: Option<String>,
    pub wrap_text: bool,
    pub indent: u32,
    pub rotation: i32,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            font_id: 0,
            align_h: HAlign::General,
            align_v: VAlign::Bottom,
            border_top: BorderStyle::None,
            border_right: BorderStyle::None,
            border_bottom: BorderStyle::None,
            border_left: BorderStyle::None,
            fill_fg: None,
            fill_bg: None,
            wrap_text: false,
            indent: 0,
            rotation: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderStyle {
    /// The `style` attribute value in styles.xml, or `None` for no border.
    pub(crate) fn as_xml(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Thin => Some("thin"),
            Self::Medium => Some("medium"),
            Self::Thick => Some("thick"),
            Self::Dashed => Some("dashed"),
            Self::Dotted => Some("dotted"),
            Self::Double => Some("double"),
            Self::Hair => Some("hair"),
            Self::MediumDashed => Some("mediumDashed"),
            Self::DashDot => Some("dashDot"),
            Self::MediumDashDot => Some("mediumDashDot"),
            Self::DashDotDot => Some("dashDotDot"),
            Self::MediumDashDotDot => Some("mediumDashDotDot"),
            Self::SlantDashDot => Some("slantDashDot"),
        }
    }

    pub(crate) fn from_xml(s: &str) -> Self {
        match s {
            "thin" => Self::Thin,
            "medium" => Self::Medium,
            "thick" => Self::Thick,
            "dashed" => Self::Dashed,
            "dotted" => Self::Dotted,
            "double" => Self::Double,
            "hair" => Self::Hair,
            "mediumDashed" => Self::MediumDashed,
            "dashDot" => Self::DashDot,
            "mediumDashDot" => Self::MediumDashDot,
            "dashDotDot" => Self::DashDotDot,
            "mediumDashDotDot" => Self::MediumDashDotDot,
            "slantDashDot" => Self::SlantDashDot,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum HAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HAlign {
    /// The `horizontal` attribute value, or `None` for the default.
    pub(crate) fn as_xml(self) -> Option<&'static str> {
        match self {
            Self::General => None,
            Self::Left => Some("left"),
            Self::Center => Some("center"),
            Self::Right => Some("right"),
            Self::Fill => Some("fill"),
            Self::Justify => Some("justify"),
            Self::CenterContinuous => Some("centerContinuous"),
            Self::Distributed => Some("distributed"),
        }
    }

    pub(crate) fn from_xml(s: &str) -> Self {
        match s {
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            "fill" => Self::Fill,
            "justify" => Self::Justify,
            "centerContinuous" => Self::CenterContinuous,
            "distributed" => Self::Distributed,
            _ => Self::General,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum VAlign {
    Top,
    Center,
    #[default]
    Bottom,
    Justify,
    Distributed,
}

impl VAlign {
    /// The `vertical` attribute value, or `None` for the default.
    pub(crate) fn as_xml(self) -> Option<&'static str> {
        match self {
            Self::Top => Some("top"),
            Self::Center => Some("center"),
            Self::Bottom => None,
            Self::Justify => Some("justify"),
            Self::Distributed => Some("distributed"),
        }
    }

    pub(crate) fn from_xml(s: &str) -> Self {
        match s {
            "top" => Self::Top,
            "center" => Self::Center,
            "justify" => Self::Justify,
            "distributed" => Self::Distributed,
            _ => Self::Bottom,
        }
    }
}

/// Underline style for font formatting.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum UnderlineStyle {
    #[default]
    None,
    Single,
    Double,
    SingleAccounting,
    DoubleAccounting,
}

impl UnderlineStyle {
    pub(crate) fn as_xml(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Single => Some("single"),
            Self::Double => Some("double"),
            Self::SingleAccounting => Some("singleAccounting"),
            Self::DoubleAccounting => Some("doubleAccounting"),
        }
    }

    pub(crate) fn from_xml(s: &str) -> Self {
        match s {
            "double" => Self::Double,
            "singleAccounting" => Self::SingleAccounting,
            "doubleAccounting" => Self::DoubleAccounting,
            "none" => Self::None,
            _ => Self::Single,
        }
    }
}

/// Vertical alignment for text (subscript/superscript).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum VertAlign {
    #[default]
    Baseline,
    Subscript,
    Superscript,
}

impl VertAlign {
    pub(crate) fn as_xml(self) -> Option<&'static str> {
        match self {
            Self::Baseline => None,
            Self::Subscript => Some("subscript"),
            Self::Superscript => Some("superscript"),
        }
    }

    pub(crate) fn from_xml(s: &str) -> Self {
        match s {
            "subscript" => Self::Subscript,
            "superscript" => Self::Superscript,
            _ => Self::Baseline,
        }
    }
}

/// A merged cell range: a closed rectangle rendered as one cell.
///
/// `start_row <= end_row` and `start_col <= end_col` always hold.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MergeRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl MergeRange {
    pub fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }
}
