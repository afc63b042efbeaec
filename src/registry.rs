//! Font and style deduplication for cross-document copies.
//!
//! Copying cells between documents must not grow the target's style table
//! with duplicate entries: some downstream viewers corrupt or reject
//! workbooks whose style tables interleave redundant entries with data.
//! The registry maps the structural identity of a font or style to the
//! index it already has in the target, creating an entry only on first
//! sight. First structural match wins.

use std::collections::HashMap;

use crate::types::{BorderStyle, CellStyle, Font, HAlign, UnderlineStyle, VAlign, VertAlign, Workbook};

/// Dedup table scoped to one target document.
///
/// Build a fresh registry per consolidation or split run; seed it with
/// [`StyleRegistry::for_workbook`] when the target already has entries.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    fonts: HashMap<FontKey, u32>,
    styles: HashMap<StyleKey, u32>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry from the target's existing font and style tables,
    /// so copies resolve to pre-existing entries instead of duplicating them.
    pub fn for_workbook(target: &Workbook) -> Self {
        let mut fonts = HashMap::new();
        for (index, font) in target.fonts.iter().enumerate() {
            let id = u32::try_from(index).unwrap_or(u32::MAX);
            fonts.entry(FontKey::of(font)).or_insert(id);
        }
        let mut styles = HashMap::new();
        for (index, style) in target.styles.iter().enumerate() {
            let id = u32::try_from(index).unwrap_or(u32::MAX);
            // key styles by the canonical id of their font so entries
            // referencing duplicate fonts still collapse
            let canonical_font = target
                .font(style.font_id)
                .and_then(|font| fonts.get(&FontKey::of(font)).copied())
                .unwrap_or(style.font_id);
            styles
                .entry(StyleKey::of(style, canonical_font))
                .or_insert(id);
        }
        Self { fonts, styles }
    }

    /// Copy a font into the target, reusing a structurally equal entry
    /// when one exists. `None` in, `None` out.
    pub fn copy_font(&mut self, source: Option<&Font>, target: &mut Workbook) -> Option<u32> {
        let font = source?;
        let key = FontKey::of(font);
        if let Some(&id) = self.fonts.get(&key) {
            return Some(id);
        }
        let id = target.add_font(font.clone());
        self.fonts.insert(key, id);
        Some(id)
    }

    /// Copy a style (and, transitively, its font) into the target.
    ///
    /// `None` and unresolvable style ids propagate as `None`, which callers
    /// treat as "no style" rather than an error.
    pub fn copy_style(
        &mut self,
        source: &Workbook,
        style_id: Option<u32>,
        target: &mut Workbook,
    ) -> Option<u32> {
        let id = style_id?;
        let Some(style) = source.style(id) else {
            log::warn!("cell references style {id} missing from the style table; dropping it");
            return None;
        };
        let font_id = match self.copy_font(source.font(style.font_id), target) {
            Some(font_id) => font_id,
            None => {
                log::warn!(
                    "style {id} references font {} missing from the font table; using the default",
                    style.font_id
                );
                0
            }
        };
        let key = StyleKey::of(style, font_id);
        if let Some(&existing) = self.styles.get(&key) {
            return Some(existing);
        }
        let mut copied = style.clone();
        copied.font_id = font_id;
        let new_id = target.add_style(copied);
        self.styles.insert(key, new_id);
        Some(new_id)
    }
}

/// Every field participating in font structural equality. Sizes are keyed
/// by bit pattern, matching the exactness of direct float comparison.
#[derive(Debug, PartialEq, Eq, Hash)]
struct FontKey {
    name: String,
    size: u64,
    bold: bool,
    italic: bool,
    strikeout: bool,
    underline: UnderlineStyle,
    color: Option<String>,
    vert_align: VertAlign,
}

impl FontKey {
    fn of(font: &Font) -> Self {
        Self {
            name: font.name.clone(),
            size: font.size.to_bits(),
            bold: font.bold,
            italic: font.italic,
            strikeout: font.strikeout,
            underline: font.underline,
            color: font.color.clone(),
            vert_align: font.vert_align,
        }
    }
}

/// Style identity: every compared field, with the font captured through
/// its deduplicated target id.
#[derive(Debug, PartialEq, Eq, Hash)]
struct StyleKey {
    font_id: u32,
    align_h: HAlign,
    align_v: VAlign,
    border_top: BorderStyle,
    border_right: BorderStyle,
    border_bottom: BorderStyle,
    border_left: BorderStyle,
    fill_fg: Option<String>,
    fill_bg: Option<String>,
    wrap_text: bool,
    indent: u32,
    rotation: i32,
}

impl StyleKey {
    fn of(style: &CellStyle, font_id: u32) -> Self {
        Self {
            font_id,
            align_h: style.align_h,
            align_v: style.align_v,
            border_top: style.border_top,
            border_right: style.border_right,
            border_bottom: style.border_bottom,
            border_left: style.border_left,
            fill_fg: style.fill_fg.clone(),
            fill_bg: style.fill_bg.clone(),
            wrap_text: style.wrap_text,
            indent: style.indent,
            rotation: style.rotation,
        }
    }
}
