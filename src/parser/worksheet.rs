//! Worksheet parsing - reads `<sheetData>` into sparse [`CellData`].

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::types::{CellData, CellValue, Sheet};
use crate::xml_helpers::{attr_bytes, text_to_string};

/// Sheet metadata from workbook.xml
#[derive(Debug, Clone)]
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    seen.then_some(num)
}

/// Turn the raw `<v>`/`<t>` text of a cell into a typed value.
pub(super) fn resolve_cell_value(
    raw: Option<&str>,
    tag: CellTypeTag,
    shared_strings: &[String],
) -> CellValue {
    let Some(raw) = raw else {
        return CellValue::Empty;
    };
    match tag {
        CellTypeTag::Shared => {
            let text = raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| shared_strings.get(idx));
            match text {
                Some(s) => CellValue::Text(s.clone()),
                None => {
                    log::debug!("shared string index {raw:?} out of range");
                    CellValue::Empty
                }
            }
        }
        CellTypeTag::Inline | CellTypeTag::Str | CellTypeTag::Date => {
            CellValue::Text(raw.to_string())
        }
        CellTypeTag::Bool => match raw.trim() {
            "1" | "true" => CellValue::Bool(true),
            "0" | "false" => CellValue::Bool(false),
            other => CellValue::Text(other.to_string()),
        },
        CellTypeTag::Error => CellValue::Error(raw.to_string()),
        CellTypeTag::Default => match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(raw.to_string()),
        },
    }
}

/// Parse a single worksheet part. A missing part yields an empty sheet.
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
) -> Result<Sheet> {
    let mut sheet = Sheet::new(info.name.clone());

    let Ok(file) = archive.by_name(&info.path) else {
        log::warn!("sheet {:?} points at missing part {}", info.name, info.path);
        return Ok(sheet);
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut buf = Vec::new();
    // 0-based cursor; rows/cells without an `r` attribute continue from it.
    let mut next_row: u32 = 0;
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;

    loop {
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(_) | Event::Empty(_)) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"row" => {
                        current_row = attr_bytes(e, b"r")
                            .and_then(|r| parse_u32_bytes(&r))
                            .and_then(|r| r.checked_sub(1))
                            .unwrap_or(next_row);
                        next_row = current_row.saturating_add(1);
                        next_col = 0;
                    }
                    b"c" => {
                        let (col, row) = attr_bytes(e, b"r")
                            .and_then(|r| parse_cell_ref_bytes(&r))
                            .unwrap_or((next_col, current_row));
                        next_col = col.saturating_add(1);
                        let tag = attr_bytes(e, b"t")
                            .map(|t| parse_cell_type_tag(&t))
                            .unwrap_or(CellTypeTag::Default);

                        // Self-closing cells carry no value.
                        let raw = if is_start_event {
                            read_cell_text(&mut xml)?
                        } else {
                            None
                        };

                        let value = resolve_cell_value(raw.as_deref(), tag, shared_strings);
                        if !value.is_empty() {
                            sheet.cells.push(CellData { r: row, c: col, value });
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    log::debug!(
        "parsed sheet {:?}: {} cells",
        sheet.name,
        sheet.cells.len()
    );
    Ok(sheet)
}

/// Read the children of a `<c>` element up to its end tag.
///
/// Returns the `<v>` text, or the concatenated `<t>` runs of an `<is>` inline
/// string. Formula text (`<f>`) is ignored.
fn read_cell_text<B: BufRead>(xml: &mut Reader<B>) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let mut value: Option<String> = None;
    let mut inline: Option<String> = None;
    let mut in_v = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"v" => in_v = true,
                b"is" => inline = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_t = true,
                _ => {}
            },
            Event::Text(ref t) => {
                if in_v {
                    if let Some(text) = text_to_string(t) {
                        value.get_or_insert_with(String::new).push_str(&text);
                    }
                } else if in_t {
                    if let Some(text) = text_to_string(t) {
                        inline.get_or_insert_with(String::new).push_str(&text);
                    }
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" => in_v = false,
                b"t" => in_t = false,
                b"rPh" => in_phonetic = false,
                b"c" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(value.or(inline))
}
