//! Text extraction for downloaded documents
//!
//! Supported inputs, selected by file extension:
//!
//! | Kind | Extensions | Output |
//! |------|------------|--------|
//! | plain text | `.txt` | the bytes as UTF-8 |
//! | Word | `.docx` | body paragraphs joined with `\n` |
//! | PDF | `.pdf` | text of every page, trimmed |
//! | spreadsheet | `.xls`, `.xlsx` | first worksheet rendered as a right-aligned table |
//!
//! Office formats are read straight from the OOXML zip container. The legacy
//! binary `.xls` format is not a zip archive and fails with an extraction error.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use strum::EnumString;
use zip::ZipArchive;
use zip::result::ZipError;

use super::ReaderError;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Maximum cells read from a worksheet.
const MAX_CELLS_PER_SHEET: usize = 100_000;
/// Columns in a worksheet (`A` through `XFD`).
const MAX_SHEET_COLUMNS: usize = 16_384;

/// Document formats the reader can turn into text
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum DocumentKind {
    #[strum(serialize = ".txt")]
    Text,
    #[strum(serialize = ".docx")]
    Word,
    #[strum(serialize = ".pdf")]
    Pdf,
    #[strum(serialize = ".xls", serialize = ".xlsx")]
    Spreadsheet,
}

impl DocumentKind {
    /// Parses a file extension such as `.pdf`. Matching is exact.
    pub fn from_extension(extension: &str) -> Result<Self, ReaderError> {
        extension
            .parse()
            .map_err(|_| ReaderError::UnsupportedFileType(extension.to_string()))
    }
}

/// Decodes `bytes` as a document of the given kind.
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String, ReaderError> {
    match kind {
        DocumentKind::Text => extract_plain(bytes),
        DocumentKind::Word => extract_docx(bytes),
        DocumentKind::Pdf => extract_pdf(bytes),
        DocumentKind::Spreadsheet => extract_spreadsheet(bytes),
    }
}

fn ooxml_error(e: impl std::fmt::Display) -> ReaderError {
    ReaderError::Extract(format!("OOXML: {}", e))
}

fn xml_error(e: quick_xml::Error) -> ReaderError {
    ReaderError::Extract(format!("XML: {}", e))
}

fn extract_plain(bytes: &[u8]) -> Result<String, ReaderError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ReaderError::Extract(format!("text is not valid UTF-8: {}", e)))
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ReaderError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map(|text| text.trim().to_string())
        .map_err(|e| ReaderError::Extract(format!("PDF: {}", e)))
}

fn open_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, ReaderError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(ooxml_error)
}

/// Reads a zip entry, or `None` when the archive has no such entry.
fn read_zip_entry_bounded(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<Vec<u8>>, ReaderError> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ooxml_error(e)),
    };
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(ooxml_error)?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ooxml_error(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, MAX_XML_ENTRY_BYTES
        )));
    }
    Ok(Some(out))
}

fn local_name_is(e: &BytesStart<'_>, name: &[u8]) -> bool {
    e.local_name().as_ref() == name
}

// ============ Word ============

fn extract_docx(bytes: &[u8]) -> Result<String, ReaderError> {
    let mut archive = open_archive(bytes)?;
    let xml = read_zip_entry_bounded(&mut archive, "word/document.xml")?
        .ok_or_else(|| ooxml_error("word/document.xml not found"))?;
    Ok(docx_paragraphs(&xml)?.join("\n"))
}

/// Collects the text of body-level paragraphs; paragraphs inside tables are skipped.
fn docx_paragraphs(xml: &[u8]) -> Result<Vec<String>, ReaderError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut table_depth = 0usize;
    let mut paragraph_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"p" => {
                    paragraph_depth += 1;
                    if table_depth == 0 && paragraph_depth == 1 {
                        current = Some(String::new());
                    }
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                if let Some(text) = current.as_mut() {
                    match e.local_name().as_ref() {
                        b"tab" => text.push('\t'),
                        b"br" | b"cr" => text.push('\n'),
                        _ => {}
                    }
                } else if table_depth == 0 && paragraph_depth == 0 && local_name_is(&e, b"p") {
                    paragraphs.push(String::new());
                }
            }
            Event::Text(te) if in_text => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&te.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                b"p" => {
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                    if paragraph_depth == 0 {
                        if let Some(text) = current.take() {
                            paragraphs.push(text);
                        }
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

// ============ Spreadsheet ============

/// Sparse worksheet: row index → column index → cell text
type SheetCells = BTreeMap<usize, BTreeMap<usize, String>>;

fn extract_spreadsheet(bytes: &[u8]) -> Result<String, ReaderError> {
    let mut archive = open_archive(bytes)?;
    let shared_strings = match read_zip_entry_bounded(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => read_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let first_sheet = first_worksheet_name(&archive)
        .ok_or_else(|| ooxml_error("workbook has no worksheets"))?;
    let sheet_xml = read_zip_entry_bounded(&mut archive, &first_sheet)?
        .ok_or_else(|| ooxml_error(format!("{} not found", first_sheet)))?;

    let cells = read_sheet_cells(&sheet_xml, &shared_strings)?;
    Ok(render_table(&cells))
}

fn first_worksheet_name(archive: &ZipArchive<Cursor<&[u8]>>) -> Option<String> {
    archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .min_by_key(|name| {
            name.trim_start_matches("xl/worksheets/sheet")
                .trim_end_matches(".xml")
                .parse::<u32>()
                .unwrap_or(u32::MAX)
        })
        .map(str::to_string)
}

/// Reads the shared string table; rich-text runs of one item are concatenated.
fn read_shared_strings(xml: &[u8]) -> Result<Vec<String>, ReaderError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = !in_phonetic,
                _ => {}
            },
            Event::Empty(e) if local_name_is(&e, b"si") => strings.push(String::new()),
            Event::Text(te) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&te.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    if let Some(s) = current.take() {
                        strings.push(s);
                    }
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Splits a cell reference such as `AB12` into zero-based (row, column).
///
/// References past the last worksheet column `XFD` are rejected.
fn parse_cell_reference(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut column = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        column = column
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as usize - 'A' as usize + 1)?;
        if column > MAX_SHEET_COLUMNS {
            return None;
        }
    }
    let row: usize = digits.parse().ok()?;
    Some((row.checked_sub(1)?, column - 1))
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Cell being read: position, `t` attribute and accumulated raw value
struct PendingCell {
    row: usize,
    column: usize,
    cell_type: Option<String>,
    value: String,
}

fn read_sheet_cells(xml: &[u8], shared_strings: &[String]) -> Result<SheetCells, ReaderError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut cells = SheetCells::new();
    let mut row = 0usize;
    let mut next_column = 0usize;
    let mut pending: Option<PendingCell> = None;
    let mut in_value = false;
    let mut cell_count = 0usize;

    loop {
        if cell_count >= MAX_CELLS_PER_SHEET {
            tracing::warn!("Worksheet truncated at {} cells", MAX_CELLS_PER_SHEET);
            break;
        }
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = attribute(&e, b"r")
                        .and_then(|r| r.parse::<usize>().ok())
                        .and_then(|r| r.checked_sub(1))
                        .unwrap_or(row);
                    next_column = 0;
                }
                b"c" => {
                    let (cell_row, column) = attribute(&e, b"r")
                        .and_then(|r| parse_cell_reference(&r))
                        .unwrap_or((row, next_column));
                    next_column = column + 1;
                    pending = Some(PendingCell {
                        row: cell_row,
                        column,
                        cell_type: attribute(&e, b"t"),
                        value: String::new(),
                    });
                }
                b"v" | b"t" => in_value = pending.is_some(),
                _ => {}
            },
            Event::Empty(e) if local_name_is(&e, b"c") => {
                next_column = attribute(&e, b"r")
                    .and_then(|r| parse_cell_reference(&r))
                    .map(|(_, column)| column + 1)
                    .unwrap_or(next_column + 1);
            }
            Event::Text(te) if in_value => {
                if let Some(cell) = pending.as_mut() {
                    cell.value.push_str(&te.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(cell) = pending.take() {
                        if cell.column >= MAX_SHEET_COLUMNS {
                            tracing::debug!("Skipping cell beyond column XFD");
                        } else if let Some(text) = resolve_cell(&cell, shared_strings) {
                            cells.entry(cell.row).or_default().insert(cell.column, text);
                            cell_count += 1;
                        }
                    }
                }
                b"row" => row += 1,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(cells)
}

fn resolve_cell(cell: &PendingCell, shared_strings: &[String]) -> Option<String> {
    let raw = cell.value.trim();
    match cell.cell_type.as_deref() {
        Some("s") => raw
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i).cloned()),
        Some("b") => Some(if raw == "1" { "True" } else { "False" }.to_string()),
        Some("inlineStr") | Some("str") => Some(cell.value.clone()),
        _ if raw.is_empty() => None,
        _ => Some(raw.to_string()),
    }
}

/// Renders the sheet with its first row as the header, every column right-aligned,
/// and `NaN` for missing cells.
fn render_table(cells: &SheetCells) -> String {
    let Some((&header_row, header_cells)) = cells.iter().next() else {
        return "Empty DataFrame\nColumns: []\nIndex: []".to_string();
    };

    let width = cells
        .values()
        .filter_map(|row| row.keys().next_back())
        .max()
        .map_or(0, |last| last + 1);

    let header: Vec<String> = (0..width)
        .map(|column| {
            header_cells
                .get(&column)
                .cloned()
                .unwrap_or_else(|| format!("Unnamed: {}", column))
        })
        .collect();

    let rows: Vec<Vec<String>> = cells
        .range(header_row + 1..)
        .map(|(_, row)| {
            (0..width)
                .map(|column| row.get(&column).cloned().unwrap_or_else(|| "NaN".to_string()))
                .collect()
        })
        .collect();

    if rows.is_empty() {
        return format!(
            "Empty DataFrame\nColumns: [{}]\nIndex: []",
            header.join(", ")
        );
    }

    let column_widths: Vec<usize> = (0..width)
        .map(|column| {
            rows.iter()
                .map(|row| row[column].chars().count())
                .chain(std::iter::once(header[column].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    std::iter::once(&header)
        .chain(rows.iter())
        .map(|row| {
            row.iter()
                .zip(&column_widths)
                .map(|(cell, &w)| format!("{:>w$}", cell, w = w))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
