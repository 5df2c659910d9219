//! Turns uploaded bytes into text, rows or a passthrough image.
//!
//! Text-like formats are flattened to one string (fragments joined with
//! newlines) plus a word preview. Tabular formats become a [`Table`] with a
//! rendered markdown preview. Anything outside the fixed upload set comes back
//! as [`Extraction::Unsupported`] rather than an error.

use calamine::{Data, Reader, Xlsx};
use serde::Serialize;
use std::io::{Cursor, Read};

use super::{preview::preview, table::Table};
use crate::config::AvaConfig;
use crate::error::ExtractError;
use crate::tokens::TokenBudget;
use crate::types::{ImageFormat, MediaType, UploadedFile};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractedContent {
    Text {
        text: String,
        preview: String,
        source: MediaType,
    },
    Table {
        table: Table,
        preview_markdown: String,
    },
    Image {
        #[serde(skip)]
        bytes: Vec<u8>,
        format: ImageFormat,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Supported(ExtractedContent),
    Unsupported { mime: String },
}

/// Extracted content measured against the model that will receive it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractedDocument {
    Text {
        text: String,
        preview: String,
        token_count: usize,
        token_limit: usize,
        over_limit: bool,
        source: MediaType,
    },
    Table {
        table: Table,
        preview_markdown: String,
    },
    Image {
        #[serde(skip)]
        bytes: Vec<u8>,
        format: ImageFormat,
    },
}

impl ExtractedDocument {
    pub fn measure(content: ExtractedContent, model: &str, token_limit: usize) -> Self {
        match content {
            ExtractedContent::Text {
                text,
                preview,
                source,
            } => {
                let budget = TokenBudget::measure(&text, model, token_limit);
                Self::Text {
                    over_limit: budget.is_over(),
                    token_count: budget.tokens,
                    token_limit,
                    text,
                    preview,
                    source,
                }
            }
            ExtractedContent::Table {
                table,
                preview_markdown,
            } => Self::Table {
                table,
                preview_markdown,
            },
            ExtractedContent::Image { bytes, format } => Self::Image { bytes, format },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentExtractor {
    preview_words: usize,
    table_preview_rows: usize,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self {
            preview_words: 200,
            table_preview_rows: 5,
        }
    }
}

impl ContentExtractor {
    pub fn new(preview_words: usize, table_preview_rows: usize) -> Self {
        Self {
            preview_words,
            table_preview_rows,
        }
    }

    pub fn from_config(config: &AvaConfig) -> Self {
        Self::new(config.preview_words, config.table_preview_rows)
    }

    pub fn extract_upload(&self, file: &UploadedFile) -> Result<Extraction, ExtractError> {
        let media = MediaType::detect(&file.mime, &file.name);
        self.extract(media, &file.mime, &file.bytes)
    }

    pub fn extract(
        &self,
        media: Option<MediaType>,
        mime: &str,
        bytes: &[u8],
    ) -> Result<Extraction, ExtractError> {
        let Some(media) = media else {
            tracing::warn!(mime = %mime, "Unsupported upload type");
            return Ok(Extraction::Unsupported {
                mime: mime.to_string(),
            });
        };

        let content = match media {
            MediaType::PlainText => self.text(String::from_utf8(bytes.to_vec())?, media),
            MediaType::Pdf => self.text(extract_pdf_text(bytes)?, media),
            MediaType::Docx => self.text(extract_docx_text(bytes)?, media),
            MediaType::Pptx => self.text(extract_pptx_text(bytes)?, media),
            MediaType::Csv => self.table(read_csv(bytes)?),
            MediaType::Xlsx => self.table(read_xlsx(bytes)?),
            MediaType::Image(format) => ExtractedContent::Image {
                bytes: bytes.to_vec(),
                format,
            },
        };

        tracing::debug!(media = ?media, bytes = bytes.len(), "Extracted upload");
        Ok(Extraction::Supported(content))
    }

    pub fn text(&self, text: String, source: MediaType) -> ExtractedContent {
        ExtractedContent::Text {
            preview: preview(&text, self.preview_words),
            text,
            source,
        }
    }

    fn table(&self, table: Table) -> ExtractedContent {
        ExtractedContent::Table {
            preview_markdown: table.to_markdown(self.table_preview_rows),
            table,
        }
    }
}

/// Page text of a PDF joined with newlines. `pdf-extract` first, then lopdf
/// page by page when that fails or finds nothing.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed fonts
    let primary = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

    match primary {
        Ok(Ok(text)) => {
            let cleaned = text
                .lines()
                .map(|line| line.trim_end())
                .collect::<Vec<_>>()
                .join("\n");
            if !cleaned.trim().is_empty() {
                return Ok(cleaned.trim().to_string());
            }
            tracing::debug!("pdf-extract found no text, trying lopdf");
        }
        Ok(Err(e)) => tracing::warn!(error = %e, "pdf-extract failed, trying lopdf"),
        Err(_) => tracing::warn!("pdf-extract panicked, trying lopdf"),
    }

    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let pages: Vec<String> = doc
        .get_pages()
        .keys()
        .map(|page| doc.extract_text(&[*page]).unwrap_or_default())
        .map(|text| text.trim().to_string())
        .collect();

    let text = pages.join("\n");
    if text.trim().is_empty() {
        return Err(ExtractError::NoText("PDF"));
    }
    Ok(text)
}

fn read_zip_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
    format: &'static str,
) -> Result<String, ExtractError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|source| ExtractError::Archive { format, source })?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Paragraph text of a DOCX, one paragraph per line.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|source| {
        ExtractError::Archive {
            format: "DOCX",
            source,
        }
    })?;

    if archive.by_name("word/document.xml").is_err() {
        return Err(ExtractError::MissingEntry {
            format: "DOCX",
            entry: "word/document.xml",
        });
    }
    let xml = read_zip_entry(&mut archive, "word/document.xml", "DOCX")?;
    Ok(xml_paragraphs(&xml, "w").join("\n"))
}

/// Shape paragraphs of every slide of a PPTX, in slide order.
pub fn extract_pptx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|source| {
        ExtractError::Archive {
            format: "PPTX",
            source,
        }
    })?;

    let mut slides: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse::<usize>()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    let mut fragments = Vec::new();
    for (_, name) in slides {
        let xml = read_zip_entry(&mut archive, &name, "PPTX")?;
        fragments.extend(xml_paragraphs(&xml, "a"));
    }
    Ok(fragments.join("\n"))
}

/// Collect the text runs (`<ns:t>`) of each paragraph (`<ns:p>`) in an
/// OOXML part. Empty paragraphs are kept so blank lines survive.
fn xml_paragraphs(xml: &str, ns: &str) -> Vec<String> {
    let para_open = format!("<{}:p", ns);
    let para_close = format!("</{}:p>", ns);
    let run_open = format!("<{}:t", ns);
    let run_close = format!("</{}:t>", ns);

    let mut paragraphs = Vec::new();
    let mut pos = 0;

    while let Some(found) = find_tag(&xml[pos..], &para_open) {
        let start = pos + found;
        let end = xml[start..]
            .find(&para_close)
            .map(|e| start + e + para_close.len())
            .unwrap_or(xml.len());
        let paragraph = &xml[start..end];

        let mut text = String::new();
        let mut t_pos = 0;
        while let Some(found) = find_tag(&paragraph[t_pos..], &run_open) {
            let tag_start = t_pos + found;
            let Some(tag_len) = paragraph[tag_start..].find('>') else {
                break;
            };
            let content_start = tag_start + tag_len + 1;
            // Self-closing run such as <w:t/>
            if paragraph[..content_start].ends_with("/>") {
                t_pos = content_start;
                continue;
            }
            match paragraph[content_start..].find(&run_close) {
                Some(len) => {
                    text.push_str(&decode_xml_entities(
                        &paragraph[content_start..content_start + len],
                    ));
                    t_pos = content_start + len + run_close.len();
                }
                None => break,
            }
        }

        paragraphs.push(text);
        pos = end;
    }

    paragraphs
}

/// Find `<ns:x` only where the tag name ends there, so `<w:t` does not match
/// `<w:tab/>` and `<w:p` does not match `<w:pPr>`.
fn find_tag(haystack: &str, open: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(found) = haystack[offset..].find(open) {
        let at = offset + found;
        let next = haystack[at + open.len()..].chars().next();
        if matches!(next, Some('>') | Some(' ') | Some('/') | Some('\n') | Some('\t')) {
            return Some(at);
        }
        offset = at + open.len();
    }
    None
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn read_csv(bytes: &[u8]) -> Result<Table, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(Table::new(headers, rows))
}

fn read_xlsx(bytes: &[u8]) -> Result<Table, ExtractError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;

    let Some(first_sheet) = workbook.sheet_names().first().cloned() else {
        return Err(ExtractError::Spreadsheet("workbook has no sheets".into()));
    };
    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    let rows = rows
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();
    Ok(Table::new(headers, rows))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR:{:?}", e),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            for (name, body) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(body.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_docx_paragraphs_joined_with_newlines() {
        let xml = r#"<w:document><w:body>
            <w:p><w:pPr><w:jc w:val="left"/></w:pPr><w:r><w:t>Hello </w:t></w:r><w:r><w:tab/><w:t xml:space="preserve">world</w:t></w:r></w:p>
            <w:p><w:r><w:t>Fish &amp; chips</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let docx = zip_with(&[("word/document.xml", xml)]);
        assert_eq!(extract_docx_text(&docx).unwrap(), "Hello world\nFish & chips");
    }

    #[test]
    fn test_docx_without_document_part() {
        let docx = zip_with(&[("word/styles.xml", "<w:styles/>")]);
        assert!(matches!(
            extract_docx_text(&docx),
            Err(ExtractError::MissingEntry { format: "DOCX", .. })
        ));
    }

    #[test]
    fn test_pptx_slides_in_numeric_order() {
        let slide = |text: &str| format!("<p:sld><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:sld>", text);
        let s1 = slide("first");
        let s2 = slide("second");
        let s10 = slide("tenth");
        let pptx = zip_with(&[
            ("ppt/slides/slide10.xml", s10.as_str()),
            ("ppt/slides/slide2.xml", s2.as_str()),
            ("ppt/slides/slide1.xml", s1.as_str()),
            ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
        ]);
        assert_eq!(extract_pptx_text(&pptx).unwrap(), "first\nsecond\ntenth");
    }

    #[test]
    fn test_csv_header_is_not_a_row() {
        let extractor = ContentExtractor::default();
        let csv = b"a,b,c\n1,2,3\n4,5,6\n";
        let result = extractor
            .extract(Some(MediaType::Csv), "text/csv", csv)
            .unwrap();
        match result {
            Extraction::Supported(ExtractedContent::Table { table, preview_markdown }) => {
                assert_eq!(table.row_count(), 2);
                assert_eq!(table.column_count(), 3);
                assert!(preview_markdown.starts_with("|    | a | b | c |"));
            }
            other => panic!("unexpected extraction: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_media_type_is_unsupported_not_error() {
        let extractor = ContentExtractor::default();
        let result = extractor.extract(None, "application/zip", b"PK").unwrap();
        assert_eq!(
            result,
            Extraction::Unsupported {
                mime: "application/zip".into()
            }
        );
    }

    #[test]
    fn test_invalid_utf8_text_is_an_error() {
        let extractor = ContentExtractor::default();
        let result = extractor.extract(Some(MediaType::PlainText), "text/plain", &[0xff, 0xfe]);
        assert!(matches!(result, Err(ExtractError::Decode(_))));
    }

    #[test]
    fn test_text_preview_uses_configured_word_count() {
        let extractor = ContentExtractor::new(3, 5);
        let content = extractor.text("one two\nthree four".into(), MediaType::PlainText);
        assert_eq!(
            content,
            ExtractedContent::Text {
                text: "one two\nthree four".into(),
                preview: "one two three".into(),
                source: MediaType::PlainText,
            }
        );
    }

    #[test]
    fn test_measure_flags_over_limit() {
        let extractor = ContentExtractor::default();
        let text = "word ".repeat(500);
        let doc = ExtractedDocument::measure(
            extractor.text(text, MediaType::PlainText),
            "tiny",
            10,
        );
        match doc {
            ExtractedDocument::Text {
                over_limit,
                token_limit,
                token_count,
                ..
            } => {
                assert!(over_limit);
                assert_eq!(token_limit, 10);
                assert!(token_count > 10);
            }
            other => panic!("unexpected document: {:?}", other),
        }
    }
}
