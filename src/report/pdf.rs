//! Minimal PDF 1.4 writer for rendered reports
//!
//! Markdown is walked with pulldown-cmark into styled lines, wrapped at a
//! fixed character width and laid out top to bottom on US Letter pages.
//! Only the standard Type1 fonts are referenced, so nothing is embedded.
//! Characters outside Latin-1 are printed as `?`.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use std::io::Write;

use super::ReportError;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const LEADING: f32 = 12.0;
const WRAP_WIDTH: usize = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Body,
    Heading,
    Code,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Body => "F1",
            Font::Heading => "F2",
            Font::Code => "F3",
        }
    }

    fn size(self) -> f32 {
        match self {
            Font::Body => 10.0,
            Font::Heading => 11.0,
            Font::Code => 9.0,
        }
    }
}

const FONTS: [(&str, &str); 3] = [
    ("F1", "Helvetica"),
    ("F2", "Helvetica-Bold"),
    ("F3", "Courier"),
];

/// One laid-out line. `None` text is vertical space.
#[derive(Debug, Clone, PartialEq)]
struct Line {
    font: Font,
    text: Option<String>,
}

impl Line {
    fn text(font: Font, text: String) -> Self {
        Self {
            font,
            text: Some(text),
        }
    }

    fn blank() -> Self {
        Self {
            font: Font::Body,
            text: None,
        }
    }
}

/// Render Markdown as PDF bytes
pub fn pdf_from_markdown(markdown: &str) -> Result<Vec<u8>, ReportError> {
    let lines = layout(markdown);
    let pages = paginate(&lines);
    write_document(&pages)
}

/// Turn Markdown into wrapped, styled lines
fn layout(markdown: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut buffer = String::new();
    let mut font = Font::Body;
    let mut in_code = false;
    let mut list_depth = 0usize;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                font = Font::Heading;
                buffer.push_str(&"#".repeat(heading_depth(level)));
                buffer.push(' ');
            }
            Event::Start(Tag::CodeBlock(_)) => {
                in_code = true;
                font = Font::Code;
            }
            Event::Start(Tag::List(_)) => {
                flush_wrapped(&mut lines, &mut buffer, font);
                list_depth += 1;
            }
            Event::Start(Tag::Item) => {
                buffer.push_str(&"  ".repeat(list_depth.saturating_sub(1)));
                buffer.push_str("- ");
            }
            Event::End(TagEnd::Heading(_)) | Event::End(TagEnd::Paragraph) => {
                flush_wrapped(&mut lines, &mut buffer, font);
                lines.push(Line::blank());
                font = Font::Body;
            }
            Event::End(TagEnd::Item) => flush_wrapped(&mut lines, &mut buffer, font),
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                if list_depth == 0 {
                    lines.push(Line::blank());
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                for raw in buffer.trim_end_matches('\n').split('\n') {
                    for chunk in hard_wrap(raw, WRAP_WIDTH) {
                        lines.push(Line::text(Font::Code, chunk));
                    }
                }
                buffer.clear();
                lines.push(Line::blank());
                in_code = false;
                font = Font::Body;
            }
            Event::Text(text) => buffer.push_str(&text),
            Event::Code(code) => buffer.push_str(&code),
            Event::SoftBreak => buffer.push(if in_code { '\n' } else { ' ' }),
            Event::HardBreak => flush_wrapped(&mut lines, &mut buffer, font),
            Event::Rule => {
                lines.push(Line::text(Font::Body, "-".repeat(40)));
                lines.push(Line::blank());
            }
            _ => {}
        }
    }
    flush_wrapped(&mut lines, &mut buffer, font);

    while lines.last().map(|l| l.text.is_none()).unwrap_or(false) {
        lines.pop();
    }
    lines
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn flush_wrapped(lines: &mut Vec<Line>, buffer: &mut String, font: Font) {
    if buffer.trim().is_empty() {
        buffer.clear();
        return;
    }
    for line in word_wrap(buffer, WRAP_WIDTH) {
        lines.push(Line::text(font, line));
    }
    buffer.clear();
}

/// Greedy word wrap; words longer than `width` are split
fn word_wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        for piece in hard_wrap(word, width) {
            let piece_len = piece.chars().count();
            if current_len > 0 && current_len + 1 + piece_len > width {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Split into chunks of at most `width` characters, keeping one empty chunk
/// for an empty input so blank code lines survive
fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Positioned text on one page
#[derive(Debug, Clone, PartialEq)]
struct Placed {
    font: Font,
    y: f32,
    text: String,
}

fn paginate(lines: &[Line]) -> Vec<Vec<Placed>> {
    let top = PAGE_HEIGHT - MARGIN;
    let mut pages = vec![Vec::new()];
    let mut y = top;

    for line in lines {
        if y < MARGIN {
            pages.push(Vec::new());
            y = top;
        }
        if let Some(text) = &line.text {
            if let Some(page) = pages.last_mut() {
                page.push(Placed {
                    font: line.font,
                    y,
                    text: text.clone(),
                });
            }
        }
        y -= LEADING;
    }
    pages
}

/// PDF string literal body: Latin-1 bytes with `\`, `(` and `)` escaped
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = ch as u32;
        let byte = match ch {
            '\t' => b' ',
            _ if code < 0x20 || code == 0x7f => b' ',
            _ if (0x80..0xa0).contains(&code) || code > 0xff => b'?',
            _ => code as u8,
        };
        if matches!(byte, b'\\' | b'(' | b')') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out
}

fn content_stream(page: &[Placed]) -> Result<Vec<u8>, ReportError> {
    let mut stream = Vec::new();
    for placed in page {
        write!(
            stream,
            "BT /{} {} Tf {} {} Td (",
            placed.font.resource(),
            placed.font.size(),
            MARGIN,
            placed.y
        )?;
        stream.extend_from_slice(&encode_text(&placed.text));
        stream.extend_from_slice(b") Tj ET\n");
    }
    Ok(stream)
}

/// Serialize the object graph with a cross-reference table.
///
/// Object layout: 1 catalog, 2 page tree, 3..=5 fonts, then a
/// (page, content stream) pair per page.
fn write_document(pages: &[Vec<Placed>]) -> Result<Vec<u8>, ReportError> {
    let first_page_obj = 3 + FONTS.len();
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| first_page_obj + 2 * i).collect();
    let total_objects = first_page_obj - 1 + 2 * pages.len();

    let mut out: Vec<u8> = Vec::new();
    let mut offsets = vec![0usize; total_objects + 1];

    out.extend_from_slice(b"%PDF-1.4\n");

    offsets[1] = out.len();
    write!(out, "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n")?;

    offsets[2] = out.len();
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
    write!(
        out,
        "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
        kids.join(" "),
        pages.len()
    )?;

    for (i, (_, base_font)) in FONTS.iter().enumerate() {
        let id = 3 + i;
        offsets[id] = out.len();
        write!(
            out,
            "{} 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>\nendobj\n",
            id, base_font
        )?;
    }

    let font_resources: Vec<String> = FONTS
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("/{} {} 0 R", name, 3 + i))
        .collect();
    let font_resources = font_resources.join(" ");

    for (page, &page_id) in pages.iter().zip(&page_ids) {
        let content_id = page_id + 1;

        offsets[page_id] = out.len();
        write!(
            out,
            "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << {} >> >> /Contents {} 0 R >>\nendobj\n",
            page_id, PAGE_WIDTH, PAGE_HEIGHT, font_resources, content_id
        )?;

        let stream = content_stream(page)?;
        offsets[content_id] = out.len();
        write!(out, "{} 0 obj\n<< /Length {} >>\nstream\n", content_id, stream.len())?;
        out.extend_from_slice(&stream);
        write!(out, "endstream\nendobj\n")?;
    }

    let xref_offset = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", total_objects + 1)?;
    for offset in &offsets[1..] {
        write!(out, "{:010} 00000 n \n", offset)?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        total_objects + 1,
        xref_offset
    )?;

    if offsets[1..].iter().any(|&o| o == 0) {
        return Err(ReportError::Pdf("object table is incomplete".to_string()));
    }
    Ok(out)
}
