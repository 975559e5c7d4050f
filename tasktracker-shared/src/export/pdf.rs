/// Single-page PDF summary
///
/// Writes a minimal PDF 1.4 file by hand: catalog, page tree, one page,
/// the built-in Helvetica font and one text content stream. Only ASCII is
/// rendered; other characters print as `?`.

use std::fmt::Write as _;

use crate::models::{
    report::{SummaryStats, Window},
    task::TaskStatus,
};

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN: u32 = 72;
const LINE_HEIGHT: u32 = 22;

/// Renders the summary counts as a one-page PDF
///
/// `window` is `None` for an all-time summary.
pub fn to_pdf_summary(window: Option<Window>, stats: &SummaryStats) -> Vec<u8> {
    let period = match window {
        Some(w) => format!("Period: {} to {}", w.start(), w.end()),
        None => "Period: all tasks".to_string(),
    };

    let mut lines: Vec<(u32, String)> = vec![(18, "Task Summary Report".to_string()), (11, period)];
    lines.push((11, String::new()));
    lines.extend(
        [
            ("Total tasks", stats.total),
            (TaskStatus::ToDo.label(), stats.to_do),
            (TaskStatus::InProgress.label(), stats.in_progress),
            (TaskStatus::Done.label(), stats.done),
            ("Overdue", stats.overdue),
            ("Completed in period", stats.completed_in_window),
        ]
        .into_iter()
        .map(|(label, value)| (12, format!("{}: {}", label, value))),
    );

    let content = content_stream(&lines);

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>",
            PAGE_WIDTH, PAGE_HEIGHT
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, body);
    }

    let xref_at = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    );

    out.into_bytes()
}

fn content_stream(lines: &[(u32, String)]) -> String {
    let mut stream = String::from("BT\n");
    let _ = writeln!(stream, "{} {} Td", MARGIN, PAGE_HEIGHT - MARGIN);
    for (i, (size, text)) in lines.iter().enumerate() {
        if i > 0 {
            let _ = writeln!(stream, "0 -{} Td", LINE_HEIGHT);
        }
        let _ = writeln!(stream, "/F1 {} Tf", size);
        let _ = writeln!(stream, "({}) Tj", escape(text));
    }
    stream.push_str("ET");
    stream
}

/// Escapes a PDF literal string
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}
