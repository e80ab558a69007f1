use docstream_core::{highlight, AnalyticsReport, DocumentSummary, ProgressSnapshot};

const MARK_START: &str = "\x1b[7m";
const MARK_END: &str = "\x1b[0m";

pub fn progress_line(snapshot: &ProgressSnapshot) -> String {
    format!(
        "[{}] {}/{} ({:.1}%) {} - {}",
        snapshot.stage().label(),
        snapshot.current,
        snapshot.total,
        snapshot.percentage(),
        snapshot.filename,
        snapshot.message
    )
}

/// Wraps every case-insensitive occurrence of `term` in reverse video.
pub fn highlighted(text: &str, term: &str) -> String {
    highlight(text, term)
        .into_iter()
        .map(|segment| {
            if segment.matched {
                format!("{MARK_START}{}{MARK_END}", segment.text)
            } else {
                segment.text
            }
        })
        .collect()
}

pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

pub fn document_row(doc: &DocumentSummary) -> String {
    format!(
        "[{}] {} words={} preview={}",
        doc.id,
        doc.filename,
        doc.word_count,
        preview(&doc.original_text_preview, 80)
    )
}

pub fn report_lines(report: &AnalyticsReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "words={} unique={} characters={} (no spaces {}) paragraphs={}",
            report.original_word_count,
            report.unique_original_words,
            report.char_count,
            report.char_count_no_spaces,
            report.paragraph_count
        ),
        format!(
            "processed_words={} unique={} tokens={} unique_tokens={}",
            report.processed_word_count,
            report.unique_processed_words,
            report.token_count,
            report.unique_tokens
        ),
        format!(
            "reduction={:.1}% avg_token_length={:.1}",
            report.reduction_percentage, report.avg_word_length
        ),
    ];

    if !report.top_tokens.is_empty() {
        let top = report
            .top_tokens
            .iter()
            .map(|entry| format!("{}({})", entry.token, entry.count))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("top_tokens: {top}"));
    }

    lines
}
