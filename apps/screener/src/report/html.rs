//! Standalone HTML evaluation report.

use html_escape::encode_text;

use crate::report::{classify_feedback, metadata_rows, FeedbackLine, ScreeningReport};

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; font-size: 16px; padding: 30px; color: #333; }
    h1 { color: #003366; font-size: 22px; border-bottom: 2px solid #003366; padding-bottom: 6px; }
    h2 { color: #004488; font-size: 18px; margin-top: 1em; }
    .section { margin-top: 20px; }
    .score { font-weight: bold; font-size: 18px; color: #0066cc; margin-top: 1em; }
    .metadata { background-color: #f1f5f9; padding: 10px; border-radius: 8px; margin-bottom: 20px; }
    .metadata p { margin: 4px 0; }
"#;

pub fn render_html(report: &ScreeningReport) -> String {
    let metadata = metadata_rows(report)
        .iter()
        .map(|row| {
            format!(
                "<p><strong>{} {}:</strong> {}</p>",
                row.icon,
                row.label,
                encode_text(&row.value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Resume Evaluation Report</title>
    <style>{STYLE}</style>
</head>
<body>
    <h1>Resume Evaluation Report</h1>

    <div class="metadata">
        {metadata}
    </div>

    <div class="section">
{feedback}
    </div>
</body>
</html>
"#,
        feedback = format_feedback_as_html(&report.feedback)
    )
}

/// Converts feedback text to HTML: score line, section headings, paragraphs.
pub fn format_feedback_as_html(text: &str) -> String {
    classify_feedback(text)
        .into_iter()
        .map(|(kind, line)| {
            let escaped = encode_text(line);
            match kind {
                FeedbackLine::Score => format!(r#"<p class="score">{escaped}</p>"#),
                FeedbackLine::Heading => format!("<h2>{escaped}</h2>"),
                FeedbackLine::Body => format!("<p>{escaped}</p>"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn test_feedback_line_classification() {
        let html = format_feedback_as_html("**Score: 78/100**\n\nStrengths:\n- Clean layout\nAreas to Improve:");
        let lines: Vec<&str> = html.lines().collect();
        assert_eq!(lines[0], r#"<p class="score">**Score: 78/100**</p>"#);
        assert_eq!(lines[1], "<h2>Strengths:</h2>");
        assert_eq!(lines[2], "<p>- Clean layout</p>");
        assert_eq!(lines[3], "<h2>Areas to Improve:</h2>");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_feedback_is_escaped() {
        let html = format_feedback_as_html("Uses <script> & tags");
        assert_eq!(html, "<p>Uses &lt;script&gt; &amp; tags</p>");
    }

    #[test]
    fn test_report_metadata_block() {
        let html = render_html(&sample_report());
        assert!(html.contains("<strong>🎯 Target Role:</strong> Data Scientist"));
        assert!(html.contains("<strong>📊 ATS Match Score:</strong> 60/100"));
        assert!(html.contains("<strong>📌 Extracted JD Keywords:</strong> python, sql"));
        assert!(html.contains("Solid Python &lt;3"));
    }

    #[test]
    fn test_missing_jd_keywords_render_na() {
        let mut report = sample_report();
        report.jd_keywords.clear();
        assert!(render_html(&report).contains("<strong>📌 Extracted JD Keywords:</strong> N/A"));
    }
}
