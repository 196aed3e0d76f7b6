//! Minimal HTML rendering for a parsed dump: an `index.html` summary and
//! one `file<N>.html` per covered source file.

use std::fmt::Write as _;

/// Escape text for safe inclusion in HTML markup.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn percent(hit: u32, possible: u32) -> f64 {
    if possible == 0 {
        100.0
    } else {
        100.0 * hit as f64 / possible as f64
    }
}

fn file_totals(file: &dump::FileReport) -> (u32, u32) {
    file.lines
        .iter()
        .fold((0u32, 0u32), |(hit, possible), l| (hit + l.hit, possible + l.possible))
}

/// Render the summary `index.html` listing every covered file and its
/// coverage percentage, each linking to its own `file<N>.html`.
pub fn render_index(report: &dump::Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html><head><title>Coverage - {}</title></head>", escape_html(&report.command));
    let _ = writeln!(out, "<body>");
    let _ = writeln!(out, "<h1>Coverage summary</h1>");
    let _ = writeln!(
        out,
        "<p>{} {}</p>",
        escape_html(&report.command),
        escape_html(&report.args.join(" "))
    );
    let _ = writeln!(out, "<table border=\"1\">");
    let _ = writeln!(out, "<tr><th>File</th><th>Lines hit</th><th>Lines possible</th><th>%</th></tr>");

    for (index, file) in report.files.iter().enumerate() {
        let (hit, possible) = file_totals(file);
        let _ = writeln!(
            out,
            "<tr><td><a href=\"file{index}.html\">{}</a></td><td>{hit}</td><td>{possible}</td><td>{:.1}</td></tr>",
            escape_html(&file.path),
            percent(hit, possible)
        );
    }

    let _ = writeln!(out, "</table>");
    let _ = writeln!(out, "</body></html>");
    out
}

/// Render one file's per-line coverage table.
pub fn render_file(file: &dump::FileReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html><head><title>{}</title></head>", escape_html(&file.path));
    let _ = writeln!(out, "<body>");
    let _ = writeln!(out, "<h1>{}</h1>", escape_html(&file.path));
    let _ = writeln!(out, "<table border=\"1\">");
    let _ = writeln!(out, "<tr><th>Line</th><th>Hit</th><th>Possible</th></tr>");

    for line in &file.lines {
        let class = if line.is_fully_covered() {
            "covered"
        } else if line.is_covered() {
            "partial"
        } else {
            "uncovered"
        };
        let _ = writeln!(
            out,
            "<tr class=\"{class}\"><td>{}</td><td>{}</td><td>{}</td></tr>",
            line.line, line.hit, line.possible
        );
    }

    let _ = writeln!(out, "</table>");
    let _ = writeln!(out, "</body></html>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_the_five_html_metacharacters_it_knows_about() {
        assert_eq!(escape_html("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn index_lists_every_file_with_a_link() {
        let report = dump::Report {
            command: "prog".to_string(),
            args: vec![],
            date: "".to_string(),
            files: vec![dump::FileReport {
                path: "a.c".to_string(),
                lines: vec![dump::LineReport {
                    line: 1,
                    possible: 2,
                    hit: 1,
                }],
            }],
        };

        let html = render_index(&report);
        assert!(html.contains("file0.html"));
        assert!(html.contains("a.c"));
    }
}
