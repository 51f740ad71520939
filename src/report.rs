//! Console and JSON rendering of scan results.

use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::{CommentKind, ScanResult};

const RULE_WIDTH: usize = 80;

/// Scan result for one file, ready to be printed.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: ScanResult,
}

impl FileReport {
    pub fn new(path: &Path, result: ScanResult) -> Self {
        FileReport {
            path: path.to_path_buf(),
            result,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Escape control characters so that a block record stays on one line.
pub fn escape_content(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn format_file_report(report: &FileReport) -> String {
    let result = &report.result;
    let mut output = String::new();
    let _ = writeln!(output, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(output, "文件名：{}", report.file_name());
    let _ = writeln!(output, "注释信息：");
    let _ = writeln!(output, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(output, "行号\t注释内容");
    for record in &result.records {
        let _ = writeln!(
            output,
            "{}\t{}",
            record.line_number,
            escape_content(&record.content)
        );
    }
    let _ = writeln!(output, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(
        output,
        "注释行数：\t{}\t总行数：\t{}\t注释占比：\t{}%",
        result.comment_line_count,
        result.total_line_count,
        result.line_ratio()
    );
    let _ = writeln!(
        output,
        "注释字母数：\t{}\t总字母数：\t{}\t注释字母占比：\t{}%",
        result.comment_char_count,
        result.total_char_count,
        result.char_ratio()
    );
    output
}

pub fn closing_rule() -> String {
    format!("{}\n", "=".repeat(RULE_WIDTH))
}

#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    #[serde(rename = "行号")]
    line_number: usize,
    #[serde(rename = "内容")]
    content: &'a str,
    #[serde(rename = "类型")]
    kind: &'static str,
}

fn kind_label(kind: CommentKind) -> &'static str {
    match kind {
        CommentKind::Hash => "单行注释",
        CommentKind::Block => "多行注释",
    }
}

#[derive(Debug, Serialize)]
struct JsonFileReport<'a> {
    #[serde(rename = "文件名")]
    path: String,
    #[serde(rename = "注释信息")]
    records: Vec<JsonRecord<'a>>,
    #[serde(rename = "注释行数")]
    comment_line_count: usize,
    #[serde(rename = "总行数")]
    total_line_count: usize,
    #[serde(rename = "注释占比")]
    line_ratio: u64,
    #[serde(rename = "注释字母数")]
    comment_char_count: usize,
    #[serde(rename = "总字母数")]
    total_char_count: usize,
    #[serde(rename = "注释字母占比")]
    char_ratio: u64,
}

impl<'a> From<&'a FileReport> for JsonFileReport<'a> {
    fn from(report: &'a FileReport) -> Self {
        let result = &report.result;
        JsonFileReport {
            path: report.path.to_string_lossy().into_owned(),
            records: result
                .records
                .iter()
                .map(|record| JsonRecord {
                    line_number: record.line_number,
                    content: &record.content,
                    kind: kind_label(record.kind),
                })
                .collect(),
            comment_line_count: result.comment_line_count,
            total_line_count: result.total_line_count,
            line_ratio: result.line_ratio(),
            comment_char_count: result.comment_char_count,
            total_char_count: result.total_char_count,
            char_ratio: result.char_ratio(),
        }
    }
}

pub fn render_json(reports: &[FileReport]) -> serde_json::Result<String> {
    let entries: Vec<JsonFileReport<'_>> = reports.iter().map(JsonFileReport::from).collect();
    serde_json::to_string_pretty(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    #[test]
    fn test_escape_content_keeps_block_on_one_line() {
        assert_eq!(escape_content("\nline\tone\r\n"), "\\nline\\tone\\r\\n");
        assert_eq!(escape_content("C:\\path"), "C:\\\\path");
        assert_eq!(escape_content("中文注释"), "中文注释");
    }

    #[test]
    fn test_format_file_report_layout() {
        let report = FileReport::new(
            Path::new("pkg/example2.py"),
            scan("value = 1234567890123456789\n# 0123456789abcdef"),
        );
        let text = format_file_report(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(80));
        assert_eq!(lines[1], "文件名：example2.py");
        assert_eq!(lines[2], "注释信息：");
        assert_eq!(lines[3], "-".repeat(80));
        assert_eq!(lines[4], "行号\t注释内容");
        assert_eq!(lines[5], "2\t 0123456789abcdef");
        assert_eq!(lines[6], "-".repeat(80));
        assert_eq!(lines[7], "注释行数：\t1\t总行数：\t2\t注释占比：\t50%");
        assert_eq!(lines[8], "注释字母数：\t17\t总字母数：\t45\t注释字母占比：\t38%");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn test_block_records_print_escaped() {
        let report = FileReport::new(Path::new("doc.py"), scan("'''\nabout\n'''\n"));
        let text = format_file_report(&report);
        assert!(text.contains("1\t\\nabout\\n\n"), "{text}");
        assert!(text.contains("3\t\\nabout\\n\n"), "{text}");
    }

    #[test]
    fn test_render_json_uses_report_labels() {
        let reports = vec![FileReport::new(Path::new("a.py"), scan("x = 1  # one\n"))];
        let json = render_json(&reports).expect("json renders");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        let first = &value[0];
        assert_eq!(first["文件名"], "a.py");
        assert_eq!(first["注释行数"], 1);
        assert_eq!(first["总行数"], 1);
        assert_eq!(first["注释占比"], 100);
        assert_eq!(first["注释信息"][0]["行号"], 1);
        assert_eq!(first["注释信息"][0]["内容"], " one");
        assert_eq!(first["注释信息"][0]["类型"], "单行注释");
    }
}
