// Directory listing format, close to `ls -l`
use chrono::{DateTime, Local};
use std::fs::Metadata;

/// One listing line for `name`.
///
/// ```text
/// -rw-r--r--   1 ftp      ftp              2134 Jan 01 00:00 file1.txt
/// ```
pub fn format_entry(name: &str, metadata: &Metadata) -> String {
    let (perms, size) = if metadata.is_dir() {
        ("drwxr-xr-x", 0)
    } else if metadata.file_type().is_symlink() {
        ("lrwxrwxrwx", metadata.len())
    } else {
        ("-rw-r--r--", metadata.len())
    };

    let modified: DateTime<Local> = metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Local::now());

    format!(
        "{} {:>3} {:<8} {:<8} {:>12} {} {}",
        perms,
        1,
        "ftp",
        "ftp",
        size,
        modified.format("%b %d %H:%M"),
        name
    )
}

/// Joins listing lines with CRLF, terminating the last one too.
pub fn join_lines(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}
