use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Reads a rank. Anything that is not a positive number leaves the candidate unranked.
pub fn parse_rank(s: &str) -> i32 {
    match s.trim().parse::<i32>() {
        Ok(r) if r > 0 => r,
        _ => 0,
    }
}

/// Reads an optional time in nanoseconds. An empty cell is None.
pub fn parse_time(s: &str) -> Option<Option<i64>> {
    let s = s.trim();
    if s.is_empty() {
        return Some(None);
    }
    s.parse::<i64>().ok().map(Some)
}
