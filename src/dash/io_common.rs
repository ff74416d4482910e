use std::collections::HashMap;
use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The provider matching the extension of a file. Excel is the default.
pub fn infer_provider(path: &str) -> String {
    match Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("csv") => "csv".to_string(),
        _ => "xlsx".to_string(),
    }
}

/// Trims a text cell. Blank cells are missing values.
pub fn normalize_cell(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Numbers are compared as text: whole numbers lose their fractional part.
pub fn render_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// Names for every column of a header.
///
/// Unnamed columns get a positional name, and repeated names get a `.1`, `.2`, ... suffix so
/// that every column can be addressed by name.
pub fn make_header(cells: &[Option<String>]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut header: Vec<String> = Vec::new();
    for (idx, c) in cells.iter().enumerate() {
        let base = c.clone().unwrap_or_else(|| format!("Unnamed: {}", idx));
        let mut name = base.clone();
        while seen.contains_key(&name) {
            let n = seen.entry(base.clone()).or_insert(0);
            *n += 1;
            name = format!("{}.{}", base, n);
        }
        seen.insert(name.clone(), 0);
        header.push(name);
    }
    header
}
