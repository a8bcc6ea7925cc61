//! Text table rendering for `Logger::table`

use serde_json::Value;

/// Render rows of JSON objects as an aligned text table.
///
/// Columns default to the union of row keys in first-seen order.
/// Non-object rows contribute nothing; missing cells render empty.
pub fn render_table(rows: &[Value], columns: Option<&[&str]>) -> String {
    let cols: Vec<String> = match columns {
        Some(c) => c.iter().map(|s| s.to_string()).collect(),
        None => {
            let mut seen: Vec<String> = Vec::new();
            for row in rows {
                if let Value::Object(map) = row {
                    for key in map.keys() {
                        if !seen.iter().any(|k| k == key) {
                            seen.push(key.clone());
                        }
                    }
                }
            }
            seen
        }
    };
    if cols.is_empty() {
        return String::new();
    }

    let cell = |row: &Value, col: &str| -> String {
        match row.get(col) {
            Some(Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
            None => String::new(),
        }
    };

    let mut widths: Vec<usize> = cols.iter().map(|c| c.len()).collect();
    for row in rows {
        for (i, col) in cols.iter().enumerate() {
            widths[i] = widths[i].max(cell(row, col).len());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = cols
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{c:<w$}"))
        .collect();
    out.push_str(&header.join(" | "));
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));

    for row in rows {
        out.push('\n');
        let line: Vec<String> = cols
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", cell(row, c)))
            .collect();
        out.push_str(&line.join(" | "));
    }
    out
}
