use serde_json::Value;

const MAX_COL_WIDTH: usize = 60;

/// Print a backend response: list responses as an ASCII table, anything else as pretty JSON.
pub fn print_response(val: &Value) {
    if std::env::var("PORTAL_OUTPUT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false) {
        println!("{}", serde_json::to_string_pretty(val).unwrap_or_else(|_| val.to_string()));
        return;
    }
    match render_table(val) {
        Some(table) => println!("{}", table),
        None => println!("{}", serde_json::to_string_pretty(val).unwrap_or_else(|_| val.to_string())),
    }
}

/// Render an array (bare or under `data`) as a table. `None` when the shape isn't tabular
/// or the list is empty.
pub fn render_table(val: &Value) -> Option<String> {
    let rows = match val {
        Value::Array(arr) => arr,
        Value::Object(map) => map.get("data")?.as_array()?,
        _ => return None,
    };
    if rows.is_empty() {
        return None;
    }

    // Objects: union of keys, sorted. Scalars: single "value" column.
    let mut cols: Vec<String> = Vec::new();
    let all_objects = rows.iter().all(Value::is_object);
    if all_objects {
        for r in rows {
            if let Value::Object(map) = r {
                for k in map.keys() {
                    if !cols.contains(k) {
                        cols.push(k.clone());
                    }
                }
            }
        }
        cols.sort();
    } else {
        cols.push("value".to_string());
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| match r {
            Value::Object(map) if all_objects => cols.iter().map(|c| to_cell_string(map.get(c).unwrap_or(&Value::Null))).collect(),
            other => vec![to_cell_string(other)],
        })
        .collect();

    let mut widths: Vec<usize> = cols.iter().map(|c| c.chars().count().min(MAX_COL_WIDTH)).collect();
    for r in &cells {
        for (i, cell) in r.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count().min(MAX_COL_WIDTH));
        }
    }

    let sep = build_separator(&widths);
    let mut out = vec![sep.clone(), build_row(&cols, &widths), sep.clone()];
    out.extend(cells.iter().map(|r| build_row(r, &widths)));
    out.push(sep);
    out.push(format!("rows: {}, cols: {}", cells.len(), cols.len()));
    Some(out.join("\n"))
}

fn to_cell_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let text = truncate(cells.get(i).map(String::as_str).unwrap_or(""), *w);
        let pad = " ".repeat(w.saturating_sub(text.chars().count()));
        if is_numeric_like(&text) {
            s.push_str(&format!(" {}{} |", pad, text));
        } else {
            s.push_str(&format!(" {}{} |", text, pad));
        }
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 1 {
        return "…".to_string();
    }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    !st.is_empty() && st.chars().any(|c| c.is_ascii_digit()) && st.chars().all(|c| c.is_ascii_digit() || ".-+eE,_".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_object_rows_with_sorted_columns() {
        let t = render_table(&json!([{"nombre": "Ñuñoa", "id": 1}, {"id": 22, "region": "RM"}])).unwrap();
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[1], "| id | nombre | region |");
        assert_eq!(lines[3], "|  1 | Ñuñoa  |        |");
        assert_eq!(lines[4], "| 22 |        | RM     |");
        assert_eq!(*lines.last().unwrap(), "rows: 2, cols: 3");
    }

    #[test]
    fn envelope_and_non_tabular() {
        assert!(render_table(&json!({"data": [1, 2]})).unwrap().contains("| value |"));
        assert!(render_table(&json!({"id": 1})).is_none());
        assert!(render_table(&json!([])).is_none());
    }
}
