//! Decoding of catalog response bodies with readable failure messages.

use anyhow::Result;

/// Deserialize `body`, reporting the serde path, the type mismatch and a
/// short excerpt around the failing column when it does not fit `T`.
pub fn decode_with_context<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let inner = err.inner();
        let (line, column) = (inner.line(), inner.column());
        let path = err.path().to_string();

        let msg = inner.to_string();
        let loc = format!(" at line {line} column {column}");
        let summary = describe_mismatch(msg.strip_suffix(&loc).unwrap_or(&msg));
        let excerpt = excerpt_around(body, line, column, 24);

        let mut out = String::new();
        if !path.is_empty() && path != "." {
            out.push_str(&format!("at '{path}': "));
        }
        out.push_str(&format!("{summary} (line {line} col {column})\n{excerpt}"));
        anyhow::anyhow!(out)
    })
}

/// Turn "invalid type: null, expected u64" into "expected u64, got null".
fn describe_mismatch(msg: &str) -> String {
    if let Some(rest) = msg.strip_prefix("invalid type: ")
        && let Some((actual, expected)) = rest.split_once(", expected ")
    {
        return format!("expected {}, got {actual}", expected.trim());
    }
    msg.to_string()
}

fn excerpt_around(body: &str, line: usize, column: usize, width: usize) -> String {
    let target: Vec<char> = body
        .lines()
        .nth(line.saturating_sub(1))
        .unwrap_or("")
        .chars()
        .collect();
    if target.is_empty() {
        return "(empty line)".to_string();
    }

    let idx = column.saturating_sub(1).min(target.len() - 1);
    let start = idx.saturating_sub(width / 2);
    let end = (idx + width / 2).min(target.len());
    let slice: String = target[start..end].iter().collect();
    let caret = " ".repeat(idx - start) + "^";

    format!("...{slice}...\n   {caret}")
}
