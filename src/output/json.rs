use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// Pretty-print any serializable value as JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    write_json(&mut std::io::stdout().lock(), value)
}

/// Pretty-print to any writer, newline-terminated.
pub fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_pretty_json_with_trailing_newline() {
        let mut buf = Vec::new();
        write_json(&mut buf, &serde_json::json!({ "total": 2 })).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\n  \"total\": 2\n}\n");
    }
}
