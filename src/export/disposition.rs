//! `content-disposition` filename handling.

use crate::config::{ACCEPTED_EXTENSION, DOWNLOAD_PREFIX};

/// Extract the `filename` parameter from a `content-disposition` value.
///
/// Quoted values run to the closing quote (backslash escapes honoured);
/// bare values run to the next `;`. `filename*` is not consulted. Blank
/// names count as absent.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    for param in split_params(header) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("filename") {
            continue;
        }
        let value = value.trim();
        let name = match value.strip_prefix('"') {
            Some(quoted) => unquote(quoted),
            None => value.to_string(),
        };
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    None
}

/// The download name: the server's suggestion, else `modified-<sheet>.xlsx`.
pub fn resolve_download_name(header: Option<&str>, sheet: &str) -> String {
    header
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| format!("{DOWNLOAD_PREFIX}{sheet}{ACCEPTED_EXTENSION}"))
}

/// Split on `;` outside of quoted strings.
fn split_params(header: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, ch) in header.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(header.get(start..idx).unwrap_or_default());
                start = idx + 1;
            }
            _ => {}
        }
    }
    params.push(header.get(start..).unwrap_or_default());
    params
}

/// Read a quoted-string body (opening quote already stripped).
fn unquote(quoted: &str) -> String {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => break,
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(r#"attachment; filename="report.xlsx""#, Some("report.xlsx") ; "quoted")]
    #[test_case("attachment; filename=report.xlsx", Some("report.xlsx") ; "bare")]
    #[test_case("attachment; FILENAME = report.xlsx ; size=10", Some("report.xlsx") ; "case and spaces")]
    #[test_case(r#"attachment; filename="a;b.xlsx""#, Some("a;b.xlsx") ; "semicolon inside quotes")]
    #[test_case(r#"attachment; filename="say \"hi\".xlsx""#, Some(r#"say "hi".xlsx"#) ; "escaped quotes")]
    #[test_case("attachment; filename*=UTF-8''r%C3%A9.xlsx", None ; "extended form ignored")]
    #[test_case(r#"attachment; filename="""#, None ; "empty")]
    #[test_case("inline", None ; "no parameter")]
    fn extracts_filename(header: &str, expected: Option<&str>) {
        assert_eq!(filename_from_disposition(header).as_deref(), expected);
    }

    #[test]
    fn falls_back_to_sheet_name() {
        assert_eq!(resolve_download_name(None, "Q1"), "modified-Q1.xlsx");
        assert_eq!(resolve_download_name(Some("attachment"), "Q1"), "modified-Q1.xlsx");
        assert_eq!(
            resolve_download_name(Some(r#"attachment; filename="out.xlsx""#), "Q1"),
            "out.xlsx"
        );
    }
}
