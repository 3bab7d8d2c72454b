// Extraction of the hosted link from the upload response body.
//
// Only `data.link` matters. A body that is valid JSON but shaped differently
// is not an error here, it simply has no link; the caller decides what that
// means for the upload.

use crate::error::ParseError;
use serde_json::Value;

/// Longest slice of the body echoed back in a parse diagnostic.
const FRAGMENT_LEN: usize = 40;

/// Parse `body` and return the string at `data.link`, if any.
///
/// Returns `Err` only when the body is not valid JSON. Missing fields, a
/// non-object `data` or a non-string `link` all give `Ok(None)`.
pub fn extract_link(body: &[u8]) -> Result<Option<String>, ParseError> {
    let json: Value = serde_json::from_slice(body).map_err(|e| parse_error(body, &e))?;

    let link = json
        .get("data")
        .and_then(|data| data.get("link"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(link)
}

fn parse_error(body: &[u8], err: &serde_json::Error) -> ParseError {
    let offset = byte_offset(body, err.line(), err.column());
    let rest = &body[offset..];
    let fragment: String = String::from_utf8_lossy(rest)
        .chars()
        .take(FRAGMENT_LEN)
        .collect();

    ParseError {
        line: err.line(),
        column: err.column(),
        message: err.to_string(),
        fragment,
    }
}

/// Convert serde_json's 1-based line / column pair into a byte offset,
/// clamped to the body length.
fn byte_offset(body: &[u8], line: usize, column: usize) -> usize {
    let mut start = 0;
    for _ in 1..line {
        match body[start..].iter().position(|b| *b == b'\n') {
            Some(pos) => start += pos + 1,
            None => return body.len(),
        }
    }
    (start + column.saturating_sub(1)).min(body.len())
}
