//! Recipient list parsing for CSV / pasted text input.
//!
//! One `address,amount` pair per line. Separators may be a comma,
//! semicolon, tab or plain whitespace. Blank lines, `#` comments and a
//! header row are ignored. A malformed row is skipped with a warning and
//! reported back to the caller; it never fails the whole batch.

use tracing::{debug, warn};

use crate::{Address, Recipient, TokenAmount};

/// A row that was dropped while parsing a recipient list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the input
    pub line: usize,
    /// The raw line content
    pub content: String,
    /// Why it was skipped
    pub reason: String,
}

/// Result of parsing a recipient list
#[derive(Debug, Clone, Default)]
pub struct ParsedRecipients {
    /// Well-formed recipients, in input order
    pub recipients: Vec<Recipient>,
    /// Rows that were dropped
    pub skipped: Vec<SkippedRow>,
}

/// Parse raw recipient list text.
///
/// Duplicate addresses are kept here; rejecting them is the tree
/// builder's job so the caller sees one consistent construction error.
pub fn parse_recipient_list(text: &str) -> ParsedRecipients {
    let mut parsed = ParsedRecipients::default();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .map(|f| f.trim().trim_matches('"'))
            .filter(|f| !f.is_empty())
            .collect();

        if parsed.recipients.is_empty() && parsed.skipped.is_empty() && is_header(&fields) {
            debug!("Skipping header row: {}", line);
            continue;
        }

        match parse_row(&fields) {
            Ok(recipient) => parsed.recipients.push(recipient),
            Err(reason) => {
                warn!("Skipping recipient row {}: {} ({})", line_no, line, reason);
                parsed.skipped.push(SkippedRow {
                    line: line_no,
                    content: line.to_string(),
                    reason,
                });
            }
        }
    }

    parsed
}

fn is_header(fields: &[&str]) -> bool {
    fields.first()
        .map(|f| f.eq_ignore_ascii_case("address") || f.eq_ignore_ascii_case("recipient"))
        .unwrap_or(false)
}

fn parse_row(fields: &[&str]) -> Result<Recipient, String> {
    if fields.len() != 2 {
        return Err(format!("expected 2 fields, got {}", fields.len()));
    }

    let address: Address = fields[0].parse().map_err(|e| format!("{}", e))?;
    if address.is_zero() {
        return Err("zero address not allowed".to_string());
    }

    let amount_str = fields[1];
    if amount_str.contains(['e', 'E']) {
        return Err(format!("scientific notation amount: {}", amount_str));
    }
    let amount = TokenAmount::from_dec_str(amount_str).map_err(|e| format!("{}", e))?;

    Ok(Recipient { address, amount })
}
