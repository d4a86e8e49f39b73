use crate::error::FormatError;
use crate::types::{RowValues, TIMESTAMP_FORMAT};

use super::{Segment, StatementTemplate, TemplateFormatter, ValueKind};

/// Default formatter: renders each parameter as an inline SQL literal.
///
/// Text-like values are quoted after passing through the connection's escape function,
/// blobs become `X'..'` hex literals, booleans become `1`/`0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralFormatter;

impl TemplateFormatter for LiteralFormatter {
    fn format(
        &self,
        template: &StatementTemplate,
        params: &[RowValues],
        escape: &dyn Fn(&str) -> String,
    ) -> Result<String, FormatError> {
        let mut used = vec![false; params.len()];
        let mut out = String::with_capacity(template.source().len() + params.len() * 8);

        for segment in template.segments() {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { index, kind } => {
                    let value = params.get(*index).ok_or(FormatError::MissingParameter {
                        index: *index,
                        available: params.len(),
                    })?;
                    used[*index] = true;
                    if let Some(kind) = kind {
                        check_kind(*index, *kind, value)?;
                    }
                    write_literal(&mut out, *index, value, escape)?;
                }
            }
        }

        if let Some(index) = used.iter().position(|u| !u) {
            return Err(FormatError::UnusedParameter { index });
        }
        Ok(out)
    }
}

fn check_kind(index: usize, expected: ValueKind, value: &RowValues) -> Result<(), FormatError> {
    let ok = match (expected, value) {
        (_, RowValues::Null)
        | (ValueKind::Int, RowValues::Int(_) | RowValues::Bool(_))
        | (ValueKind::Float, RowValues::Float(_) | RowValues::Int(_))
        | (ValueKind::Text, RowValues::Text(_))
        | (ValueKind::Blob, RowValues::Blob(_))
        | (ValueKind::Timestamp, RowValues::Timestamp(_))
        | (ValueKind::Json, RowValues::JSON(_)) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(FormatError::KindMismatch {
            index,
            expected,
            found: value.type_name(),
        })
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

fn write_quoted(out: &mut String, raw: &str, escape: &dyn Fn(&str) -> String) {
    out.push('\'');
    out.push_str(&escape(raw));
    out.push('\'');
}

fn write_literal(
    out: &mut String,
    index: usize,
    value: &RowValues,
    escape: &dyn Fn(&str) -> String,
) -> Result<(), FormatError> {
    match value {
        RowValues::Int(i) => out.push_str(&i.to_string()),
        RowValues::Float(f) => {
            if !f.is_finite() {
                return Err(FormatError::NonFiniteFloat { index });
            }
            out.push_str(&f.to_string());
        }
        RowValues::Bool(b) => out.push(if *b { '1' } else { '0' }),
        RowValues::Null => out.push_str("NULL"),
        RowValues::Text(s) => write_quoted(out, s, escape),
        RowValues::Timestamp(dt) => {
            write_quoted(out, &dt.format(TIMESTAMP_FORMAT).to_string(), escape);
        }
        RowValues::JSON(json) => write_quoted(out, &json.to_string(), escape),
        RowValues::Blob(bytes) => {
            out.push_str("X'");
            for byte in bytes {
                out.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
                out.push(char::from(HEX_DIGITS[usize::from(byte & 0x0F)]));
            }
            out.push('\'');
        }
    }
    Ok(())
}
