//! Legacy Amino JSON sign documents.
//!
//! The chain re-derives the `StdSignDoc` from the protobuf transaction and compares signatures
//! against its own serialization, so the output here has to match Go's `encoding/json` plus
//! `sdk.MustSortJSON` exactly: object keys sorted at every depth, no insignificant whitespace, and
//! `<`, `>`, `&`, U+2028, U+2029 escaped.

use super::{Coin, Fee};
use serde_json::{json, Map, Value};
use std::fmt::Write;

/// `{"amount": "...", "denom": "..."}`.
#[must_use]
pub fn coin_json(coin: &Coin) -> Value {
    json!({ "amount": coin.amount, "denom": coin.denom })
}

/// `StdFee` as it appears in the sign doc.
#[must_use]
pub fn fee_json(fee: &Fee) -> Value {
    json!({
        "amount": [coin_json(&fee.amount)],
        "gas": fee.gas_limit.to_string(),
    })
}

/// Builds the `StdSignDoc` value. `msgs` are the per-message `{"type", "value"}` objects in
/// transaction order.
#[must_use]
pub fn std_sign_doc(
    chain_id: &str,
    account_number: u64,
    sequence: u64,
    fee: &Fee,
    memo: &str,
    msgs: Vec<Value>,
) -> Value {
    json!({
        "account_number": account_number.to_string(),
        "chain_id": chain_id,
        "fee": fee_json(fee),
        "memo": memo,
        "msgs": msgs,
        "sequence": sequence.to_string(),
    })
}

/// Inserts a string field unless empty, mirroring `omitempty` on the Amino message structs.
pub(crate) fn insert_str(map: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.is_empty() {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Inserts a `uint64` field (string-encoded in Amino JSON) unless zero.
pub(crate) fn insert_u64(map: &mut Map<String, Value>, key: &str, value: u64) {
    if value != 0 {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Inserts an `int64` field (string-encoded in Amino JSON) unless zero.
pub(crate) fn insert_i64(map: &mut Map<String, Value>, key: &str, value: i64) {
    if value != 0 {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Serializes `value` in canonical form: sorted keys, compact, Go-compatible escaping.
#[must_use]
pub fn to_canonical_json(value: &Value) -> String {
    let mut out = String::with_capacity(256);
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' | '>' | '&' | '\u{2028}' | '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
