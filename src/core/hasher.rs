//! Canonical block encoding and digest
//!
//! The digest input is sorted-key JSON text with `", "` and `": "`
//! separators, ASCII-only strings (`\uXXXX` escapes) and shortest round-trip
//! floats that always carry a decimal point or exponent. Every node must
//! produce these bytes exactly, so the encoder is written out by hand.

use crate::core::{Block, Transaction};
use crate::utils::sha256_digest_parts;
use data_encoding::HEXLOWER;
use serde_json::{Number, Value};

/// Hex SHA-256 digest of the canonical encoding of `block`.
pub fn digest(block: &Block) -> String {
    HashTemplate::new(block).digest_with_proof(block.get_proof())
}

/// Canonical JSON text of `block`.
pub fn canonical_json(block: &Block) -> String {
    let template = HashTemplate::new(block);
    format!("{}{}{}", template.head, block.get_proof(), template.tail)
}

/// Canonical encoding split around the `proof` value.
///
/// `proof` sorts between `previous_hash` and `timestamp`, so everything before
/// and after it is fixed for a given candidate and only the number changes
/// between mining attempts.
pub struct HashTemplate {
    head: String,
    tail: String,
}

impl HashTemplate {
    pub fn new(block: &Block) -> HashTemplate {
        let mut head = String::from("{\"index\": ");
        head.push_str(&block.get_index().to_string());
        head.push_str(", \"previous_hash\": ");
        write_string(block.get_previous_hash(), &mut head);
        head.push_str(", \"proof\": ");

        let mut tail = String::from(", \"timestamp\": ");
        write_float(block.get_timestamp(), &mut tail);
        tail.push_str(", \"transactions\": [");
        for (i, transaction) in block.get_transactions().iter().enumerate() {
            if i > 0 {
                tail.push_str(", ");
            }
            write_transaction(transaction, &mut tail);
        }
        tail.push_str("]}");

        HashTemplate { head, tail }
    }

    pub fn digest_with_proof(&self, proof: u64) -> String {
        let proof = proof.to_string();
        let hash = sha256_digest_parts(&[
            self.head.as_bytes(),
            proof.as_bytes(),
            self.tail.as_bytes(),
        ]);
        HEXLOWER.encode(&hash)
    }
}

fn write_transaction(transaction: &Transaction, out: &mut String) {
    out.push_str("{\"data\": ");
    write_value(&transaction.data, out);
    out.push_str(", \"sender\": ");
    write_string(&transaction.sender, out);
    out.push('}');
}

/// Canonical text of an arbitrary JSON value.
pub fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(number) => write_number(number, out),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            // serde_json may be built with preserve_order; never rely on map order
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(key, out);
                out.push_str(": ");
                write_value(item, out);
            }
            out.push('}');
        }
    }
}

// Integers outside the i64/u64 range are parsed as f64 before they get here,
// so they are written in float form (2**70 becomes 1.1805916207174113e+21).
fn write_number(number: &Number, out: &mut String) {
    if let Some(n) = number.as_u64() {
        out.push_str(&n.to_string());
    } else if let Some(n) = number.as_i64() {
        out.push_str(&n.to_string());
    } else if let Some(f) = number.as_f64() {
        write_float(f, out);
    }
}

fn write_float(value: f64, out: &mut String) {
    if value.is_nan() {
        out.push_str("NaN");
        return;
    }
    if value.is_infinite() {
        out.push_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
        return;
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "1.5e-5"
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if (-4..16).contains(&exponent) {
        let fixed = value.to_string();
        out.push_str(&fixed);
        if !fixed.contains('.') {
            out.push_str(".0");
        }
    } else {
        out.push_str(mantissa);
        out.push('e');
        out.push(if exponent < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", exponent.abs()));
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn float_text(value: f64) -> String {
        let mut out = String::new();
        write_float(value, &mut out);
        out
    }

    fn sample_block() -> Block {
        Block::new(
            2,
            1700000000.25,
            vec![
                Transaction::new("alice", json!("x")),
                Transaction::new(
                    "bob",
                    json!({"z": 1, "a": [1.0, null, true], "é": "ü😀\n"}),
                ),
            ],
            42,
            "ab".to_string(),
        )
    }

    #[test]
    fn test_genesis_matches_reference_encoding() {
        let genesis = Block::genesis();
        assert_eq!(
            canonical_json(&genesis),
            r#"{"index": 1, "previous_hash": "1", "proof": 100, "timestamp": 0.0, "transactions": []}"#
        );
        assert_eq!(
            digest(&genesis),
            "d5243d5f5a34e89e77c6d803097f973f214f4305d13e07ba676f9cd480b6ef93"
        );
    }

    #[test]
    fn test_nested_data_matches_reference_encoding() {
        let block = sample_block();
        assert_eq!(
            canonical_json(&block),
            concat!(
                r#"{"index": 2, "previous_hash": "ab", "proof": 42, "timestamp": 1700000000.25, "#,
                r#""transactions": [{"data": "x", "sender": "alice"}, "#,
                r#"{"data": {"a": [1.0, null, true], "z": 1, "\u00e9": "\u00fc\ud83d\ude00\n"}, "sender": "bob"}]}"#
            )
        );
        assert_eq!(
            digest(&block),
            "297dd920479251518a2d77c33767c77cd7a19644d53718c73751c8ffe774e189"
        );
    }

    #[test]
    fn test_digest_ignores_key_insertion_order() {
        let mut forward = serde_json::Map::new();
        forward.insert("amount".to_string(), json!(5));
        forward.insert("to".to_string(), json!("carol"));
        let mut backward = serde_json::Map::new();
        backward.insert("to".to_string(), json!("carol"));
        backward.insert("amount".to_string(), json!(5));

        let a = Block::new(
            2,
            10.0,
            vec![Transaction::new("bob", Value::Object(forward))],
            0,
            "p".to_string(),
        );
        let b = Block::new(
            2,
            10.0,
            vec![Transaction::new("bob", Value::Object(backward))],
            0,
            "p".to_string(),
        );
        assert_eq!(digest(&a), digest(&b));
        assert_eq!(digest(&a), digest(&a.clone()));
    }

    #[test]
    fn test_template_matches_full_digest() {
        let block = sample_block();
        let template = HashTemplate::new(&block);
        for proof in [0, 1, 42, 99_999] {
            let expected = digest(&block.clone().with_proof(proof));
            assert_eq!(template.digest_with_proof(proof), expected);
        }
    }

    #[test]
    fn test_float_repr_rules() {
        assert_eq!(float_text(0.0), "0.0");
        assert_eq!(float_text(-0.0), "-0.0");
        assert_eq!(float_text(123.456), "123.456");
        assert_eq!(float_text(0.0001), "0.0001");
        assert_eq!(float_text(1e15), "1000000000000000.0");
        assert_eq!(float_text(1e16), "1e+16");
        assert_eq!(float_text(2.5e20), "2.5e+20");
        assert_eq!(float_text(1.5e-5), "1.5e-05");
        assert_eq!(float_text(1e-7), "1e-07");
    }

    #[test]
    fn test_integers_beyond_u64_are_written_as_floats() {
        let value: Value = serde_json::from_str("1180591620717411303424").unwrap();
        let mut out = String::new();
        write_value(&value, &mut out);
        assert_eq!(out, "1.1805916207174113e+21");

        let value: Value = serde_json::from_str("18446744073709551615").unwrap();
        let mut out = String::new();
        write_value(&value, &mut out);
        assert_eq!(out, "18446744073709551615");
    }

    #[test]
    fn test_string_escapes() {
        let mut out = String::new();
        write_string("a\"b\\c\t\u{01}\u{7f}", &mut out);
        assert_eq!(out, r#""a\"b\\c\t\u0001\u007f""#);
    }
}
