//! Minimal bencode reader for .torrent metadata.

use std::collections::BTreeMap;

use crate::error::{StageError, StageResult};

/// A decoded bencode value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Dict(BTreeMap<Vec<u8>, Value>),
}

impl Value {
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        match self {
            Value::Dict(entries) => entries.get(key),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<String> {
        self.as_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Decode a complete bencode document; trailing bytes are an error.
pub fn decode(data: &[u8]) -> StageResult<Value> {
    let mut reader = Reader { data, pos: 0 };
    let value = reader.read_value()?;
    if reader.pos != data.len() {
        return Err(StageError::ParseError(format!(
            "Trailing data after bencode document at byte {}",
            reader.pos
        )));
    }
    Ok(value)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> StageResult<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| StageError::ParseError("Unexpected end of bencode input".to_string()))
    }

    fn read_value(&mut self) -> StageResult<Value> {
        match self.peek()? {
            b'i' => self.read_int().map(Value::Int),
            b'l' => {
                self.pos += 1;
                let mut items = Vec::new();
                while self.peek()? != b'e' {
                    items.push(self.read_value()?);
                }
                self.pos += 1;
                Ok(Value::List(items))
            }
            b'd' => {
                self.pos += 1;
                let mut entries = BTreeMap::new();
                while self.peek()? != b'e' {
                    let key = self.read_bytes()?;
                    let value = self.read_value()?;
                    entries.insert(key, value);
                }
                self.pos += 1;
                Ok(Value::Dict(entries))
            }
            b'0'..=b'9' => self.read_bytes().map(Value::Bytes),
            other => Err(StageError::ParseError(format!(
                "Invalid bencode prefix byte 0x{:02x} at offset {}",
                other, self.pos
            ))),
        }
    }

    fn read_int(&mut self) -> StageResult<i64> {
        self.pos += 1; // consume 'i'
        let end = self.find(b'e')?;
        let digits = &self.data[self.pos..end];
        let text = std::str::from_utf8(digits)
            .map_err(|_| StageError::ParseError("Non-ASCII integer".to_string()))?;
        // Leading zeros and negative zero are invalid per BEP 3
        if (text.len() > 1 && text.starts_with('0'))
            || (text.len() > 2 && text.starts_with("-0"))
            || text == "-0"
        {
            return Err(StageError::ParseError(format!("Invalid integer '{}'", text)));
        }
        let value = text
            .parse::<i64>()
            .map_err(|_| StageError::ParseError(format!("Invalid integer '{}'", text)))?;
        self.pos = end + 1;
        Ok(value)
    }

    fn read_bytes(&mut self) -> StageResult<Vec<u8>> {
        let colon = self.find(b':')?;
        let len_text = std::str::from_utf8(&self.data[self.pos..colon])
            .map_err(|_| StageError::ParseError("Non-ASCII length".to_string()))?;
        let len = len_text
            .parse::<usize>()
            .map_err(|_| StageError::ParseError(format!("Invalid length '{}'", len_text)))?;
        let start = colon + 1;
        let end = start
            .checked_add(len)
            .filter(|&e| e <= self.data.len())
            .ok_or_else(|| {
                StageError::ParseError("Byte string length exceeds input".to_string())
            })?;
        self.pos = end;
        Ok(self.data[start..end].to_vec())
    }

    fn find(&self, byte: u8) -> StageResult<usize> {
        self.data[self.pos..]
            .iter()
            .position(|&b| b == byte)
            .map(|offset| self.pos + offset)
            .ok_or_else(|| StageError::ParseError("Unexpected end of bencode input".to_string()))
    }
}

/// Encode a value back to bencode bytes. Used by test fixtures.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Int(n) => {
            out.push(b'i');
            out.extend_from_slice(n.to_string().as_bytes());
            out.push(b'e');
        }
        Value::Bytes(bytes) => {
            out.extend_from_slice(bytes.len().to_string().as_bytes());
            out.push(b':');
            out.extend_from_slice(bytes);
        }
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                encode_into(item, out);
            }
            out.push(b'e');
        }
        Value::Dict(entries) => {
            out.push(b'd');
            for (key, value) in entries {
                out.extend_from_slice(key.len().to_string().as_bytes());
                out.push(b':');
                out.extend_from_slice(key);
                encode_into(value, out);
            }
            out.push(b'e');
        }
    }
}
