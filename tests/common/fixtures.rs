use std::collections::BTreeMap;
use std::path::PathBuf;

use torrent_stage::metainfo::bencode::{encode, Value};

fn bytes(s: &str) -> Value {
    Value::Bytes(s.as_bytes().to_vec())
}

fn torrent_doc(info: BTreeMap<Vec<u8>, Value>) -> Vec<u8> {
    let mut doc = BTreeMap::new();
    doc.insert(
        b"announce".to_vec(),
        bytes("http://tracker.example/announce"),
    );
    doc.insert(b"info".to_vec(), Value::Dict(info));
    encode(&Value::Dict(doc))
}

/// A minimal single-file torrent document.
pub fn single_file_torrent(name: &str, length: i64) -> Vec<u8> {
    let mut info = BTreeMap::new();
    info.insert(b"name".to_vec(), bytes(name));
    info.insert(b"length".to_vec(), Value::Int(length));
    info.insert(b"piece length".to_vec(), Value::Int(16384));
    torrent_doc(info)
}

/// A multi-file torrent document; each entry is (path components, length).
pub fn multi_file_torrent(name: &str, files: &[(&[&str], i64)]) -> Vec<u8> {
    let entries: Vec<Value> = files
        .iter()
        .map(|(path, length)| {
            let mut entry = BTreeMap::new();
            entry.insert(b"length".to_vec(), Value::Int(*length));
            entry.insert(
                b"path".to_vec(),
                Value::List(path.iter().map(|s| bytes(s)).collect()),
            );
            Value::Dict(entry)
        })
        .collect();

    let mut info = BTreeMap::new();
    info.insert(b"name".to_vec(), bytes(name));
    info.insert(b"files".to_vec(), Value::List(entries));
    info.insert(b"piece length".to_vec(), Value::Int(16384));
    torrent_doc(info)
}

/// Write torrent bytes into a temp dir and return the path.
pub fn write_torrent(dir: &tempfile::TempDir, file_name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(file_name);
    std::fs::write(&path, data).unwrap();
    path
}

/// A successful torrent-add RPC response body.
pub fn added_body(id: i64, name: &str) -> serde_json::Value {
    serde_json::json!({
        "result": "success",
        "arguments": {
            "torrent-added": {"id": id, "name": name, "hashString": format!("hash-{}", id)}
        }
    })
}

/// A failed torrent-add RPC response body (HTTP 200, envelope failure).
pub fn rejected_body(reason: &str) -> serde_json::Value {
    serde_json::json!({ "result": reason })
}
