//! Torrent metadata parsing: turns a .torrent file into the recursive
//! description the staging tree is built from.

pub mod bencode;

use std::path::Path;

use tracing::debug;

use crate::error::{StageError, StageResult};

/// Recursive parsed-file description.
///
/// A node with a name and no children is a file (carrying `index`/`length`);
/// a node with children is a directory. A nameless node only ever appears as
/// a synthetic root wrapping several top-level entries.
#[derive(Debug, Clone, Default)]
pub struct TreeDescription {
    pub name: Option<String>,
    pub children: Vec<TreeDescription>,
    pub index: Option<u32>,
    pub length: Option<u64>,
}

/// Parsed torrent metadata, reduced to what staging needs.
#[derive(Debug, Clone)]
pub struct TorrentMetainfo {
    pub name: String,
    pub file_count: u32,
    pub top_node: TreeDescription,
}

/// Parse a .torrent file from disk.
pub fn parse(path: &Path) -> StageResult<TorrentMetainfo> {
    let data = std::fs::read(path)?;
    let metainfo = parse_bytes(&data)?;
    debug!(
        path = %path.display(),
        name = %metainfo.name,
        files = metainfo.file_count,
        "Parsed torrent metadata"
    );
    Ok(metainfo)
}

/// Parse raw .torrent bytes.
pub fn parse_bytes(data: &[u8]) -> StageResult<TorrentMetainfo> {
    let document = bencode::decode(data)?;
    let info = document
        .get(b"info")
        .ok_or_else(|| StageError::ParseError("Torrent has no info dictionary".to_string()))?;
    let name = info
        .get(b"name")
        .and_then(bencode::Value::as_str)
        .ok_or_else(|| StageError::ParseError("Torrent info has no name".to_string()))?;

    match info.get(b"files") {
        // Multi-file: the name is the top directory, each entry nests its
        // path components beneath it.
        Some(files) => {
            let entries = files.as_list().ok_or_else(|| {
                StageError::ParseError("Torrent files field is not a list".to_string())
            })?;
            if entries.is_empty() {
                return Err(StageError::ParseError(
                    "Torrent files list is empty".to_string(),
                ));
            }

            let mut top_node = TreeDescription {
                name: Some(name.clone()),
                ..Default::default()
            };
            for (index, entry) in entries.iter().enumerate() {
                let length = entry.get(b"length").and_then(bencode::Value::as_int).ok_or_else(
                    || StageError::ParseError(format!("File {} has no length", index)),
                )?;
                let components = entry
                    .get(b"path")
                    .and_then(bencode::Value::as_list)
                    .ok_or_else(|| {
                        StageError::ParseError(format!("File {} has no path", index))
                    })?;
                let segments: Vec<String> = components
                    .iter()
                    .filter_map(bencode::Value::as_str)
                    .filter(|s| !s.is_empty())
                    .collect();
                if segments.is_empty() {
                    return Err(StageError::ParseError(format!(
                        "File {} has an empty path",
                        index
                    )));
                }
                attach_file(&mut top_node, &segments, index as u32, length as u64);
            }

            Ok(TorrentMetainfo {
                name,
                file_count: entries.len() as u32,
                top_node,
            })
        }
        // Single-file: the top node is the file itself.
        None => {
            let length = info
                .get(b"length")
                .and_then(bencode::Value::as_int)
                .ok_or_else(|| {
                    StageError::ParseError("Single-file torrent has no length".to_string())
                })?;
            Ok(TorrentMetainfo {
                name: name.clone(),
                file_count: 1,
                top_node: TreeDescription {
                    name: Some(name),
                    children: Vec::new(),
                    index: Some(0),
                    length: Some(length as u64),
                },
            })
        }
    }
}

fn attach_file(node: &mut TreeDescription, segments: &[String], index: u32, length: u64) {
    if segments.len() == 1 {
        node.children.push(TreeDescription {
            name: Some(segments[0].clone()),
            children: Vec::new(),
            index: Some(index),
            length: Some(length),
        });
        return;
    }

    let dir_name = &segments[0];
    let position = node
        .children
        .iter()
        .position(|c| c.name.as_deref() == Some(dir_name) && c.index.is_none());
    let dir = match position {
        Some(p) => &mut node.children[p],
        None => {
            node.children.push(TreeDescription {
                name: Some(dir_name.clone()),
                ..Default::default()
            });
            node.children.last_mut().expect("just pushed")
        }
    };
    attach_file(dir, &segments[1..], index, length);
}
