//! Builds torrent-add requests from tree state and shared options.

use std::path::Path;

use base64::Engine;

use crate::api::types::TorrentAddArgs;
use crate::error::StageResult;
use crate::tree::{FileTree, Priority, TriState};

/// The four index buckets a staged tree serializes to.
///
/// `wanted` and `unwanted` partition the full leaf-index set; the priority
/// buckets hold only non-normal leaves - absence is the "normal" signal on
/// the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    pub wanted: Vec<u32>,
    pub unwanted: Vec<u32>,
    pub priority_low: Vec<u32>,
    pub priority_high: Vec<u32>,
}

impl FileSelection {
    /// Collect every leaf's index into its buckets.
    ///
    /// Directories are traversed for their children but contribute nothing
    /// themselves. A leaf is never individually Mixed, but anything other
    /// than a concrete true lands in `unwanted`.
    pub fn from_tree(tree: &FileTree) -> Self {
        let mut selection = Self::default();
        for id in tree.leaves() {
            let node = tree.node(id);
            let Some(index) = node.index else { continue };

            match node.enabled {
                TriState::Value(true) => selection.wanted.push(index),
                _ => selection.unwanted.push(index),
            }
            match node.priority {
                TriState::Value(Priority::Low) => selection.priority_low.push(index),
                TriState::Value(Priority::High) => selection.priority_high.push(index),
                _ => {}
            }
        }
        selection
    }

    /// Layer the buckets onto a seeded torrent-add request.
    pub fn apply_to(&self, args: &mut TorrentAddArgs) {
        args.files_wanted = self.wanted.clone();
        args.files_unwanted = self.unwanted.clone();
        args.priority_low = self.priority_low.clone();
        args.priority_high = self.priority_high.clone();
    }
}

/// Submission fields shared by every item of an add action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonArgs {
    pub download_dir: Option<String>,
    pub bandwidth_priority: Priority,
}

/// Layer the shared destination directory and bandwidth priority onto a
/// seeded request.
pub fn apply_common_args(args: &mut TorrentAddArgs, common: &CommonArgs) {
    if let Some(dir) = &common.download_dir {
        args.download_dir = Some(dir.clone());
    }
    args.bandwidth_priority = Some(common.bandwidth_priority.to_rpc());
}

/// Seed a torrent-add request from a torrent file on disk.
///
/// The file contents go on the wire base64-encoded; nothing here depends on
/// the metadata being parseable, the server does its own validation.
pub fn seed_add_request(source: &Path, paused: bool) -> StageResult<TorrentAddArgs> {
    let raw = std::fs::read(source)?;
    Ok(TorrentAddArgs {
        metainfo: Some(base64::engine::general_purpose::STANDARD.encode(raw)),
        paused: Some(paused),
        ..Default::default()
    })
}
