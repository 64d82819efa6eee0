pub mod api;
pub mod config;
pub mod error;
pub mod metainfo;
pub mod session;
pub mod submit;
pub mod tree;

pub use api::TransmissionClient;
pub use config::Config;
pub use error::{StageError, StageResult};
pub use session::SessionSnapshot;
pub use submit::{BatchJob, SubmissionPipeline};
pub use tree::FileTree;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::api::Dispatcher;
use crate::submit::{apply_common_args, seed_add_request, CommonArgs, FileSelection};
use crate::submit::pipeline::DispatchOutcome;
use crate::tree::{handle_activation, Column, NodeId, Priority, TriState};

/// One staging invocation: which sources to submit and how to edit the tree.
#[derive(Debug, Clone, Default)]
pub struct StageAction {
    pub sources: Vec<PathBuf>,
    /// Tree paths whose download checkbox gets one toggle activation each.
    pub toggle: Vec<String>,
    /// Tree paths whose priority gets one cycle activation each.
    pub cycle_priority: Vec<String>,
    /// Print the staged tree and request instead of submitting.
    pub dry_run: bool,
    /// Print the server's destination-folder choices and exit.
    pub list_dirs: bool,
}

pub async fn run(config: Config, action: StageAction) -> Result<()> {
    let client = Arc::new(create_client(&config)?);

    if action.list_dirs {
        let snapshot = SessionSnapshot::fetch(&client)
            .await
            .context("Failed to read session state")?;
        for dir in snapshot.destination_choices() {
            println!("{}", dir);
        }
        return Ok(());
    }

    if action.sources.is_empty() {
        anyhow::bail!("No torrent files given");
    }

    let common = CommonArgs {
        download_dir: config.submit.download_dir.clone(),
        bandwidth_priority: config.bandwidth_priority(),
    };
    let pipeline = SubmissionPipeline::new(client as Arc<dyn Dispatcher>);

    if action.sources.len() == 1 {
        stage_single(&config, &action, &common, &pipeline).await
    } else {
        // The tree only exists when exactly one torrent is staged
        if !action.toggle.is_empty() || !action.cycle_priority.is_empty() {
            warn!("File-tree edits apply only when staging a single torrent; ignoring them");
        }
        run_batch(&config, &action, &common, &pipeline).await
    }
}

/// Single-source path: parse, stage the tree, apply edits, submit async.
async fn stage_single(
    config: &Config,
    action: &StageAction,
    common: &CommonArgs,
    pipeline: &SubmissionPipeline,
) -> Result<()> {
    let source = &action.sources[0];
    let metainfo = metainfo::parse(source)
        .with_context(|| format!("Failed to parse {}", source.display()))?;
    let mut tree = FileTree::from_description(&metainfo.top_node);
    info!(
        name = %metainfo.name,
        files = metainfo.file_count,
        "Staged torrent"
    );

    for path in &action.toggle {
        match tree.resolve(path) {
            Some(id) => {
                handle_activation(&mut tree, id, Column::Enabled);
            }
            None => warn!(path = %path, "No such entry in the torrent; toggle ignored"),
        }
    }
    for path in &action.cycle_priority {
        match tree.resolve(path) {
            Some(id) => {
                handle_activation(&mut tree, id, Column::Priority);
            }
            None => warn!(path = %path, "No such entry in the torrent; priority cycle ignored"),
        }
    }

    let selection = FileSelection::from_tree(&tree);

    if action.dry_run {
        print!("{}", render_tree(&tree));
        println!(
            "wanted: {:?}  unwanted: {:?}  priority-low: {:?}  priority-high: {:?}",
            selection.wanted, selection.unwanted, selection.priority_low, selection.priority_high
        );
        return Ok(());
    }

    let mut args = seed_add_request(source, config.submit.paused)?;
    selection.apply_to(&mut args);
    apply_common_args(&mut args, common);

    let (tx, rx) = tokio::sync::oneshot::channel();
    pipeline.submit_single(args.into_request(), move |outcome| {
        let _ = tx.send(outcome);
    })?;

    // The dispatch itself is non-blocking; the process just sticks around
    // for the acknowledgement before exiting.
    let outcome = rx.await.context("Submission worker dropped its reply")?;
    if report_outcome(source, outcome) {
        Ok(())
    } else {
        anyhow::bail!("Submission of {} failed", source.display())
    }
}

/// Batch path: one sequential worker, per-item reporting, no aggregation.
async fn run_batch(
    config: &Config,
    action: &StageAction,
    common: &CommonArgs,
    pipeline: &SubmissionPipeline,
) -> Result<()> {
    let carries_common =
        common.download_dir.is_some() || common.bandwidth_priority != Priority::Normal;
    let job = BatchJob {
        sources: action.sources.clone(),
        paused: config.submit.paused,
        common: carries_common.then(|| common.clone()),
    };

    if action.dry_run {
        for source in &job.sources {
            println!(
                "would submit {} (paused: {}, dir: {}, priority: {})",
                source.display(),
                job.paused,
                common.download_dir.as_deref().unwrap_or("<server default>"),
                common.bandwidth_priority,
            );
        }
        return Ok(());
    }

    let total = job.sources.len();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    match pipeline.submit_batch(job, move |source, outcome| {
        let _ = tx.send((source.to_path_buf(), outcome));
    }) {
        Ok(()) => {
            for _ in 0..total {
                match rx.recv().await {
                    Some((source, outcome)) => {
                        report_outcome(&source, outcome);
                    }
                    None => break,
                }
            }
            Ok(())
        }
        Err(e) => {
            // Known rough edge: a batch whose worker never started is
            // dropped without per-item callbacks or a user-facing error.
            error!(error = %e, "Could not start batch worker; batch discarded");
            Ok(())
        }
    }
}

/// Report one submission outcome; returns whether it succeeded.
fn report_outcome(source: &std::path::Path, outcome: DispatchOutcome) -> bool {
    match outcome {
        Ok(response) if response.is_success() => {
            match response.added_torrent() {
                Some(added) => {
                    info!(id = added.id, name = %added.name, "Torrent added");
                    println!("added {} (id {})", added.name, added.id);
                }
                None => println!("added {}", source.display()),
            }
            true
        }
        Ok(response) => {
            error!(source = %source.display(), result = %response.result, "Server rejected torrent");
            println!("failed {}: {}", source.display(), response.result);
            false
        }
        Err(e) => {
            error!(source = %source.display(), error = %e, "Submission failed");
            println!("failed {}: {}", source.display(), e);
            false
        }
    }
}

fn create_client(config: &Config) -> StageResult<TransmissionClient> {
    match (&config.rpc.username, &config.rpc.password) {
        (Some(username), Some(password)) => TransmissionClient::with_auth(
            config.rpc.url.clone(),
            username.clone(),
            password.clone(),
        ),
        _ => TransmissionClient::new(config.rpc.url.clone()),
    }
}

/// Plain-text rendering of the staged tree for --dry-run.
fn render_tree(tree: &FileTree) -> String {
    fn mark(state: TriState<bool>) -> &'static str {
        match state {
            TriState::Value(true) => "[x]",
            TriState::Value(false) => "[ ]",
            TriState::Mixed => "[~]",
        }
    }

    fn walk(tree: &FileTree, id: NodeId, depth: usize, out: &mut String) {
        let node = tree.node(id);
        if let Some(name) = &node.name {
            let indent = "  ".repeat(depth);
            let size = node
                .size
                .map(|s| format!(" ({} bytes)", s))
                .unwrap_or_default();
            out.push_str(&format!(
                "{}{} {} {}{}\n",
                indent,
                mark(node.enabled),
                node.priority,
                name,
                size
            ));
        }
        for &child in tree.children(id) {
            walk(tree, child, depth + 1, out);
        }
    }

    let mut out = String::new();
    for &child in tree.children(FileTree::ROOT) {
        walk(tree, child, 0, &mut out);
    }
    out
}
