//! arbor - an incremental project tree explorer.
//!
//! Usage:
//!   arbor [PATH]             Print the project tree
//!   arbor tree [PATH]        Print the project tree
//!   arbor files [PATH]       Flat file listing (text or JSON)
//!   arbor topic [PATH]       Print the VCS topic for a directory
//!   arbor --help             Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use arbor_core::{
    FileCandidate, FileKind, NodeId, NodeTree, NodesVisitor, NullObserver, ScanOptions, VcsLookup,
};
use arbor_scan::{ScanOutcome, TreeScanner};
use arbor_vcs::GitVcs;

#[derive(Parser)]
#[command(
    name = "arbor",
    version,
    about = "An incremental project tree explorer",
    long_about = "arbor scans a directory into a project node tree and prints it.\n\n\
                  Run `arbor [PATH]` for the tree view, or use subcommands for \
                  flat listings and VCS information."
)]
struct Cli {
    /// Path to explore (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and print its project tree
    Tree {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Patterns to skip (glob syntax), e.g. "target"
        #[arg(short, long)]
        ignore: Vec<String>,
    },

    /// Scan a directory and list its files flat
    Files {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Patterns to skip (glob syntax)
        #[arg(short, long)]
        ignore: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the VCS topic (branch) for a directory
    Topic {
        /// Path to inspect
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Tree { path, ignore }) => run_tree(&path, ignore).await?,
        Some(Command::Files {
            path,
            ignore,
            format,
        }) => run_files(&path, ignore, format).await?,
        Some(Command::Topic { path }) => run_topic(&path)?,
        None => run_tree(&cli.path, Vec::new()).await?,
    }

    Ok(())
}

/// Scan on a blocking worker, draining progress onto stderr meanwhile.
async fn scan(path: &Path, ignore: Vec<String>) -> Result<ScanOutcome> {
    let path = path.canonicalize().context("Invalid path")?;
    let options = ScanOptions::builder()
        .root(path)
        .ignore_patterns(ignore)
        .build()?;

    let scanner = TreeScanner::new();
    let mut progress_rx = scanner.subscribe();
    let progress_task = tokio::spawn(async move {
        while let Ok(progress) = progress_rx.recv().await {
            eprint!("\rScanning... {:>3.0}%", progress.fraction() * 100.0);
        }
        eprint!("\r");
    });

    let cancel = CancellationToken::new();
    let outcome = tokio::task::spawn_blocking(move || {
        scanner.scan(&options, &cancel, Some(&GitVcs::new()), |p| FileCandidate::new(p))
    })
    .await
    .context("Scan worker panicked")??;
    // The sender went away with the scanner; the drain task is done.
    progress_task.await.ok();

    Ok(outcome)
}

/// Build a session tree holding one project for the scanned root.
fn build_session(root: &Path, outcome: &ScanOutcome) -> (NodeTree, NodeId) {
    let mut tree = NodeTree::new();
    let project = tree.new_project_node(root);
    tree.add_project_nodes(tree.root(), vec![project], &mut NullObserver);
    tree.build_tree(project, outcome.files.clone(), None, &mut NullObserver);
    (tree, project)
}

async fn run_tree(path: &Path, ignore: Vec<String>) -> Result<()> {
    let root = path.canonicalize().context("Invalid path")?;
    let outcome = scan(&root, ignore).await?;
    let (tree, project) = build_session(&root, &outcome);

    // The scanned directory is the repository itself, so key the lookup
    // on it directly rather than going through a node path.
    let vcs = GitVcs::new();
    if let Some(topic) = repo_topic(&vcs, &root).filter(|t| !t.is_empty()) {
        println!("[{topic}]");
    }

    let mut printer = TreePrinter;
    tree.accept(project, &mut printer);

    if !outcome.warnings.is_empty() {
        println!();
        println!("{} warning(s) during scan", outcome.warnings.len());
    }
    if outcome.cancelled {
        println!("Scan was cancelled; listing is partial.");
    }

    Ok(())
}

async fn run_files(path: &Path, ignore: Vec<String>, format: OutputFormat) -> Result<()> {
    let root = path.canonicalize().context("Invalid path")?;
    let outcome = scan(&root, ignore).await?;
    let (tree, project) = build_session(&root, &outcome);

    let mut export = FileExporter::default();
    tree.accept(project, &mut export);

    match format {
        OutputFormat::Text => {
            for entry in &export.entries {
                println!("{}", entry.path.display());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&export.entries)?);
        }
    }

    Ok(())
}

fn run_topic(path: &Path) -> Result<()> {
    let root = path.canonicalize().context("Invalid path")?;
    let vcs = GitVcs::new();
    match repo_topic(&vcs, &root) {
        Some(topic) => println!("{topic}"),
        None => println!("(no VCS)"),
    }
    Ok(())
}

/// Topic of the version-control repository managing `root`, if any.
fn repo_topic(vcs: &GitVcs, root: &Path) -> Option<String> {
    vcs.find_controller(root).map(|c| c.topic(root))
}

/// Prints composite nodes indented by depth, with their files beneath.
struct TreePrinter;

impl TreePrinter {
    fn depth(tree: &NodeTree, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = tree.parent_folder(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    fn print(&self, tree: &NodeTree, id: NodeId) {
        let indent = "  ".repeat(Self::depth(tree, id).saturating_sub(1));
        println!("{indent}{}/", tree.node(id).display_name());
        for &file in tree.file_nodes(id) {
            let node = tree.node(file);
            println!("{indent}  {}", node.display_name());
        }
    }
}

impl NodesVisitor for TreePrinter {
    fn visit_project(&mut self, tree: &NodeTree, project: NodeId) {
        self.print(tree, project);
    }

    fn visit_folder(&mut self, tree: &NodeTree, folder: NodeId) {
        self.print(tree, folder);
    }
}

#[derive(Debug, Serialize)]
struct FileEntry {
    path: PathBuf,
    kind: FileKind,
    generated: bool,
}

/// Collects every file in traversal order for the flat listing.
#[derive(Default)]
struct FileExporter {
    entries: Vec<FileEntry>,
}

impl FileExporter {
    fn collect(&mut self, tree: &NodeTree, folder: NodeId) {
        for &file in tree.file_nodes(folder) {
            let node = tree.node(file);
            let data = node.file_data().expect("file child is a file node");
            self.entries.push(FileEntry {
                path: node.path().to_path_buf(),
                kind: data.kind,
                generated: data.generated,
            });
        }
    }
}

impl NodesVisitor for FileExporter {
    fn visit_project(&mut self, tree: &NodeTree, project: NodeId) {
        self.collect(tree, project);
    }

    fn visit_folder(&mut self, tree: &NodeTree, folder: NodeId) {
        self.collect(tree, folder);
    }
}
