//! Fake filesystem backend for testing.
//!
//! Models just enough of a Linux device namespace (directories, regular files, block device
//! nodes and symlinks) to exercise resolution logic without touching `/dev` or `/sys`.
//! Every call is recorded so tests can assert which probes ran, and faults can be injected
//! per call and path.

use super::{FileKind, FsOps};
use crate::{HalError, HalResult};
use glob::{MatchOptions, Pattern};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Same limit the Linux kernel applies (`MAXSYMLINKS`).
const MAX_SYMLINK_HOPS: usize = 40;

/// The kind of filesystem call a recorded [`Operation`] was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsCall {
    Stat,
    Canonicalize,
    ReadDir,
    Glob,
    ReadFile,
}

/// Operation record for testing and verification. Globs record the pattern as `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub call: FsCall,
    pub target: PathBuf,
}

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(String),
    BlockDevice,
    Symlink(PathBuf),
}

#[derive(Debug, Default)]
struct FakeFsState {
    nodes: BTreeMap<PathBuf, Node>,
    faults: HashMap<(FsCall, PathBuf), io::ErrorKind>,
    operations: Vec<Operation>,
}

impl FakeFsState {
    fn begin(&mut self, call: FsCall, target: &Path) -> HalResult<()> {
        self.operations.push(Operation {
            call,
            target: target.to_path_buf(),
        });
        match self.faults.get(&(call, target.to_path_buf())) {
            Some(kind) => Err(HalError::Io(io::Error::new(
                *kind,
                format!("injected fault on {}", target.display()),
            ))),
            None => Ok(()),
        }
    }

    fn insert(&mut self, path: &Path, node: Node) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.parent().is_none() {
                break;
            }
            self.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Dir);
        }
        self.nodes.insert(path.to_path_buf(), node);
    }

    fn kind_of(&self, resolved: &Path) -> FileKind {
        match self.nodes.get(resolved) {
            None | Some(Node::Dir) => FileKind::Dir,
            Some(Node::File(_)) => FileKind::File,
            Some(Node::BlockDevice) => FileKind::BlockDevice,
            Some(Node::Symlink(_)) => FileKind::Other,
        }
    }

    /// Walk `path` component by component, expanding every symlink on the way.
    fn resolve(&self, path: &Path) -> HalResult<PathBuf> {
        let mut pending = segments(path);
        let mut current = PathBuf::from("/");
        let mut hops = 0;

        while let Some(seg) = pending.pop_front() {
            match seg {
                Seg::Root => current = PathBuf::from("/"),
                Seg::Up => {
                    current.pop();
                }
                Seg::Name(name) => {
                    let candidate = current.join(&name);
                    match self.nodes.get(&candidate) {
                        None => return Err(not_found(path)),
                        Some(Node::Symlink(target)) => {
                            hops += 1;
                            if hops > MAX_SYMLINK_HOPS {
                                return Err(HalError::SymlinkLoop(path.to_path_buf()));
                            }
                            // Relative targets resolve against the link's directory, which is
                            // still `current`.
                            let mut expanded = segments(target);
                            expanded.extend(pending.drain(..));
                            pending = expanded;
                        }
                        Some(Node::Dir) => current = candidate,
                        Some(Node::File(_)) | Some(Node::BlockDevice) => {
                            if !pending.is_empty() {
                                return Err(HalError::Io(io::Error::other(format!(
                                    "{}: not a directory",
                                    candidate.display()
                                ))));
                            }
                            current = candidate;
                        }
                    }
                }
            }
        }
        Ok(current)
    }
}

enum Seg {
    Root,
    Up,
    Name(OsString),
}

fn segments(path: &Path) -> VecDeque<Seg> {
    path.components()
        .filter_map(|c| match c {
            Component::RootDir => Some(Seg::Root),
            Component::ParentDir => Some(Seg::Up),
            Component::Normal(name) => Some(Seg::Name(name.to_os_string())),
            Component::CurDir | Component::Prefix(_) => None,
        })
        .collect()
}

fn not_found(path: &Path) -> HalError {
    HalError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file or directory", path.display()),
    ))
}

/// In-memory filesystem that records every call.
///
/// Cloning shares the same tree, so a test can hand one clone to the code under test and
/// mutate the tree from another thread (e.g. to simulate a disk attaching mid-wait).
#[derive(Debug, Clone, Default)]
pub struct FakeFs {
    state: Arc<Mutex<FakeFsState>>,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeFsState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a directory (and any missing parents).
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        self.state().insert(path.as_ref(), Node::Dir);
        self
    }

    /// Create a regular file with the given contents.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<String>) -> &Self {
        self.state()
            .insert(path.as_ref(), Node::File(contents.into()));
        self
    }

    /// Create a block device node such as `/dev/sdc`.
    pub fn add_block_device(&self, path: impl AsRef<Path>) -> &Self {
        self.state().insert(path.as_ref(), Node::BlockDevice);
        self
    }

    /// Create a symlink. Relative targets resolve against the link's parent directory.
    pub fn add_symlink(&self, link: impl AsRef<Path>, target: impl AsRef<Path>) -> &Self {
        log::debug!(
            "FAKE FS: symlink {} -> {}",
            link.as_ref().display(),
            target.as_ref().display()
        );
        self.state()
            .insert(link.as_ref(), Node::Symlink(target.as_ref().to_path_buf()));
        self
    }

    /// Remove a node and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) -> &Self {
        let path = path.as_ref();
        log::debug!("FAKE FS: remove {}", path.display());
        self.state().nodes.retain(|p, _| !p.starts_with(path));
        self
    }

    /// Make `call` on exactly `target` fail with `kind` until healed.
    pub fn fail(&self, call: FsCall, target: impl AsRef<Path>, kind: io::ErrorKind) -> &Self {
        self.state()
            .faults
            .insert((call, target.as_ref().to_path_buf()), kind);
        self
    }

    pub fn heal(&self, call: FsCall, target: impl AsRef<Path>) -> &Self {
        self.state()
            .faults
            .remove(&(call, target.as_ref().to_path_buf()));
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state().operations.clone()
    }

    pub fn operation_count(&self) -> usize {
        self.state().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state().operations.iter().any(check)
    }

    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }
}

impl FsOps for FakeFs {
    fn stat(&self, path: &Path) -> HalResult<FileKind> {
        let mut state = self.state();
        state.begin(FsCall::Stat, path)?;
        let resolved = state.resolve(path)?;
        Ok(state.kind_of(&resolved))
    }

    fn canonicalize(&self, path: &Path) -> HalResult<PathBuf> {
        let mut state = self.state();
        state.begin(FsCall::Canonicalize, path)?;
        state.resolve(path)
    }

    fn read_dir_names(&self, dir: &Path) -> HalResult<Vec<String>> {
        let mut state = self.state();
        state.begin(FsCall::ReadDir, dir)?;
        let resolved = state.resolve(dir)?;
        if state.kind_of(&resolved) != FileKind::Dir {
            return Err(HalError::Io(io::Error::other(format!(
                "{}: not a directory",
                dir.display()
            ))));
        }
        let mut names: Vec<String> = state
            .nodes
            .keys()
            .filter(|p| p.parent() == Some(resolved.as_path()))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    fn glob(&self, pattern: &str) -> HalResult<Vec<PathBuf>> {
        let mut state = self.state();
        state.begin(FsCall::Glob, Path::new(pattern))?;
        let compiled = Pattern::new(pattern).map_err(|e| HalError::Pattern(e.to_string()))?;
        let opts = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        // Matches stored paths literally; wildcards do not expand through symlinked directories.
        Ok(state
            .nodes
            .keys()
            .filter(|p| compiled.matches_path_with(p, opts))
            .cloned()
            .collect())
    }

    fn read_to_string(&self, path: &Path) -> HalResult<String> {
        let mut state = self.state();
        state.begin(FsCall::ReadFile, path)?;
        let resolved = state.resolve(path)?;
        match state.nodes.get(&resolved) {
            Some(Node::File(contents)) => Ok(contents.clone()),
            _ => Err(HalError::Io(io::Error::other(format!(
                "{}: not a regular file",
                path.display()
            )))),
        }
    }
}
