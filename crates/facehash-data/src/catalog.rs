// IdentityCatalog — enumeration of identity folders and their image paths
//
// The on-disk corpus is one directory per identity:
//
//   root/
//     some_person/
//       img_001.png
//       img_002.png
//       val/        <- reserved held-out subfolder
//       test/       <- reserved held-out subfolder
//     another_person/
//       ...
//
// The train partition is implicit: every file directly under the identity
// directory that is not inside a reserved subfolder.  Val and test are the
// contents of the corresponding subfolders, populated by a carve-out pass
// (see the `split` module).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Names of the reserved held-out subfolders.  Entries with these names are
/// never listed as images, in any partition.
pub const RESERVED_SUBFOLDERS: &[&str] = &["val", "test"];

/// Which partition of an identity's images to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Default for Split {
    fn default() -> Self {
        Split::Train
    }
}

impl Split {
    /// The reserved subfolder this split reads from (`None` for train).
    pub fn subfolder(&self) -> Option<&'static str> {
        match self {
            Split::Train => None,
            Split::Val => Some("val"),
            Split::Test => Some("test"),
        }
    }
}

/// An immutable snapshot of the identity folders under a data root.
///
/// Orderings come from the underlying directory listing: identities in
/// discovery order, files in per-directory listing order.  They are
/// deterministic for a given directory state but NOT sorted — callers must
/// not assume alphabetical order.  The flat image list is the concatenation
/// of the per-identity lists and is the backing for flat-index arithmetic,
/// so it is computed exactly once; if the tree mutates afterwards (a
/// carve-out runs, a file is deleted), indices may resolve to moved or
/// deleted files and the catalog must be rebuilt to observe the change.
#[derive(Debug, Clone)]
pub struct IdentityCatalog {
    names: Vec<String>,
    paths_by_identity: Vec<Vec<PathBuf>>,
    image_paths: Vec<PathBuf>,
}

impl IdentityCatalog {
    /// Scan `root` and build the catalog for the given split.
    ///
    /// Identities are the directories directly under `root`; other entries
    /// are ignored.  A missing val/test subfolder contributes an empty list
    /// for that identity rather than an error, so a catalog built before
    /// any carve-out simply has length zero for those splits.
    pub fn build(root: &Path, split: Split) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }

        let mut names = Vec::new();
        let mut paths_by_identity = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let files = list_split_files(&path, split)?;
            names.push(name.to_string());
            paths_by_identity.push(files);
        }

        let image_paths = paths_by_identity.iter().flatten().cloned().collect();
        Ok(Self {
            names,
            paths_by_identity,
            image_paths,
        })
    }

    /// Identity names in discovery order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of identity directories found.
    pub fn num_identities(&self) -> usize {
        self.names.len()
    }

    /// Image paths of one identity, in listing order.
    pub fn paths_for(&self, identity: usize) -> &[PathBuf] {
        &self.paths_by_identity[identity]
    }

    /// The flat concatenation of every image path: identity discovery
    /// order, then per-identity file order.  Pair indexing decomposes over
    /// this list, so its order is load-bearing.
    pub fn image_paths(&self) -> &[PathBuf] {
        &self.image_paths
    }

    /// Total number of images across all identities.
    pub fn len(&self) -> usize {
        self.image_paths.len()
    }

    /// Whether the catalog holds no images.
    pub fn is_empty(&self) -> bool {
        self.image_paths.is_empty()
    }

    /// Position of `name` in the identity list, if present.
    pub fn identity_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// List the image files of one identity directory for the given split.
///
/// Train reads the identity directory itself; val/test read the reserved
/// subfolder.  Entries named `val` or `test` and non-file entries are
/// skipped in every partition.
pub fn list_split_files(identity_dir: &Path, split: Split) -> Result<Vec<PathBuf>> {
    let dir = match split.subfolder() {
        Some(sub) => identity_dir.join(sub),
        None => identity_dir.to_path_buf(),
    };
    if split.subfolder().is_some() && !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if RESERVED_SUBFOLDERS.contains(&name) {
                continue;
            }
        }
        files.push(path);
    }
    Ok(files)
}
