// Split carving — physically relocate held-out images into reserved subfolders
//
// `carve_out` moves a fixed number of images per identity into the `val/`
// or `test/` subfolder; `restore` moves them back.  The train partition is
// implicit: whatever remains directly under the identity directory.  Both
// operations mutate the directory tree, so any catalog built against the
// same root is stale afterwards and must be rebuilt before sampling.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::catalog::{list_split_files, Split};
use crate::error::{Error, Result};

/// Configuration for a carve-out pass.
#[derive(Debug, Clone)]
pub struct CarveConfig {
    /// How many images to move per identity.  Identities with fewer train
    /// images left contribute everything they have.
    pub per_identity: usize,
    /// Optional random seed for reproducible selection.
    pub seed: Option<u64>,
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self {
            per_identity: 5,
            seed: None,
        }
    }
}

impl CarveConfig {
    pub fn per_identity(mut self, n: usize) -> Self {
        self.per_identity = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// Report of what a carve-out pass moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarveStats {
    /// Identity directories visited.
    pub identities: usize,
    /// Files relocated into the reserved subfolder.
    pub files_moved: usize,
    /// Identities that had fewer than `per_identity` train images left.
    pub underfilled: Vec<String>,
}

/// Move up to `config.per_identity` randomly-selected train images of every
/// identity under `root` into the reserved subfolder for `split`.
///
/// Selection is a shuffle of the identity's current train files truncated
/// to the requested count, so an identity holding at least that many images
/// contributes exactly that many.  Each move is a single `fs::rename`; the
/// first I/O failure aborts the pass with no rollback of earlier moves.
pub fn carve_out(root: &Path, split: Split, config: &CarveConfig) -> Result<CarveStats> {
    let Some(sub) = split.subfolder() else {
        return Err(Error::InvalidConfiguration(
            "carve_out requires the val or test split".into(),
        ));
    };
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut stats = CarveStats {
        identities: 0,
        files_moved: 0,
        underfilled: Vec::new(),
    };

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let target = dir.join(sub);
        fs::create_dir_all(&target)?;

        let candidates = list_split_files(&dir, Split::Train)?;
        if candidates.len() < config.per_identity {
            stats
                .underfilled
                .push(entry.file_name().to_string_lossy().into_owned());
        }

        let mut indices: Vec<usize> = (0..candidates.len()).collect();
        indices.shuffle(&mut rng);
        indices.truncate(config.per_identity);

        for &i in &indices {
            let src = &candidates[i];
            let Some(file_name) = src.file_name() else {
                continue;
            };
            fs::rename(src, target.join(file_name))?;
            stats.files_moved += 1;
        }
        stats.identities += 1;
    }

    Ok(stats)
}

/// Move every file in each identity's reserved subfolder for `split` back
/// up to the identity directory.  Identities without the subfolder are
/// skipped, which makes the operation idempotent.  Returns the number of
/// files moved.
pub fn restore(root: &Path, split: Split) -> Result<usize> {
    let Some(sub) = split.subfolder() else {
        return Err(Error::InvalidConfiguration(
            "restore requires the val or test split".into(),
        ));
    };
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut moved = 0;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let held = dir.join(sub);
        if !held.is_dir() {
            continue;
        }
        for file in fs::read_dir(&held)? {
            let file = file?;
            let src = file.path();
            if !src.is_file() {
                continue;
            }
            let Some(file_name) = src.file_name() else {
                continue;
            };
            fs::rename(&src, dir.join(file_name))?;
            moved += 1;
        }
    }
    Ok(moved)
}
