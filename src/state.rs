/// Per-region run state persisted as pretty-printed JSON.
///
/// One file per region, `lastdata.<region>.json`, holding the last processed
/// generation marker and the flattened fields of the last selected record:
///
/// ```json
/// {
///   "runid": 1704931200,
///   "date": "2024-01-09",
///   "percent_positive_7_day": 5.4,
///   ...
/// }
/// ```
///
/// Saves go through a temp file in the same directory which is fsynced and
/// then renamed over the target. A failure at any point drops the temp file
/// and leaves the previous state file untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::RunError;
use crate::model::{Record, RegionId, RunState};

/// On-disk layout. Record fields are flattened next to `runid`; a file
/// with no record fields decodes to `last_selected: None`.
#[derive(Serialize)]
struct StateFileOut<'a> {
    runid: i64,
    #[serde(flatten)]
    record: Option<&'a Record>,
}

#[derive(Deserialize)]
struct StateFileIn {
    runid: i64,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// Reads and writes `RunState` files under one directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding state for `region`.
    pub fn path_for(&self, region: RegionId) -> PathBuf {
        self.dir.join(format!("lastdata.{}.json", region))
    }

    /// Loads state for `region`.
    ///
    /// A missing file is a first run and yields `RunState::default()`.
    ///
    /// # Errors
    /// - `RunError::CorruptState` - the file exists but cannot be read or
    ///   does not decode.
    pub fn load(&self, region: RegionId) -> Result<RunState, RunError> {
        let path = self.path_for(region);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no state file found, starting from empty state");
                return Ok(RunState::default());
            }
            Err(e) => return Err(corrupt(&path, e)),
        };

        let state = decode_state(&contents).map_err(|e| corrupt(&path, e))?;
        debug!(
            path = %path.display(),
            generation = state.generation_id,
            last_date = ?state.last_selected.as_ref().map(|r| r.date),
            "loaded state"
        );
        Ok(state)
    }

    /// Atomically replaces the state file for `region`.
    ///
    /// # Errors
    /// - `RunError::Persistence` - serialization, temp-file creation, write,
    ///   fsync, or rename failed. The previous file is intact.
    pub fn save(&self, region: RegionId, state: &RunState) -> Result<(), RunError> {
        self.save_with(region, state, |_| Ok(()))
    }

    /// `save` with a hook that runs after the temp file is fully written
    /// and synced but before it replaces the target. An `Err` from the hook
    /// aborts the save exactly like a crash at that point would.
    pub(crate) fn save_with<F>(
        &self,
        region: RegionId,
        state: &RunState,
        before_commit: F,
    ) -> Result<(), RunError>
    where
        F: FnOnce(&Path) -> io::Result<()>,
    {
        let path = self.path_for(region);
        let json = encode_state(state).map_err(|e| persistence(&path, e))?;

        write_atomic(&self.dir, &path, json.as_bytes(), before_commit)
            .map_err(|e| persistence(&path, e))?;

        info!(path = %path.display(), generation = state.generation_id, "saved state");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn encode_state(state: &RunState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&StateFileOut {
        runid: state.generation_id,
        record: state.last_selected.as_ref(),
    })
}

fn decode_state(contents: &str) -> serde_json::Result<RunState> {
    let raw: StateFileIn = serde_json::from_str(contents)?;

    let last_selected = if raw.rest.is_empty() {
        None
    } else {
        Some(serde_json::from_value(Value::Object(raw.rest))?)
    };

    Ok(RunState {
        generation_id: raw.runid,
        last_selected,
    })
}

// ---------------------------------------------------------------------------
// Atomic write
// ---------------------------------------------------------------------------

#[cfg(unix)]
const STATE_FILE_MODE: u32 = 0o644;

fn write_atomic<F>(dir: &Path, target: &Path, bytes: &[u8], before_commit: F) -> io::Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    // Same directory as the target so the rename never crosses filesystems.
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;

    // Published 0644 regardless of the temp file's 0600.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(fs::Permissions::from_mode(STATE_FILE_MODE))?;
    }

    before_commit(tmp.path())?;

    tmp.persist(target).map_err(|e| e.error)?;
    sync_parent_dir(target)
}

fn sync_parent_dir(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent() {
            let parent = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
            fs::File::open(parent)?.sync_all()?;
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

fn corrupt(path: &Path, e: impl std::fmt::Display) -> RunError {
    RunError::CorruptState {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn persistence(path: &Path, e: impl std::fmt::Display) -> RunError {
    RunError::Persistence {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
