use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::nbt::{self, NbtError, Tag};

/// In-game ticks per day in the modern schema's absolute time counter.
pub const TICKS_PER_DAY: i64 = 24000;

/// Errors surfaced while deriving the current day from a save file.
///
/// Any of these terminates the watch loop; a failed read never mutates
/// extractor state, so a hypothetical retry would resume cleanly.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("decode: {0}")]
    Nbt(#[from] NbtError),
    #[error("missing `{0}` section")]
    MissingSection(&'static str),
    #[error("missing `{0}` field")]
    MissingField(&'static str),
    #[error("`{field}` is not a {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },
}

/// The two save-file schemas, chosen once from the file extension and
/// fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// `level.dat` — absolute tick counter under `Data`.
    Modern,
    /// `.mclevel` — 16-bit within-day clock under `Environment`.
    Indev,
}

impl SaveFormat {
    /// Only the `.mclevel` extension selects Indev; everything else is
    /// read as a modern `level.dat`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mclevel") => SaveFormat::Indev,
            _ => SaveFormat::Modern,
        }
    }
}

/// One observation of the world clock. Built fresh on every poll, never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub world_name: String,
    pub day: i64,
    pub observed_at: DateTime<Utc>,
}

/// Cross-poll state owned by the watch loop and mutated only by
/// [`DayExtractor::compute`] (on success) and [`ExtractorState::record`].
///
/// The Indev counter advances by exactly one per observed decrease of the
/// within-day clock. If the poll interval is coarse enough for the clock
/// to wrap more than once between reads, the extra days are lost; an
/// accepted limitation of the wrap heuristic.
#[derive(Debug, Clone)]
pub struct ExtractorState {
    last_day: Option<i64>,
    indev_day: i64,
    last_sub_day_tick: i16,
}

impl ExtractorState {
    pub fn new() -> Self {
        Self {
            last_day: None,
            indev_day: -1,
            last_sub_day_tick: 0,
        }
    }

    /// The day most recently recorded by the watch loop, `None` before the
    /// first successful poll.
    pub fn last_day(&self) -> Option<i64> {
        self.last_day
    }

    /// Record a freshly computed day, returning whether it differs from
    /// the previous one. The unset sentinel never equals a real day, so
    /// the first successful poll always reports a change.
    pub fn record(&mut self, day: i64) -> bool {
        let changed = self.last_day != Some(day);
        self.last_day = Some(day);
        changed
    }
}

impl Default for ExtractorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the world name and current day from a parsed tag tree.
pub struct DayExtractor {
    path: PathBuf,
    format: SaveFormat,
}

impl DayExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SaveFormat::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SaveFormat {
        self.format
    }

    /// Read and decode the level file, then compute a snapshot.
    pub fn read(&self, state: &mut ExtractorState) -> Result<WorldSnapshot, ReadError> {
        let (_, root) = nbt::read_file(&self.path)?;
        self.compute(&root, state)
    }

    /// Compute the current snapshot from an already-decoded tag tree.
    ///
    /// Modern is a pure re-derivation (the counter in the file is absolute
    /// and monotonic); Indev consults and advances the wrap counter in
    /// `state`. Errors leave `state` untouched.
    pub fn compute(
        &self,
        root: &Tag,
        state: &mut ExtractorState,
    ) -> Result<WorldSnapshot, ReadError> {
        let (world_name, day) = match self.format {
            SaveFormat::Modern => self.compute_modern(root)?,
            SaveFormat::Indev => self.compute_indev(root, state)?,
        };
        debug!(world = %world_name, day, format = ?self.format, "computed snapshot");
        Ok(WorldSnapshot {
            world_name,
            day,
            observed_at: Utc::now(),
        })
    }

    fn compute_modern(&self, root: &Tag) -> Result<(String, i64), ReadError> {
        let data = root
            .get("Data")
            .filter(|t| t.as_compound().is_some())
            .ok_or(ReadError::MissingSection("Data"))?;

        // A missing or non-string LevelName falls back to the directory
        // holding the save, which is the world name in modern layouts.
        let world_name = data
            .get("LevelName")
            .and_then(Tag::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| self.parent_dir_name());

        // DayTime is the wall clock; older saves only carry Time. A
        // wrongly-typed DayTime falls through to Time, a wrongly-typed
        // Time is an error, and a world with neither reads as tick zero.
        let ticks = match data.get("DayTime").and_then(Tag::as_long) {
            Some(ticks) => ticks,
            None => match data.get("Time") {
                Some(Tag::Long(ticks)) => *ticks,
                Some(_) => {
                    return Err(ReadError::TypeMismatch {
                        field: "Time",
                        expected: "long",
                    })
                }
                None => 0,
            },
        };

        Ok((world_name, ticks / TICKS_PER_DAY))
    }

    fn compute_indev(
        &self,
        root: &Tag,
        state: &mut ExtractorState,
    ) -> Result<(String, i64), ReadError> {
        let environment = root
            .get("Environment")
            .filter(|t| t.as_compound().is_some())
            .ok_or(ReadError::MissingSection("Environment"))?;

        let tick = match environment.get("TimeOfDay") {
            Some(Tag::Short(tick)) => *tick,
            Some(_) => {
                return Err(ReadError::TypeMismatch {
                    field: "TimeOfDay",
                    expected: "short",
                })
            }
            None => return Err(ReadError::MissingField("TimeOfDay")),
        };

        // All reads succeeded; state mutation only happens past this point.
        let mut day = state.indev_day;
        if tick < state.last_sub_day_tick {
            day += 1;
        }
        state.indev_day = day;
        state.last_sub_day_tick = tick;

        let world_name = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("world")
            .to_string();
        Ok((world_name, day))
    }

    fn parent_dir_name(&self) -> String {
        self.path
            .parent()
            .and_then(Path::file_name)
            .and_then(|s| s.to_str())
            .unwrap_or("world")
            .to_string()
    }
}
