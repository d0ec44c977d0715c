//! Log file writer that rolls over on calendar-month boundaries.
//!
//! The active file keeps its name (`download.log`). When the first line of a
//! new month is written, the current file is renamed to
//! `download.log.YYYY-MM` after the month it covers and a fresh file is
//! started. Old rotations are never removed.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Datelike, Local, TimeZone};
use tracing_subscriber::fmt::MakeWriter;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    #[must_use]
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    #[must_use]
    pub fn of<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self::new(at.year(), at.month())
    }

    /// The current month in local time.
    #[must_use]
    pub fn current() -> Self {
        Self::of(&Local::now())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

struct RollingState {
    file: File,
    month: YearMonth,
}

/// `MakeWriter` over a monthly-rotated file.
pub struct MonthlyRollingFile {
    path: PathBuf,
    state: Mutex<RollingState>,
}

impl MonthlyRollingFile {
    /// Opens `path` for appending, first rotating it away if it was last
    /// written in an earlier month.
    ///
    /// # Errors
    ///
    /// Returns the IO error if the file cannot be opened or rotated.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        Self::open_at(path, YearMonth::current())
    }

    /// Like [`open`](Self::open) with an explicit current month.
    ///
    /// # Errors
    ///
    /// Returns the IO error if the file cannot be opened or rotated.
    pub fn open_at(path: impl Into<PathBuf>, now: YearMonth) -> io::Result<Self> {
        let path = path.into();

        if let Some(last_written) = last_written_month(&path)?
            && last_written < now
        {
            rotate(&path, last_written)?;
        }

        let file = open_append(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(RollingState { file, month: now }),
        })
    }

    /// Path of the active file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `buf`, rotating first if `now` is past the active file's month.
    ///
    /// # Errors
    ///
    /// Returns the IO error from rotating or writing.
    pub fn write_at(&self, buf: &[u8], now: YearMonth) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if now > state.month {
            state.file.flush()?;
            rotate(&self.path, state.month)?;
            state.file = open_append(&self.path)?;
            state.month = now;
        }
        state.file.write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .file
            .flush()
    }
}

/// Per-event handle returned by [`MonthlyRollingFile::make_writer`].
pub struct RollingWriter<'a> {
    inner: &'a MonthlyRollingFile,
}

impl Write for RollingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write_at(buf, YearMonth::current())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<'a> MakeWriter<'a> for MonthlyRollingFile {
    type Writer = RollingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter { inner: self }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Month of the last write to a non-empty existing file.
fn last_written_month(path: &Path) -> io::Result<Option<YearMonth>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if metadata.len() == 0 {
        return Ok(None);
    }
    let modified: DateTime<Local> = metadata.modified()?.into();
    Ok(Some(YearMonth::of(&modified)))
}

/// Renames the active file to `<name>.<YYYY-MM>`, adding `.N` if taken.
fn rotate(path: &Path, month: YearMonth) -> io::Result<PathBuf> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = format!("{file_name}.{month}");

    let mut target = path.with_file_name(&base);
    let mut n = 1;
    while target.exists() {
        target = path.with_file_name(format!("{base}.{n}"));
        n += 1;
    }
    fs::rename(path, &target)?;
    Ok(target)
}
