// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Logging setup - console output plus a size-rotated log file

use anyhow::{Context, Result};
use chrono::Local;
use parking_lot::{Mutex, MutexGuard};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const BACKUP_SUFFIX_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Installs the global subscriber: console always, file when enabled
pub fn init(level: Level, debug: bool, config: &LoggingConfig) -> Result<()> {
    let file_layer = if config.file_enabled {
        let file = RotatingFile::open(&config.file_path(), config.max_file_bytes)
            .with_context(|| format!("opening log file {:?}", config.file_path()))?;
        Some(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(true),
        )
    } else {
        None
    };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(debug)
        .with_line_number(debug)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(console_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

/// Subscriber used before the configuration, and thus the log file, is known
pub fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    fmt::Subscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish()
}

/// Append-only log file that is moved to `<name>.<timestamp>` once it grows
/// past `max_bytes`
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    state: Mutex<FileState>,
}

#[derive(Debug)]
struct FileState {
    file: File,
    len: u64,
}

impl RotatingFile {
    pub fn open(path: &Path, max_bytes: u64) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        match fs::metadata(path) {
            Ok(meta) if meta.len() > max_bytes => {
                fs::rename(path, backup_path(path))?;
            }
            _ => {}
        }

        let file = append(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            state: Mutex::new(FileState { file, len }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rotate(&self, state: &mut FileState) -> io::Result<()> {
        state.file.flush()?;
        fs::rename(&self.path, backup_path(&self.path))?;
        state.file = append(&self.path)?;
        state.len = 0;
        Ok(())
    }
}

fn append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(Local::now().format(BACKUP_SUFFIX_FORMAT).to_string());
    PathBuf::from(name)
}

/// Writer handed out per log line; holds the file lock for that line
pub struct RotatingWriter<'a> {
    owner: &'a RotatingFile,
    state: MutexGuard<'a, FileState>,
}

impl Write for RotatingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.state.len > self.owner.max_bytes {
            self.owner.rotate(&mut self.state)?;
        }
        let written = self.state.file.write(buf)?;
        self.state.len += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RotatingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriter {
            owner: self,
            state: self.state.lock(),
        }
    }
}
