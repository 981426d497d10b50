use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::time::Instant;

use camino::Utf8Path;
use clap::ValueEnum;
use tracing::debug;

use crate::app::{ProgressEvent, ProgressSink};
use crate::error::FetchError;
use crate::index::{ByteRange, IndexTable};
use crate::remote::RemoteClient;
use crate::resolver::GribLocation;
use crate::store::{Store, format_message};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorMode {
    Warn,
    Raise,
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMode::Warn => write!(f, "warn"),
            ErrorMode::Raise => write!(f, "raise"),
        }
    }
}

pub struct Transfer<'a, C: RemoteClient> {
    client: &'a C,
}

impl<'a, C: RemoteClient> Transfer<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn whole(
        &self,
        location: &GribLocation,
        dest: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<u64, FetchError> {
        Store::ensure_parent(dest)?;
        match location {
            GribLocation::Remote(url) => {
                let parent = dest.parent().ok_or_else(|| {
                    FetchError::Filesystem(format!("download path has no parent: {dest}"))
                })?;
                let mut temp = tempfile::Builder::new()
                    .prefix(".gribfetch-")
                    .tempfile_in(parent.as_std_path())
                    .map_err(|err| FetchError::Filesystem(err.to_string()))?;

                let started = Instant::now();
                let mut last_report = 0u64;
                let bytes = {
                    let mut on_progress = |transferred: u64, total: Option<u64>| match total {
                        Some(total) if total > 0 => {
                            let percent = transferred * 100 / total;
                            if percent != last_report {
                                last_report = percent;
                                sink.event(ProgressEvent {
                                    message: format!(
                                        "transferred {percent}% of {:.1} MB",
                                        total as f64 / 1_000_000.0
                                    ),
                                    elapsed: None,
                                });
                            }
                        }
                        _ => {
                            if transferred - last_report >= 8 * 1024 * 1024 {
                                last_report = transferred;
                                sink.event(ProgressEvent {
                                    message: format!(
                                        "transferred {:.1} MB",
                                        transferred as f64 / 1_000_000.0
                                    ),
                                    elapsed: None,
                                });
                            }
                        }
                    };
                    self.client.download(url, temp.as_file_mut(), &mut on_progress)?
                };

                if dest.as_std_path().exists() {
                    fs::remove_file(dest.as_std_path())
                        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
                }
                temp.persist(dest.as_std_path())
                    .map_err(|err| FetchError::Filesystem(err.to_string()))?;
                sink.event(ProgressEvent {
                    message: format!("downloaded {url} -> {dest}"),
                    elapsed: Some(started.elapsed()),
                });
                Ok(bytes)
            }
            GribLocation::Local(path) => {
                if path == dest {
                    let metadata = fs::metadata(path.as_std_path())
                        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
                    return Ok(metadata.len());
                }
                fs::copy(path.as_std_path(), dest.as_std_path())
                    .map_err(|err| FetchError::Filesystem(err.to_string()))
            }
        }
    }

    pub fn subset(
        &self,
        location: &GribLocation,
        table: &IndexTable,
        dest: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<u64, FetchError> {
        Store::ensure_parent(dest)?;
        let started = Instant::now();

        let mut entries = table.entries.clone();
        entries.sort_by(|a, b| {
            a.message
                .partial_cmp(&b.message)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut total = 0u64;
        for (position, entry) in entries.iter().enumerate() {
            sink.event(ProgressEvent {
                message: format!(
                    "message {}: {} [{}]",
                    format_message(entry.message),
                    entry.search_key(),
                    entry.range
                ),
                elapsed: None,
            });
            // The first message recreates the file; the rest append, which
            // yields a valid multi-message GRIB2 stream.
            let mut file = if position == 0 {
                File::create(dest.as_std_path())
                    .map_err(|err| FetchError::Filesystem(err.to_string()))?
            } else {
                OpenOptions::new()
                    .append(true)
                    .open(dest.as_std_path())
                    .map_err(|err| FetchError::Filesystem(err.to_string()))?
            };
            let range = entry.byte_range();
            total += match location {
                GribLocation::Remote(url) => self.client.download_range(url, &range, &mut file)?,
                GribLocation::Local(path) => copy_local_range(path, &range, &mut file)?,
            };
        }

        debug!(messages = entries.len(), bytes = total, dest = %dest, "subset assembled");
        sink.event(ProgressEvent {
            message: format!("downloaded {} messages -> {dest}", entries.len()),
            elapsed: Some(started.elapsed()),
        });
        Ok(total)
    }
}

fn copy_local_range(
    path: &Utf8Path,
    range: &ByteRange,
    dest: &mut dyn Write,
) -> Result<u64, FetchError> {
    let mut file =
        File::open(path.as_std_path()).map_err(|err| FetchError::Filesystem(err.to_string()))?;
    file.seek(SeekFrom::Start(range.start))
        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    let copied = match range.end {
        // Byte ranges are inclusive of the end byte, matching HTTP Range
        // semantics and the ranges advertised by wgrib2 index files.
        Some(end) => {
            let length = end + 1 - range.start;
            io::copy(&mut Read::by_ref(&mut file).take(length), dest)
        }
        None => io::copy(&mut file, dest),
    };
    copied.map_err(|err| FetchError::Filesystem(err.to_string()))
}
