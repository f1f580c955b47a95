//! ZIP packaging of a job's completed files.
//!
//! Archives are built in memory per request: the set of completed items can
//! grow while a job is running, so a cached archive would go stale.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use thiserror::Error;
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use snaptap_media::unique_archive_name;
use snaptap_models::Job;

#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("no completed items to package")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Bundle the job's `done` items into a ZIP archive.
///
/// Only completed items are included, under their original filenames with
/// collisions de-duplicated. Items that are queued, in flight, or failed are
/// never part of the archive.
pub async fn build_zip(job: &Job) -> Result<Vec<u8>, PackagingError> {
    let files = job.completed_files();
    if files.is_empty() {
        return Err(PackagingError::Empty);
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(6));

    let mut used_names = HashSet::new();
    let mut written = 0usize;

    for name in files {
        let path = job.output_dir.join(name);
        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                // A done item whose file vanished is skipped, not fatal
                warn!(job_id = %job.id, file = %path.display(), "Skipping missing file: {}", e);
                continue;
            }
        };

        let entry_name = unique_archive_name(&mut used_names, name);
        writer.start_file(entry_name, options)?;
        writer.write_all(&contents)?;
        written += 1;
    }

    if written == 0 {
        return Err(PackagingError::Empty);
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
