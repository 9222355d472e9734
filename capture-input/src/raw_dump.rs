// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! One-shot raw video dump.
//!
//! [`request_raw_video_dump`] arms a process-wide switch; the next video frame
//! any decoder accepts is written verbatim to disk and the switch disarms
//! itself. The decoder is the only reader.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use tracing::info;

use crate::Result;

static DUMP_NEXT_VIDEO_FRAME: AtomicBool = AtomicBool::new(false);

/// Arms the dump for the next received video frame.
pub fn request_raw_video_dump() {
    DUMP_NEXT_VIDEO_FRAME.store(true, Ordering::SeqCst);
}

/// `true` while a dump is armed and not yet taken.
pub fn is_raw_video_dump_pending() -> bool {
    DUMP_NEXT_VIDEO_FRAME.load(Ordering::SeqCst)
}

/// Disarms the switch, returning whether it was armed.
pub(crate) fn take_raw_video_dump_request() -> bool {
    DUMP_NEXT_VIDEO_FRAME.swap(false, Ordering::SeqCst)
}

/// Writes `data` to `directory/file_name`, creating the directory if needed.
pub(crate) fn write_raw_file(directory: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(directory)?;
    let path = directory.join(file_name);
    fs::write(&path, data)?;
    info!("Wrote {} bytes of raw video to {}", data.len(), path.display());
    Ok(path)
}
