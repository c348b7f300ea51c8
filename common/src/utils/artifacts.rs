//! JSON artifacts exchanged between pipeline stages.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::AppError;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(format!("artifact {}", path.display()))
        } else {
            AppError::Io(err)
        }
    })?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    debug!(path = %path.display(), "loaded json artifact");
    Ok(value)
}

/// Writes `value` as pretty-printed JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    debug!(path = %path.display(), "wrote json artifact");
    Ok(())
}

pub fn ensure_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
