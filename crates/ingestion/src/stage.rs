//! Temp-file staging for container libraries.
//!
//! The NetCDF and HDF5 C libraries need a file path and cannot read from
//! memory, so in-memory sources are written to a temp file for the
//! duration of the parse. On Linux we prefer /dev/shm (memory-backed
//! tmpfs) to keep the round trip cheap.

use std::io::Write;
use std::path::{Path, PathBuf};

use geo_common::IngestResult;
use tempfile::NamedTempFile;

/// Pick the fastest writable temp directory available.
fn optimal_temp_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm = Path::new("/dev/shm");
        if shm.is_dir() {
            let probe = shm.join(format!(".geoscope_probe_{}", std::process::id()));
            if std::fs::write(&probe, b"probe").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return shm.to_path_buf();
            }
        }
    }

    std::env::temp_dir()
}

/// Write `data` to a uniquely named temp file with the given suffix.
///
/// The file is removed when the returned handle drops, so it lives exactly
/// as long as the parse that staged it. The suffix matters: the container
/// libraries sniff it when deciding how to open the file.
pub(crate) fn stage_bytes(data: &[u8], suffix: &str) -> IngestResult<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("geoscope_")
        .suffix(suffix)
        .tempfile_in(optimal_temp_dir())?;
    file.write_all(data)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_writes_content_with_suffix() {
        let staged = stage_bytes(b"hello", ".nc").unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.extension().is_some_and(|e| e == "nc"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        drop(staged);
        assert!(!path.exists());
    }
}
