//! Path-based load and save.

use alloc::vec::Vec;
use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use crate::decode::{DecodeRequest, Decoded};
use crate::encode::EncodeRequest;
use crate::error::RasterError;
use crate::surface::Surface;

/// Read and decode a file with default options.
pub fn load(path: impl AsRef<Path>) -> Result<Decoded, RasterError> {
    let data = read(path.as_ref())?;
    DecodeRequest::new(&data).decode()
}

/// Read a file and decode it with `configure` applied to the request.
///
/// ```no_run
/// let decoded = zenraster::fs::load_with("anim.gif", |r| r.with_screens(true))?;
/// # Ok::<(), zenraster::RasterError>(())
/// ```
pub fn load_with(
    path: impl AsRef<Path>,
    configure: impl for<'a> FnOnce(DecodeRequest<'a>) -> DecodeRequest<'a>,
) -> Result<Decoded, RasterError> {
    let data = read(path.as_ref())?;
    configure(DecodeRequest::new(&data)).decode()
}

fn read(path: &Path) -> Result<Vec<u8>, RasterError> {
    let data = std::fs::read(path)?;
    log::debug!("read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Write `bytes` to `path`. A partially written file is removed.
pub fn save(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), RasterError> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
        log::warn!("writing {} failed, removing it: {e}", path.display());
        let _ = std::fs::remove_file(path);
        return Err(e.into());
    }
    Ok(())
}

/// Encode `surface` with `request` and save it. Nothing is written when
/// encoding fails.
pub fn save_image(
    path: impl AsRef<Path>,
    surface: &Surface,
    request: &EncodeRequest,
) -> Result<(), RasterError> {
    let bytes = request.encode(surface)?;
    save(path, &bytes)
}
