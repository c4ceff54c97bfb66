use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::info;

use super::protocol::PROCESS_GINI_FLOAT;
use super::server::GiniRoutine;
use crate::error::NativeError;

/// Base name of the native library; the platform prefix/suffix is added.
pub const LIBRARY_NAME: &str = "giniprocessor";

type ProcessGiniFn = unsafe extern "C" fn(f32) -> i32;

/// The native library with `process_gini_float` resolved.
pub struct NativeGiniLibrary {
    func: ProcessGiniFn,
    path: PathBuf,
    // Must outlive `func`.
    _library: Library,
}

impl NativeGiniLibrary {
    pub fn load(path: &Path) -> Result<Self, NativeError> {
        info!(path = %path.display(), "looking for native library");
        if !path.exists() {
            return Err(NativeError::LibraryNotFound(path.to_path_buf()));
        }

        // SAFETY: the library is ours and runs no initialisers with
        // preconditions beyond being loaded once.
        let library = unsafe { Library::new(path) }.map_err(|source| NativeError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;

        // SAFETY: the exported symbol has the C signature `int (float)`.
        let func = unsafe {
            library
                .get::<ProcessGiniFn>(PROCESS_GINI_FLOAT.as_bytes())
                .map(|symbol| *symbol)
        }
        .map_err(|source| NativeError::SymbolNotFound {
            symbol: PROCESS_GINI_FLOAT.to_string(),
            source,
        })?;

        info!(symbol = PROCESS_GINI_FLOAT, "native library loaded");
        Ok(Self {
            func,
            path: path.to_path_buf(),
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GiniRoutine for NativeGiniLibrary {
    fn process_gini_float(&self, value: f32) -> i32 {
        // SAFETY: `func` stays valid while `_library` is loaded.
        unsafe { (self.func)(value) }
    }
}

/// The native library file next to the running executable.
pub fn default_library_path() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().map(PathBuf::from).unwrap_or_default();
    Ok(dir.join(libloading::library_filename(LIBRARY_NAME)))
}
