//! Find PHP files to analyze
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Mutex,
};

use ignore::{
    WalkBuilder, WalkState,
    types::{Types, TypesBuilder},
};
use tracing::debug;

use crate::{
    error::{Error, Result},
    prelude::OrPanic as _,
};

/// The name of the custom ignore file, same syntax as `.gitignore`
pub const IGNORE_FILE_NAME: &str = ".kphpignore";

fn canonicalize(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).map_err(|err| Error::IOError {
        path: path.to_path_buf(),
        err,
    })
}

fn is_php_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
}

/// A file type filter matching `*.php` regardless of case
fn php_types() -> Types {
    let mut builder = TypesBuilder::new();
    builder
        .add("php", "*.[pP][hH][pP]")
        .or_panic("glob should be valid");
    builder
        .select("php")
        .build()
        .or_panic("types builder should build")
}

/// Walk the given folders in parallel and collect the PHP files that are not ignored or excluded
fn walk_dirs(dirs: &[PathBuf], exclude: &[PathBuf]) -> Vec<PathBuf> {
    let Some((first, others)) = dirs.split_first() else {
        return Vec::new();
    };
    let mut builder = WalkBuilder::new(first);
    for dir in others {
        builder.add(dir);
    }
    builder
        .hidden(false)
        .git_global(false)
        .git_exclude(false)
        .add_custom_ignore_filename(IGNORE_FILE_NAME)
        .types(php_types());

    let found = Mutex::new(Vec::new());
    builder.build_parallel().run(|| {
        let found = &found;
        Box::new(move |entry| {
            let Ok(entry) = entry else {
                return WalkState::Continue;
            };
            let path = entry.path();
            if exclude.iter().any(|p| p == path) {
                // excluded folders are not visited at all
                return WalkState::Skip;
            }
            if entry.file_type().is_some_and(|t| t.is_file()) {
                found
                    .lock()
                    .or_panic("mutex should not be poisoned")
                    .push(path.to_path_buf());
            }
            WalkState::Continue
        })
    });
    found.into_inner().or_panic("mutex should not be poisoned")
}

/// Find paths to PHP files in the provided parent paths.
///
/// Folders are walked in parallel. Files given explicitly are kept if they have a `.php` extension, even if an ignore
/// file would exclude them; other explicit files are skipped. An optional list of excluded paths (files or folders) can
/// be provided too.
///
/// `.ignore`, `.gitignore` and `.kphpignore` files are honored inside of folders. Global git ignore configurations as
/// well as parent folder gitignores are not taken into account. Hidden files are included.
///
/// Returned paths are canonicalized and unique.
pub fn find_php_files<T: AsRef<Path>>(
    paths: &[T],
    exclude: &[T],
    sort: bool,
) -> Result<Vec<PathBuf>> {
    let exclude = exclude
        .iter()
        .map(|p| canonicalize(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for path in paths {
        let path = canonicalize(path.as_ref())?;
        if path.is_dir() {
            dirs.push(path);
        } else if !is_php_file(&path) {
            debug!(?path, "skipping non-PHP file");
        } else if !exclude.contains(&path) {
            files.push(path);
        }
    }
    files.extend(walk_dirs(&dirs, &exclude));

    // overlapping inputs yield the same file more than once
    let mut seen = HashSet::new();
    files.retain(|p| seen.insert(p.clone()));
    if sort {
        files.sort_unstable();
    }
    debug!(count = files.len(), "found PHP files");
    Ok(files)
}
