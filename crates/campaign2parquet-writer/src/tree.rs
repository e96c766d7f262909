//! Directory-tree operations over an opendal operator.
//!
//! Object stores have no rename, so a move is read + write + delete per file.

use opendal::{EntryMode, ErrorKind, Operator};

use crate::error::{Result, WriterError};

/// List every file below `dir` (which must end in `/`), as full paths.
pub(crate) async fn list_files(op: &Operator, dir: &str) -> Result<Vec<String>> {
    let entries = match op.list_with(dir).recursive(true).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(WriterError::write_failure(format!(
                "Failed to list '{}': {}",
                dir, e
            )))
        }
    };

    let mut files: Vec<String> = entries
        .into_iter()
        .filter(|entry| entry.metadata().mode() == EntryMode::FILE)
        .map(|entry| entry.path().to_string())
        .collect();
    files.sort();
    Ok(files)
}

/// Copy every file under `from` to the same relative path under `to`, then
/// remove the source tree including its directories. Returns the destination
/// paths.
pub(crate) async fn move_tree(op: &Operator, from: &str, to: &str) -> Result<Vec<String>> {
    let files = list_files(op, from).await?;
    let mut moved = Vec::with_capacity(files.len());

    for source in &files {
        let relative = source.strip_prefix(from).unwrap_or(source);
        let target = format!("{}{}", to, relative);
        copy_file(op, source, &target).await?;
        moved.push(target);
    }

    remove_tree(op, from).await?;
    Ok(moved)
}

/// Delete every file under `dir`, then the directory markers themselves.
pub(crate) async fn remove_tree(op: &Operator, dir: &str) -> Result<()> {
    let entries = match op.list_with(dir).recursive(true).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(WriterError::write_failure(format!(
                "Failed to list '{}': {}",
                dir, e
            )))
        }
    };

    let (files, mut dirs): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .map(|entry| (entry.metadata().mode(), entry.path().to_string()))
        .partition(|(mode, _)| *mode == EntryMode::FILE);

    for (_, path) in &files {
        delete_file(op, path).await?;
    }

    // Deepest directories first; filesystem backends refuse non-empty ones.
    // Leftover empty directories are harmless, so failures are only logged.
    dirs.retain(|(_, path)| path != dir);
    dirs.sort_by_key(|(_, path)| std::cmp::Reverse(path.len()));
    for path in dirs.iter().map(|(_, path)| path.as_str()).chain([dir]) {
        if let Err(e) = delete_file(op, path).await {
            tracing::debug!(path, error = %e, "Leaving directory in place");
        }
    }
    Ok(())
}

pub(crate) async fn copy_file(op: &Operator, from: &str, to: &str) -> Result<()> {
    let data = op.read(from).await.map_err(|e| {
        WriterError::write_failure(format!("Failed to read '{}': {}", from, e))
    })?;
    op.write(to, data).await.map_err(|e| {
        WriterError::write_failure(format!("Failed to write '{}': {}", to, e))
    })?;
    Ok(())
}

pub(crate) async fn delete_file(op: &Operator, path: &str) -> Result<()> {
    match op.delete(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(WriterError::write_failure(format!(
            "Failed to delete '{}': {}",
            path, e
        ))),
    }
}
