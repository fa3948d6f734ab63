//! File IO for point clouds.
//!
//! The format specific code lives in the submodules. The point cloud
//! operations at the crate root are built on top of them.

use std::path::Path;


pub mod parse;
pub mod ply;

#[cfg(test)]
mod tests;


/// Returns `true` if the path has the extension `ply`, matched
/// case-insensitively. Paths without extension or with a non-UTF8 one
/// return `false`.
pub fn is_ply_extension(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("ply"))
}
