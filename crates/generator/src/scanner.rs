use pagegen_core::Result;
use std::fs;
use std::path::Path;

/// Names of the immediate subdirectories of `dir`, in filesystem order.
///
/// Fails if `dir` does not exist; callers check for it first.
pub fn list_subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir()
            && let Some(name) = entry.file_name().to_str()
        {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
