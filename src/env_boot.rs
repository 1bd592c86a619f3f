use std::path::PathBuf;

/// Load .env from the working directory; if missing, try the crate root.
/// Returns the file that was loaded, if any.
pub fn ensure_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenv::dotenv() {
        return Some(path);
    }
    let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".env");
    dotenv::from_path(&candidate).ok().map(|_| candidate)
}
