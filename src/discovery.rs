use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions treated as HTML pages
pub const PAGE_EXTENSIONS: &[&str] = &["html", "htm"];

/// Infix marking files this tool wrote, so reruns never process their own output
pub const OUTPUT_MARKER: &str = ".neutral.";

/// Configuration for file discovery behavior
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
}

/// Result of file discovery validation
#[derive(Debug, Clone)]
pub struct FileValidation {
    pub path: PathBuf,
    pub error: Option<String>,
}

/// Check if a path names an HTML page this tool should read
pub fn is_page_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let is_html = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PAGE_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p)));
    is_html && !name.contains(OUTPUT_MARKER)
}

/// Expand input paths into page files: files are taken as given, directories are walked
/// Results are sorted and deduplicated so runs are reproducible
pub async fn collect_discovered_files(
    inputs: &[PathBuf],
    config: &DiscoveryConfig,
) -> Result<Vec<FileValidation>> {
    let mut files = Vec::new();

    for input in inputs {
        let metadata = match fs::metadata(input).await {
            Ok(metadata) => metadata,
            Err(e) => {
                let error = format!("Cannot access input {}: {}", input.display(), e);
                warn!("{}", error);
                if config.fail_fast {
                    return Err(anyhow::anyhow!(error));
                }
                files.push(FileValidation {
                    path: input.clone(),
                    error: Some(error),
                });
                continue;
            }
        };

        if metadata.is_file() {
            // WHY: an explicitly named file is processed whatever its extension
            files.push(FileValidation {
                path: input.clone(),
                error: None,
            });
            continue;
        }

        info!("Starting directory traversal in: {}", input.display());
        for entry in WalkDir::new(input).follow_links(false) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_page_file(entry.path()) {
                        debug!("Found page file: {}", entry.path().display());
                        files.push(FileValidation {
                            path: entry.into_path(),
                            error: None,
                        });
                    }
                }
                Err(e) => {
                    let error = format!("Directory walk error under {}: {}", input.display(), e);
                    warn!("{}", error);
                    if config.fail_fast {
                        return Err(anyhow::anyhow!(error));
                    }
                    if let Some(path) = e.path() {
                        files.push(FileValidation {
                            path: path.to_path_buf(),
                            error: Some(error),
                        });
                    }
                }
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);

    let valid_count = files.iter().filter(|f| f.error.is_none()).count();
    let invalid_count = files.len() - valid_count;
    if invalid_count > 0 {
        warn!("Found {} inputs with validation issues", invalid_count);
    }
    info!("File discovery summary: {} valid, {} invalid", valid_count, invalid_count);

    Ok(files)
}

/// Convenience function returning only the valid page paths
pub async fn find_page_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let validations = collect_discovered_files(inputs, &DiscoveryConfig::default()).await?;
    Ok(validations
        .into_iter()
        .filter(|v| v.error.is_none())
        .map(|v| v.path)
        .collect())
}
