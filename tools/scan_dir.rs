mod config;

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use config::{config_path_from_env, load_or_create_config, resolve_media_dir};
use metadata::{tags_to_track, FilePipeline, Scanner};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;
use walkdir::WalkDir;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let media_dir = env::args()
        .nth(1)
        .or_else(|| env::var("MEDIA_DIR").ok())
        .map(PathBuf::from)
        .or_else(|| resolve_media_dir(&config_path, &config.media_dir));
    let media_dir = match media_dir {
        Some(dir) => std::fs::canonicalize(dir)?,
        None => {
            warn!("Config value media_dir is not set.");
            return Ok(());
        }
    };

    let files = media_files(&media_dir, &config.extensions);
    let mut scanner = Scanner::with_config(FilePipeline::new(), config.scanner());
    info!(
        "Scanning {} files under {:?} (timeout {}ms)",
        files.len(),
        media_dir,
        scanner.config().timeout_ms
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut added = 0usize;
    let mut failed = 0usize;

    for path in files {
        let uri = match Url::from_file_path(&path) {
            Ok(url) => url.to_string(),
            Err(_) => {
                warn!("Skipping {:?}: not an absolute path", path);
                failed += 1;
                continue;
            }
        };

        match scanner.scan(&uri) {
            Ok(result) => {
                if result.tags.is_empty() {
                    debug!("No tags found in {}", uri);
                }
                let mut track = tags_to_track(&result.tags);
                track.uri = Some(uri);
                track.length = result.duration_ms;
                serde_json::to_writer(&mut out, &track)?;
                writeln!(out)?;
                debug!("Added {:?}", track.uri);
                added += 1;
            }
            Err(err) => {
                warn!("Failed {}: {}", uri, err);
                failed += 1;
            }
        }
    }

    info!("Done scanning: {} tracks added, {} failed", added, failed);
    Ok(())
}

fn media_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if entry.file_type().is_file() && has_media_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    files
}

fn has_media_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .map(|ext| extensions.iter().any(|allowed| *allowed == ext))
        .unwrap_or(false)
}
