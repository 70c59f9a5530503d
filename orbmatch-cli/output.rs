use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use image::RgbImage;
use rand::{Rng, SeedableRng, rngs::StdRng};
use sha2::{Digest, Sha256};

use crate::error::{OrbMatchError, OrbMatchResult};

/// Files older than this are removed by the sweep
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(5 * 3600);

/// Source of "now" for naming and retention
pub trait Clock {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock stopped at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

/// `<image1>_<image2>[_<keyword>]` with every whitespace run turned into `_`
pub fn folder_name(image1: &str, image2: &str, keyword: Option<&str>) -> String {
    let base = match keyword {
        Some(k) => format!("{}_{}_{}", image1, image2, k),
        None => format!("{}_{}", image1, image2),
    };
    base.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Create (if needed) and return `<media_root>/<folder_name>`
pub fn create_image_folder<P: AsRef<Path>>(
    media_root: P,
    image1: &str,
    image2: &str,
    keyword: Option<&str>,
) -> OrbMatchResult<PathBuf> {
    let folder = media_root.as_ref().join(folder_name(image1, image2, keyword));
    std::fs::create_dir_all(&folder)?;
    Ok(folder)
}

/// Generates unique artifact paths under a media root
pub struct ArtifactNamer<R = StdRng, C = SystemClock> {
    media_root: PathBuf,
    rng: R,
    clock: C,
    sequence: u64,
}

impl ArtifactNamer {
    pub fn new<P: Into<PathBuf>>(media_root: P) -> Self {
        Self::with_sources(media_root, StdRng::from_os_rng(), SystemClock)
    }
}

impl<R: Rng, C: Clock> ArtifactNamer<R, C> {
    pub fn with_sources<P: Into<PathBuf>>(media_root: P, rng: R, clock: C) -> Self {
        Self {
            media_root: media_root.into(),
            rng,
            clock,
            sequence: 0,
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// `<media_root>/<folder>/[<keyword>_]<sha256-hex>.png`, never an existing file.
    ///
    /// An empty keyword counts as none. The folder is created if missing.
    pub fn generate(&mut self, image1: &str, image2: &str, keyword: Option<&str>) -> OrbMatchResult<PathBuf> {
        let keyword = keyword.filter(|k| !k.is_empty());
        let folder = create_image_folder(&self.media_root, image1, image2, keyword)?;
        let name = folder_name(image1, image2, keyword);

        loop {
            let stamp = DateTime::<Local>::from(self.clock.now()).format("%Y-%m-%d_%H-%M-%S");
            let random: u32 = self.rng.random_range(1000..=9999);
            self.sequence += 1;

            let digest = Sha256::digest(format!("{}_{}_{}_{}", name, stamp, random, self.sequence).as_bytes());
            let file_name = match keyword {
                Some(k) => format!("{}_{:x}.png", k, digest),
                None => format!("{:x}.png", digest),
            };

            let path = folder.join(file_name);
            if !path.exists() {
                return Ok(path);
            }
            log::debug!("{} already exists, drawing another name", path.display());
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
}

/// Delete regular files in `dir` whose age is strictly greater than `retention`.
///
/// Failures are logged and counted, never returned.
pub fn sweep_expired<P: AsRef<Path>, C: Clock>(dir: P, retention: Duration, clock: &C) -> SweepReport {
    let dir = dir.as_ref();
    let mut report = SweepReport::default();
    let now = clock.now();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot list {}: {}", dir.display(), e);
            return report;
        }
    };

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                log::warn!("Cannot read entry in {}: {}", dir.display(), e);
                report.failed += 1;
                continue;
            }
        };

        let modified = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta.modified(),
            Ok(_) => continue,
            Err(e) => Err(e),
        };
        let modified = match modified {
            Ok(time) => time,
            Err(e) => {
                log::warn!("Cannot stat {}: {}", path.display(), e);
                report.failed += 1;
                continue;
            }
        };

        // a timestamp in the future counts as age zero
        let age = now.duration_since(modified).unwrap_or_default();
        if age <= retention {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Deleted file: {}", path.display());
                report.removed += 1;
            }
            Err(e) => {
                log::warn!("Error deleting file {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }

    report
}

/// Write the annotated image; the format follows the extension
pub fn save_annotated<P: AsRef<Path>>(image: &RgbImage, path: P) -> OrbMatchResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save(path).map_err(|source| OrbMatchError::Encode {
        path: path.to_path_buf(),
        source,
    })
}

/// Presents a saved result to the user
pub trait Viewer {
    fn show(&self, path: &Path) -> std::io::Result<()>;
}

/// Shows nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Viewer for Headless {
    fn show(&self, path: &Path) -> std::io::Result<()> {
        log::debug!("Display skipped for {}", path.display());
        Ok(())
    }
}

/// Opens the platform image viewer and waits for it to exit
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemViewer;

impl SystemViewer {
    fn command(path: &Path) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg("-W").arg(path);
            cmd
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "/WAIT", ""]).arg(path);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(path);
            cmd
        }
    }
}

impl Viewer for SystemViewer {
    fn show(&self, path: &Path) -> std::io::Result<()> {
        let status = Self::command(path).status()?;
        if !status.success() {
            log::warn!("Image viewer exited with {}", status);
        }
        Ok(())
    }
}
