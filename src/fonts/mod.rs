//! Font discovery for report rendering.
//!
//! `genpdf` embeds TrueType fonts, so a complete regular/bold/italic/bold-italic family has to be
//! found on disk before a document can be built.  The bundled Roboto family is searched first;
//! when it is missing the loader falls back to common system families.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Overrides the directory searched for the bundled family.
pub const FONTS_DIR_ENV: &str = "LCA_REPORT_FONTS_DIR";

/// Overrides the directory searched for system fallback families.
pub const SYSTEM_FONTS_DIR_ENV: &str = "LCA_REPORT_SYSTEM_FONTS_DIR";

const BUNDLED_FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// File names of a four-style family installed outside the crate.
struct SystemFamily {
    name: &'static str,
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
    directories: &'static [&'static str],
}

impl SystemFamily {
    fn files(&self) -> [(&'static str, &'static str); 4] {
        [
            (self.regular, "regular"),
            (self.bold, "bold"),
            (self.italic, "italic"),
            (self.bold_italic, "bold italic"),
        ]
    }
}

const SYSTEM_FAMILIES: &[SystemFamily] = &[
    SystemFamily {
        name: "Liberation Sans",
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
        directories: &[
            "/usr/share/fonts/truetype/liberation",
            "/usr/share/fonts/truetype/liberation2",
            "/usr/share/fonts/liberation-sans",
            "/usr/share/fonts/liberation",
        ],
    },
    SystemFamily {
        name: "DejaVu Sans",
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
        directories: &[
            "/usr/share/fonts/truetype/dejavu",
            "/usr/share/fonts/dejavu-sans-fonts",
            "/usr/share/fonts/dejavu",
            "/usr/share/fonts/TTF",
        ],
    },
    SystemFamily {
        name: "Arial",
        regular: "arial.ttf",
        bold: "arialbd.ttf",
        italic: "ariali.ttf",
        bold_italic: "arialbi.ttf",
        directories: &[],
    },
];

/// Directory holding the fonts shipped with the crate sources.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn push_unique(candidates: &mut Vec<PathBuf>, candidate: PathBuf) {
    if !candidates.iter().any(|existing| existing == &candidate) {
        candidates.push(candidate);
    }
}

fn bundled_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push_unique(&mut candidates, path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push_unique(&mut candidates, bin_dir.join("assets/fonts"));
        }
    }

    push_unique(&mut candidates, bundled_fonts_source_dir());
    candidates
}

fn missing_files<'a>(directory: &Path, files: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    files
        .into_iter()
        .filter(|name| !directory.join(name).is_file())
        .map(str::to_owned)
        .collect()
}

fn describe_attempt(directory: &Path, missing: &[String]) -> String {
    let reason = if !directory.is_dir() {
        "directory missing".to_owned()
    } else {
        format!("missing files [{}]", missing.join(", "))
    };
    format!("{} ({})", directory.display(), reason)
}

fn not_found(message: String, detail: &str) -> Error {
    Error::new(message, io::Error::new(io::ErrorKind::NotFound, detail))
}

fn resolve_bundled_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in bundled_directory_candidates() {
        let missing = missing_files(&candidate, BUNDLED_FONT_FILES.iter().copied());
        if candidate.is_dir() && missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(describe_attempt(&candidate, &missing));
    }

    Err(not_found(
        format!(
            "Unable to locate bundled font directory. Checked: {}. See assets/fonts/README.md or set {}.",
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        "bundled fonts directory not found",
    ))
}

fn load_bundled_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_bundled_directory()?;

    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load default font family '{}' from {}: {}",
                DEFAULT_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn system_directory_candidates(family: &SystemFamily) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(SYSTEM_FONTS_DIR_ENV) {
        push_unique(&mut candidates, path);
    }

    for directory in family.directories {
        push_unique(&mut candidates, PathBuf::from(directory));
    }

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env_path(var) {
                push_unique(&mut candidates, root.join("Fonts"));
            }
        }
    }

    candidates
}

fn resolve_system_directory(family: &SystemFamily) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in system_directory_candidates(family) {
        let missing = missing_files(&candidate, family.files().iter().map(|(file, _)| *file));
        if candidate.is_dir() && missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(describe_attempt(&candidate, &missing));
    }

    Err(not_found(
        format!(
            "System font family '{}' not found. Checked: {}",
            family.name,
            if attempts.is_empty() {
                "no search paths were available".to_owned()
            } else {
                attempts.join(", ")
            }
        ),
        "system fonts directory not found",
    ))
}

fn load_system_font(directory: &Path, file: &str, style: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load fallback {} font at {}: {}",
                style,
                path.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn load_system_family(family: &SystemFamily) -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_system_directory(family)?;
    debug!("Loading '{}' from {}", family.name, directory.display());

    Ok(FontFamily {
        regular: load_system_font(&directory, family.regular, "regular")?,
        bold: load_system_font(&directory, family.bold, "bold")?,
        italic: load_system_font(&directory, family.italic, "italic")?,
        bold_italic: load_system_font(&directory, family.bold_italic, "bold italic")?,
    })
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Returns the bundled Roboto family, or the first installed system family when the bundled fonts
/// are missing.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    let bundled_err = match load_bundled_font_family() {
        Ok(family) => return Ok(family),
        Err(err) if fonts_missing(&err) => err,
        Err(err) => return Err(err),
    };

    let mut failures = Vec::new();
    for family in SYSTEM_FAMILIES {
        match load_system_family(family) {
            Ok(loaded) => {
                warn!(
                    "Bundled fonts unavailable ({}); falling back to system '{}' family.",
                    bundled_err, family.name
                );
                return Ok(loaded);
            }
            Err(err) => failures.push(err.to_string()),
        }
    }

    warn!(
        "Bundled fonts unavailable ({}); system fallbacks failed: {}",
        bundled_err,
        failures.join("; ")
    );
    Err(not_found(
        format!(
            "Bundled fonts unavailable and no system fallback found: {}",
            failures.join("; ")
        ),
        "default fonts are not available",
    ))
}

/// Path of the regular face of the family [`default_font_family`] would pick.
///
/// Used where a single face is enough, such as the chart labels.
pub fn default_regular_font_path() -> Result<PathBuf, Error> {
    if let Ok(directory) = resolve_bundled_directory() {
        return Ok(directory.join(BUNDLED_FONT_FILES[0]));
    }

    let mut failures = Vec::new();
    for family in SYSTEM_FAMILIES {
        match resolve_system_directory(family) {
            Ok(directory) => return Ok(directory.join(family.regular)),
            Err(err) => failures.push(err.to_string()),
        }
    }
    Err(not_found(
        format!("No regular font face found: {}", failures.join("; ")),
        "default fonts are not available",
    ))
}

/// Indicates whether some usable font family can be located without loading it.
pub fn default_fonts_available() -> bool {
    resolve_bundled_directory().is_ok()
        || SYSTEM_FAMILIES
            .iter()
            .any(|family| resolve_system_directory(family).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_reported_as_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let absent = dir.path().join("nope");
        let missing = missing_files(&absent, BUNDLED_FONT_FILES.iter().copied());
        assert_eq!(missing.len(), BUNDLED_FONT_FILES.len());
        assert!(describe_attempt(&absent, &missing).contains("directory missing"));

        let err = not_found("no fonts".into(), "missing");
        assert!(fonts_missing(&err));
    }

    #[test]
    fn dejavu_family_is_a_system_fallback() {
        let dejavu = SYSTEM_FAMILIES
            .iter()
            .find(|family| family.name == "DejaVu Sans")
            .expect("DejaVu Sans listed");
        assert!(dejavu
            .directories
            .contains(&"/usr/share/fonts/truetype/dejavu"));

        let dir = tempfile::tempdir().expect("temp dir");
        for (file, _) in dejavu.files() {
            std::fs::write(dir.path().join(file), b"").expect("touch font");
        }
        let missing = missing_files(dir.path(), dejavu.files().iter().map(|(file, _)| *file));
        assert!(missing.is_empty(), "{missing:?}");
        assert_eq!(dejavu.italic, "DejaVuSans-Oblique.ttf");
    }

    #[test]
    fn regular_face_exists_whenever_fonts_are_available() {
        if !default_fonts_available() {
            eprintln!("Skipping regular_face_exists_whenever_fonts_are_available: no fonts");
            return;
        }
        let path = default_regular_font_path().expect("regular face");
        assert!(path.is_file(), "{}", path.display());
    }

    #[test]
    fn partial_directory_lists_missing_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("Roboto-Regular.ttf"), b"").expect("touch font");

        let missing = missing_files(dir.path(), BUNDLED_FONT_FILES.iter().copied());
        assert_eq!(missing.len(), 3);
        assert!(!missing.contains(&"Roboto-Regular.ttf".to_owned()));
        assert!(describe_attempt(dir.path(), &missing).contains("Roboto-Bold.ttf"));
    }
}
