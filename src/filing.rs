//! # Filing Path Resolver
//!
//! Locates the fixed set of files a TDnet/JPX filing directory is expected
//! to contain: one XSD schema, one label linkbase, one each of the
//! presentation/definition/calculation linkbases, and one or more
//! inline-XBRL instance documents. Every slot but the instance documents
//! must resolve to exactly one file; zero or more than one is a filing we
//! refuse to guess about.

use std::path::{Path, PathBuf};

use glob::glob;

use crate::error::{JpxError, JpxResult};
use crate::linkbase::LinkbaseKind;

/// The resolved file layout of a single filing directory.
#[derive(Debug, Clone)]
pub struct FilingPaths {
    pub dir: PathBuf,
    pub xsd: PathBuf,
    pub lab: PathBuf,
    pub pre: PathBuf,
    pub def: PathBuf,
    pub cal: PathBuf,
    pub ixbrl: Vec<PathBuf>,
}

impl FilingPaths {
    /// Resolve every expected file under `dir`, a directory that has already
    /// been unzipped from a TDnet filing archive.
    pub fn discover(dir: impl AsRef<Path>) -> JpxResult<Self> {
        let dir = dir.as_ref().to_path_buf();

        let xsd = singleton_glob(&dir, "*.xsd", "xsd")?;
        let lab = singleton_glob(&dir, "*lab.xml", "lab")?;
        let pre = singleton_glob(&dir, "*pre.xml", "pre")?;
        let def = singleton_glob(&dir, "*def.xml", "def")?;
        let cal = singleton_glob(&dir, "*cal.xml", "cal")?;
        let ixbrl = discover_ixbrl(&dir)?;

        Ok(Self {
            dir,
            xsd,
            lab,
            pre,
            def,
            cal,
            ixbrl,
        })
    }

    pub fn linkbase_path(&self, kind: LinkbaseKind) -> &Path {
        match kind {
            LinkbaseKind::Presentation => &self.pre,
            LinkbaseKind::Definition => &self.def,
            LinkbaseKind::Calculation => &self.cal,
        }
    }

    /// Every location [`crate::instance::InstanceAnalyzer::load`] should
    /// read, as string paths suitable for [`crate::xmlsrc::XmlSource::get`].
    pub fn instance_documents(&self) -> Vec<String> {
        self.ixbrl.iter().map(|p| p.to_string_lossy().to_string()).collect()
    }
}

fn singleton_glob(dir: &Path, pattern: &str, kind: &str) -> JpxResult<PathBuf> {
    let matches = glob_matches(dir, pattern)?;

    match matches.len() {
        0 => Err(JpxError::MissingFilingFile {
            kind: kind.to_string(),
            dir: dir.to_string_lossy().to_string(),
        }),
        1 => Ok(matches.into_iter().next().unwrap()),
        _ => Err(JpxError::AmbiguousFilingFile {
            kind: kind.to_string(),
            dir: dir.to_string_lossy().to_string(),
        }),
    }
}

fn glob_matches(dir: &Path, pattern: &str) -> JpxResult<Vec<PathBuf>> {
    let full_pattern = dir.join(pattern);
    Ok(glob(&full_pattern.to_string_lossy())
        .map_err(|e| JpxError::Other(e.to_string()))?
        .filter_map(Result::ok)
        .collect())
}

/// The inline-XBRL instance documents' file names don't share the simple
/// suffix convention of the linkbases: filers name them `*-ixbrl.htm`, and
/// occasionally `*_ixbrl.htm` when the generator normalizes hyphens to
/// underscores. A filing may ship more than one (e.g. consolidated and
/// non-consolidated statements as separate instances), so every match is
/// kept, not just one; try the hyphenated pattern first and only fall back
/// to the underscored one when it finds nothing at all.
fn discover_ixbrl(dir: &Path) -> JpxResult<Vec<PathBuf>> {
    let matches = glob_matches(dir, "*-ixbrl.htm")?;
    if !matches.is_empty() {
        return Ok(matches);
    }

    let matches = glob_matches(dir, "*_ixbrl.htm")?;
    if matches.is_empty() {
        return Err(JpxError::MissingFilingFile {
            kind: "ixbrl".to_string(),
            dir: dir.to_string_lossy().to_string(),
        });
    }
    Ok(matches)
}
