//! # XML Source Provider
//!
//! Resolves a URI or local filesystem path to the raw XML/HTML text behind
//! it, caching on disk (keyed by the SHA-256 of the location) and in memory
//! for the lifetime of the process.
//!
//! `roxmltree::Document` borrows from the string it was parsed from, so this
//! provider deliberately hands back owned, shared text (`Rc<String>`) rather
//! than a parsed document — callers parse it with `roxmltree::Document::parse`
//! wherever they need it. Re-parsing a cached string is cheap relative to a
//! network fetch, and it avoids building a self-referential struct to smuggle
//! a `Document` and its backing text out of this module together.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use bon::bon;
use sha2::{Digest, Sha256};

use crate::error::JpxResult;

/// Fetches and caches the XML/HTML text behind a URL or local path.
///
/// Network fetches pause one second after completing to throttle upstream
/// servers (§5 of the specification this crate implements).
pub struct XmlSource {
    webcache_dir: PathBuf,
    memory: RefCell<HashMap<String, Rc<String>>>,
    fetch_delay: Duration,
}

#[bon]
impl XmlSource {
    #[builder]
    pub fn new(
        #[builder(default = PathBuf::from("webcache"))] webcache_dir: PathBuf,
        #[builder(default = Duration::from_secs(1))] fetch_delay: Duration,
    ) -> Self {
        Self {
            webcache_dir,
            memory: RefCell::new(HashMap::new()),
            fetch_delay,
        }
    }

    /// Resolve `location` (an `http(s)` URL or a local path) to its raw text.
    pub fn get(&self, location: &str) -> JpxResult<Rc<String>> {
        if let Some(text) = self.memory.borrow().get(location) {
            log::debug!("xmlsrc: memory cache hit for {location}");
            return Ok(Rc::clone(text));
        }

        let text = if location.starts_with("http") {
            self.get_remote(location)?
        } else {
            self.get_local(location)?
        };

        let text = Rc::new(text);
        self.memory
            .borrow_mut()
            .insert(location.to_string(), Rc::clone(&text));
        Ok(text)
    }

    /// Drop everything held in the in-memory cache. The on-disk byte cache is
    /// untouched.
    pub fn clear_memory_cache(&self) {
        self.memory.borrow_mut().clear();
    }

    fn get_remote(&self, url: &str) -> JpxResult<String> {
        let cache_path = self.cache_file_path(url);
        if cache_path.exists() {
            log::debug!("xmlsrc: webcache hit for {url}");
            return Ok(std::fs::read_to_string(&cache_path)?);
        }

        log::debug!("xmlsrc: fetching {url}");
        let response = reqwest::blocking::get(url)?;
        let text = response.text()?;
        std::thread::sleep(self.fetch_delay);

        if let Some(parent) = cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&cache_path, &text)?;

        Ok(text)
    }

    fn get_local(&self, path: &str) -> JpxResult<String> {
        log::debug!("xmlsrc: reading local file {path}");
        Ok(std::fs::read_to_string(path)?)
    }

    fn cache_file_path(&self, url: &str) -> PathBuf {
        cache_file_path(&self.webcache_dir, "xml_text", url)
    }
}

/// Shared helper: build a cache file path of the form
/// `<dir>/<prefix>_<slug>_<sha256>`, slugging `/\.:` characters to `_` as the
/// reference implementation does.
pub(crate) fn cache_file_path(dir: &Path, prefix: &str, key: &str) -> PathBuf {
    let hash = hex_sha256(key);
    let slug: String = key
        .chars()
        .map(|c| match c {
            '/' | '\\' | '.' | ':' => '_',
            other => other,
        })
        .collect();
    dir.join(format!("{prefix}_{slug}_{hash}"))
}

pub(crate) fn hex_sha256(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_file_is_read_and_cached() {
        let dir = std::env::temp_dir().join(format!("jpxbrl_xmlsrc_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file_path = dir.join("sample.xml");
        std::fs::write(&file_path, "<root>hello</root>").unwrap();

        let src = XmlSource::builder().webcache_dir(dir.join("webcache")).build();
        let text = src.get(file_path.to_str().unwrap()).unwrap();
        assert_eq!(text.as_str(), "<root>hello</root>");

        // Second call should hit the in-memory cache and return the same Rc.
        let text2 = src.get(file_path.to_str().unwrap()).unwrap();
        assert!(Rc::ptr_eq(&text, &text2));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cache_file_path_is_deterministic_and_slugged() {
        let dir = PathBuf::from("webcache");
        let a = cache_file_path(&dir, "xml_text", "https://example.com/a.xml");
        let b = cache_file_path(&dir, "xml_text", "https://example.com/a.xml");
        assert_eq!(a, b);
        assert!(!a.to_string_lossy().contains("://"));
    }
}
