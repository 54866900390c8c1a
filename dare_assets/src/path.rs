//! `AssetPath` — spec section 6 grammar: `/domain/segment*/name[.ext]`.
//! Case-insensitive compares for domain and extension; exact compares for
//! the remainder. No `AssetPath.h`/`.cpp` survives in the retrieved
//! original source, so this is designed fresh from the grammar in spec.md.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPath {
    /// Lowercased at parse time, so `Eq`/`Hash` derive gives the
    /// case-insensitive compare the grammar requires.
    domain: String,
    segments: Vec<String>,
    name: String,
    /// Lowercased at parse time; `None` when the filename has no `.ext`.
    ext: Option<String>,
}

impl AssetPath {
    /// Parses `/domain/segment*/name[.ext]`. Requires at least a domain and
    /// a name (`/domain/name`); rejects empty path components.
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix('/')?;
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        let domain = parts[0].to_lowercase();
        let filename = parts[parts.len() - 1];
        let segments = parts[1..parts.len() - 1]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (name, ext) = match filename.rsplit_once('.') {
            Some((n, e)) if !n.is_empty() && !e.is_empty() => {
                (n.to_string(), Some(e.to_lowercase()))
            }
            _ => (filename.to_string(), None),
        };
        Some(Self {
            domain,
            segments,
            name,
            ext,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ext(&self) -> Option<&str> {
        self.ext.as_deref()
    }

    /// `engine/Types/<typepath>` keying used by `load_domain`'s concrete-type
    /// population (spec section 4.4, step 2).
    pub fn engine_type(typepath: &str) -> Self {
        Self {
            domain: "engine".to_string(),
            segments: vec!["Types".to_string()],
            name: typepath.to_string(),
            ext: None,
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.domain)?;
        for segment in &self.segments {
            write!(f, "{segment}/")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(ext) = &self.ext {
            write!(f, ".{ext}")?;
        }
        Ok(())
    }
}
