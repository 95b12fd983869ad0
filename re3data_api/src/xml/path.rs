use std::fmt;
use std::str::FromStr;

use sxd_xpath::Factory;

use super::XmlError;

/// A checked XPath 1.0 expression such as `//r3d:api/@apiType`.
///
/// The expression is compiled once by [`XPath::parse`] to reject bad syntax
/// up front. Only the source text is kept, so the type stays `Send + Sync`
/// and is compiled again for each evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct XPath {
    source: String,
}

impl XPath {
    pub fn parse(source: &str) -> Result<Self, XmlError> {
        let trimmed = source.trim();
        compile(trimmed)?;
        Ok(Self {
            source: trimmed.to_string(),
        })
    }

    /// The expression as written, without surrounding whitespace.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn compiled(&self) -> Result<sxd_xpath::XPath, XmlError> {
        compile(&self.source)
    }
}

fn compile(source: &str) -> Result<sxd_xpath::XPath, XmlError> {
    let invalid = |reason: String| XmlError::InvalidPath {
        path: source.to_string(),
        reason,
    };
    if source.is_empty() {
        return Err(invalid("path is empty".to_string()));
    }
    Factory::new()
        .build(source)
        .map_err(|e| invalid(e.to_string()))?
        .ok_or_else(|| invalid("no expression".to_string()))
}

impl FromStr for XPath {
    type Err = XmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        XPath::parse(s)
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_trimmed_source() {
        let path = XPath::parse("  //r3d:api/@apiType ").unwrap();
        assert_eq!(path.as_str(), "//r3d:api/@apiType");
        assert_eq!(path.to_string(), "//r3d:api/@apiType");
    }

    #[test]
    fn accepts_relative_and_predicate_paths() {
        for good in [".", "@apiType", "r3d:repository/r3d:repositoryName", "//r3d:api[1]"] {
            assert!(XPath::parse(good).is_ok(), "expected '{}' to parse", good);
        }
    }

    #[test]
    fn rejects_bad_paths() {
        for bad in ["", "   ", "//", "a///b", "//a[", "@x/("] {
            assert!(
                matches!(XPath::parse(bad), Err(XmlError::InvalidPath { .. })),
                "expected '{}' to be rejected",
                bad
            );
        }
    }
}
