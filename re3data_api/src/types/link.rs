//! Detail references extracted from the repository listing.

use std::fmt;

use serde::Serialize;
use url::Url;

use crate::xml::{XPath, XmlDocument, XmlError};

/// Path selecting every detail link in a listing response.
pub const LISTING_LINK_PATH: &str = "//@href";

/// A link to one repository's full record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RepositoryLink {
    href: Url,
}

impl RepositoryLink {
    pub fn new(href: Url) -> Self {
        Self { href }
    }

    pub fn href(&self) -> &str {
        self.href.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.href
    }

    /// Last non-empty path segment, which the registry uses as the repository ID.
    pub fn repository_id(&self) -> Option<&str> {
        self.href
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
    }
}

impl fmt::Display for RepositoryLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.href.as_str())
    }
}

/// Extracts detail links from a listing body, in document order.
///
/// Relative hrefs are resolved against `base`. Hrefs that cannot be resolved
/// are skipped with a warning rather than failing the whole listing.
pub fn parse_listing(body: &str, base: &Url) -> Result<Vec<RepositoryLink>, XmlError> {
    let document = XmlDocument::parse(body)?;
    let path = XPath::parse(LISTING_LINK_PATH)?;
    let links = document
        .select(&path)?
        .into_iter()
        .filter_map(|href| match base.join(&href) {
            Ok(url) => Some(RepositoryLink::new(url)),
            Err(e) => {
                tracing::warn!("Skipping unresolvable link '{}': {}", href, e);
                None
            }
        })
        .collect();
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.re3data.org/api/beta/repositories").unwrap()
    }

    #[test]
    fn parses_links_in_order() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<list>
  <repository>
    <id>r3d100010134</id>
    <name>PANGAEA</name>
    <link href="https://www.re3data.org/api/beta/repository/r3d100010134" rel="self" />
  </repository>
  <repository>
    <id>r3d100000001</id>
    <name>Relative</name>
    <link href="/api/beta/repository/r3d100000001" rel="self" />
  </repository>
</list>"#;
        let links = parse_listing(body, &base()).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(
            links[0].href(),
            "https://www.re3data.org/api/beta/repository/r3d100010134"
        );
        assert_eq!(links[0].repository_id(), Some("r3d100010134"));
        assert_eq!(
            links[1].href(),
            "https://www.re3data.org/api/beta/repository/r3d100000001"
        );
    }

    #[test]
    fn empty_listing_is_not_an_error() {
        let links = parse_listing("<list></list>", &base()).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn malformed_listing_is_an_error() {
        assert!(parse_listing("<list><repository></list>", &base()).is_err());
    }

    #[test]
    fn repository_id_ignores_trailing_slash() {
        let link = RepositoryLink::new(
            Url::parse("https://www.re3data.org/api/v1/repository/r3d100010134/").unwrap(),
        );
        assert_eq!(link.repository_id(), Some("r3d100010134"));
    }
}
