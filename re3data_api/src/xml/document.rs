use sxd_document::dom::ChildOfRoot;
use sxd_document::{parser, Package};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Value};

use super::path::XPath;
use super::{XmlError, R3D_NAMESPACE, R3D_PREFIX};

/// A parsed XML document that can be queried with [`XPath`] expressions.
///
/// The `r3d` prefix is bound to the root element's namespace when it has
/// one, and to [`R3D_NAMESPACE`] otherwise.
pub struct XmlDocument {
    package: Package,
}

impl XmlDocument {
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        let package = parser::parse(input)?;
        Ok(Self { package })
    }

    /// Evaluates `path` from the document node and returns the selected
    /// values in document order.
    ///
    /// Node values are string values with surrounding whitespace trimmed.
    /// Scalar results (`count(...)`, `string(...)`) give a single value, and
    /// an empty string gives none.
    pub fn select(&self, path: &XPath) -> Result<Vec<String>, XmlError> {
        let document = self.package.as_document();
        let context = self.context();
        let value = path.compiled()?.evaluate(&context, document.root())?;
        Ok(values(value))
    }

    /// First selected value, if any.
    pub fn select_first(&self, path: &XPath) -> Result<Option<String>, XmlError> {
        Ok(self.select(path)?.into_iter().next())
    }

    /// Evaluates `members` relative to every node `anchor` selects.
    ///
    /// Returns one row per anchor node in document order. Each row has one
    /// cell per member: the member's first value under that node, or `None`.
    pub fn select_grouped(
        &self,
        anchor: &XPath,
        members: &[&XPath],
    ) -> Result<Vec<Vec<Option<String>>>, XmlError> {
        let document = self.package.as_document();
        let context = self.context();
        let anchors = match anchor.compiled()?.evaluate(&context, document.root())? {
            Value::Nodeset(nodes) => nodes.document_order(),
            _ => Vec::new(),
        };
        let members = members
            .iter()
            .map(|member| member.compiled())
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(anchors.len());
        for node in anchors {
            let mut row = Vec::with_capacity(members.len());
            for member in &members {
                let value = member.evaluate(&context, node)?;
                row.push(values(value).into_iter().next());
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn context(&self) -> Context<'_> {
        let mut context = Context::new();
        context.set_namespace(R3D_PREFIX, &self.root_namespace());
        context
    }

    fn root_namespace(&self) -> String {
        let document = self.package.as_document();
        document
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(element) => {
                    element.name().namespace_uri().map(str::to_string)
                }
                _ => None,
            })
            .unwrap_or_else(|| R3D_NAMESPACE.to_string())
    }
}

fn values(value: Value<'_>) -> Vec<String> {
    match value {
        Value::Nodeset(nodes) => nodes
            .document_order()
            .into_iter()
            .map(|node: Node<'_>| node.string_value().trim().to_string())
            .collect(),
        Value::String(s) if s.is_empty() => Vec::new(),
        other => vec![other.string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPOSITORY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<r3d:re3data xmlns:r3d="http://www.re3data.org/schema/2-2">
  <r3d:repository>
    <r3d:re3data.orgIdentifier>r3d100010134</r3d:re3data.orgIdentifier>
    <r3d:repositoryName language="eng">PANGAEA</r3d:repositoryName>
    <r3d:description language="eng"><![CDATA[Data Publisher for Earth &amp; Environmental Science]]></r3d:description>
    <r3d:api apiType="OAI-PMH">https://ws.pangaea.de/oai/</r3d:api>
    <r3d:api>https://ws.pangaea.de/ws/</r3d:api>
    <r3d:api apiType="REST">https://ws.pangaea.de/rest</r3d:api>
    <r3d:institution>
      <r3d:institutionName>AWI &amp; MARUM</r3d:institutionName>
    </r3d:institution>
  </r3d:repository>
</r3d:re3data>"#;

    fn select(doc: &XmlDocument, path: &str) -> Vec<String> {
        doc.select(&XPath::parse(path).unwrap()).unwrap()
    }

    #[test]
    fn selects_with_registered_prefix() {
        let doc = XmlDocument::parse(REPOSITORY).unwrap();
        assert_eq!(select(&doc, "//r3d:re3data.orgIdentifier"), vec!["r3d100010134"]);
        assert_eq!(
            select(&doc, "/r3d:re3data/r3d:repository/r3d:repositoryName"),
            vec!["PANGAEA"]
        );
        assert!(select(&doc, "//repositoryName").is_empty());
    }

    #[test]
    fn selects_attributes_in_document_order() {
        let doc = XmlDocument::parse(REPOSITORY).unwrap();
        assert_eq!(select(&doc, "//r3d:api/@apiType"), vec!["OAI-PMH", "REST"]);
        assert_eq!(select(&doc, "//r3d:api").len(), 3);
        assert_eq!(select(&doc, "//@language"), vec!["eng", "eng"]);
    }

    #[test]
    fn string_values_are_trimmed() {
        let doc = XmlDocument::parse(REPOSITORY).unwrap();
        assert_eq!(select(&doc, "//r3d:institution"), vec!["AWI & MARUM"]);
        assert_eq!(
            select(&doc, "//r3d:description"),
            vec!["Data Publisher for Earth &amp; Environmental Science"]
        );
    }

    #[test]
    fn scalar_results() {
        let doc = XmlDocument::parse(REPOSITORY).unwrap();
        assert_eq!(select(&doc, "count(//r3d:api)"), vec!["3"]);
        assert!(select(&doc, "string(//r3d:certificate)").is_empty());
    }

    #[test]
    fn missing_paths_select_nothing() {
        let doc = XmlDocument::parse(REPOSITORY).unwrap();
        assert!(select(&doc, "//r3d:certificate").is_empty());
        let first = doc.select_first(&XPath::parse("//r3d:type").unwrap()).unwrap();
        assert_eq!(first, None);
    }

    #[test]
    fn grouped_members_stay_with_their_element() {
        let doc = XmlDocument::parse(REPOSITORY).unwrap();
        let anchor = XPath::parse("//r3d:api").unwrap();
        let endpoint = XPath::parse(".").unwrap();
        let api_type = XPath::parse("@apiType").unwrap();
        let rows = doc.select_grouped(&anchor, &[&endpoint, &api_type]).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Some("https://ws.pangaea.de/oai/".to_string()), Some("OAI-PMH".to_string())],
                vec![Some("https://ws.pangaea.de/ws/".to_string()), None],
                vec![Some("https://ws.pangaea.de/rest".to_string()), Some("REST".to_string())],
            ]
        );
    }

    #[test]
    fn grouped_without_anchor_matches_is_empty() {
        let doc = XmlDocument::parse(REPOSITORY).unwrap();
        let anchor = XPath::parse("//r3d:subject").unwrap();
        let member = XPath::parse(".").unwrap();
        assert!(doc.select_grouped(&anchor, &[&member]).unwrap().is_empty());
    }

    #[test]
    fn prefix_follows_the_document_namespace() {
        let doc = XmlDocument::parse(
            r#"<r3d:re3data xmlns:r3d="http://www.re3data.org/schema/3-0"><r3d:type>other</r3d:type></r3d:re3data>"#,
        )
        .unwrap();
        assert_eq!(select(&doc, "//r3d:type"), vec!["other"]);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["this is not xml", "", "<a><b></a>", "<a><b>", "<a/><b/>"] {
            assert!(
                matches!(XmlDocument::parse(bad), Err(XmlError::Parse(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
    }
}
