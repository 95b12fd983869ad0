//! Shared query infrastructure: the [`Query`] trait and [`QueryCommon`] fields.

use url::Url;

use super::FilterKey;

/// Trait implemented by all query builders. Provides URL serialization and
/// shared builder methods for filter parameters.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;

    /// Returns a mutable reference to the common query fields.
    fn get_common(&mut self) -> &mut QueryCommon;

    /// Adds one filter. Repeated keys are sent as repeated parameters.
    fn with_filter(mut self, key: FilterKey, value: &str) -> Self
    where
        Self: Sized,
    {
        self.get_common().filters.push((key, value.to_string()));
        self
    }

    /// Adds one filter per value, all under the same key.
    fn with_filters(mut self, key: FilterKey, values: &[String]) -> Self
    where
        Self: Sized,
    {
        let common = self.get_common();
        for value in values {
            common.filters.push((key.clone(), value.clone()));
        }
        self
    }
}

/// Fields shared by all query types: the opaque filter pairs.
///
/// Values are passed through untouched; the registry ANDs them.
#[derive(Clone, Debug, Default)]
pub struct QueryCommon {
    pub filters: Vec<(FilterKey, String)>,
}

impl QueryCommon {
    /// Appends the filter pairs to the URL in insertion order.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if self.filters.is_empty() {
            return url;
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.filters {
                pairs.append_pair(&key.to_string(), value);
            }
        }
        url
    }
}
