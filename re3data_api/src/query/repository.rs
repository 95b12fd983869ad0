use url::Url;

use super::{common::QueryCommon, FilterKey, Query};

/// Query for the repository listing endpoint.
#[derive(Clone, Debug, Default)]
pub struct RepositoryQuery {
    pub common: QueryCommon,
    pub search: Option<String>,
}

impl Query for RepositoryQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if let Some(search) = &self.search {
            url.query_pairs_mut().append_pair("query", search.as_str());
        };
        self.common.add_to_url(&url)
    }
}

impl RepositoryQuery {
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub fn with_subject(self, subject: &str) -> Self {
        self.with_filter(FilterKey::Subject, subject)
    }

    pub fn with_data_upload(self, policy: &str) -> Self {
        self.with_filter(FilterKey::DataUpload, policy)
    }

    pub fn with_pid_system(self, pid_system: &str) -> Self {
        self.with_filter(FilterKey::PidSystem, pid_system)
    }

    pub fn with_certificate(self, certificate: &str) -> Self {
        self.with_filter(FilterKey::Certificate, certificate)
    }

    pub fn with_content_type(self, content_type: &str) -> Self {
        self.with_filter(FilterKey::ContentType, content_type)
    }

    pub fn with_country(self, country: &str) -> Self {
        self.with_filter(FilterKey::Country, country)
    }
    pub fn with_countries(self, countries: &[String]) -> Self {
        self.with_filters(FilterKey::Country, countries)
    }

    pub fn with_repository_type(self, repository_type: &str) -> Self {
        self.with_filter(FilterKey::RepositoryType, repository_type)
    }

    pub fn with_api_type(self, api_type: &str) -> Self {
        self.with_filter(FilterKey::ApiType, api_type)
    }

    /// True when no parameter would be sent.
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.common.filters.is_empty()
    }
}
