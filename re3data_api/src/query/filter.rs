use std::fmt;
use std::str::FromStr;

/// Filter parameter names understood by the repository listing endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterKey {
    /// DFG subject classification, e.g. `34 Geosciences (including Geography)`.
    Subject,
    /// Upload policy: `open`, `restricted`, `closed`.
    DataUpload,
    /// Persistent identifier scheme, e.g. `DOI`, `hdl`.
    PidSystem,
    Certificate,
    ContentType,
    /// ISO 3166-1 alpha-3 country code.
    Country,
    /// Repository type: `disciplinary`, `institutional`, `other`.
    RepositoryType,
    ApiType,
    /// Any other parameter name, sent verbatim.
    Custom(String),
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FilterKey::Subject => "subjects[]",
                FilterKey::DataUpload => "dataUploads[]",
                FilterKey::PidSystem => "pidSystems[]",
                FilterKey::Certificate => "certificates[]",
                FilterKey::ContentType => "contentTypes[]",
                FilterKey::Country => "countries[]",
                FilterKey::RepositoryType => "types[]",
                FilterKey::ApiType => "apis[]",
                FilterKey::Custom(name) => name.as_str(),
            }
        )
    }
}

impl FromStr for FilterKey {
    type Err = ();

    /// Accepts the short names used on the command line; anything else
    /// non-empty becomes a [`FilterKey::Custom`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s {
            "" => return Err(()),
            "subject" | "subjects" => FilterKey::Subject,
            "data-upload" | "upload" => FilterKey::DataUpload,
            "pid-system" | "pid" => FilterKey::PidSystem,
            "certificate" => FilterKey::Certificate,
            "content-type" => FilterKey::ContentType,
            "country" => FilterKey::Country,
            "type" | "repository-type" => FilterKey::RepositoryType,
            "api-type" | "api" => FilterKey::ApiType,
            other => FilterKey::Custom(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_map_to_wire_names() {
        let key: FilterKey = "data-upload".parse().unwrap();
        assert_eq!(key, FilterKey::DataUpload);
        assert_eq!(key.to_string(), "dataUploads[]");
        assert_eq!("pid".parse::<FilterKey>().unwrap().to_string(), "pidSystems[]");
    }

    #[test]
    fn unknown_names_pass_through() {
        let key: FilterKey = "dataLicenses[]".parse().unwrap();
        assert_eq!(key, FilterKey::Custom("dataLicenses[]".to_string()));
        assert_eq!(key.to_string(), "dataLicenses[]");
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(" ".parse::<FilterKey>().is_err());
    }
}
