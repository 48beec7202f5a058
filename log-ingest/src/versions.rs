//! Discovery documents for the API versions this service exposes.

use crate::errors::{LogApiError, Result};
use serde::Serialize;

struct VersionInfo {
    id: &'static str,
    status: &'static str,
    updated: &'static str,
}

const VERSIONS: &[VersionInfo] = &[VersionInfo {
    id: "v2.0",
    status: "CURRENT",
    updated: "2015-11-18T00:00:00Z",
}];

#[derive(Debug, PartialEq, Serialize)]
pub struct Link {
    pub rel: &'static str,
    pub href: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Version {
    pub id: &'static str,
    pub links: Vec<Link>,
    pub status: &'static str,
    pub updated: &'static str,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct VersionList {
    pub links: Vec<Link>,
    pub elements: Vec<Version>,
}

impl Version {
    fn new(info: &VersionInfo, base_url: &str) -> Self {
        Version {
            id: info.id,
            links: vec![Link {
                rel: "self",
                href: format!("{base_url}/{}", info.id),
            }],
            status: info.status,
            updated: info.updated,
        }
    }
}

/// Every supported version. `base_url` is scheme and authority, or empty.
pub fn list_versions(base_url: &str, path: &str) -> VersionList {
    VersionList {
        links: vec![Link {
            rel: "self",
            href: format!("{base_url}{path}"),
        }],
        elements: VERSIONS
            .iter()
            .map(|info| Version::new(info, base_url))
            .collect(),
    }
}

pub fn get_version(base_url: &str, path: &str, version_id: &str) -> Result<VersionList> {
    let info = VERSIONS
        .iter()
        .find(|info| info.id == version_id)
        .ok_or_else(|| LogApiError::InvalidVersion(version_id.to_string()))?;

    Ok(VersionList {
        links: vec![Link {
            rel: "self",
            href: format!("{base_url}{path}"),
        }],
        elements: vec![Version::new(info, base_url)],
    })
}
