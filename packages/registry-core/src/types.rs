//! Registry entities and query templates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Labels attached to an endpoint for one of the network services it serves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkServiceLabels {
    pub labels: BTreeMap<String, String>,
}

/// A registered endpoint providing one or more network services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkServiceEndpoint {
    pub name: String,
    #[serde(default)]
    pub network_service_names: Vec<String>,
    #[serde(default)]
    pub network_service_labels: BTreeMap<String, NetworkServiceLabels>,
    #[serde(default)]
    pub url: String,
    /// Expiration as milliseconds since the Unix epoch. `None` never expires.
    #[serde(default)]
    pub expiration_time: Option<u64>,
}

impl NetworkServiceEndpoint {
    /// Endpoint with only a name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A network service definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkService {
    pub name: String,
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub matches: Vec<String>,
}

impl NetworkService {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Query for endpoints. Fields left empty in the template match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkServiceEndpointQuery {
    pub network_service_endpoint: NetworkServiceEndpoint,
    /// Keep the stream open for updates after the initial snapshot.
    #[serde(default)]
    pub watch: bool,
}

/// Query for network services. Fields left empty in the template match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkServiceQuery {
    pub network_service: NetworkService,
    #[serde(default)]
    pub watch: bool,
}

impl NetworkServiceEndpointQuery {
    /// Reports whether `candidate` satisfies this query's template.
    ///
    /// Name and URL match by substring; every network service name listed in the
    /// template must be served by the candidate.
    #[must_use]
    pub fn matches(&self, candidate: &NetworkServiceEndpoint) -> bool {
        let template = &self.network_service_endpoint;
        candidate.name.contains(&template.name)
            && candidate.url.contains(&template.url)
            && template
                .network_service_names
                .iter()
                .all(|ns| candidate.network_service_names.contains(ns))
    }
}

impl NetworkServiceQuery {
    #[must_use]
    pub fn matches(&self, candidate: &NetworkService) -> bool {
        let template = &self.network_service;
        candidate.name.contains(&template.name) && candidate.payload.contains(&template.payload)
    }
}
