// # Record Model
//
// Provider-agnostic view of the registrar's DNS state.
//
// A provider decodes its wire format into a [`RecordSet`]; selecting the
// managed record out of that set happens here so every provider matches
// hosts the same way.

use crate::config::RecordType;
use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The host this agent keeps in sync
///
/// Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Registered domain (e.g., "example.com")
    pub domain: String,

    /// Label in front of the domain (e.g., "home")
    pub subdomain: String,

    /// Only match records of this type when set
    #[serde(default)]
    pub record_type: Option<RecordType>,
}

impl Target {
    /// Create a target matching any record type
    pub fn new(domain: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            subdomain: subdomain.into(),
            record_type: None,
        }
    }

    /// Restrict matching to one record type
    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = Some(record_type);
        self
    }

    /// Fully-qualified host name, `subdomain.domain`
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.subdomain, self.domain)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.subdomain, self.domain)
    }
}

/// One resource record as listed by the registrar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub record_id: String,
    pub record_type: String,
    pub host: String,
    pub value: String,
    pub ttl: Option<u32>,
    pub distance: Option<u32>,
}

/// Decoded list response: the caller's address plus every record of the domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    /// Address the registrar saw the list request come from
    pub observed_ip: String,

    /// Records in document order
    pub records: Vec<ResourceRecord>,
}

impl RecordSet {
    /// Find the managed record for `target`
    ///
    /// The first record in document order whose host equals `target.fqdn()`
    /// wins. When the target names a record type, records of other types are
    /// skipped, so a host carrying both A and AAAA entries resolves to the
    /// one the agent manages.
    pub fn find(&self, target: &Target) -> Option<&ResourceRecord> {
        let fqdn = target.fqdn();
        self.records.iter().find(|record| {
            record.host == fqdn
                && target
                    .record_type
                    .is_none_or(|wanted| wanted.matches(&record.record_type))
        })
    }

    /// Build the snapshot for `target`, or report the host as missing
    ///
    /// A missing host wins over a missing observed address.
    pub fn snapshot_for(&self, target: &Target) -> Result<DnsRecordSnapshot, FetchError> {
        let record = self.find(target).ok_or_else(|| FetchError::HostNotFound {
            target: target.fqdn(),
        })?;

        if self.observed_ip.trim().is_empty() {
            return Err(FetchError::Parse(
                "response did not include the requesting ip".to_string(),
            ));
        }

        Ok(DnsRecordSnapshot {
            observed_external_ip: self.observed_ip.trim().to_string(),
            record_id: record.record_id.clone(),
            current_published_value: record.value.clone(),
            record_type: record.record_type.clone(),
            ttl: record.ttl,
        })
    }
}

/// Result of a successful fetch
///
/// Either every field is populated or no snapshot exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecordSnapshot {
    /// Caller's public address as seen by the registrar
    pub observed_external_ip: String,

    /// Registrar-assigned id of the managed record
    pub record_id: String,

    /// Value the record currently publishes
    pub current_published_value: String,

    /// Type of the matched record (e.g., "A")
    pub record_type: String,

    /// TTL the record currently carries
    pub ttl: Option<u32>,
}

impl DnsRecordSnapshot {
    /// Whether the published value already equals the observed address
    pub fn is_current(&self) -> bool {
        self.observed_external_ip == self.current_published_value
    }
}

/// Acknowledgement of a successful update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReceipt {
    /// Record id echoed by the registrar
    ///
    /// NameSilo may hand out a fresh id on update; when the reply omits it
    /// this is the id that was sent.
    pub record_id: String,
}
