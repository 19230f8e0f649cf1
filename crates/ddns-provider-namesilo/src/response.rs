// # NameSilo Response Decoding
//
// Both endpoints answer with a `<namesilo>` document:
//
// ```xml
// <namesilo>
//   <request><operation>dnsListRecords</operation><ip>5.6.7.8</ip></request>
//   <reply>
//     <code>300</code>
//     <detail>success</detail>
//     <resource_record>
//       <record_id>R1</record_id><type>A</type><host>home.example.com</host>
//       <value>1.2.3.4</value><ttl>3600</ttl><distance>0</distance>
//     </resource_record>
//   </reply>
// </namesilo>
// ```
//
// Reply code 300 is success on every endpoint; anything else is an
// application-level rejection, not a transport failure.

use ddns_core::error::{FetchError, UpdateError};
use ddns_core::record::{RecordSet, ResourceRecord};
use serde::Deserialize;

/// Reply code NameSilo uses for success
pub const SUCCESS_CODE: u32 = 300;

#[derive(Debug, Default, Deserialize)]
struct RequestEcho {
    #[serde(default)]
    operation: String,
    #[serde(default)]
    ip: String,
}

#[derive(Debug, Deserialize)]
struct ListRecordsEnvelope {
    #[serde(default)]
    request: RequestEcho,
    reply: ListRecordsReply,
}

#[derive(Debug, Deserialize)]
struct ListRecordsReply {
    code: u32,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    resource_record: Vec<ResourceRecordXml>,
}

// ttl and distance stay textual: NameSilo leaves them empty on some types
#[derive(Debug, Deserialize)]
struct ResourceRecordXml {
    record_id: String,
    #[serde(rename = "type")]
    record_type: String,
    host: String,
    value: String,
    #[serde(default)]
    ttl: String,
    #[serde(default)]
    distance: String,
}

impl From<ResourceRecordXml> for ResourceRecord {
    fn from(xml: ResourceRecordXml) -> Self {
        Self {
            record_id: xml.record_id.trim().to_string(),
            record_type: xml.record_type.trim().to_string(),
            host: xml.host.trim().to_string(),
            value: xml.value.trim().to_string(),
            ttl: xml.ttl.trim().parse().ok(),
            distance: xml.distance.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateRecordEnvelope {
    reply: UpdateRecordReply,
}

#[derive(Debug, Deserialize)]
struct UpdateRecordReply {
    code: u32,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    record_id: Option<String>,
}

/// Decode a `dnsListRecords` body
///
/// # Returns
///
/// - `Ok(RecordSet)`: reply code 300, records in document order
/// - `Err(FetchError::RemoteRejected)`: any other reply code
/// - `Err(FetchError::Parse)`: body is not a NameSilo document
pub fn parse_list_records(body: &str) -> Result<RecordSet, FetchError> {
    let envelope: ListRecordsEnvelope = quick_xml::de::from_str(body)
        .map_err(|e| FetchError::Parse(format!("invalid dnsListRecords response: {}", e)))?;

    if envelope.reply.code != SUCCESS_CODE {
        return Err(FetchError::RemoteRejected {
            code: envelope.reply.code,
            detail: envelope.reply.detail.trim().to_string(),
        });
    }

    tracing::trace!(
        "Decoded {} reply with {} record(s)",
        envelope.request.operation,
        envelope.reply.resource_record.len()
    );

    Ok(RecordSet {
        observed_ip: envelope.request.ip.trim().to_string(),
        records: envelope
            .reply
            .resource_record
            .into_iter()
            .map(ResourceRecord::from)
            .collect(),
    })
}

/// Decode a `dnsUpdateRecord` body
///
/// # Returns
///
/// - `Ok(Some(id))`: reply code 300 with the (possibly new) record id
/// - `Ok(None)`: reply code 300 without a record id
/// - `Err(UpdateError::RemoteRejected)`: any other reply code
/// - `Err(UpdateError::Parse)`: body is not a NameSilo document
pub fn parse_update_record(body: &str) -> Result<Option<String>, UpdateError> {
    let envelope: UpdateRecordEnvelope = quick_xml::de::from_str(body)
        .map_err(|e| UpdateError::Parse(format!("invalid dnsUpdateRecord response: {}", e)))?;

    if envelope.reply.code != SUCCESS_CODE {
        return Err(UpdateError::RemoteRejected {
            code: envelope.reply.code,
            detail: envelope.reply.detail.trim().to_string(),
        });
    }

    Ok(envelope
        .reply
        .record_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty()))
}
