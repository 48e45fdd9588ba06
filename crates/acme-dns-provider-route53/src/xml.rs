//! Route 53 XML request bodies and response parsing

use acme_dns_core::record::ChallengeRecord;
use acme_dns_core::{Error, Result};
use quick_xml::Reader;
use quick_xml::escape::partial_escape;
use quick_xml::events::Event;

const ROUTE53_XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

/// Change action inside a change batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Upsert,
    Delete,
}

impl ChangeAction {
    fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Upsert => "UPSERT",
            ChangeAction::Delete => "DELETE",
        }
    }
}

/// Body of a `ChangeResourceRecordSets` call touching one TXT record
pub fn change_batch(action: ChangeAction, record: &ChallengeRecord) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ChangeResourceRecordSetsRequest xmlns="{xmlns}">
  <ChangeBatch>
    <Comment>ACME DNS-01 challenge</Comment>
    <Changes>
      <Change>
        <Action>{action}</Action>
        <ResourceRecordSet>
          <Name>{name}</Name>
          <Type>TXT</Type>
          <TTL>{ttl}</TTL>
          <ResourceRecords>
            <ResourceRecord>
              <Value>{value}</Value>
            </ResourceRecord>
          </ResourceRecords>
        </ResourceRecordSet>
      </Change>
    </Changes>
  </ChangeBatch>
</ChangeResourceRecordSetsRequest>"#,
        xmlns = ROUTE53_XMLNS,
        action = action.as_str(),
        name = partial_escape(&record.fqdn()),
        ttl = record.ttl(),
        value = partial_escape(&record.quoted_value()),
    )
}

/// Error document returned with a non-2xx status
///
/// Route 53 uses two shapes: the generic
/// `<ErrorResponse><Error><Code/><Message/></Error></ErrorResponse>` and
/// `<InvalidChangeBatch><Messages><Message/>...</Messages></InvalidChangeBatch>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub messages: Vec<String>,
}

impl ApiError {
    /// All messages joined for display
    pub fn message(&self) -> String {
        self.messages.join("; ")
    }

    /// A DELETE that failed because our value is no longer there
    ///
    /// Either the record set is gone, or a later UPSERT replaced the value
    /// being deleted. Both leave nothing of ours to remove.
    pub fn is_missing_record(&self) -> bool {
        self.code == "InvalidChangeBatch"
            && self.messages.iter().any(|m| {
                m.contains("not found")
                    || m.contains("does not exist")
                    || m.contains("values provided do not match")
            })
    }

    pub fn is_throttling(&self) -> bool {
        matches!(
            self.code.as_str(),
            "Throttling" | "ThrottlingException" | "PriorRequestNotComplete"
        )
    }

    pub fn parse(body: &str) -> Result<Self> {
        let mut error = ApiError::default();

        walk(body, |path, text| {
            match path.last().map(String::as_str) {
                Some("Code") => error.code = text.to_string(),
                Some("Message") => error.messages.push(text.to_string()),
                _ => {}
            }
            if error.code.is_empty() && path.first().map(String::as_str) == Some("InvalidChangeBatch") {
                error.code = "InvalidChangeBatch".to_string();
            }
        })?;

        Ok(error)
    }
}

/// One record set from `ListResourceRecordSets`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub name: String,
    pub record_type: String,
    pub ttl: u32,
    pub values: Vec<String>,
}

/// Parse a `ListResourceRecordSetsResponse`
pub fn parse_record_sets(body: &str) -> Result<Vec<RecordSet>> {
    let mut sets: Vec<RecordSet> = Vec::new();

    walk(body, |path, text| {
        let Some(pos) = path.iter().position(|p| p == "ResourceRecordSet") else {
            return;
        };
        let field = &path[pos + 1..];

        // A new set starts with its Name element
        if field == ["Name"] {
            sets.push(RecordSet {
                name: text.to_string(),
                ..RecordSet::default()
            });
            return;
        }

        let Some(current) = sets.last_mut() else {
            return;
        };
        match field {
            [f] if f == "Type" => current.record_type = text.to_string(),
            [f] if f == "TTL" => current.ttl = text.parse().unwrap_or_default(),
            [a, b, c] if a == "ResourceRecords" && b == "ResourceRecord" && c == "Value" => {
                current.values.push(text.to_string())
            }
            _ => {}
        }
    })?;

    Ok(sets)
}

/// Zone name from a `GetHostedZoneResponse`, without the trailing dot
pub fn parse_hosted_zone_name(body: &str) -> Result<Option<String>> {
    let mut name = None;

    walk(body, |path, text| {
        if path.len() >= 2 && path[path.len() - 2] == "HostedZone" && path[path.len() - 1] == "Name" {
            name = Some(text.trim_end_matches('.').to_lowercase());
        }
    })?;

    Ok(name)
}

/// Visit every text node with the element path leading to it
fn walk<F>(body: &str, mut visit: F) -> Result<()>
where
    F: FnMut(&[String], &str),
{
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::provider("route53", format!("Malformed XML text: {}", e)))?;
                visit(&path, &text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::provider(
                    "route53",
                    format!(
                        "Malformed XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    ),
                ));
            }
        }
    }

    Ok(())
}
