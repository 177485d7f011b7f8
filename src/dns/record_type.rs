//! Record type definitions and conversions.

use serde_derive::{Deserialize, Serialize};

/// `RecordType` represents the type of a zone record.
///
/// The service addresses record types by their textual names on the
/// wire. The specific type `Unknown` keeps the original string so that
/// types this crate has no special handling for still pass through
/// requests and responses untouched.
#[derive(PartialEq, Eq, Debug, Clone, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    Unknown(String),
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Ptr,
    Soa,
    Srv,
    Txt,
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::Unknown(name) => name,
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Srv => "SRV",
            RecordType::Txt => "TXT",
        }
    }

    pub fn from_name(name: &str) -> RecordType {
        match name.to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "CNAME" => RecordType::Cname,
            "MX" => RecordType::Mx,
            "NS" => RecordType::Ns,
            "PTR" => RecordType::Ptr,
            "SOA" => RecordType::Soa,
            "SRV" => RecordType::Srv,
            "TXT" => RecordType::Txt,
            _ => RecordType::Unknown(name.to_string()),
        }
    }
}

impl From<String> for RecordType {
    fn from(name: String) -> RecordType {
        RecordType::from_name(&name)
    }
}

impl From<RecordType> for String {
    fn from(record_type: RecordType) -> String {
        record_type.as_str().to_string()
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
