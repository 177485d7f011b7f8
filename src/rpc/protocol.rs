//! Typed requests and responses for the zone-service RPC dialect.
//!
//! The service itself dispatches on bare method-name strings and returns
//! loosely shaped structures. This module pins both ends down: the
//! methods this crate may invoke form a closed registry, search requests
//! are assembled through a builder that knows the flat numbered-predicate
//! shape the service consumes, and responses are viewed through explicit
//! serde types instead of ad-hoc field access.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::dns::record_type::RecordType;
use crate::rpc::client::RpcError;

/// The remote operations this crate is allowed to invoke.
///
/// The service accepts any method name on the wire; keeping an explicit
/// registry means a typo is a compile error instead of an unintended
/// remote call.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum RpcMethod {
    Login,
    GetGroupZones,
    GetZoneRecords,
    NewZoneRecord,
    DeleteZoneRecord,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match *self {
            RpcMethod::Login => "login",
            RpcMethod::GetGroupZones => "get_group_zones",
            RpcMethod::GetZoneRecords => "get_zone_records",
            RpcMethod::NewZoneRecord => "new_zone_record",
            RpcMethod::DeleteZoneRecord => "delete_zone_record",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single argument value.
///
/// The wire format types every item as int, float or string; anything
/// richer has to be flattened before it gets here.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl RpcValue {
    /// The `xsd` type name used when the value is serialized.
    pub fn type_name(&self) -> &'static str {
        match *self {
            RpcValue::Int(_) => "int",
            RpcValue::Float(_) => "float",
            RpcValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for RpcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcValue::Int(v) => write!(f, "{}", v),
            RpcValue::Float(v) => write!(f, "{}", v),
            RpcValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for RpcValue {
    fn from(v: i64) -> RpcValue {
        RpcValue::Int(v)
    }
}

impl From<u32> for RpcValue {
    fn from(v: u32) -> RpcValue {
        RpcValue::Int(i64::from(v))
    }
}

impl From<f64> for RpcValue {
    fn from(v: f64) -> RpcValue {
        RpcValue::Float(v)
    }
}

impl From<&str> for RpcValue {
    fn from(v: &str) -> RpcValue {
        RpcValue::Str(v.to_string())
    }
}

impl From<String> for RpcValue {
    fn from(v: String) -> RpcValue {
        RpcValue::Str(v)
    }
}

/// Call arguments. Kept ordered so assembled envelopes are deterministic.
pub type ArgMap = BTreeMap<String, RpcValue>;

/// Page size used when searching for zones.
pub const ZONE_SEARCH_LIMIT: u32 = 255;

/// Match operators understood by the search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOption {
    Equals,
}

impl MatchOption {
    pub fn as_str(&self) -> &'static str {
        match *self {
            MatchOption::Equals => "equals",
        }
    }
}

/// One field predicate in a search request.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub field: String,
    pub value: String,
    pub option: MatchOption,
}

#[derive(Debug, Clone)]
enum SearchScope {
    /// The root group and all of its subgroups.
    GroupZones,
    /// Records within one resolved zone.
    ZoneRecords(ZoneId),
}

/// Builder for the flat search maps the service consumes.
///
/// Predicates are numbered `{n}_field` / `{n}_value` / `{n}_option`,
/// with `{n}_inclusive` joining every predicate after the first.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    scope: SearchScope,
    predicates: Vec<Predicate>,
    paging: Option<(u32, u32)>,
}

impl SearchRequest {
    /// Exact-match search for a zone by name across the root group and
    /// its subgroups.
    pub fn group_zones(zone: &str) -> SearchRequest {
        SearchRequest {
            scope: SearchScope::GroupZones,
            predicates: vec![Predicate {
                field: "zone".to_string(),
                value: zone.to_string(),
                option: MatchOption::Equals,
            }],
            paging: Some((0, ZONE_SEARCH_LIMIT)),
        }
    }

    /// Exact-match search for records of one type and name within a zone.
    ///
    /// Record searches are single-page; the service reports the full
    /// match count in `total` regardless.
    pub fn zone_records(zone_id: &ZoneId, record_type: &RecordType, name: &str) -> SearchRequest {
        SearchRequest {
            scope: SearchScope::ZoneRecords(zone_id.clone()),
            predicates: vec![
                Predicate {
                    field: "type".to_string(),
                    value: record_type.as_str().to_string(),
                    option: MatchOption::Equals,
                },
                Predicate {
                    field: "name".to_string(),
                    value: name.to_string(),
                    option: MatchOption::Equals,
                },
            ],
            paging: None,
        }
    }

    /// Continue a paginated search at the given offset.
    pub fn start_at(mut self, start: u32) -> SearchRequest {
        if let Some((_, limit)) = self.paging {
            self.paging = Some((start, limit));
        }
        self
    }

    /// Flatten into the arg map shape the search endpoints expect.
    pub fn into_args(self) -> ArgMap {
        let mut args = ArgMap::new();
        args.insert("Search".to_string(), RpcValue::Int(1));
        args.insert("exact_match".to_string(), RpcValue::Int(1));
        match self.scope {
            SearchScope::GroupZones => {
                args.insert("nt_group_id".to_string(), RpcValue::Int(1));
                args.insert("include_subgroups".to_string(), RpcValue::Int(1));
                args.insert("quick_search".to_string(), RpcValue::Int(0));
            }
            SearchScope::ZoneRecords(zone_id) => {
                args.insert("nt_zone_id".to_string(), RpcValue::from(zone_id.as_str()));
            }
        }
        for (n, predicate) in self.predicates.iter().enumerate() {
            if n > 0 {
                args.insert(format!("{}_inclusive", n), RpcValue::from("And"));
            }
            args.insert(format!("{}_field", n), RpcValue::from(predicate.field.as_str()));
            args.insert(format!("{}_value", n), RpcValue::from(predicate.value.as_str()));
            args.insert(
                format!("{}_option", n),
                RpcValue::from(predicate.option.as_str()),
            );
        }
        if let Some((start, limit)) = self.paging {
            args.insert("start".to_string(), RpcValue::from(start));
            args.insert("limit".to_string(), RpcValue::from(limit));
        }
        args
    }
}

/// Opaque zone identifier assigned by the service.
///
/// The wire is inconsistent about typing identifiers (integers in some
/// responses, strings in others), so they are kept as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> ZoneId {
        ZoneId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ZoneId {
    fn deserialize<D>(deserializer: D) -> Result<ZoneId, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_id(deserializer).map(ZoneId)
    }
}

/// Opaque record identifier assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> RecordId {
        RecordId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<RecordId, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_id(deserializer).map(RecordId)
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

/// Accepts counters that arrive either as numbers or as numeric strings.
fn de_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse().map(Some).map_err(serde::de::Error::custom)
        }
    }
}

/// Accepts list fields that arrive as a single element instead of an
/// array, which happens when only one entry matched.
fn de_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(OneOrMany::Many(items)) => Ok(items),
        Some(OneOrMany::One(item)) => Ok(vec![item]),
    }
}

/// A zone as it appears in search results.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSummary {
    pub nt_zone_id: ZoneId,
    pub zone: String,
}

/// One page of a zone search.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSearchPage {
    #[serde(deserialize_with = "de_number")]
    pub total: u32,
    #[serde(default, deserialize_with = "de_number")]
    pub page: u32,
    #[serde(default, deserialize_with = "de_number")]
    pub limit: u32,
    #[serde(default, deserialize_with = "de_list")]
    pub zones: Vec<ZoneSummary>,
}

impl ZoneSearchPage {
    /// Number of entries consumed once this page has been scanned.
    /// Pages are 1-based; a page that cannot state its position cannot
    /// be advanced past.
    pub fn offset(&self) -> Option<u32> {
        if self.page == 0 || self.limit == 0 {
            return None;
        }
        Some(self.page.saturating_mul(self.limit))
    }
}

/// A single record as returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneRecord {
    pub nt_zone_record_id: RecordId,
    #[serde(default)]
    pub nt_zone_id: Option<ZoneId>,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub address: String,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub ttl: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub weight: Option<u32>,
}

/// Result of a record search within one zone.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSearchResult {
    #[serde(deserialize_with = "de_number")]
    pub total: u32,
    #[serde(default, deserialize_with = "de_list")]
    pub records: Vec<ZoneRecord>,
}

/// Successful login response. Only the token matters to this crate.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub nt_user_session: String,
}

/// Response to a record creation call.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecordResponse {
    pub nt_zone_record_id: RecordId,
}

/// Decode a generic response value into a typed view.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(RpcError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn arg(args: &ArgMap, key: &str) -> String {
        args.get(key)
            .unwrap_or_else(|| panic!("missing argument {}", key))
            .to_string()
    }

    #[test]
    fn test_group_zone_search_shape() {
        let args = SearchRequest::group_zones("example.com").into_args();

        assert_eq!(arg(&args, "Search"), "1");
        assert_eq!(arg(&args, "exact_match"), "1");
        assert_eq!(arg(&args, "nt_group_id"), "1");
        assert_eq!(arg(&args, "include_subgroups"), "1");
        assert_eq!(arg(&args, "quick_search"), "0");
        assert_eq!(arg(&args, "0_field"), "zone");
        assert_eq!(arg(&args, "0_value"), "example.com");
        assert_eq!(arg(&args, "0_option"), "equals");
        assert_eq!(arg(&args, "start"), "0");
        assert_eq!(arg(&args, "limit"), "255");
        assert!(!args.contains_key("0_inclusive"));
    }

    #[test]
    fn test_group_zone_search_offset() {
        let args = SearchRequest::group_zones("example.com")
            .start_at(255)
            .into_args();

        assert_eq!(arg(&args, "start"), "255");
        assert_eq!(arg(&args, "limit"), "255");
    }

    #[test]
    fn test_zone_record_search_shape() {
        let zone_id = ZoneId::new("42");
        let args = SearchRequest::zone_records(&zone_id, &RecordType::Ptr, "40").into_args();

        assert_eq!(arg(&args, "Search"), "1");
        assert_eq!(arg(&args, "exact_match"), "1");
        assert_eq!(arg(&args, "nt_zone_id"), "42");
        assert_eq!(arg(&args, "0_field"), "type");
        assert_eq!(arg(&args, "0_value"), "PTR");
        assert_eq!(arg(&args, "0_option"), "equals");
        assert_eq!(arg(&args, "1_inclusive"), "And");
        assert_eq!(arg(&args, "1_field"), "name");
        assert_eq!(arg(&args, "1_value"), "40");
        assert_eq!(arg(&args, "1_option"), "equals");
        assert!(!args.contains_key("start"));
        assert!(!args.contains_key("limit"));
    }

    #[test]
    fn test_zone_page_accepts_mixed_number_forms() {
        let page: ZoneSearchPage = serde_json::from_value(json!({
            "total": "2",
            "page": 1,
            "limit": "255",
            "zones": [
                {"nt_zone_id": 7, "zone": "example.com"},
                {"nt_zone_id": "8", "zone": "example.org"},
            ],
        }))
        .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.offset(), Some(255));
        assert_eq!(page.zones[0].nt_zone_id, ZoneId::new("7"));
        assert_eq!(page.zones[1].nt_zone_id, ZoneId::new("8"));
    }

    #[test]
    fn test_zone_page_without_position_cannot_advance() {
        let page: ZoneSearchPage = serde_json::from_value(json!({
            "total": 300,
            "zones": [],
        }))
        .unwrap();

        assert_eq!(page.offset(), None);
    }

    #[test]
    fn test_single_zone_entry_becomes_a_list() {
        let page: ZoneSearchPage = serde_json::from_value(json!({
            "total": 1,
            "page": 1,
            "limit": 255,
            "zones": {"nt_zone_id": 7, "zone": "example.com"},
        }))
        .unwrap();

        assert_eq!(page.zones.len(), 1);
        assert_eq!(page.zones[0].zone, "example.com");
    }

    #[test]
    fn test_record_decoding() {
        let result: RecordSearchResult = serde_json::from_value(json!({
            "total": 1,
            "records": [{
                "nt_zone_record_id": 99,
                "nt_zone_id": "3",
                "name": "host",
                "type": "A",
                "address": "10.20.30.40",
                "ttl": "3600",
            }],
        }))
        .unwrap();

        assert_eq!(result.total, 1);
        let record = &result.records[0];
        assert_eq!(record.nt_zone_record_id, RecordId::new("99"));
        assert_eq!(record.record_type, RecordType::A);
        assert_eq!(record.ttl, Some(3600));
        assert_eq!(record.weight, None);
    }

    #[test]
    fn test_empty_ttl_reads_as_absent() {
        let result: RecordSearchResult = serde_json::from_value(json!({
            "total": 1,
            "records": [{
                "nt_zone_record_id": 1,
                "name": "host",
                "type": "A",
                "address": "10.0.0.1",
                "ttl": "",
            }],
        }))
        .unwrap();

        assert_eq!(result.records[0].ttl, None);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(RpcMethod::Login.as_str(), "login");
        assert_eq!(RpcMethod::GetGroupZones.as_str(), "get_group_zones");
        assert_eq!(RpcMethod::GetZoneRecords.as_str(), "get_zone_records");
        assert_eq!(RpcMethod::NewZoneRecord.as_str(), "new_zone_record");
        assert_eq!(RpcMethod::DeleteZoneRecord.as_str(), "delete_zone_record");
    }
}
