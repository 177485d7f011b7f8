//! Forward/reverse record reconciliation.
//!
//! Everything here is built around one invariant: a reverse record is
//! only ever deleted when its stored value provably points back at the
//! forward record just removed. Several forward records can share one
//! address, so a PTR that names a different host is always left alone.
//! The same caution applies to plain deletes - when more than one record
//! matches, deleting any of them risks collateral damage, so nothing is
//! deleted at all.
//!
//! Additions are tolerant instead: missing parameters or an address that
//! is not valid IPv4 make the call a quiet no-op, which is what bulk
//! automation feeding this crate wants.

use derive_more::{Display, Error, From};

use crate::dns::cache::{TtlZoneCache, ZoneCache};
use crate::dns::netutil::{ip_to_arpa, is_ipv4};
use crate::dns::record_type::RecordType;
use crate::dns::resolver::{ResolveError, ZoneResolver};
use crate::rpc::client::{RpcError, RpcInvoker};
use crate::rpc::protocol::{
    decode, ArgMap, NewRecordResponse, RecordId, RecordSearchResult, RpcMethod, RpcValue,
    SearchRequest, ZoneRecord,
};
use crate::rpc::session::SessionManager;

/// TTL applied to created records when the caller has no opinion.
pub const DEFAULT_RECORD_TTL: u32 = 3600;

/// Weight attached to MX records; the service requires one.
const MX_WEIGHT: u32 = 10;

#[derive(Debug, Display, From, Error)]
pub enum ReconcileError {
    Rpc(RpcError),
    Resolve(ResolveError),
}

type Result<T> = std::result::Result<T, ReconcileError>;

/// Reconciles forward and reverse records through the zone service.
pub struct RecordReconciler<I: RpcInvoker, C: ZoneCache> {
    resolver: ZoneResolver<I, C>,
}

impl<I: RpcInvoker> RecordReconciler<I, TtlZoneCache> {
    /// Wire a reconciler from an invoker and credentials, with the
    /// default zone cache.
    pub fn connect(invoker: I, username: &str, password: &str) -> RecordReconciler<I, TtlZoneCache> {
        let session = SessionManager::new(invoker, username, password);
        RecordReconciler::new(ZoneResolver::new(session, TtlZoneCache::new()))
    }
}

impl<I: RpcInvoker, C: ZoneCache> RecordReconciler<I, C> {
    pub fn new(resolver: ZoneResolver<I, C>) -> RecordReconciler<I, C> {
        RecordReconciler { resolver }
    }

    pub fn resolver_mut(&mut self) -> &mut ZoneResolver<I, C> {
        &mut self.resolver
    }

    /// Find records of one type and name inside a zone.
    ///
    /// Issues a single exact-match page. `total` reports the true match
    /// count even when it exceeds what the page carries.
    pub fn find_records(
        &mut self,
        zone: &str,
        name: &str,
        record_type: &RecordType,
    ) -> Result<RecordSearchResult> {
        let zone_id = self.resolver.resolve_zone_id(zone)?;
        let request = SearchRequest::zone_records(&zone_id, record_type, name);
        let response = self
            .resolver
            .session_mut()
            .call(RpcMethod::GetZoneRecords, request.into_args())?;
        Ok(decode(response)?)
    }

    /// Delete the record matching zone/name/type, but only when exactly
    /// one record matches. Zero matches is a quiet no-op; several
    /// matches is a warned no-op. Returns the deleted record's captured
    /// data so callers can clean up what it pointed at.
    pub fn delete_unique_record(
        &mut self,
        zone: &str,
        name: &str,
        record_type: &RecordType,
    ) -> Result<Option<ZoneRecord>> {
        let found = self.find_records(zone, name, record_type)?;
        if found.total < 1 {
            log::debug!("unable to find {} [{}] to delete from {}", name, record_type, zone);
            return Ok(None);
        }
        if found.total > 1 {
            log::warn!(
                "{} records matched {} [{}] in {}, not deleting any of them",
                found.total,
                name,
                record_type,
                zone
            );
            return Ok(None);
        }
        let record = match found.records.into_iter().next() {
            Some(record) => record,
            None => {
                log::warn!(
                    "search for {} [{}] in {} reported one match but returned none",
                    name,
                    record_type,
                    zone
                );
                return Ok(None);
            }
        };

        log::debug!("deleting {} [{}] from {}", name, record_type, zone);
        let mut args = ArgMap::new();
        args.insert(
            "nt_zone_record_id".to_string(),
            RpcValue::from(record.nt_zone_record_id.as_str()),
        );
        self.resolver
            .session_mut()
            .call(RpcMethod::DeleteZoneRecord, args)?;
        Ok(Some(record))
    }

    /// Create a record in a zone and return its new identifier.
    ///
    /// A blank record id in the request tells the service to create
    /// rather than edit.
    pub fn add_record(
        &mut self,
        zone: &str,
        name: &str,
        record_type: &RecordType,
        address: &str,
        ttl: u32,
    ) -> Result<RecordId> {
        let zone_id = self.resolver.resolve_zone_id(zone)?;
        let mut args = ArgMap::new();
        args.insert("nt_zone_id".to_string(), RpcValue::from(zone_id.as_str()));
        args.insert("nt_zone_record_id".to_string(), RpcValue::from(""));
        args.insert("name".to_string(), RpcValue::from(name));
        args.insert("type".to_string(), RpcValue::from(record_type.as_str()));
        args.insert("address".to_string(), RpcValue::from(address));
        args.insert("ttl".to_string(), RpcValue::from(ttl));
        if *record_type == RecordType::Mx {
            args.insert("weight".to_string(), RpcValue::from(MX_WEIGHT));
        }
        let response = self
            .resolver
            .session_mut()
            .call(RpcMethod::NewZoneRecord, args)?;
        let created: NewRecordResponse = decode(response)?;
        Ok(created.nt_zone_record_id)
    }

    /// Delete a forward record, its reverse counterpart, or both.
    ///
    /// With a hostname, the unique A record goes first; its reverse
    /// record follows only when the PTR value (trailing dot stripped)
    /// equals the hostname. With an ip, the unique PTR goes first and
    /// the forward record it implies is derived from the hostname
    /// argument by splitting at the first dot - the historical behavior,
    /// kept deliberately (see DESIGN.md).
    pub fn delete_forward_and_reverse(
        &mut self,
        hostname: Option<&str>,
        ip: Option<&str>,
    ) -> Result<()> {
        if let Some(hostname) = hostname {
            self.delete_forward_then_reverse(hostname)?;
        }
        if let Some(ip) = ip {
            self.delete_reverse_then_forward(ip, hostname)?;
        }
        Ok(())
    }

    fn delete_forward_then_reverse(&mut self, hostname: &str) -> Result<()> {
        let (name, zone) = self.resolver.split_host_and_zone(hostname)?;
        let record = match self.delete_unique_record(&zone, &name, &RecordType::A)? {
            Some(record) => record,
            None => return Ok(()),
        };

        let (ptr_name, ptr_zone) = match ip_to_arpa(&record.address) {
            Some(parts) => parts,
            None => {
                log::warn!(
                    "deleted record for {} carries unparseable address {}, leaving reverse records alone",
                    hostname,
                    record.address
                );
                return Ok(());
            }
        };
        let found = self.find_records(&ptr_zone, &ptr_name, &RecordType::Ptr)?;
        let reverse = match found.records.first() {
            Some(reverse) => reverse,
            None => return Ok(()),
        };
        if reverse.address.trim_end_matches('.') != hostname {
            // several A records can share one address; only the matching
            // reverse entry may go
            log::warn!(
                "reverse record for {} [{}] does not match {}, not deleting {}.{}",
                record.address,
                reverse.address.trim_end_matches('.'),
                hostname,
                ptr_name,
                ptr_zone
            );
            return Ok(());
        }
        self.delete_unique_record(&ptr_zone, &ptr_name, &RecordType::Ptr)?;
        Ok(())
    }

    fn delete_reverse_then_forward(&mut self, ip: &str, hostname: Option<&str>) -> Result<()> {
        let (ptr_name, ptr_zone) = match ip_to_arpa(ip) {
            Some(parts) => parts,
            None => {
                log::debug!("{} is not a valid IPv4 address, nothing to delete", ip);
                return Ok(());
            }
        };
        if self
            .delete_unique_record(&ptr_zone, &ptr_name, &RecordType::Ptr)?
            .is_none()
        {
            return Ok(());
        }

        let hostname = match hostname {
            Some(hostname) => hostname,
            None => {
                log::warn!(
                    "reverse record for {} deleted but no hostname was supplied, leaving the forward record alone",
                    ip
                );
                return Ok(());
            }
        };
        // the forward zone comes from the hostname argument, split at
        // its first dot; see DESIGN.md before changing this
        let trimmed = hostname.trim_end_matches('.');
        let (name, zone) = match trimmed.split_once('.') {
            Some(parts) => parts,
            None => (trimmed, ""),
        };
        self.delete_unique_record(zone, name, &RecordType::A)?;
        Ok(())
    }

    /// Create the A record and its PTR counterpart for a host/address
    /// pair. Quietly does nothing unless both parts are present and the
    /// address is valid IPv4.
    pub fn add_forward_and_reverse(&mut self, hostname: &str, ip: &str, ttl: u32) -> Result<()> {
        if !valid_pair(hostname, ip) {
            return Ok(());
        }
        self.add_forward_record(hostname, ip, ttl)?;
        self.add_reverse_record(hostname, ip, ttl)?;
        Ok(())
    }

    /// Create only the forward (A) record for a host/address pair.
    pub fn add_forward_record(&mut self, hostname: &str, ip: &str, ttl: u32) -> Result<()> {
        if !valid_pair(hostname, ip) {
            return Ok(());
        }
        let (name, zone) = self.resolver.split_host_and_zone(hostname)?;
        self.add_record(&zone, &name, &RecordType::A, ip, ttl)?;
        Ok(())
    }

    /// Create only the reverse (PTR) record for a host/address pair.
    /// The stored value is the hostname in absolute form (trailing dot).
    pub fn add_reverse_record(&mut self, hostname: &str, ip: &str, ttl: u32) -> Result<()> {
        if !valid_pair(hostname, ip) {
            return Ok(());
        }
        if let Some((ptr_name, ptr_zone)) = ip_to_arpa(ip) {
            self.add_record(
                &ptr_zone,
                &ptr_name,
                &RecordType::Ptr,
                &format!("{}.", hostname),
                ttl,
            )?;
        }
        Ok(())
    }
}

fn valid_pair(hostname: &str, ip: &str) -> bool {
    if hostname.is_empty() || ip.is_empty() {
        log::debug!("both a hostname and an address are required, skipping");
        return false;
    }
    if !is_ipv4(ip) {
        log::debug!("{} is not a valid IPv4 address, skipping", ip);
        return false;
    }
    true
}
