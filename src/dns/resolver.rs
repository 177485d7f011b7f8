//! Zone resolution.
//!
//! Two questions get answered here. "Which zone id is registered under
//! exactly this name?" is a paginated exact-match search against the
//! root group and its subgroups, cached per name because callers ask it
//! relentlessly. "Where does the host part end and the zone begin in
//! this fully qualified name?" is answered by walking the name from the
//! left, peeling one label at a time, until the remainder resolves as a
//! registered zone - which makes the most specific registered suffix
//! win, exactly what forward record placement needs.

use chrono::Duration;
use derive_more::{Display, Error, From};

use crate::dns::cache::{ZoneCache, ZONE_CACHE_TTL_SECS};
use crate::rpc::client::{RpcError, RpcInvoker};
use crate::rpc::protocol::{decode, RpcMethod, SearchRequest, ZoneId, ZoneSearchPage};
use crate::rpc::session::SessionManager;

#[derive(Debug, Display, From, Error)]
pub enum ResolveError {
    Rpc(RpcError),
    #[display(fmt = "unable to find zone {}", zone)]
    ZoneNotFound { zone: String },
}

type Result<T> = std::result::Result<T, ResolveError>;

/// Resolves zone names to their service-assigned identifiers.
pub struct ZoneResolver<I: RpcInvoker, C: ZoneCache> {
    session: SessionManager<I>,
    cache: C,
}

impl<I: RpcInvoker, C: ZoneCache> ZoneResolver<I, C> {
    pub fn new(session: SessionManager<I>, cache: C) -> ZoneResolver<I, C> {
        ZoneResolver { session, cache }
    }

    pub fn session_mut(&mut self) -> &mut SessionManager<I> {
        &mut self.session
    }

    /// Find the identifier of the zone registered under exactly `name`.
    ///
    /// Cached answers are served without a round-trip for the cache TTL;
    /// on a miss the paginated search runs until the zone shows up. Name
    /// comparison is case-insensitive.
    pub fn resolve_zone_id(&mut self, name: &str) -> Result<ZoneId> {
        if name.is_empty() {
            log::error!("unable to find zone: no name given");
            return Err(ResolveError::ZoneNotFound {
                zone: String::new(),
            });
        }
        if let Some(id) = self.cache.get(name) {
            return Ok(id);
        }
        let id = self.search_zone(name)?;
        self.cache
            .put(name, id.clone(), Duration::seconds(ZONE_CACHE_TTL_SECS));
        Ok(id)
    }

    fn search_zone(&mut self, name: &str) -> Result<ZoneId> {
        log::debug!("finding zone {}", name);
        let mut start = 0;
        let mut tentative = None;
        loop {
            let request = SearchRequest::group_zones(name).start_at(start);
            let response = self
                .session
                .call(RpcMethod::GetGroupZones, request.into_args())?;
            let page: ZoneSearchPage = decode(response)?;

            if page.total == 1 {
                if let Some(only) = page.zones.first() {
                    tentative = Some(only.nt_zone_id.clone());
                }
            }
            for zone in &page.zones {
                if zone.zone.eq_ignore_ascii_case(name) {
                    log::debug!("found zone id {}", zone.nt_zone_id);
                    return Ok(zone.nt_zone_id.clone());
                }
            }

            let offset = match page.offset() {
                Some(offset) => offset,
                None => break,
            };
            if page.total <= offset {
                break;
            }
            log::debug!("continuing search at offset {} of {}", offset, page.total);
            start = offset;
        }

        // an exact-match search reporting a single hit has found the
        // zone even when the listed name is normalized differently
        if let Some(id) = tentative {
            log::debug!("settling for the single match {} for zone {}", id, name);
            return Ok(id);
        }
        log::error!("unable to find zone {}", name);
        Err(ResolveError::ZoneNotFound {
            zone: name.to_string(),
        })
    }

    /// Split a fully qualified name into its host label and the longest
    /// registered zone suffix.
    ///
    /// Labels are peeled off the front of the name until the remainder
    /// resolves as a zone. When nothing resolves, the returned zone is
    /// empty and the host holds the whole name; callers must check for
    /// that before using the result.
    pub fn split_host_and_zone(&mut self, fqdn: &str) -> Result<(String, String)> {
        let mut rest = fqdn.strip_suffix('.').unwrap_or(fqdn);
        let mut host = String::new();
        while !rest.is_empty() {
            match self.resolve_zone_id(rest) {
                Ok(_) => break,
                Err(ResolveError::ZoneNotFound { .. }) => {
                    let (label, tail) = match rest.split_once('.') {
                        Some(parts) => parts,
                        None => (rest, ""),
                    };
                    if !host.is_empty() {
                        host.push('.');
                    }
                    host.push_str(label);
                    rest = tail;
                }
                Err(other) => return Err(other),
            }
        }
        Ok((host, rest.to_string()))
    }
}
