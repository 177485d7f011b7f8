//! Property-based tests for the reverse-address transform and the
//! host/zone split walk.

use proptest::prelude::*;

use serde_json::{json, Value};
use zonesync::dns::cache::NullCache;
use zonesync::dns::netutil::{ip_to_arpa, is_ipv4};
use zonesync::dns::resolver::ZoneResolver;
use zonesync::rpc::client::{RpcError, RpcInvoker};
use zonesync::rpc::protocol::{ArgMap, RpcMethod, RpcValue};
use zonesync::rpc::session::SessionManager;

// Strategy for generating dotted names of 1..4 lowercase labels
fn name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9]{0,10}", 1..4).prop_map(|parts| parts.join("."))
}

/// Invoker that resolves exactly one registered zone and knows nothing
/// else.
struct SingleZoneService {
    zone: String,
}

impl RpcInvoker for SingleZoneService {
    fn invoke(&self, method: RpcMethod, args: &ArgMap) -> Result<Value, RpcError> {
        match method {
            RpcMethod::Login => Ok(json!({"nt_user_session": "tok", "error_code": 200})),
            RpcMethod::GetGroupZones => {
                let wanted = match args.get("0_value") {
                    Some(RpcValue::Str(s)) => s.clone(),
                    _ => String::new(),
                };
                if wanted.eq_ignore_ascii_case(&self.zone) {
                    Ok(json!({
                        "total": 1, "page": 1, "limit": 255,
                        "zones": [{"nt_zone_id": 1, "zone": self.zone.clone()}],
                        "error_code": 200,
                    }))
                } else {
                    Ok(json!({
                        "total": 0, "page": 1, "limit": 255,
                        "zones": [],
                        "error_code": 200,
                    }))
                }
            }
            other => panic!("unexpected call {}", other),
        }
    }
}

proptest! {
    #[test]
    fn test_arpa_transform_shape(a in any::<u8>(), b in any::<u8>(), c in any::<u8>(), d in any::<u8>()) {
        let addr = format!("{}.{}.{}.{}", a, b, c, d);
        let (label, zone) = ip_to_arpa(&addr).expect("valid quad must map");

        prop_assert_eq!(label, d.to_string());
        prop_assert_eq!(zone, format!("{}.{}.{}.in-addr.arpa", c, b, a));
        prop_assert!(is_ipv4(&addr));
    }

    #[test]
    fn test_split_recovers_host_and_registered_zone(
        host in name_strategy(),
        zone in name_strategy(),
    ) {
        let service = SingleZoneService { zone: zone.clone() };
        let session = SessionManager::new(service, "ops", "secret");
        let mut resolver = ZoneResolver::new(session, NullCache);

        let fqdn = format!("{}.{}", host, zone);
        let (split_host, split_zone) = resolver.split_host_and_zone(&fqdn).unwrap();

        prop_assert_eq!(split_host, host);
        prop_assert_eq!(split_zone, zone);
    }

    #[test]
    fn test_split_of_unregistered_name_keeps_whole_name_as_host(
        name in name_strategy(),
    ) {
        let service = SingleZoneService { zone: "registered.example".to_string() };
        let session = SessionManager::new(service, "ops", "secret");
        let mut resolver = ZoneResolver::new(session, NullCache);

        prop_assume!(name != "registered.example" && !name.ends_with(".registered.example"));
        let (split_host, split_zone) = resolver.split_host_and_zone(&name).unwrap();

        prop_assert_eq!(split_host, name);
        prop_assert_eq!(split_zone, "");
    }
}
