//! Endpoint specification parsing and listener-set composition
//!
//! Exercises the documented host/port grammar through the public API and the
//! union behavior of multi-spec listen lists.

use nntp_slb::constants::listener::MAX_LISTENERS;
use nntp_slb::resolver::{ResolveMode, resolve, split_host_port};
use nntp_slb::{ListenerSet, ResolveError};

#[test]
fn spec_grammar_covers_all_documented_forms() {
    let cases: &[(&str, Option<&str>, Option<&str>)] = &[
        ("host:1190", Some("host"), Some("1190")),
        ("host", Some("host"), None),
        ("1190", None, Some("1190")),
        ("[::1]:1190", Some("::1"), Some("1190")),
        ("[::1]", Some("::1"), None),
        ("[fe80::1]:119", Some("fe80::1"), Some("119")),
        ("*", Some("0.0.0.0"), None),
        ("*:1190", Some("0.0.0.0"), Some("1190")),
        // Unbracketed IPv6 splits at the last colon.
        ("fe80::1", Some("fe80:"), Some("1")),
    ];

    for (spec, host, port) in cases {
        let parts = split_host_port(spec);
        assert_eq!(parts.host.as_deref(), *host, "host of {:?}", spec);
        assert_eq!(parts.port.as_deref(), *port, "port of {:?}", spec);
    }
}

#[test]
fn wildcard_resolves_to_ipv4_any_in_both_modes() {
    for mode in [ResolveMode::Listen, ResolveMode::Connect] {
        let addrs = resolve("*:1190", "119", mode).unwrap();
        assert!(
            addrs.contains(&"0.0.0.0:1190".parse().unwrap()),
            "mode {:?}",
            mode
        );
    }
}

#[test]
fn default_port_fills_in_when_a_spec_omits_one() {
    let addrs = resolve("127.0.0.1", "1190", ResolveMode::Listen).unwrap();
    assert_eq!(addrs, vec!["127.0.0.1:1190".parse().unwrap()]);
}

#[test]
fn resolution_failure_names_the_original_spec() {
    let err = resolve("not-a-literal:119", "119", ResolveMode::Listen).unwrap_err();
    assert!(matches!(err, ResolveError::Lookup { .. }));
    let msg = err.to_string();
    assert!(msg.starts_with("not-a-literal:119: "));
    // The resolver's failure text follows the spec, not an empty tail.
    assert!(msg.len() > "not-a-literal:119: ".len());
}

#[test]
fn listen_list_is_the_union_of_all_specs() {
    let specs = vec![
        "127.0.0.1:0".to_string(),
        "127.0.0.1:0".to_string(),
        "127.0.0.1:0".to_string(),
    ];
    let set = ListenerSet::bind(&specs, MAX_LISTENERS).unwrap();
    assert_eq!(set.len(), 3);

    let addrs = set.local_addrs().unwrap();
    assert_eq!(addrs.len(), 3);
    for addr in addrs {
        assert!(addr.ip().is_loopback());
    }
}

#[test]
fn listen_list_is_bounded_by_the_cap() {
    let specs: Vec<String> = (0..5).map(|_| "127.0.0.1:0".to_string()).collect();
    let set = ListenerSet::bind(&specs, 3).unwrap();
    assert_eq!(set.len(), 3);
}
