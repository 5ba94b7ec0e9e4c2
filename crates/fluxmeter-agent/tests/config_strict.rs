#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use fluxmeter_agent::config::{self, SinkKind};
use fluxmeter_core::protocol::{Consistency, Precision};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
batch:
  database: "metrics"
  precison: "s" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.class().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
batch:
  database: "metrics"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.batch.database, "metrics");
    assert_eq!(cfg.batch.precision, Precision::Nanoseconds);
    assert_eq!(cfg.histogram.buckets, 50);
    assert_eq!(cfg.export.interval_ms, 10_000);
    assert_eq!(cfg.export.sink, SinkKind::Stdout);
    assert_eq!(cfg.ops.listen, "0.0.0.0:9273");
}

#[test]
fn ok_full_config() {
    let ok = r#"
version: 1
tags:
  host: "web-1"
  region: "eu-west"
batch:
  database: "metrics"
  retention_policy: "two_weeks"
  precision: "ms"
  write_consistency: "quorum"
histogram:
  buckets: 100
export:
  interval_ms: 5000
  sink: file
  path: "/var/lib/fluxmeter/points.lp"
ops:
  listen: "127.0.0.1:9000"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.tags.get("host").map(String::as_str), Some("web-1"));
    assert_eq!(cfg.batch.precision, Precision::Milliseconds);
    assert_eq!(cfg.batch.write_consistency, Some(Consistency::Quorum));
    assert_eq!(cfg.histogram.buckets, 100);
    assert_eq!(cfg.export.sink, SinkKind::File);
    assert_eq!(cfg.ops.listen_addr().unwrap().port(), 9000);
}

#[test]
fn rejects_invalid_values() {
    let cases = [
        ("wrong version", "version: 2\nbatch: { database: m }\n"),
        ("missing database", "version: 1\nbatch: { database: \"\" }\n"),
        ("unknown precision", "version: 1\nbatch: { database: m, precision: h }\n"),
        ("empty tag value", "version: 1\ntags: { host: \"\" }\nbatch: { database: m }\n"),
        ("reserved tag key", "version: 1\ntags: { time: x }\nbatch: { database: m }\n"),
        ("too few buckets", "version: 1\nbatch: { database: m }\nhistogram: { buckets: 1 }\n"),
        ("interval too short", "version: 1\nbatch: { database: m }\nexport: { interval_ms: 10 }\n"),
        ("file sink without path", "version: 1\nbatch: { database: m }\nexport: { sink: file }\n"),
        ("path with stdout", "version: 1\nbatch: { database: m }\nexport: { path: /tmp/x }\n"),
        ("bad listen", "version: 1\nbatch: { database: m }\nops: { listen: nowhere }\n"),
    ];
    for (what, yaml) in cases {
        let err = config::load_from_str(yaml)
            .err()
            .unwrap_or_else(|| panic!("{what}: accepted"));
        assert_eq!(err.class().as_str(), "CONFIG", "{what}");
    }
}
