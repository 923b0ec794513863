//! Round-trip laws for the method-URI codec

use stitcher::{MethodUri, UriError};

#[test]
fn test_parse_build_round_trip_preserves_node() {
    let cases = [
        "/java.lang/String.length()%2Fjava.lang%2FIntegerType",
        "/com.example/Widget.render(%2Fjava.lang%2FString,%2Fjava.lang%2FIntegerType)%2Fjava.lang%2FVoidType",
        "/ns/Outer.%3Cinit%3E(%2Fns%2FInner)%2Fns%2FVoidType",
    ];
    for case in cases {
        let parsed = MethodUri::parse(case).unwrap();
        let rebuilt = MethodUri::parse(&parsed.to_uri_string()).unwrap();
        assert_eq!(rebuilt.node(), parsed.node(), "round trip changed {case}");
    }
}

#[test]
fn test_decanonicalize_canonicalize_identity() {
    // Law holds for URIs without cross-authority sub-URIs
    let uri = MethodUri::parse(
        "fasten://mvn!org.example.app$1.0/com.example/Service.handle(%2Fjava.lang%2FString)%2Fjava.lang%2FVoidType",
    )
    .unwrap();
    assert_eq!(uri.clone().canonicalize().decanonicalize(), uri);
}

#[test]
fn test_decanonicalize_recovers_short_forms() {
    let canonical = MethodUri::parse(
        "fasten://mvn!g.a$1.0/ns/C.m(%2F%2Fmvn!g.a$1.0%2Fjava.lang%2FString)%2F%2Fmvn!g.a$1.0%2Fns%2FRet",
    )
    .unwrap();
    let short = canonical.decanonicalize();
    assert_eq!(short.args, vec!["/java.lang/String"]);
    assert_eq!(short.return_type, "/ns/Ret");
    assert_eq!(
        short.node().signature,
        "m(/java.lang/String)/ns/Ret"
    );
}

#[test]
fn test_malformed_inputs_are_rejected_not_mangled() {
    for bad in [
        "",
        "no-namespace",
        "/ns-only",
        "/ns/Class",                  // no signature
        "/ns/C.m%2Fns%2FV",           // no parens
        "/ns/C.m(%G1)%2Fns%2FV",      // bad escape
    ] {
        assert!(
            MethodUri::parse(bad).is_err(),
            "expected rejection for {bad:?}"
        );
    }
}

#[test]
fn test_error_kinds_are_specific() {
    assert!(matches!(
        MethodUri::parse("plain"),
        Err(UriError::MissingNamespace(_))
    ));
    assert!(matches!(
        MethodUri::parse("/ns/Klass"),
        Err(UriError::MissingSignature(_))
    ));
    assert!(matches!(
        MethodUri::parse("/ns/C.m()%2Fns%2FV("),
        Err(UriError::UnbalancedParens(_))
    ));
    assert!(matches!(
        MethodUri::parse("/ns/C.m(%xy)%2Fns%2FV"),
        Err(UriError::NonHexEscape { .. })
    ));
}
