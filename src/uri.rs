//! Method-URI codec
//!
//! Parses and rebuilds method identifiers of the form
//! `/<namespace>/<ClassName>.<method>(<arg>,...)<return>`, optionally carrying
//! a `fasten:` scheme and a `//forge!product$version` authority. Argument and
//! return types are themselves percent-encoded type URIs.
//!
//! The resolver keys everything by the [`Node`] decomposition produced here:
//! the type URI (`/<namespace>/<ClassName>`) and the decoded signature
//! (`<method>(<args>)<return>`). Constructors use the method name `<init>`,
//! class initializers `<clinit>`.

use thiserror::Error;

/// Error types for method-URI parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UriError {
    /// No `/`-delimited namespace component
    #[error("missing '/'-delimited namespace: {0}")]
    MissingNamespace(String),

    /// Namespace present but no entity after it
    #[error("missing entity component: {0}")]
    MissingEntity(String),

    /// Entity has no `.`-separated method signature
    #[error("missing method signature in entity: {0}")]
    MissingSignature(String),

    /// Signature parentheses are missing or out of order
    #[error("unbalanced parentheses in signature: {0}")]
    UnbalancedParens(String),

    /// A `%` escape is not followed by two hex digits
    #[error("non-hex percent escape at byte {pos}: {uri}")]
    NonHexEscape { uri: String, pos: usize },
}

/// Characters that survive percent-encoding verbatim (beyond alphanumerics).
///
/// Matches the arg-char production of the URI grammar: unreserved plus the
/// sub-delims usable inside type names.
const TYPE_CHARS: &[char] = &[
    '-', '.', '_', '~', '!', '$', '&', '\'', '*', ';', '=', '@',
];

/// Percent-encode a sub-URI for embedding in a signature.
pub fn pct_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || TYPE_CHARS.contains(&c) || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('%');
            out.push_str(&format!("{:02X}", c as u32));
        }
    }
    out
}

/// Percent-decode a component, rejecting malformed escapes.
pub fn pct_decode(s: &str) -> Result<String, UriError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).copied();
            let lo = bytes.get(i + 2).copied();
            match (
                hi.and_then(|b| (b as char).to_digit(16)),
                lo.and_then(|b| (b as char).to_digit(16)),
            ) {
                (Some(h), Some(l)) => {
                    out.push((h * 16 + l) as u8);
                    i += 3;
                }
                _ => {
                    return Err(UriError::NonHexEscape {
                        uri: s.to_string(),
                        pos: i,
                    })
                }
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    // Escapes decode to arbitrary bytes; re-validate as UTF-8
    String::from_utf8(out).map_err(|_| UriError::NonHexEscape {
        uri: s.to_string(),
        pos: 0,
    })
}

/// A type plus method signature extracted from a method URI.
///
/// This is the lookup key shape used by the type dictionary and the
/// resolver: `type_uri` is `/<namespace>/<ClassName>`, `signature` is the
/// decoded `<method>(<args>)<return>` text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    /// Type component, `/<namespace>/<ClassName>`
    pub type_uri: String,
    /// Method signature, `<method>(<args>)<return>`
    pub signature: String,
}

impl Node {
    /// True if this node is an instance constructor (`<init>` method).
    pub fn is_constructor(&self) -> bool {
        self.signature.starts_with("<init>")
    }

    /// The signature of the class initializer triggered by this constructor.
    pub fn clinit_signature(&self) -> String {
        self.signature.replace("<init>", "<clinit>")
    }

    /// Full short-form URI of this node.
    pub fn uri(&self) -> String {
        format!("{}.{}", self.type_uri, self.signature)
    }
}

/// A parsed method URI.
///
/// Components are stored decoded; [`MethodUri::to_uri_string`] re-encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodUri {
    /// `forge!product$version` authority, when the URI carried one
    pub authority: Option<String>,
    /// Namespace (package) component, decoded
    pub namespace: String,
    /// Class name, decoded
    pub class_name: String,
    /// Method name, decoded (`<init>` for constructors)
    pub method_name: String,
    /// Argument type sub-URIs, decoded
    pub args: Vec<String>,
    /// Return type sub-URI, decoded
    pub return_type: String,
}

impl MethodUri {
    /// Parse a canonical or short-form method URI.
    ///
    /// Accepts `fasten://forge!product$version/ns/Class.m(...)R`,
    /// `//forge!product$version/ns/Class.m(...)R`, and `/ns/Class.m(...)R`.
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let rest = uri.strip_prefix("fasten:").unwrap_or(uri);

        let (authority, path) = if let Some(after) = rest.strip_prefix("//") {
            match after.find('/') {
                Some(slash) => (
                    Some(after[..slash].to_string()),
                    &after[slash..],
                ),
                None => return Err(UriError::MissingNamespace(uri.to_string())),
            }
        } else {
            (None, rest)
        };

        let path = path
            .strip_prefix('/')
            .ok_or_else(|| UriError::MissingNamespace(uri.to_string()))?;
        let slash = path
            .find('/')
            .ok_or_else(|| UriError::MissingNamespace(uri.to_string()))?;
        let namespace = pct_decode(&path[..slash])?;
        if namespace.is_empty() {
            return Err(UriError::MissingNamespace(uri.to_string()));
        }
        let entity = &path[slash + 1..];
        if entity.is_empty() {
            return Err(UriError::MissingEntity(uri.to_string()));
        }

        let dot = entity
            .find('.')
            .ok_or_else(|| UriError::MissingSignature(uri.to_string()))?;
        let class_name = pct_decode(&entity[..dot])?;
        let sig = &entity[dot + 1..];

        // Structural parens of the signature are unencoded in the wire form;
        // parens inside sub-URIs arrive as escapes and do not collide here.
        let open = sig.find('(');
        let close = sig.find(')');
        let (open, close) = match (open, close) {
            (Some(o), Some(c)) if o < c => (o, c),
            _ => return Err(UriError::UnbalancedParens(uri.to_string())),
        };
        if sig[close + 1..].contains('(') || sig[close + 1..].contains(')') {
            return Err(UriError::UnbalancedParens(uri.to_string()));
        }

        let method_name = pct_decode(&sig[..open])?;
        let arg_list = &sig[open + 1..close];
        let args = if arg_list.is_empty() {
            Vec::new()
        } else {
            arg_list
                .split(',')
                .map(pct_decode)
                .collect::<Result<Vec<_>, _>>()?
        };
        let return_type = pct_decode(&sig[close + 1..])?;

        Ok(MethodUri {
            authority,
            namespace,
            class_name,
            method_name,
            args,
            return_type,
        })
    }

    /// Strip the outer authority from argument/return sub-URIs that carry it.
    ///
    /// Stored canonical URIs qualify every sub-URI with the authority of the
    /// artifact that defines the type. Lookups key on short forms, so
    /// matching authorities are removed; foreign authorities are kept.
    pub fn decanonicalize(mut self) -> Self {
        if let Some(authority) = self.authority.clone() {
            let strip = |sub: &str| -> String {
                let body = sub.strip_prefix("fasten:").unwrap_or(sub);
                if let Some(after) = body.strip_prefix("//") {
                    if let Some(path) = after.strip_prefix(authority.as_str()) {
                        if path.starts_with('/') {
                            return path.to_string();
                        }
                    }
                }
                sub.to_string()
            };
            for arg in &mut self.args {
                *arg = strip(arg);
            }
            self.return_type = strip(&self.return_type);
        }
        self
    }

    /// Qualify authority-less argument/return sub-URIs with the outer
    /// authority. Inverse of [`MethodUri::decanonicalize`] for URIs without
    /// cross-authority sub-URIs.
    pub fn canonicalize(mut self) -> Self {
        if let Some(authority) = self.authority.clone() {
            let qualify = |sub: &str| -> String {
                if sub.starts_with('/') && !sub.starts_with("//") {
                    format!("//{}{}", authority, sub)
                } else {
                    sub.to_string()
                }
            };
            for arg in &mut self.args {
                *arg = qualify(arg);
            }
            self.return_type = qualify(&self.return_type);
        }
        self
    }

    /// Type URI of the declaring class, `/<namespace>/<ClassName>`.
    pub fn type_uri(&self) -> String {
        format!("/{}/{}", self.namespace, self.class_name)
    }

    /// Decoded method signature, `<method>(<args>)<return>`.
    pub fn signature(&self) -> String {
        format!(
            "{}({}){}",
            self.method_name,
            self.args.join(","),
            self.return_type
        )
    }

    /// Decompose into the resolver's lookup key.
    pub fn node(&self) -> Node {
        Node {
            type_uri: self.type_uri(),
            signature: self.signature(),
        }
    }

    /// Rebuild the wire form, percent-encoding sub-URIs.
    pub fn to_uri_string(&self) -> String {
        let mut out = String::new();
        if let Some(authority) = &self.authority {
            out.push_str("fasten://");
            out.push_str(authority);
        }
        out.push('/');
        out.push_str(&self.namespace);
        out.push('/');
        out.push_str(&pct_encode(&self.class_name));
        out.push('.');
        out.push_str(&self.method_name);
        out.push('(');
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&pct_encode(arg));
        }
        out.push(')');
        out.push_str(&pct_encode(&self.return_type));
        out
    }
}

/// Parse a URI, decanonicalize, and decompose in one step.
///
/// This is the path every stored callable URI takes on its way into the
/// type dictionary or the focal type map.
pub fn parse_node(uri: &str) -> Result<Node, UriError> {
    Ok(MethodUri::parse(uri)?.decanonicalize().node())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_form() {
        let uri = MethodUri::parse("/java.lang/String.length()%2Fjava.lang%2FIntegerType")
            .unwrap();
        assert_eq!(uri.namespace, "java.lang");
        assert_eq!(uri.class_name, "String");
        assert_eq!(uri.method_name, "length");
        assert!(uri.args.is_empty());
        assert_eq!(uri.return_type, "/java.lang/IntegerType");
        assert_eq!(uri.authority, None);
    }

    #[test]
    fn test_parse_full_form_with_authority() {
        let uri = MethodUri::parse(
            "fasten://mvn!g.a$1.0/com.example/Widget.render(%2Fjava.lang%2FString)%2Fjava.lang%2FVoidType",
        )
        .unwrap();
        assert_eq!(uri.authority.as_deref(), Some("mvn!g.a$1.0"));
        assert_eq!(uri.type_uri(), "/com.example/Widget");
        assert_eq!(uri.args, vec!["/java.lang/String"]);
    }

    #[test]
    fn test_node_decomposition() {
        let node = parse_node("/com.example/Widget.render(%2Fjava.lang%2FString)%2Fjava.lang%2FVoidType")
            .unwrap();
        assert_eq!(node.type_uri, "/com.example/Widget");
        assert_eq!(
            node.signature,
            "render(/java.lang/String)/java.lang/VoidType"
        );
        assert!(!node.is_constructor());
    }

    #[test]
    fn test_constructor_node() {
        let node = parse_node("/com.example/Widget.%3Cinit%3E()%2Fjava.lang%2FVoidType").unwrap();
        assert!(node.is_constructor());
        assert_eq!(
            node.clinit_signature(),
            "<clinit>()/java.lang/VoidType"
        );
    }

    #[test]
    fn test_constructor_literal_angle_brackets() {
        // Producers differ on whether <init> arrives encoded; both parse
        let node = parse_node("/com.example/Widget.<init>()%2Fjava.lang%2FVoidType").unwrap();
        assert!(node.is_constructor());
    }

    #[test]
    fn test_decanonicalize_strips_matching_authority() {
        let uri = MethodUri::parse(
            "fasten://mvn!g.a$1.0/ns/C.m(%2F%2Fmvn!g.a$1.0%2Fjava.lang%2FString)%2F%2Fmvn!other$2.0%2Fns%2FD",
        )
        .unwrap()
        .decanonicalize();
        // Matching authority stripped, foreign authority kept
        assert_eq!(uri.args, vec!["/java.lang/String"]);
        assert_eq!(uri.return_type, "//mvn!other$2.0/ns/D");
    }

    #[test]
    fn test_decanonicalize_canonicalize_round_trip() {
        let original = MethodUri::parse(
            "fasten://mvn!g.a$1.0/ns/C.m(%2Fjava.lang%2FString)%2Fjava.lang%2FVoidType",
        )
        .unwrap();
        let round_tripped = original.clone().canonicalize().decanonicalize();
        assert_eq!(round_tripped, original);
    }

    #[test]
    fn test_build_parse_round_trip() {
        let uri = MethodUri {
            authority: None,
            namespace: "com.example".to_string(),
            class_name: "Widget".to_string(),
            method_name: "render".to_string(),
            args: vec!["/java.lang/String".to_string()],
            return_type: "/java.lang/VoidType".to_string(),
        };
        let reparsed = MethodUri::parse(&uri.to_uri_string()).unwrap();
        assert_eq!(reparsed.node(), uri.node());
        assert_eq!(reparsed.type_uri(), "/com.example/Widget");
    }

    #[test]
    fn test_missing_namespace_rejected() {
        assert!(matches!(
            MethodUri::parse("no-slashes-here"),
            Err(UriError::MissingNamespace(_))
        ));
        assert!(matches!(
            MethodUri::parse("/only-namespace"),
            Err(UriError::MissingNamespace(_))
        ));
    }

    #[test]
    fn test_missing_signature_rejected() {
        assert!(matches!(
            MethodUri::parse("/ns/ClassOnly"),
            Err(UriError::MissingSignature(_))
        ));
    }

    #[test]
    fn test_unbalanced_parens_rejected() {
        assert!(matches!(
            MethodUri::parse("/ns/C.m%2Fjava.lang%2FVoidType"),
            Err(UriError::UnbalancedParens(_))
        ));
        assert!(matches!(
            MethodUri::parse("/ns/C.m)broken(%2Fns%2FT"),
            Err(UriError::UnbalancedParens(_))
        ));
    }

    #[test]
    fn test_non_hex_escape_rejected() {
        assert!(matches!(
            MethodUri::parse("/ns/C.m(%ZZ)%2Fns%2FT"),
            Err(UriError::NonHexEscape { .. })
        ));
        // Truncated escape at end of input
        assert!(matches!(
            MethodUri::parse("/ns/C.m()%2"),
            Err(UriError::NonHexEscape { .. })
        ));
    }

    #[test]
    fn test_pct_encode_decode_round_trip() {
        let original = "/java.lang/String";
        let encoded = pct_encode(original);
        assert_eq!(encoded, "%2Fjava.lang%2FString");
        assert_eq!(pct_decode(&encoded).unwrap(), original);
    }

    #[test]
    fn test_multiple_args() {
        let node = parse_node(
            "/ns/C.combine(%2Fns%2FA,%2Fns%2FB,%2Fns%2FC)%2Fns%2FR",
        )
        .unwrap();
        assert_eq!(node.signature, "combine(/ns/A,/ns/B,/ns/C)/ns/R");
    }
}
