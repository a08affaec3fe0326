//! Identity document types accepted by the verification flow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of identity document a session was opened with.
///
/// Wire codes are the short lowercase strings kiosks send (`"ci"`, `"ce"`,
/// `"pp"`); anything else is preserved verbatim as [`DocumentType::Other`]
/// rather than rejected, so new document kinds degrade gracefully to the
/// generic display label.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
    /// Cédula de Ciudadanía (national ID).
    Ci,
    /// Cédula de Extranjería (foreign resident ID).
    Ce,
    /// Pasaporte (passport).
    Pp,
    /// Any other document code, kept as received.
    Other(String),
}

impl DocumentType {
    /// Short wire code (`"ci"`, `"ce"`, `"pp"`, or the original string).
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Ci => "ci",
            Self::Ce => "ce",
            Self::Pp => "pp",
            Self::Other(code) => code,
        }
    }

    /// Human-readable label shown to operators.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ci => "Cédula de Ciudadanía",
            Self::Ce => "Cédula de Extranjería",
            Self::Pp => "Pasaporte",
            Self::Other(_) => "Documento",
        }
    }
}

impl From<String> for DocumentType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ci" => Self::Ci,
            "ce" => Self::Ce,
            "pp" => Self::Pp,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for DocumentType {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<DocumentType> for String {
    fn from(doc: DocumentType) -> Self {
        doc.code().to_owned()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_parse() {
        assert_eq!(DocumentType::from("ci"), DocumentType::Ci);
        assert_eq!(DocumentType::from("ce"), DocumentType::Ce);
        assert_eq!(DocumentType::from("pp"), DocumentType::Pp);
    }

    #[test]
    fn unknown_code_preserved() {
        let doc = DocumentType::from("ti");
        assert_eq!(doc, DocumentType::Other("ti".to_owned()));
        assert_eq!(doc.code(), "ti");
    }

    #[test]
    fn codes_are_case_sensitive() {
        // Kiosks send lowercase; anything else falls back to the generic label.
        let doc = DocumentType::from("CI");
        assert_eq!(doc, DocumentType::Other("CI".to_owned()));
        assert_eq!(doc.label(), "Documento");
    }

    #[test]
    fn labels() {
        assert_eq!(DocumentType::Ci.label(), "Cédula de Ciudadanía");
        assert_eq!(DocumentType::Ce.label(), "Cédula de Extranjería");
        assert_eq!(DocumentType::Pp.label(), "Pasaporte");
        assert_eq!(DocumentType::Other("xx".into()).label(), "Documento");
    }

    #[test]
    fn serde_uses_wire_codes() {
        let json = serde_json::to_string(&DocumentType::Ce).unwrap();
        assert_eq!(json, "\"ce\"");
        let back: DocumentType = serde_json::from_str("\"pp\"").unwrap();
        assert_eq!(back, DocumentType::Pp);
    }

    #[test]
    fn serde_roundtrip_other() {
        let doc = DocumentType::Other("nit".into());
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, "\"nit\"");
        let back: DocumentType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn display_is_code() {
        assert_eq!(format!("{}", DocumentType::Ci), "ci");
        assert_eq!(format!("{}", DocumentType::Other("ti".into())), "ti");
    }
}
