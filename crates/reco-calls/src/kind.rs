//! Definition-site kinds.

use std::fmt;

/// How the receiver variable was produced.
///
/// The kind node of a trained network draws its outcome labels from this
/// closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// Returned from a method call.
    MethodReturn,
    /// Freshly constructed.
    New,
    /// Read from a field.
    Field,
    /// Passed in as a parameter.
    Parameter,
    /// The receiver is `this`.
    This,
    /// Definition site not known.
    Unknown,
    /// Wildcard matching any definition site.
    Any,
}

impl DefinitionKind {
    /// All kinds, in label order.
    pub const ALL: [DefinitionKind; 7] = [
        DefinitionKind::MethodReturn,
        DefinitionKind::New,
        DefinitionKind::Field,
        DefinitionKind::Parameter,
        DefinitionKind::This,
        DefinitionKind::Unknown,
        DefinitionKind::Any,
    ];

    /// The outcome label this kind appears under in trained networks.
    pub fn label(self) -> &'static str {
        match self {
            DefinitionKind::MethodReturn => "METHOD_RETURN",
            DefinitionKind::New => "NEW",
            DefinitionKind::Field => "FIELD",
            DefinitionKind::Parameter => "PARAMETER",
            DefinitionKind::This => "THIS",
            DefinitionKind::Unknown => "UNKNOWN",
            DefinitionKind::Any => "ANY",
        }
    }

    /// Parses an outcome label back into a kind.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for kind in DefinitionKind::ALL {
            assert_eq!(DefinitionKind::from_label(kind.label()), Some(kind));
        }
    }

    #[test]
    fn unknown_labels_parse_to_none() {
        assert_eq!(DefinitionKind::from_label("GLOBAL"), None);
    }
}
