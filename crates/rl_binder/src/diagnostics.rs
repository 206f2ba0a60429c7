//! Binding diagnostics and their code table.

use rl_ast::Span;
use std::fmt;

/// Describes a diagnostic code with remediation guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticDescriptor {
    pub code: &'static str,
    pub title: &'static str,
    pub help: &'static str,
}

pub mod codes {
    pub const MALFORMED_NODE: &str = "RL1001";
    pub const CONDITION_NOT_BOOLEAN: &str = "RL1002";
    pub const TYPE_NOT_FOUND: &str = "RL1003";
    pub const METHOD_NOT_FOUND: &str = "RL1004";
    pub const AMBIGUOUS_METHOD: &str = "RL1005";
    pub const CONSTRUCTOR_NOT_FOUND: &str = "RL1006";
    pub const INCOMPATIBLE_BRANCHES: &str = "RL1007";
    pub const NOT_AGGREGATE: &str = "RL1008";
    pub const UNKNOWN_IDENTIFIER: &str = "RL1009";
    pub const DUPLICATE_VARIABLE: &str = "RL1010";
    pub const FIELD_NOT_FOUND: &str = "RL1011";
    pub const INVALID_CAST: &str = "RL1012";
    pub const INVALID_LITERAL: &str = "RL1013";
    pub const DEPRECATED_METHOD: &str = "RL1014";
    pub const NESTING_TOO_DEEP: &str = "RL1015";
    pub const TYPE_MISMATCH: &str = "RL1016";
    pub const DEPENDENCY_HAS_ERRORS: &str = "RL1017";
    pub const TYPE_CONFLICT: &str = "RL1018";
    pub const METHOD_IMPORT_REJECTED: &str = "RL1019";
    pub const BRANCHES_KEPT: &str = "RL1020";
}

const DIAGNOSTICS: &[DiagnosticDescriptor] = &[
    DiagnosticDescriptor {
        code: codes::MALFORMED_NODE,
        title: "Malformed expression",
        help: "The node has an unexpected number of children; check the parser output.",
    },
    DiagnosticDescriptor {
        code: codes::CONDITION_NOT_BOOLEAN,
        title: "Condition is not boolean",
        help: "Conditions of `if`, `?:` and aggregate filters must be boolean or Boolean.",
    },
    DiagnosticDescriptor {
        code: codes::TYPE_NOT_FOUND,
        title: "Unknown type",
        help: "Declare the datatype in this module or add the dependency that defines it.",
    },
    DiagnosticDescriptor {
        code: codes::METHOD_NOT_FOUND,
        title: "Method not found",
        help: "No overload accepts these argument types; add an explicit cast or a matching overload.",
    },
    DiagnosticDescriptor {
        code: codes::AMBIGUOUS_METHOD,
        title: "Ambiguous method call",
        help: "Several overloads are equally close; cast an argument to select one.",
    },
    DiagnosticDescriptor {
        code: codes::CONSTRUCTOR_NOT_FOUND,
        title: "Constructor not found",
        help: "No constructor of the type accepts these argument types.",
    },
    DiagnosticDescriptor {
        code: codes::INCOMPATIBLE_BRANCHES,
        title: "Branches have no common type",
        help: "Cast one branch so that both branches share a type.",
    },
    DiagnosticDescriptor {
        code: codes::NOT_AGGREGATE,
        title: "Not an array or collection",
        help: "Aggregate selections and indexing need an array or collection on the left.",
    },
    DiagnosticDescriptor {
        code: codes::UNKNOWN_IDENTIFIER,
        title: "Unknown identifier",
        help: "The name is neither a local variable, a field in scope nor a module field.",
    },
    DiagnosticDescriptor {
        code: codes::DUPLICATE_VARIABLE,
        title: "Duplicate variable",
        help: "A variable with this name already exists in the same scope.",
    },
    DiagnosticDescriptor {
        code: codes::FIELD_NOT_FOUND,
        title: "Field not found",
        help: "The type declares no field with this name.",
    },
    DiagnosticDescriptor {
        code: codes::INVALID_CAST,
        title: "Invalid cast",
        help: "No conversion exists between these types.",
    },
    DiagnosticDescriptor {
        code: codes::INVALID_LITERAL,
        title: "Invalid literal",
        help: "The literal text does not fit its declared kind.",
    },
    DiagnosticDescriptor {
        code: codes::DEPRECATED_METHOD,
        title: "Deprecated method",
        help: "The selected method is deprecated; see its note for a replacement.",
    },
    DiagnosticDescriptor {
        code: codes::NESTING_TOO_DEEP,
        title: "Expression nested too deeply",
        help: "Split the expression or raise `max_bind_depth`.",
    },
    DiagnosticDescriptor {
        code: codes::TYPE_MISMATCH,
        title: "Type mismatch",
        help: "The value cannot be implicitly converted to the required type.",
    },
    DiagnosticDescriptor {
        code: codes::DEPENDENCY_HAS_ERRORS,
        title: "Dependency failed to compile",
        help: "Types and methods of a dependency with errors are not imported.",
    },
    DiagnosticDescriptor {
        code: codes::TYPE_CONFLICT,
        title: "Conflicting type definition",
        help: "Two different definitions share one namespace-qualified name.",
    },
    DiagnosticDescriptor {
        code: codes::METHOD_IMPORT_REJECTED,
        title: "Method import rejected",
        help: "The module's import filter refused a dependency method.",
    },
    DiagnosticDescriptor {
        code: codes::BRANCHES_KEPT,
        title: "Branches kept unconverted",
        help: "The branches share no type; the result is typed as Object.",
    },
];

/// Descriptor registered for a diagnostic code.
pub fn lookup(code: &str) -> Option<&'static DiagnosticDescriptor> {
    DIAGNOSTICS.iter().find(|descriptor| descriptor.code == code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A message collected against the compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn descriptor(&self) -> Option<&'static DiagnosticDescriptor> {
        lookup(self.code)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{severity}[{}]: {}", self.code, self.message)?;
        if let Some(span) = &self.span {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_has_a_unique_descriptor() {
        for (index, descriptor) in DIAGNOSTICS.iter().enumerate() {
            assert!(descriptor.code.starts_with("RL"));
            assert!(
                DIAGNOSTICS[index + 1..]
                    .iter()
                    .all(|other| other.code != descriptor.code)
            );
        }
        assert_eq!(
            lookup(codes::AMBIGUOUS_METHOD).map(|descriptor| descriptor.title),
            Some("Ambiguous method call")
        );
        assert!(lookup("RL9999").is_none());
    }

    #[test]
    fn display_includes_code_and_span() {
        let diagnostic = Diagnostic::error(codes::TYPE_NOT_FOUND, "unknown type 'Foo'", Some(Span::new(1, 2, 1, 5)));
        let rendered = diagnostic.to_string();
        assert!(rendered.starts_with("error[RL1003]: unknown type 'Foo'"));
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.descriptor().map(|d| d.code), Some("RL1003"));
    }
}
