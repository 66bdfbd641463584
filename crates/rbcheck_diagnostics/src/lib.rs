//! rbcheck_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Defines the catalog of diagnostic messages the front-end can emit.
//! Diagnostics are recoverable: passes report them and keep walking, so a
//! diagnostic carries structured information (code, category, location,
//! related locations) rather than aborting anything.

use rbcheck_core::text::Loc;
use std::fmt;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Message => write!(f, "message"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic error code (e.g., 4003).
    pub code: u32,
    /// The category of this diagnostic.
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Where this diagnostic occurred, if anywhere.
    pub loc: Option<Loc>,
    /// The resolved message text.
    pub message_text: String,
    /// The diagnostic error code.
    pub code: u32,
    /// The category.
    pub category: DiagnosticCategory,
    /// Related diagnostics ("Previous definition" and the like).
    pub related_information: Vec<Diagnostic>,
}

impl Diagnostic {
    /// Create a new diagnostic without location info (global diagnostic).
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            loc: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
            related_information: Vec::new(),
        }
    }

    /// Create a new diagnostic at a location.
    pub fn with_location(loc: Loc, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            loc: if loc.exists() { Some(loc) } else { None },
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
            related_information: Vec::new(),
        }
    }

    /// Add related diagnostic information.
    pub fn with_related(mut self, related: Diagnostic) -> Self {
        self.related_information.push(related);
        self
    }

    /// Whether this is an error diagnostic.
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = self.loc {
            write!(f, "file {}({}): ", loc.file.0, loc.span.start)?;
        }
        write!(f, "{} RB{}: {}", self.category, self.code, self.message_text)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// A collection of diagnostics accumulated during a pass.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// Sort diagnostics by file and position.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            let a_key = a.loc.map(|l| (l.file.0, l.span.start)).unwrap_or((u32::MAX, 0));
            let b_key = b.loc.map(|l| (l.file.0, l.span.start)).unwrap_or((u32::MAX, 0));
            a_key.cmp(&b_key)
        });
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Message, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Message, message: $msg }
        };
    }

    // ========================================================================
    // Namer errors (4000-4099)
    // ========================================================================
    pub const INCLUDE_REQUIRES_AT_LEAST_ONE_ARGUMENT: DiagnosticMessage = diag!(4001, Error, "`{0}` requires at least one argument.");
    pub const INCLUDE_CANNOT_BE_PASSED_A_BLOCK: DiagnosticMessage = diag!(4002, Error, "`{0}` cannot be passed a block.");
    pub const REDEFINING_CONSTANT: DiagnosticMessage = diag!(4003, Error, "Redefining constant `{0}`.");
    pub const PREVIOUSLY_DEFINED_AS: DiagnosticMessage = diag!(4003, Error, "`{0}` was previously defined as a `{1}`.");
    pub const METHOD_REDEFINED_ARGUMENT_COUNT: DiagnosticMessage = diag!(4004, Error, "Method `{0}` redefined without matching argument count. Expected: `{1}`, got: `{2}`.");
    pub const METHOD_REDEFINED_ARGUMENT_ATTRIBUTE: DiagnosticMessage = diag!(4004, Error, "Method `{0}` redefined with mismatched argument attribute `{1}`. Expected: `{2}`, got: `{3}`.");
    pub const METHOD_REDEFINED_ARGUMENT_NAME: DiagnosticMessage = diag!(4004, Error, "Method `{0}` redefined with mismatched argument name. Expected: `{1}`, got: `{2}`.");
    pub const CLASSES_CANT_BE_INTERFACES: DiagnosticMessage = diag!(4005, Error, "Classes can't be interfaces. Use `abstract!` instead of `interface!`.");
    pub const ARGUMENTS_MUST_BE_SYMBOL_LITERALS: DiagnosticMessage = diag!(4006, Error, "Unsupported argument to `{0}`: arguments must be symbol literals.");
    pub const NO_SUCH_METHOD: DiagnosticMessage = diag!(4007, Error, "`{0}`: no such method: `{1}`.");
    pub const WRONG_NUMBER_OF_ARGUMENTS: DiagnosticMessage = diag!(4008, Error, "Wrong number of arguments to `{0}`; Expected: `{1}`, got: `{2}`.");
    pub const TYPES_MUST_BE_DEFINED_IN_CLASS_SCOPES: DiagnosticMessage = diag!(4009, Error, "Types must be defined in class or module scopes.");
    pub const TOO_MANY_ARGS_IN_TYPE_DEFINITION: DiagnosticMessage = diag!(4009, Error, "Too many args in type definition.");
    pub const INVALID_VARIANCE_KIND: DiagnosticMessage = diag!(4009, Error, "Invalid variance kind, only `{0}` and `{1}` are supported.");
    pub const INVALID_PARAM_MUST_BE_A_SYMBOL: DiagnosticMessage = diag!(4009, Error, "Invalid param, must be a :symbol.");
    pub const DUPLICATE_TYPE_MEMBER: DiagnosticMessage = diag!(4009, Error, "Duplicate type member `{0}`.");
    pub const MISSING_REQUIRED_PARAM_FIXED: DiagnosticMessage = diag!(4009, Error, "Missing required param :fixed.");
    pub const SUPER_OUTSIDE_OF_METHOD: DiagnosticMessage = diag!(4010, Error, "`{0}` outside of method.");

    // Related-information entries attached to the errors above.
    pub const PREVIOUS_DEFINITION: DiagnosticMessage = diag!(4090, Message, "Previous definition");
}
