//! # Operation Verbs
//!
//! The fixed verb set, longest-match recognition, and the compatibility
//! matrix between verb families and left-hand-side type classes. Every
//! matrix violation maps to its own error code.

use crate::error::{EvalError, EvalResult};
use crate::schema::{TypeClass, UnsupportedKind};

/// Verb families; compatibility is checked per family, dispatch per verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpFamily {
    /// `== != <= < >= >`
    Relational,
    /// `+ - * / %` with an inline operand and post-verb
    Arithmetic,
    /// `contains notContains containsCI notContainsCI`
    Contains,
    /// `startsWith endsWith ...` and their `not`/`CI` forms
    Substring,
    /// `equalsCI notEqualsCI`
    CaseEquality,
    /// `in inCI`
    Membership,
    /// `sizeEQ sizeNE sizeLT sizeLE sizeGT sizeGE`
    Size,
}

/// Longest-match verb table; word verbs listed before their prefixes
const VERBS: &[(&str, OpFamily)] = &[
    ("notStartsWithCI", OpFamily::Substring),
    ("notEndsWithCI", OpFamily::Substring),
    ("notContainsCI", OpFamily::Contains),
    ("notStartsWith", OpFamily::Substring),
    ("notEndsWith", OpFamily::Substring),
    ("startsWithCI", OpFamily::Substring),
    ("notContains", OpFamily::Contains),
    ("notEqualsCI", OpFamily::CaseEquality),
    ("endsWithCI", OpFamily::Substring),
    ("containsCI", OpFamily::Contains),
    ("startsWith", OpFamily::Substring),
    ("equalsCI", OpFamily::CaseEquality),
    ("endsWith", OpFamily::Substring),
    ("contains", OpFamily::Contains),
    ("sizeEQ", OpFamily::Size),
    ("sizeNE", OpFamily::Size),
    ("sizeLT", OpFamily::Size),
    ("sizeLE", OpFamily::Size),
    ("sizeGT", OpFamily::Size),
    ("sizeGE", OpFamily::Size),
    ("inCI", OpFamily::Membership),
    ("in", OpFamily::Membership),
    ("==", OpFamily::Relational),
    ("!=", OpFamily::Relational),
    ("<=", OpFamily::Relational),
    (">=", OpFamily::Relational),
    ("<", OpFamily::Relational),
    (">", OpFamily::Relational),
    ("+", OpFamily::Arithmetic),
    ("-", OpFamily::Arithmetic),
    ("*", OpFamily::Arithmetic),
    ("/", OpFamily::Arithmetic),
    ("%", OpFamily::Arithmetic),
];

/// Post-arithmetic verbs are the relational set
pub const RELATIONAL_VERBS: &[&str] = &["==", "!=", "<=", ">=", "<", ">"];

/// True when `b` can start an operation verb (terminates LHS matching)
pub fn is_op_starter(b: u8) -> bool {
    matches!(b, b'=' | b'!' | b'<' | b'>' | b'+' | b'-' | b'*' | b'/' | b'%')
}

/// Longest-match the verb at the head of `rest`. Word verbs must be
/// delimited by a space (or end); symbol verbs bind tightly.
pub fn match_verb(rest: &str) -> Option<(&'static str, OpFamily)> {
    for &(verb, family) in VERBS {
        if let Some(tail) = rest.strip_prefix(verb) {
            let word = verb.bytes().all(|b| b.is_ascii_alphanumeric());
            if word {
                match tail.bytes().next() {
                    None | Some(b' ') => return Some((verb, family)),
                    _ => continue,
                }
            }
            return Some((verb, family));
        }
    }
    None
}

/// True for the case-insensitive verb spellings
pub fn is_case_insensitive(verb: &str) -> bool {
    verb.ends_with("CI")
}

/// True for the negated verb spellings (`notXxx`, `!=`, `sizeNE`)
pub fn is_negated(verb: &str) -> bool {
    verb.starts_with("not") || verb == "!=" || verb == "sizeNE"
}

/// Error for using an unsupported attribute type as a comparison operand
pub fn unsupported_lhs_error(kind: UnsupportedKind) -> EvalError {
    match kind {
        UnsupportedKind::Decimal => EvalError::DecimalLhsAttributeNotSupported,
        UnsupportedKind::Complex => EvalError::ComplexLhsAttributeNotSupported,
        UnsupportedKind::Timestamp => EvalError::TimestampLhsAttributeNotSupported,
        UnsupportedKind::Blob => EvalError::BlobLhsAttributeNotSupported,
        UnsupportedKind::Xml => EvalError::XmlLhsAttributeNotSupported,
        UnsupportedKind::Enum => EvalError::EnumLhsAttributeNotSupported,
        UnsupportedKind::Ustring => EvalError::UstringLhsAttributeNotSupported,
        UnsupportedKind::Tuple | UnsupportedKind::Other => EvalError::LhsAttributeNameNotFound,
    }
}

/// Compatibility of a verb family with a *scalar* effective type class
pub fn check_scalar_compat(eff: &TypeClass, family: OpFamily, verb: &str) -> EvalResult<()> {
    match eff {
        TypeClass::Boolean => match family {
            OpFamily::Relational => {
                if verb == "==" || verb == "!=" {
                    Ok(())
                } else {
                    Err(EvalError::OrderingVerbNotAllowedForBooleanLhs)
                }
            }
            OpFamily::Arithmetic => Err(EvalError::ArithmeticVerbNotAllowedForBooleanLhs),
            OpFamily::Contains => Err(EvalError::ContainsVerbNotAllowedForBooleanLhs),
            OpFamily::Substring => Err(EvalError::SubstringVerbNotAllowedForBooleanLhs),
            OpFamily::CaseEquality => Err(EvalError::CaseVerbNotAllowedForBooleanLhs),
            OpFamily::Membership => Err(EvalError::MembershipVerbNotAllowedForBooleanLhs),
            OpFamily::Size => Err(EvalError::SizeVerbNotAllowedForBooleanLhs),
        },
        c if c.is_numeric() => match family {
            OpFamily::Relational | OpFamily::Arithmetic => Ok(()),
            OpFamily::Contains => Err(EvalError::ContainsVerbNotAllowedForNumericLhs),
            OpFamily::Substring => Err(EvalError::SubstringVerbNotAllowedForNumericLhs),
            OpFamily::CaseEquality => Err(EvalError::CaseVerbNotAllowedForNumericLhs),
            OpFamily::Membership => {
                if is_case_insensitive(verb) {
                    Err(EvalError::CaseMembershipVerbNotAllowedForNumericLhs)
                } else {
                    Ok(())
                }
            }
            OpFamily::Size => Err(EvalError::SizeVerbNotAllowedForNumericLhs),
        },
        TypeClass::Str => match family {
            OpFamily::Arithmetic => Err(EvalError::ArithmeticVerbNotAllowedForStringLhs),
            _ => Ok(()),
        },
        TypeClass::Unsupported(kind) => Err(unsupported_lhs_error(*kind)),
        // Collection classes reaching here means an element was itself a
        // collection; containment-style verbs are checked by the caller.
        _ => Ok(()),
    }
}

/// Compatibility of a verb family with a *whole-collection* left-hand side
pub fn check_collection_compat(
    class: &TypeClass,
    family: OpFamily,
    verb: &str,
    element_is_string: bool,
) -> EvalResult<()> {
    let ci = is_case_insensitive(verb);
    match class {
        TypeClass::List(_) => match family {
            OpFamily::Contains => {
                if ci && !element_is_string {
                    Err(EvalError::CaseContainsVerbNotAllowedForNonStringCollection)
                } else {
                    Ok(())
                }
            }
            OpFamily::Size => Ok(()),
            OpFamily::Relational => Err(EvalError::RelationalVerbNotAllowedForListLhs),
            OpFamily::Arithmetic => Err(EvalError::ArithmeticVerbNotAllowedForListLhs),
            OpFamily::Substring => Err(EvalError::SubstringVerbNotAllowedForListLhs),
            OpFamily::CaseEquality => Err(EvalError::CaseEqualityVerbNotAllowedForListLhs),
            OpFamily::Membership => Err(EvalError::MembershipVerbNotAllowedForListLhs),
        },
        TypeClass::Set(_) => match family {
            OpFamily::Contains => {
                if ci && !element_is_string {
                    Err(EvalError::CaseContainsVerbNotAllowedForNonStringCollection)
                } else {
                    Ok(())
                }
            }
            OpFamily::Size => Ok(()),
            OpFamily::Relational => Err(EvalError::RelationalVerbNotAllowedForSetLhs),
            OpFamily::Arithmetic => Err(EvalError::ArithmeticVerbNotAllowedForSetLhs),
            OpFamily::Substring => Err(EvalError::SubstringVerbNotAllowedForSetLhs),
            OpFamily::CaseEquality => Err(EvalError::CaseEqualityVerbNotAllowedForSetLhs),
            OpFamily::Membership => Err(EvalError::MembershipVerbNotAllowedForSetLhs),
        },
        TypeClass::Map(_, _) => match family {
            OpFamily::Contains => {
                if ci && !element_is_string {
                    Err(EvalError::CaseContainsVerbNotAllowedForNonStringCollection)
                } else {
                    Ok(())
                }
            }
            OpFamily::Size => Ok(()),
            OpFamily::Relational => Err(EvalError::RelationalVerbNotAllowedForMapLhs),
            OpFamily::Arithmetic => Err(EvalError::ArithmeticVerbNotAllowedForMapLhs),
            OpFamily::Substring => Err(EvalError::SubstringVerbNotAllowedForMapLhs),
            OpFamily::CaseEquality => Err(EvalError::CaseEqualityVerbNotAllowedForMapLhs),
            OpFamily::Membership => Err(EvalError::MembershipVerbNotAllowedForMapLhs),
        },
        TypeClass::ListOfTuple(_) => match family {
            OpFamily::Size => Ok(()),
            _ => Err(EvalError::ListOfTupleLhsRequiresIndexOrSizeVerb),
        },
        _ => Ok(()),
    }
}
