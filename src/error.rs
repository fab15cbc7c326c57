//! # Predicate Engine Error Codes
//!
//! One flat enum, one variant per failure kind, grouped by pipeline stage.
//! Discriminants are stable `u16` codes so hosts can log or switch on them
//! numerically; `Ok(_)` from the public API is the all-clear.
//!
//! Validation errors are deterministic: a given `(expression, schema)` pair
//! always yields the same code, independent of the runtime tuple. Runtime
//! codes (invalid index, missing key, divide by zero, wrong extraction type)
//! depend on the tuple being evaluated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for all predicate-engine operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Every failure the engine can report.
///
/// Codes are grouped by region: schema 1-19, tokenisation 20-29, LHS 30-49,
/// operator compatibility 50-99, RHS 100-129, logical/structural 130-149,
/// cache 150-154, runtime dispatch 155-169, attribute fetcher 170-179.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum EvalError {
    // ---- Schema errors (canonical type string) ----
    /// Canonical schema must begin with `tuple<`
    #[error("canonical schema does not begin with a tuple literal")]
    MissingTupleLiteral = 1,

    /// `<` and `>` counts disagree somewhere in the schema string
    #[error("unmatched angle brackets in canonical schema")]
    UnmatchedBracketsInSchema = 2,

    /// A type was read but no ` name` followed it
    #[error("missing space before an attribute name in canonical schema")]
    MissingSpaceBeforeAttributeName = 3,

    /// An attribute name must be terminated by `,` or `>`
    #[error("missing comma or close bracket after an attribute name in canonical schema")]
    MissingCommaOrCloseAfterAttributeName = 4,

    /// `list<tuple<…>>` entries are bounded by a `>> ` marker
    #[error("missing '>> ' close tag for a list<tuple<...>> attribute")]
    MissingCloseTagForListOfTuple = 5,

    /// Schema string was empty or blank
    #[error("empty canonical schema")]
    EmptySchema = 6,

    /// The root value handed to the engine is not a tuple
    #[error("root value is not a tuple")]
    RootValueNotATuple = 7,

    /// Two leaves flattened to the same dotted path
    #[error("duplicate attribute path in canonical schema")]
    DuplicateAttributePath = 8,

    // ---- Tokenisation errors (expression pass 1) ----
    /// Expression string was empty or blank
    #[error("empty predicate expression")]
    EmptyExpression = 20,

    /// Only printable ASCII (0x20-0x7E) is accepted
    #[error("non-printable character found in expression")]
    NonPrintableCharacterFound = 21,

    /// `(` and `)` did not balance
    #[error("unprocessed parenthesis in expression")]
    UnprocessedParenthesis = 22,

    /// `[` and `]` did not balance
    #[error("unprocessed square bracket in expression")]
    UnprocessedBracket = 23,

    /// A `.` appeared where no attribute path admits one
    #[error("stray '.' found in expression")]
    StrayDotFound = 24,

    // ---- LHS errors ----
    /// No attribute path from the schema matches at the current position
    #[error("left-hand-side attribute name not found in tuple schema")]
    LhsAttributeNameNotFound = 30,

    /// `[` opened a list access but no index followed
    #[error("missing index in left-hand-side list access")]
    MissingListIndexInLhs = 31,

    /// List index must be a non-negative decimal
    #[error("non-numeric index in left-hand-side list access")]
    NonNumericListIndexInLhs = 32,

    /// List access must close with `]`
    #[error("missing ']' in left-hand-side list access")]
    MissingCloseBracketInLhsListAccess = 33,

    /// `[` opened a map access but no key followed
    #[error("missing key in left-hand-side map access")]
    MissingMapKeyInLhs = 34,

    /// Empty string keys are rejected
    #[error("empty string key in left-hand-side map access")]
    EmptyStringMapKeyInLhs = 35,

    /// Integer-keyed map access requires a decimal key
    #[error("non-numeric key for integer-keyed map in left-hand side")]
    NonNumericMapKeyForIntKeyedMap = 36,

    /// Float-keyed map access requires a decimal-point key
    #[error("invalid key for float-keyed map in left-hand side")]
    InvalidFloatMapKeyInLhs = 37,

    /// String-keyed map access requires a quoted key
    #[error("missing quote in left-hand-side string map key")]
    MissingQuoteInLhsStringMapKey = 38,

    /// Map access must close with `]`
    #[error("missing ']' in left-hand-side map access")]
    MissingCloseBracketInLhsMapAccess = 39,

    /// decimal32/64/128 attributes cannot be compared
    #[error("decimal attribute is not supported as a comparison operand")]
    DecimalLhsAttributeNotSupported = 40,

    /// complex32/64 attributes cannot be compared
    #[error("complex attribute is not supported as a comparison operand")]
    ComplexLhsAttributeNotSupported = 41,

    /// timestamp attributes cannot be compared
    #[error("timestamp attribute is not supported as a comparison operand")]
    TimestampLhsAttributeNotSupported = 42,

    /// blob attributes cannot be compared
    #[error("blob attribute is not supported as a comparison operand")]
    BlobLhsAttributeNotSupported = 43,

    /// xml attributes cannot be compared
    #[error("xml attribute is not supported as a comparison operand")]
    XmlLhsAttributeNotSupported = 44,

    /// enum attributes cannot be compared
    #[error("enum attribute is not supported as a comparison operand")]
    EnumLhsAttributeNotSupported = 45,

    /// ustring attributes cannot be compared
    #[error("ustring attribute is not supported as a comparison operand")]
    UstringLhsAttributeNotSupported = 46,

    /// `[` followed a scalar attribute that admits no element access
    #[error("'[' found after a scalar left-hand-side attribute")]
    OpenBracketAfterScalarLhs = 47,

    // ---- Operator compatibility errors ----
    /// `<` `<=` `>` `>=` on a boolean
    #[error("ordering verb is not allowed for a boolean left-hand side")]
    OrderingVerbNotAllowedForBooleanLhs = 50,

    /// `+ - * / %` on a boolean
    #[error("arithmetic verb is not allowed for a boolean left-hand side")]
    ArithmeticVerbNotAllowedForBooleanLhs = 51,

    /// contains family on a boolean
    #[error("containment verb is not allowed for a boolean left-hand side")]
    ContainsVerbNotAllowedForBooleanLhs = 52,

    /// startsWith/endsWith family on a boolean
    #[error("substring verb is not allowed for a boolean left-hand side")]
    SubstringVerbNotAllowedForBooleanLhs = 53,

    /// equalsCI/notEqualsCI on a boolean
    #[error("case-insensitive verb is not allowed for a boolean left-hand side")]
    CaseVerbNotAllowedForBooleanLhs = 54,

    /// in/inCI on a boolean
    #[error("membership verb is not allowed for a boolean left-hand side")]
    MembershipVerbNotAllowedForBooleanLhs = 55,

    /// sizeXX on a boolean
    #[error("size verb is not allowed for a boolean left-hand side")]
    SizeVerbNotAllowedForBooleanLhs = 56,

    /// contains family on a numeric scalar
    #[error("containment verb is not allowed for a numeric left-hand side")]
    ContainsVerbNotAllowedForNumericLhs = 57,

    /// startsWith/endsWith family on a numeric scalar
    #[error("substring verb is not allowed for a numeric left-hand side")]
    SubstringVerbNotAllowedForNumericLhs = 58,

    /// equalsCI/notEqualsCI on a numeric scalar
    #[error("case-insensitive verb is not allowed for a numeric left-hand side")]
    CaseVerbNotAllowedForNumericLhs = 59,

    /// sizeXX on a numeric scalar
    #[error("size verb is not allowed for a numeric left-hand side")]
    SizeVerbNotAllowedForNumericLhs = 60,

    /// inCI on a numeric scalar
    #[error("case-insensitive membership verb is not allowed for a numeric left-hand side")]
    CaseMembershipVerbNotAllowedForNumericLhs = 61,

    /// `+ - * / %` on a string
    #[error("arithmetic verb is not allowed for a string left-hand side")]
    ArithmeticVerbNotAllowedForStringLhs = 62,

    /// `== != < <= > >=` on a whole list
    #[error("relational verb is not allowed for a list left-hand side")]
    RelationalVerbNotAllowedForListLhs = 63,

    /// `+ - * / %` on a whole list
    #[error("arithmetic verb is not allowed for a list left-hand side")]
    ArithmeticVerbNotAllowedForListLhs = 64,

    /// startsWith/endsWith family on a whole list
    #[error("substring verb is not allowed for a list left-hand side")]
    SubstringVerbNotAllowedForListLhs = 65,

    /// equalsCI/notEqualsCI on a whole list
    #[error("case-insensitive equality verb is not allowed for a list left-hand side")]
    CaseEqualityVerbNotAllowedForListLhs = 66,

    /// in/inCI on a whole list
    #[error("membership verb is not allowed for a list left-hand side")]
    MembershipVerbNotAllowedForListLhs = 67,

    /// `== != < <= > >=` on a whole set
    #[error("relational verb is not allowed for a set left-hand side")]
    RelationalVerbNotAllowedForSetLhs = 68,

    /// `+ - * / %` on a whole set
    #[error("arithmetic verb is not allowed for a set left-hand side")]
    ArithmeticVerbNotAllowedForSetLhs = 69,

    /// startsWith/endsWith family on a whole set
    #[error("substring verb is not allowed for a set left-hand side")]
    SubstringVerbNotAllowedForSetLhs = 70,

    /// equalsCI/notEqualsCI on a whole set
    #[error("case-insensitive equality verb is not allowed for a set left-hand side")]
    CaseEqualityVerbNotAllowedForSetLhs = 71,

    /// in/inCI on a whole set
    #[error("membership verb is not allowed for a set left-hand side")]
    MembershipVerbNotAllowedForSetLhs = 72,

    /// `== != < <= > >=` on a whole map
    #[error("relational verb is not allowed for a map left-hand side")]
    RelationalVerbNotAllowedForMapLhs = 73,

    /// `+ - * / %` on a whole map
    #[error("arithmetic verb is not allowed for a map left-hand side")]
    ArithmeticVerbNotAllowedForMapLhs = 74,

    /// startsWith/endsWith family on a whole map
    #[error("substring verb is not allowed for a map left-hand side")]
    SubstringVerbNotAllowedForMapLhs = 75,

    /// equalsCI/notEqualsCI on a whole map
    #[error("case-insensitive equality verb is not allowed for a map left-hand side")]
    CaseEqualityVerbNotAllowedForMapLhs = 76,

    /// in/inCI on a whole map
    #[error("membership verb is not allowed for a map left-hand side")]
    MembershipVerbNotAllowedForMapLhs = 77,

    /// containsCI/notContainsCI over non-string elements or keys
    #[error("case-insensitive containment verb requires string elements or keys")]
    CaseContainsVerbNotAllowedForNonStringCollection = 78,

    /// A bare `list<tuple<…>>` admits only size verbs
    #[error("list<tuple<...>> left-hand side requires an index or a size verb")]
    ListOfTupleLhsRequiresIndexOrSizeVerb = 79,

    /// `lot[n]` must be followed by `.attribute`
    #[error("missing '.attribute' access after a list<tuple<...>> index")]
    MissingAttributeAccessAfterListOfTupleIndex = 80,

    /// No operator matched at this position
    #[error("invalid operation verb")]
    InvalidOperationVerb = 81,

    // ---- Arithmetic operand errors ----
    /// Arithmetic verbs are `<op> <operand> <postVerb>`
    #[error("missing space after an arithmetic verb")]
    MissingSpaceAfterArithmeticVerb = 85,

    /// Operand of an arithmetic verb must be numeric
    #[error("non-numeric operand after an arithmetic verb")]
    AllDigitsNotFoundInArithmeticOperand = 86,

    /// Unsigned left-hand sides reject negative operands
    #[error("negative arithmetic operand for an unsigned left-hand side")]
    NegativeOperandForUnsignedLhs = 87,

    /// Float left-hand sides require a decimal-point operand
    #[error("missing decimal point in a float arithmetic operand")]
    MissingDecimalPointInFloatArithmeticOperand = 88,

    /// Integer left-hand sides reject decimal-point operands
    #[error("unexpected decimal point in an integer arithmetic operand")]
    UnexpectedDecimalPointInArithmeticOperand = 89,

    /// At most one decimal point per operand
    #[error("multiple decimal points in an arithmetic operand")]
    MultipleDecimalPointsInArithmeticOperand = 90,

    /// An arithmetic verb must be completed by a relational verb
    #[error("missing post-arithmetic relational verb")]
    MissingPostArithmeticVerb = 91,

    /// Only relational verbs may follow an arithmetic operand
    #[error("invalid post-arithmetic verb")]
    InvalidPostArithmeticVerb = 92,

    /// Operand and post-verb are space separated
    #[error("missing space after an arithmetic operand")]
    MissingSpaceAfterArithmeticOperand = 93,

    // ---- RHS errors ----
    /// Expression ended while a right-hand-side value was expected
    #[error("unprocessed right-hand-side value")]
    UnprocessedRhs = 100,

    /// Boolean left-hand sides take `true` or `false`
    #[error("right-hand-side value does not match a boolean left-hand-side type")]
    RhsValueNoMatchForBooleanLhsType = 101,

    /// Signed-integer left-hand sides take optionally-signed digits
    #[error("right-hand-side value does not match an integer left-hand-side type")]
    RhsValueNoMatchForIntLhsType = 102,

    /// Unsigned-integer left-hand sides take plain digits
    #[error("right-hand-side value does not match an unsigned left-hand-side type")]
    RhsValueNoMatchForUintLhsType = 103,

    /// Float left-hand sides take digits with one decimal point
    #[error("right-hand-side value does not match a float left-hand-side type")]
    RhsValueNoMatchForFloatLhsType = 104,

    /// String left-hand sides take a quoted literal
    #[error("right-hand-side value does not match a string left-hand-side type")]
    RhsValueNoMatchForStringLhsType = 105,

    /// Unsigned left-hand sides reject negative right-hand sides
    #[error("negative right-hand-side value for an unsigned left-hand side")]
    NegativeRhsForUnsignedLhs = 106,

    /// Float right-hand sides require a decimal point
    #[error("missing decimal point in a float right-hand-side value")]
    MissingDecimalPointInRhs = 107,

    /// At most one decimal point per right-hand-side value
    #[error("multiple decimal points in a right-hand-side value")]
    MultipleDecimalPointsInRhs = 108,

    /// String right-hand sides must open with `'` or `"`
    #[error("missing open quote in a string right-hand-side value")]
    MissingOpenQuoteInRhsString = 109,

    /// String right-hand sides must close with the opening quote kind
    #[error("missing close quote in a string right-hand-side value")]
    MissingCloseQuoteInRhsString = 110,

    /// in/inCI right-hand sides must open with `[`
    #[error("missing '[' in a membership right-hand-side list literal")]
    MissingOpenBracketInRhsListLiteral = 111,

    /// in/inCI right-hand sides must close with `]`
    #[error("missing ']' in a membership right-hand-side list literal")]
    MissingCloseBracketInRhsListLiteral = 112,

    /// Membership list literal failed to parse into the element type
    #[error("invalid right-hand-side list literal")]
    InvalidRhsListLiteral = 113,

    /// Size verbs take a non-negative decimal right-hand side
    #[error("non-numeric right-hand-side value for a size verb")]
    AllDigitsNotFoundInSizeRhs = 114,

    /// Junk between a right-hand-side value and the next token
    #[error("unexpected character after a right-hand-side value")]
    UnexpectedCharacterAfterRhs = 115,

    // ---- Logical / structural errors ----
    /// Only `&&` and `||` join subexpressions
    #[error("invalid logical operator")]
    InvalidLogicalOperator = 130,

    /// Logical operators are surrounded by spaces
    #[error("missing space around a logical operator")]
    MissingSpaceAroundLogicalOperator = 131,

    /// All logical operators inside one subexpression must agree
    #[error("mixed logical operators found in a subexpression")]
    MixedLogicalOperatorsFoundInSubexpression = 132,

    /// All logical operators between subexpressions must agree
    #[error("mixed logical operators found in inter-subexpressions")]
    MixedLogicalOperatorsFoundInInterSubexpressions = 133,

    /// All logical operators inside one nested group must agree
    #[error("mixed logical operators found in nested subexpressions")]
    MixedLogicalOperatorsFoundInNestedSubexpressions = 134,

    /// Expression ended while a left-hand side was expected
    #[error("unprocessed left-hand-side attribute")]
    UnprocessedLhs = 135,

    /// Expression ended while an operation verb was expected
    #[error("unprocessed operation verb")]
    UnprocessedOperationVerb = 136,

    /// `(` appeared after a completed subexpression with no logical operator
    #[error("unexpected open parenthesis after a completed subexpression")]
    UnexpectedOpenParenthesis = 137,

    /// More `)` than `(` at some point
    #[error("unexpected close parenthesis")]
    UnexpectedCloseParenthesis = 138,

    /// interLogical length must be one less than the distinct group count
    #[error("logical operator count does not match the subexpression count")]
    SubexpressionLogicalOperatorCountMismatch = 139,

    /// `()` with nothing inside
    #[error("empty parentheses found in expression")]
    EmptyParenthesesFound = 140,

    // ---- Cache errors ----
    /// Cached plan was compiled against a different tuple schema (caller bug)
    #[error("tuple schema differs from the cached evaluation plan's schema")]
    TupleSchemaMismatchInPlanCache = 150,

    // ---- Runtime dispatch errors ----
    /// List index out of bounds at evaluation time
    #[error("invalid index for a left-hand-side list attribute")]
    InvalidIndexForLhsListAttribute = 155,

    /// Map key absent at evaluation time
    #[error("key not found in a left-hand-side map attribute")]
    MapKeyNotFoundInLhsMapAttribute = 156,

    /// Zero divisor in `/` or `%`
    #[error("divide by zero in an arithmetic operation")]
    DivideByZero = 157,

    /// A verb survived validation that the evaluator cannot dispatch (guarded)
    #[error("invalid operation verb at evaluation time")]
    InvalidOperationVerbAtEvalTime = 158,

    /// Typed extraction did not match the underlying value type
    #[error("wrong type passed for a typed extraction")]
    WrongTypePassed = 159,

    /// Dotted-path walk failed at evaluation time (guarded)
    #[error("attribute resolution failed at evaluation time")]
    AttributeResolutionFailedAtEvalTime = 160,

    /// List-of-tuple index out of bounds at evaluation time
    #[error("invalid index for a left-hand-side list<tuple<...>> attribute")]
    InvalidIndexForLhsListOfTupleAttribute = 161,

    // ---- Attribute fetcher errors ----
    /// Fetch path was empty or blank
    #[error("empty attribute name")]
    EmptyAttributeName = 170,

    /// Only spaces may follow a fetched attribute reference
    #[error("non-space character found after an attribute name")]
    NonSpaceCharacterAfterAttributeName = 171,

    /// The attribute's type cannot be materialised for a caller
    #[error("attribute type is not supported for value fetch")]
    UnsupportedAttributeTypeForFetch = 172,
}

impl EvalError {
    /// Stable numeric code for this failure kind (0 is reserved for all-clear)
    pub fn code(self) -> u16 {
        self as u16
    }

    /// True for codes the validator can emit (deterministic per expression+schema)
    pub fn is_validation_error(self) -> bool {
        self.code() < 150
    }

    /// True for codes that depend on the runtime tuple
    pub fn is_runtime_error(self) -> bool {
        (155..170).contains(&self.code())
    }
}
