//! Validation failure codes across the error taxonomy, checked through
//! `compile_predicate` so no runtime tuple can influence them.

use rulegate::{compile_predicate, EvalError};

const TRADE: &str = "tuple<rstring symbol,float32 price,uint32 qty,boolean buy,list<int32> marks,map<rstring,int32> kv>";

fn err(expr: &str) -> EvalError {
    compile_predicate(expr, TRADE).expect_err("expression must be rejected")
}

#[test]
fn incomplete_tails() {
    assert_eq!(err("symbol == "), EvalError::UnprocessedRhs);
    assert_eq!(err("symbol "), EvalError::UnprocessedOperationVerb);
    assert_eq!(err("qty == 1 && "), EvalError::UnprocessedLhs);
    assert_eq!(err("   "), EvalError::EmptyExpression);
}

#[test]
fn verb_errors() {
    assert_eq!(err("symbol = 'x'"), EvalError::InvalidOperationVerb);
    assert_eq!(err("symbol ~ 'x'"), EvalError::InvalidOperationVerb);
}

#[test]
fn rhs_type_mismatches() {
    assert_eq!(err("price < 'hi'"), EvalError::RhsValueNoMatchForFloatLhsType);
    assert_eq!(err("price < 100"), EvalError::MissingDecimalPointInRhs);
    assert_eq!(err("price < 1.2.3"), EvalError::MultipleDecimalPointsInRhs);
    assert_eq!(err("qty == x"), EvalError::RhsValueNoMatchForUintLhsType);
    assert_eq!(err("qty == -1"), EvalError::NegativeRhsForUnsignedLhs);
    assert_eq!(err("buy == yes"), EvalError::RhsValueNoMatchForBooleanLhsType);
    assert_eq!(err("symbol == INTC"), EvalError::MissingOpenQuoteInRhsString);
    assert_eq!(err("symbol == 'INTC"), EvalError::MissingCloseQuoteInRhsString);
}

#[test]
fn parenthesis_errors() {
    assert_eq!(err("(qty == 1 && buy == true"), EvalError::UnprocessedParenthesis);
    assert_eq!(err("()"), EvalError::EmptyParenthesesFound);
    assert_eq!(err("qty == 1 (buy == true)"), EvalError::UnexpectedOpenParenthesis);
}

#[test]
fn bracket_errors() {
    assert_eq!(err("marks[1 > 0"), EvalError::UnprocessedBracket);
    assert_eq!(err("marks[] > 0"), EvalError::MissingListIndexInLhs);
    assert_eq!(err("marks[x] > 0"), EvalError::NonNumericListIndexInLhs);
    assert_eq!(err("qty[0] == 1"), EvalError::OpenBracketAfterScalarLhs);
}

#[test]
fn map_key_errors() {
    assert_eq!(err("kv[b] == 1"), EvalError::MissingQuoteInLhsStringMapKey);
    assert_eq!(err("kv[''] == 1"), EvalError::EmptyStringMapKeyInLhs);
}

#[test]
fn mixed_logical_operator_errors() {
    assert_eq!(
        err("qty == 1 && price > 1.0 || buy == true"),
        EvalError::MixedLogicalOperatorsFoundInInterSubexpressions
    );
    assert_eq!(
        err("(qty == 1 && price > 1.0 || buy == true)"),
        EvalError::MixedLogicalOperatorsFoundInSubexpression
    );
    assert_eq!(
        err("((qty == 1) && (price > 1.0) || (buy == true))"),
        EvalError::MixedLogicalOperatorsFoundInNestedSubexpressions
    );
}

#[test]
fn logical_operator_shape_errors() {
    assert_eq!(err("qty == 1 & buy == true"), EvalError::InvalidLogicalOperator);
    assert_eq!(
        err("qty == 1 &&buy == true"),
        EvalError::MissingSpaceAroundLogicalOperator
    );
    assert_eq!(
        err("qty == 1&& buy == true"),
        EvalError::MissingSpaceAroundLogicalOperator
    );
}

#[test]
fn compatibility_matrix_errors() {
    assert_eq!(err("buy < true"), EvalError::OrderingVerbNotAllowedForBooleanLhs);
    assert_eq!(err("buy + 1 == 2"), EvalError::ArithmeticVerbNotAllowedForBooleanLhs);
    assert_eq!(err("buy contains 'x'"), EvalError::ContainsVerbNotAllowedForBooleanLhs);
    assert_eq!(err("buy sizeEQ 1"), EvalError::SizeVerbNotAllowedForBooleanLhs);
    assert_eq!(err("qty contains 1"), EvalError::ContainsVerbNotAllowedForNumericLhs);
    assert_eq!(err("qty startsWith '1'"), EvalError::SubstringVerbNotAllowedForNumericLhs);
    assert_eq!(err("qty equalsCI '1'"), EvalError::CaseVerbNotAllowedForNumericLhs);
    assert_eq!(err("qty sizeEQ 1"), EvalError::SizeVerbNotAllowedForNumericLhs);
    assert_eq!(err("qty inCI [1]"), EvalError::CaseMembershipVerbNotAllowedForNumericLhs);
    assert_eq!(err("symbol + 1 == 2"), EvalError::ArithmeticVerbNotAllowedForStringLhs);
    assert_eq!(err("marks == 1"), EvalError::RelationalVerbNotAllowedForListLhs);
    assert_eq!(err("marks + 1 == 2"), EvalError::ArithmeticVerbNotAllowedForListLhs);
    assert_eq!(err("marks startsWith 'x'"), EvalError::SubstringVerbNotAllowedForListLhs);
    assert_eq!(err("marks in [1]"), EvalError::MembershipVerbNotAllowedForListLhs);
    assert_eq!(
        err("marks containsCI 'x'"),
        EvalError::CaseContainsVerbNotAllowedForNonStringCollection
    );
    assert_eq!(err("kv == 1"), EvalError::RelationalVerbNotAllowedForMapLhs);
    assert_eq!(err("kv in [1]"), EvalError::MembershipVerbNotAllowedForMapLhs);
}

#[test]
fn arithmetic_operand_errors() {
    assert_eq!(err("qty % -3 == 1"), EvalError::NegativeOperandForUnsignedLhs);
    assert_eq!(err("qty % x == 1"), EvalError::AllDigitsNotFoundInArithmeticOperand);
    assert_eq!(
        err("qty % 3.5 == 1"),
        EvalError::UnexpectedDecimalPointInArithmeticOperand
    );
    assert_eq!(
        err("price % 2 == 1.0"),
        EvalError::MissingDecimalPointInFloatArithmeticOperand
    );
    assert_eq!(err("qty % 3 ~~ 1"), EvalError::InvalidPostArithmeticVerb);
    assert_eq!(err("qty % 3"), EvalError::MissingSpaceAfterArithmeticOperand);
}

#[test]
fn membership_literal_errors() {
    assert_eq!(err("qty in 1"), EvalError::MissingOpenBracketInRhsListLiteral);
    assert_eq!(err("qty in [1, x]"), EvalError::InvalidRhsListLiteral);
    assert_eq!(err("symbol in [IBM]"), EvalError::InvalidRhsListLiteral);
    assert_eq!(err("marks sizeEQ x"), EvalError::AllDigitsNotFoundInSizeRhs);
}

#[test]
fn lhs_errors() {
    assert_eq!(err("unknown == 1"), EvalError::LhsAttributeNameNotFound);
    assert_eq!(err(".qty == 1"), EvalError::StrayDotFound);
    assert_eq!(err("qty == 1 \u{1}"), EvalError::NonPrintableCharacterFound);
}

#[test]
fn unsupported_lhs_types() {
    let schema = "tuple<timestamp ts,decimal64 d,blob payload,enum<red,green> color,ustring u,complex32 c,xml doc>";
    let check = |expr: &str, code: EvalError| {
        assert_eq!(
            compile_predicate(expr, schema).expect_err("unsupported operand"),
            code
        );
    };
    check("ts == 1", EvalError::TimestampLhsAttributeNotSupported);
    check("d == 1", EvalError::DecimalLhsAttributeNotSupported);
    check("payload == 1", EvalError::BlobLhsAttributeNotSupported);
    check("color == 1", EvalError::EnumLhsAttributeNotSupported);
    check("u == 'x'", EvalError::UstringLhsAttributeNotSupported);
    check("c == 1", EvalError::ComplexLhsAttributeNotSupported);
    check("doc == 'x'", EvalError::XmlLhsAttributeNotSupported);
}

#[test]
fn schema_errors_surface_through_compile() {
    assert_eq!(
        compile_predicate("qty == 1", "rstring symbol").expect_err("schema"),
        EvalError::MissingTupleLiteral
    );
    assert_eq!(
        compile_predicate("qty == 1", "tuple<rstring symbol").expect_err("schema"),
        EvalError::UnmatchedBracketsInSchema
    );
}

#[test]
fn determinism_of_validation_errors() {
    for _ in 0..3 {
        assert_eq!(err("symbol == "), EvalError::UnprocessedRhs);
        assert_eq!(
            err("qty == 1 && price > 1.0 || buy == true"),
            EvalError::MixedLogicalOperatorsFoundInInterSubexpressions
        );
    }
}
