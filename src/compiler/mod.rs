//! # Predicate Validator / Compiler
//!
//! Turns an expression string plus an attribute path map into an
//! `EvaluationPlan`. Two passes over the raw bytes:
//!
//! 1. a printability and bracket-balance pass that understands the quoted
//!    string heuristic (brackets inside quotes do not count),
//! 2. a structural pass consuming `optional paren -> LHS -> verb -> RHS ->
//!    optional paren -> logical operator` and bookkeeping nested groups.
//!
//! Subexpression ids come from a two-level generator: the first id is
//! `1.1`; while the nested level is at most one the group level advances
//! (`2.1`, `3.1`, ...); deeper nesting advances the member instead
//! (`2.2`, `2.3`, ...). Component-wise sorted ids are evaluation order.
//!
//! A `list<tuple<...>>` left-hand side triggers recursive validation of
//! the trailing sub-expression against the inner tuple schema; the block
//! keeps the byte offsets of that slice so the evaluator can extract and
//! recompile it per record.

pub mod operators;
pub mod rhs;

use std::collections::BTreeMap;

use crate::error::{EvalError, EvalResult};
use crate::plan::{EvaluationPlan, LogicalOp, PredicateStep, StepKind, SubexprId, SubexprLayout};
use crate::schema::{parse_tuple_schema, AttributeMap, TypeClass};

use operators::{
    check_collection_compat, check_scalar_compat, is_op_starter, match_verb,
    unsupported_lhs_error, OpFamily, RELATIONAL_VERBS,
};
use rhs::{
    find_quote_close, parse_arithmetic_operand, parse_bool_rhs, parse_float_rhs, parse_int_rhs,
    parse_membership_literal, parse_membership_rhs, parse_size_rhs, parse_string_rhs,
};

/// Compile one predicate against a canonical tuple schema.
pub fn compile_predicate(expr: &str, schema: &str) -> EvalResult<EvaluationPlan> {
    let attrs = parse_tuple_schema(schema)?;
    let (subexpressions, intra, inter) = validate_with_map(expr, &attrs)?;
    tracing::debug!(
        target: "rulegate::compiler",
        expression = expr,
        subexpressions = subexpressions.len(),
        "predicate compiled"
    );
    Ok(EvaluationPlan::new(
        expr.to_string(),
        schema.to_string(),
        subexpressions,
        intra,
        inter,
    ))
}

/// Validate an expression against an already-parsed attribute map.
#[allow(clippy::type_complexity)]
pub(crate) fn validate_with_map(
    expr: &str,
    attrs: &AttributeMap,
) -> EvalResult<(
    BTreeMap<SubexprId, SubexprLayout>,
    BTreeMap<SubexprId, LogicalOp>,
    Vec<LogicalOp>,
)> {
    if expr.trim().is_empty() {
        return Err(EvalError::EmptyExpression);
    }
    balance_check(expr)?;
    Validator::new(expr, attrs).run()
}

/// Pass 1: printable ASCII only, balanced `()`/`[]` outside quoted spans.
fn balance_check(expr: &str) -> EvalResult<()> {
    let bytes = expr.as_bytes();
    for &b in bytes {
        if !(0x20..=0x7E).contains(&b) {
            return Err(EvalError::NonPrintableCharacterFound);
        }
    }

    let mut stack: Vec<u8> = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                let bracketed = stack.last() == Some(&b'[');
                match find_quote_close(bytes, i, bracketed) {
                    Some(close) => i = close + 1,
                    None => return Err(EvalError::MissingCloseQuoteInRhsString),
                }
            }
            b'(' | b'[' => {
                stack.push(bytes[i]);
                i += 1;
            }
            b')' => {
                if stack.pop() != Some(b'(') {
                    return Err(EvalError::UnprocessedParenthesis);
                }
                i += 1;
            }
            b']' => {
                if stack.pop() != Some(b'[') {
                    return Err(EvalError::UnprocessedBracket);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    match stack.last() {
        None => Ok(()),
        Some(b'(') => Err(EvalError::UnprocessedParenthesis),
        Some(_) => Err(EvalError::UnprocessedBracket),
    }
}

/// Last token category consumed by the structural pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Start,
    Open,
    Close,
    Logical,
    Block,
}

/// Pass 2 state machine
struct Validator<'a> {
    expr: &'a str,
    attrs: &'a AttributeMap,
    pos: usize,
    open_paren: usize,
    close_paren: usize,
    nested_level: u32,
    consecutive_cp: bool,
    enclosed_single: bool,
    lhs_preceded_by_op: bool,
    prev_token: Token,
    layout: Vec<PredicateStep>,
    layout_logical: Option<LogicalOp>,
    current_id: Option<SubexprId>,
    id_pending: bool,
    id_level: u32,
    id_member: u32,
    id_started: bool,
    subexpressions: BTreeMap<SubexprId, SubexprLayout>,
    intra_nested: BTreeMap<SubexprId, LogicalOp>,
    inter_logical: Vec<LogicalOp>,
}

impl<'a> Validator<'a> {
    fn new(expr: &'a str, attrs: &'a AttributeMap) -> Self {
        Validator {
            expr,
            attrs,
            pos: 0,
            open_paren: 0,
            close_paren: 0,
            nested_level: 0,
            consecutive_cp: false,
            enclosed_single: false,
            lhs_preceded_by_op: false,
            prev_token: Token::Start,
            layout: Vec::new(),
            layout_logical: None,
            current_id: None,
            id_pending: false,
            id_level: 0,
            id_member: 0,
            id_started: false,
            subexpressions: BTreeMap::new(),
            intra_nested: BTreeMap::new(),
            inter_logical: Vec::new(),
        }
    }

    #[allow(clippy::type_complexity)]
    fn run(mut self) -> EvalResult<(
        BTreeMap<SubexprId, SubexprLayout>,
        BTreeMap<SubexprId, LogicalOp>,
        Vec<LogicalOp>,
    )> {
        let bytes = self.expr.as_bytes();
        loop {
            while self.pos < bytes.len() && bytes[self.pos] == b' ' {
                self.pos += 1;
            }
            if self.pos >= bytes.len() {
                break;
            }
            match bytes[self.pos] {
                b'(' => self.handle_open_paren()?,
                b')' => self.handle_close_paren()?,
                b'&' | b'|' => self.handle_logical()?,
                _ => self.parse_block()?,
            }
        }
        self.finish()
    }

    fn peek_nonspace(&self) -> Option<u8> {
        self.expr.as_bytes()[self.pos..]
            .iter()
            .copied()
            .find(|&b| b != b' ')
    }

    /// Two-level id generator; first call is always `1.1`
    fn next_id(&mut self) -> SubexprId {
        if !self.id_started {
            self.id_started = true;
            self.id_level = 1;
            self.id_member = 1;
        } else if self.nested_level <= 1 {
            self.id_level += 1;
            self.id_member = 1;
        } else {
            self.id_member += 1;
        }
        SubexprId::new(self.id_level, self.id_member)
    }

    /// Use the id handed out at the last inter-subexpression boundary if it
    /// has not been consumed yet, otherwise generate the next one
    fn take_or_next_id(&mut self) -> SubexprId {
        match (self.id_pending, self.current_id) {
            (true, Some(id)) => {
                self.id_pending = false;
                id
            }
            _ => {
                let id = self.next_id();
                self.current_id = Some(id);
                id
            }
        }
    }

    fn flush_layout(&mut self, id: SubexprId) {
        let layout = std::mem::take(&mut self.layout);
        self.subexpressions.insert(id, layout);
        self.layout_logical = None;
        self.lhs_preceded_by_op = false;
    }

    /// Record a nested-group joiner, enforcing homogeneity per level
    fn intra_insert(&mut self, id: SubexprId, op: LogicalOp) -> EvalResult<()> {
        for (other, existing) in &self.intra_nested {
            if other.level == id.level && *existing != op {
                return Err(EvalError::MixedLogicalOperatorsFoundInNestedSubexpressions);
            }
        }
        self.intra_nested.insert(id, op);
        Ok(())
    }

    fn handle_open_paren(&mut self) -> EvalResult<()> {
        if matches!(self.prev_token, Token::Block | Token::Close) {
            let pending = self
                .layout
                .last()
                .is_some_and(|step| step.connector.is_some());
            if !pending {
                return Err(EvalError::UnexpectedOpenParenthesis);
            }
        }
        self.open_paren += 1;
        self.pos += 1;

        // An immediately following '(' is the outer paren of a nested
        // group; it only counts.
        if self.peek_nonspace() == Some(b'(') {
            self.prev_token = Token::Open;
            return Ok(());
        }
        if self.open_paren - self.close_paren > 1 {
            self.nested_level += 1;
        }
        // A filled layout ends its nested-group member here; the pending
        // logical moves into the intra-nested table.
        let pending_op = self.layout.last_mut().and_then(|step| step.connector.take());
        if let Some(op) = pending_op {
            let id = self.take_or_next_id();
            self.intra_insert(id, op)?;
            self.flush_layout(id);
        }
        self.prev_token = Token::Open;
        Ok(())
    }

    fn handle_close_paren(&mut self) -> EvalResult<()> {
        self.close_paren += 1;
        if self.close_paren > self.open_paren {
            return Err(EvalError::UnexpectedCloseParenthesis);
        }
        if self.prev_token == Token::Open {
            return Err(EvalError::EmptyParenthesesFound);
        }
        if self.prev_token == Token::Logical {
            return Err(EvalError::UnprocessedLhs);
        }
        self.pos += 1;

        if self.peek_nonspace() == Some(b')') {
            self.consecutive_cp = true;
        }
        let balanced = self.open_paren == self.close_paren;
        if self.lhs_preceded_by_op && !self.consecutive_cp && balanced {
            self.nested_level = 0;
            self.enclosed_single = true;
        }
        if balanced {
            if !self.enclosed_single {
                self.nested_level += 1;
            }
            if !self.layout.is_empty() {
                let id = self.take_or_next_id();
                self.flush_layout(id);
            }
            self.nested_level = 0;
            self.consecutive_cp = false;
            self.enclosed_single = false;
        } else if !self.consecutive_cp && !self.layout.is_empty() {
            let id = self.take_or_next_id();
            self.flush_layout(id);
        }
        self.prev_token = Token::Close;
        Ok(())
    }

    fn handle_logical(&mut self) -> EvalResult<()> {
        let bytes = self.expr.as_bytes();
        let b = bytes[self.pos];
        if self.pos + 1 >= bytes.len() || bytes[self.pos + 1] != b {
            return Err(EvalError::InvalidLogicalOperator);
        }
        let op = if b == b'&' { LogicalOp::And } else { LogicalOp::Or };
        if self.pos == 0 || bytes[self.pos - 1] != b' ' {
            return Err(EvalError::MissingSpaceAroundLogicalOperator);
        }
        if self.pos + 2 < bytes.len() && bytes[self.pos + 2] != b' ' {
            return Err(EvalError::MissingSpaceAroundLogicalOperator);
        }
        if matches!(self.prev_token, Token::Start | Token::Open | Token::Logical) {
            return Err(EvalError::InvalidLogicalOperator);
        }
        self.pos += 2;

        if self.open_paren == self.close_paren {
            // Boundary between independent subexpression groups
            if !self.layout.is_empty() {
                let id = self.take_or_next_id();
                self.flush_layout(id);
            }
            if self.inter_logical.last().is_some_and(|prev| *prev != op) {
                return Err(EvalError::MixedLogicalOperatorsFoundInInterSubexpressions);
            }
            self.inter_logical.push(op);
            let id = self.next_id();
            self.current_id = Some(id);
            self.id_pending = true;
            self.nested_level = 0;
            self.enclosed_single = false;
        } else if self.layout.is_empty() || self.consecutive_cp {
            // Joiner between members of a nested group
            if !self.layout.is_empty() {
                let id = self.take_or_next_id();
                self.flush_layout(id);
            }
            let id = self.current_id.ok_or(EvalError::InvalidLogicalOperator)?;
            self.intra_insert(id, op)?;
            self.consecutive_cp = false;
        } else {
            // Joiner between blocks of one multi-part subexpression
            if self.layout_logical.is_some_and(|existing| existing != op) {
                return Err(EvalError::MixedLogicalOperatorsFoundInSubexpression);
            }
            self.layout_logical = Some(op);
            if let Some(step) = self.layout.last_mut() {
                step.connector = Some(op);
            }
        }
        self.prev_token = Token::Logical;
        Ok(())
    }

    /// One `LHS verb RHS` block, or a `list<tuple<...>>` recursion
    fn parse_block(&mut self) -> EvalResult<()> {
        if matches!(self.prev_token, Token::Block | Token::Close) {
            return Err(EvalError::UnexpectedCharacterAfterRhs);
        }
        let bytes = self.expr.as_bytes();

        // Longest attribute path matching at this position
        let rest = &self.expr[self.pos..];
        let mut best: Option<(&str, &str)> = None;
        for (path, type_str) in self.attrs {
            if let Some(tail) = rest.strip_prefix(path.as_str()) {
                let boundary = match tail.bytes().next() {
                    None | Some(b' ') | Some(b'[') => true,
                    Some(b) => is_op_starter(b),
                };
                if boundary && best.is_none_or(|(p, _)| path.len() > p.len()) {
                    best = Some((path.as_str(), type_str.as_str()));
                }
            }
        }
        let Some((path, type_str)) = best else {
            if rest.starts_with('.') {
                return Err(EvalError::StrayDotFound);
            }
            return Err(EvalError::LhsAttributeNameNotFound);
        };
        self.lhs_preceded_by_op = self.prev_token == Token::Open;
        self.pos += path.len();

        let class = TypeClass::classify(type_str);
        if let TypeClass::Unsupported(kind) = &class {
            return Err(unsupported_lhs_error(*kind));
        }

        // Optional element access
        let mut index_or_key = String::new();
        let mut indexed = false;
        if self.pos < bytes.len() && bytes[self.pos] == b'[' {
            match &class {
                TypeClass::List(_) | TypeClass::ListOfTuple(_) => {
                    index_or_key = self.parse_list_index()?;
                }
                TypeClass::Map(key_type, _) => {
                    index_or_key = self.parse_map_key(&TypeClass::classify(key_type))?;
                }
                _ => return Err(EvalError::OpenBracketAfterScalarLhs),
            }
            indexed = true;
        }

        // list<tuple<...>> with an index recurses into the inner schema
        if indexed {
            if let TypeClass::ListOfTuple(inner_schema) = &class {
                let inner_schema = inner_schema.clone();
                return self.parse_list_of_tuple_block(path, type_str, index_or_key, &inner_schema);
            }
        }

        while self.pos < bytes.len() && bytes[self.pos] == b' ' {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return Err(EvalError::UnprocessedOperationVerb);
        }
        let Some((verb, family)) = match_verb(&self.expr[self.pos..]) else {
            return Err(EvalError::InvalidOperationVerb);
        };
        self.pos += verb.len();

        // The class the verb applies to: the element type once an index or
        // key is in play, the container itself otherwise. Size verbs always
        // measure the container (or string) at the path.
        let operand_class = if indexed {
            match &class {
                TypeClass::List(elem) => TypeClass::classify(elem),
                TypeClass::Map(_, value) => TypeClass::classify(value),
                _ => class.clone(),
            }
        } else {
            class.clone()
        };

        let (op_verb, rhs_text) = if family == OpFamily::Size {
            match &class {
                TypeClass::Boolean => return Err(EvalError::SizeVerbNotAllowedForBooleanLhs),
                c if c.is_numeric() => return Err(EvalError::SizeVerbNotAllowedForNumericLhs),
                _ => {}
            }
            while self.pos < bytes.len() && bytes[self.pos] == b' ' {
                self.pos += 1;
            }
            if self.pos >= bytes.len() {
                return Err(EvalError::UnprocessedRhs);
            }
            let (text, end) = parse_size_rhs(self.expr, self.pos)?;
            self.pos = end;
            (verb.to_string(), text)
        } else {
            match &operand_class {
                TypeClass::List(elem) | TypeClass::Set(elem) => {
                    let elem_class = TypeClass::classify(elem);
                    check_collection_compat(
                        &operand_class,
                        family,
                        verb,
                        elem_class == TypeClass::Str,
                    )?;
                    let text = self.parse_rhs_value(&elem_class)?;
                    (verb.to_string(), text)
                }
                TypeClass::Map(key, _) => {
                    let key_class = TypeClass::classify(key);
                    check_collection_compat(
                        &operand_class,
                        family,
                        verb,
                        key_class == TypeClass::Str,
                    )?;
                    let text = self.parse_rhs_value(&key_class)?;
                    (verb.to_string(), text)
                }
                TypeClass::ListOfTuple(_) => {
                    return Err(EvalError::ListOfTupleLhsRequiresIndexOrSizeVerb);
                }
                scalar => {
                    check_scalar_compat(scalar, family, verb)?;
                    match family {
                        OpFamily::Arithmetic => {
                            let scalar = scalar.clone();
                            self.parse_arithmetic_tail(verb, &scalar)?
                        }
                        OpFamily::Membership => {
                            while self.pos < bytes.len() && bytes[self.pos] == b' ' {
                                self.pos += 1;
                            }
                            if self.pos >= bytes.len() {
                                return Err(EvalError::UnprocessedRhs);
                            }
                            let (text, end) = parse_membership_rhs(self.expr, self.pos)?;
                            parse_membership_literal(&text, scalar)?;
                            self.pos = end;
                            (verb.to_string(), text)
                        }
                        OpFamily::Contains
                        | OpFamily::Substring
                        | OpFamily::CaseEquality => {
                            let text = self.parse_rhs_value(&TypeClass::Str)?;
                            (verb.to_string(), text)
                        }
                        OpFamily::Relational => {
                            let scalar = scalar.clone();
                            let text = self.parse_rhs_value(&scalar)?;
                            (verb.to_string(), text)
                        }
                        OpFamily::Size => return Err(EvalError::InvalidOperationVerb),
                    }
                }
            }
        };

        self.layout.push(PredicateStep {
            lhs_path: path.to_string(),
            lhs_type: type_str.to_string(),
            index_or_key,
            op_verb,
            rhs: rhs_text,
            connector: None,
            kind: StepKind::Comparison,
        });
        self.prev_token = Token::Block;
        Ok(())
    }

    /// `[` digits `]` for list access; the `[` is at the current position
    fn parse_list_index(&mut self) -> EvalResult<String> {
        let (index, end) = parse_list_index_at(self.expr, self.pos)?;
        self.pos = end;
        Ok(index)
    }

    /// `[` key `]` for map access; the key grammar follows the key class
    fn parse_map_key(&mut self, key_class: &TypeClass) -> EvalResult<String> {
        let (key, end) = parse_map_key_at(self.expr, self.pos, key_class)?;
        self.pos = end;
        Ok(key)
    }

    /// ` operand postVerb` after an arithmetic verb, then the RHS value
    fn parse_arithmetic_tail(
        &mut self,
        verb: &str,
        scalar: &TypeClass,
    ) -> EvalResult<(String, String)> {
        let bytes = self.expr.as_bytes();
        if self.pos >= bytes.len() || bytes[self.pos] != b' ' {
            return Err(EvalError::MissingSpaceAfterArithmeticVerb);
        }
        self.pos += 1;
        let (operand, after) = parse_arithmetic_operand(self.expr, self.pos, scalar)?;
        self.pos = after + 1; // the space after the operand

        while self.pos < bytes.len() && bytes[self.pos] == b' ' {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return Err(EvalError::MissingPostArithmeticVerb);
        }
        let mut post: Option<&str> = None;
        for &candidate in RELATIONAL_VERBS {
            if self.expr[self.pos..].starts_with(candidate) {
                post = Some(candidate);
                break;
            }
        }
        let Some(post) = post else {
            return Err(EvalError::InvalidPostArithmeticVerb);
        };
        self.pos += post.len();

        let rhs_text = self.parse_rhs_value(scalar)?;
        Ok((format!("{verb} {operand} {post}"), rhs_text))
    }

    /// Type-directed RHS value, spaces before it skipped
    fn parse_rhs_value(&mut self, class: &TypeClass) -> EvalResult<String> {
        let bytes = self.expr.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos] == b' ' {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return Err(EvalError::UnprocessedRhs);
        }
        let (text, end) = match class {
            TypeClass::Boolean => parse_bool_rhs(self.expr, self.pos)?,
            TypeClass::Str => parse_string_rhs(self.expr, self.pos)?,
            c if c.is_float() => parse_float_rhs(self.expr, self.pos)?,
            c if c.is_unsigned() => parse_int_rhs(self.expr, self.pos, false)?,
            c if c.is_numeric() => parse_int_rhs(self.expr, self.pos, true)?,
            TypeClass::Unsupported(kind) => return Err(unsupported_lhs_error(*kind)),
            _ => return Err(EvalError::InvalidOperationVerb),
        };
        self.pos = end;
        Ok(text)
    }

    /// `lot[i].<sub-expression>`: validate the slice against the inner
    /// tuple schema and keep its byte offsets in the block
    fn parse_list_of_tuple_block(
        &mut self,
        path: &str,
        type_str: &str,
        index: String,
        inner_schema: &str,
    ) -> EvalResult<()> {
        let bytes = self.expr.as_bytes();
        if self.pos >= bytes.len() || bytes[self.pos] != b'.' {
            return Err(EvalError::MissingAttributeAccessAfterListOfTupleIndex);
        }
        let sub_start = self.pos + 1;
        let sub_end = scan_subexpr_end(self.expr, sub_start);
        let slice = self.expr[sub_start..sub_end].trim_end();
        if slice.is_empty() {
            return Err(EvalError::UnprocessedLhs);
        }

        let inner_attrs = parse_tuple_schema(inner_schema)?;
        validate_with_map(slice, &inner_attrs)?;

        self.layout.push(PredicateStep {
            lhs_path: path.to_string(),
            lhs_type: type_str.to_string(),
            index_or_key: index,
            op_verb: sub_start.to_string(),
            rhs: sub_end.to_string(),
            connector: None,
            kind: StepKind::ListOfTuple,
        });
        self.pos = sub_end;
        self.prev_token = Token::Block;
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn finish(mut self) -> EvalResult<(
        BTreeMap<SubexprId, SubexprLayout>,
        BTreeMap<SubexprId, LogicalOp>,
        Vec<LogicalOp>,
    )> {
        match self.prev_token {
            Token::Logical => return Err(EvalError::UnprocessedLhs),
            Token::Start => return Err(EvalError::EmptyExpression),
            _ => {}
        }
        if !self.layout.is_empty() {
            let id = self.take_or_next_id();
            self.flush_layout(id);
        } else if self.id_pending {
            return Err(EvalError::UnprocessedLhs);
        }
        if self.subexpressions.is_empty() {
            return Err(EvalError::UnprocessedLhs);
        }

        let mut levels = 0usize;
        let mut last_level = None;
        for id in self.subexpressions.keys() {
            if last_level != Some(id.level) {
                levels += 1;
                last_level = Some(id.level);
            }
        }
        if self.inter_logical.len() != levels - 1 {
            return Err(EvalError::SubexpressionLogicalOperatorCountMismatch);
        }
        Ok((self.subexpressions, self.intra_nested, self.inter_logical))
    }
}

/// Parse a `[` digits `]` list access whose `[` sits at `pos`; returns the
/// index text and the position after `]`. Shared with the attribute fetcher.
pub(crate) fn parse_list_index_at(expr: &str, pos: usize) -> EvalResult<(String, usize)> {
    let bytes = expr.as_bytes();
    let mut i = pos + 1;
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        if i < bytes.len() && bytes[i] == b']' {
            return Err(EvalError::MissingListIndexInLhs);
        }
        return Err(EvalError::NonNumericListIndexInLhs);
    }
    if i >= bytes.len() || bytes[i] != b']' {
        if i < bytes.len() && bytes[i] != b' ' {
            return Err(EvalError::NonNumericListIndexInLhs);
        }
        return Err(EvalError::MissingCloseBracketInLhsListAccess);
    }
    Ok((expr[digits_start..i].to_string(), i + 1))
}

/// Parse a `[` key `]` map access whose `[` sits at `pos`; the key grammar
/// follows the map's key class. Shared with the attribute fetcher.
pub(crate) fn parse_map_key_at(
    expr: &str,
    pos: usize,
    key_class: &TypeClass,
) -> EvalResult<(String, usize)> {
    let bytes = expr.as_bytes();
    let mut i = pos + 1;
    let key = match key_class {
        TypeClass::Str => {
            if i >= bytes.len() || (bytes[i] != b'\'' && bytes[i] != b'"') {
                return Err(EvalError::MissingQuoteInLhsStringMapKey);
            }
            let close = find_quote_close(bytes, i, true)
                .ok_or(EvalError::MissingQuoteInLhsStringMapKey)?;
            let key = expr[i + 1..close].to_string();
            if key.is_empty() {
                return Err(EvalError::EmptyStringMapKeyInLhs);
            }
            i = close + 1;
            key
        }
        c if c.is_float() => {
            let start = i;
            if i < bytes.len() && bytes[i] == b'-' {
                i += 1;
            }
            let whole = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i == whole || i >= bytes.len() || bytes[i] != b'.' {
                return Err(EvalError::InvalidFloatMapKeyInLhs);
            }
            i += 1;
            let frac = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i == frac {
                return Err(EvalError::InvalidFloatMapKeyInLhs);
            }
            expr[start..i].to_string()
        }
        c if c.is_numeric() => {
            let start = i;
            if i < bytes.len() && bytes[i] == b'-' && c.is_signed_numeric() {
                i += 1;
            }
            let digits = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i == digits {
                return Err(EvalError::NonNumericMapKeyForIntKeyedMap);
            }
            expr[start..i].to_string()
        }
        TypeClass::Boolean => {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            let word = &expr[start..i];
            if word != "true" && word != "false" {
                return Err(EvalError::NonNumericMapKeyForIntKeyedMap);
            }
            word.to_string()
        }
        TypeClass::Unsupported(kind) => return Err(unsupported_lhs_error(*kind)),
        _ => return Err(EvalError::NonNumericMapKeyForIntKeyedMap),
    };
    if i >= bytes.len() || bytes[i] != b']' {
        return Err(EvalError::MissingCloseBracketInLhsMapAccess);
    }
    Ok((key, i + 1))
}

/// End of a `list<tuple<...>>` sub-expression slice: the first logical
/// operator or unmatched `)` outside quotes, or end-of-input. The returned
/// offset is a byte offset into the full expression.
fn scan_subexpr_end(expr: &str, start: usize) -> usize {
    let bytes = expr.as_bytes();
    let mut depth = 0usize;
    let mut in_square = false;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = match find_quote_close(bytes, i, in_square) {
                    Some(close) => close + 1,
                    None => bytes.len(),
                };
            }
            b'[' => {
                in_square = true;
                i += 1;
            }
            b']' => {
                in_square = false;
                i += 1;
            }
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                if depth == 0 {
                    return i;
                }
                depth -= 1;
                i += 1;
            }
            b'&' if depth == 0 && bytes.get(i + 1) == Some(&b'&') => return i,
            b'|' if depth == 0 && bytes.get(i + 1) == Some(&b'|') => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}
