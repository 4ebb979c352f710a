//! Expression parsing
//!
//! Binary operators, prefix operators and parentheses are handled by an
//! iterative precedence climber with an explicit frame stack, so nesting
//! depth is bounded by memory rather than by the call stack. Atoms (literals,
//! names, function calls, CASE, subqueries) and their postfix forms are
//! parsed by ordinary descent.

use super::keywords::Keyword;
use super::token::{NumberKind, Op, StringKind, TokenKind};
use super::token_parser_base::{grow_stack, ParseResult, TokenParser};
use crate::ast::{
    BinaryOp, Expr, ExprKind, FunctionCall, Ident, LegacyConstruct, Literal, ObjectName,
    OrderByItem, OuterJoinSide, Quantifier, SortDirection, UnaryOp, WhenClause, WindowFrame,
    WindowFrameBound, WindowFrameUnits, WindowSpec,
};
use crate::diagnostics::Diagnostic;
use crate::source::SourceSpan;

// Binding powers. Left-associative operators use (n, n + 1).
const OR_BP: (u8, u8) = (1, 2);
const AND_BP: (u8, u8) = (3, 4);
const NOT_BP: u8 = 5;
const COMPARISON_BP: (u8, u8) = (7, 8);
const BIT_OR_BP: (u8, u8) = (9, 10);
const BIT_XOR_BP: (u8, u8) = (11, 12);
const BIT_AND_BP: (u8, u8) = (13, 14);
const ADDITIVE_BP: (u8, u8) = (15, 16);
const MULTIPLICATIVE_BP: (u8, u8) = (17, 18);
const UNARY_BP: u8 = 19;

/// Methods that make `a.b.method(...)` a method call on `a.b` rather than a
/// call of function `method` in schema `b`.
const COLUMN_METHODS: &[&str] = &["value", "query", "exist", "nodes", "modify", "write"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfixOp {
    Binary(BinaryOp),
    LegacyJoin(OuterJoinSide),
}

/// Pending work while climbing.
enum Frame {
    Prefix {
        op: UnaryOp,
        start: SourceSpan,
        min_bp: u8,
    },
    Infix {
        lhs: Expr,
        op: InfixOp,
        min_bp: u8,
    },
    Paren {
        open: SourceSpan,
        min_bp: u8,
    },
}

impl<'a> TokenParser<'a> {
    /// Parse a full expression, including AND/OR chains.
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_expr_bp(0)
    }

    /// Parse a single operand: an atom with prefix and postfix operators but
    /// no binary operators (`TOP 10`, `AT TIME ZONE 'UTC'`).
    pub(crate) fn parse_operand(&mut self) -> ParseResult<Expr> {
        self.parse_expr_bp(UNARY_BP)
    }

    pub fn parse_expr_list(&mut self) -> ParseResult<Vec<Expr>> {
        self.parse_comma_separated(Self::parse_expr)
    }

    /// Parse an expression whose operators all bind at least as tightly as `min_bp`.
    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) -> ParseResult<Expr> {
        grow_stack(|| self.parse_expr_frames(min_bp))
    }

    /// Operators and parentheses live on an explicit frame stack; only
    /// subqueries and call arguments re-enter through [`Self::parse_expr_bp`].
    fn parse_expr_frames(&mut self, min_bp: u8) -> ParseResult<Expr> {
        let mut stack: Vec<Frame> = Vec::new();
        let mut min_bp = min_bp;

        'operand: loop {
            let start = self.current_span();
            let mut lhs = if let Some(op) = self.peek_prefix_op() {
                self.advance();
                stack.push(Frame::Prefix { op, start, min_bp });
                min_bp = if op == UnaryOp::Not { NOT_BP } else { UNARY_BP };
                continue 'operand;
            } else if self.check_op(Op::LParen) && !self.starts_subquery_at(1) {
                self.advance();
                stack.push(Frame::Paren { open: start, min_bp });
                min_bp = 0;
                continue 'operand;
            } else if let Some(quantifier) = self.peek_quantifier() {
                match stack.pop() {
                    Some(Frame::Infix {
                        lhs: left,
                        op: InfixOp::Binary(op),
                        min_bp: saved,
                    }) if op.is_comparison() => {
                        self.advance();
                        let (subquery, close) = self.parse_parenthesized_query()?;
                        min_bp = saved;
                        let span = left.span.to(close);
                        Expr::new(
                            ExprKind::Quantified {
                                left: Box::new(left),
                                op,
                                quantifier,
                                subquery: Box::new(subquery),
                            },
                            span,
                        )
                    }
                    other => {
                        if let Some(frame) = other {
                            stack.push(frame);
                        }
                        return Err(self.expected("expression"));
                    }
                }
            } else {
                self.parse_primary()?
            };

            loop {
                if self.check_special_form() && COMPARISON_BP.0 >= min_bp {
                    lhs = self.parse_special_form(lhs)?;
                    continue;
                }
                if let Some((op, (l_bp, r_bp))) = self.peek_infix_op() {
                    if l_bp >= min_bp {
                        let op_span = self.advance().span;
                        if let InfixOp::LegacyJoin(_) = op {
                            self.note_legacy(LegacyConstruct::OuterJoinOperator, op_span);
                        }
                        stack.push(Frame::Infix { lhs, op, min_bp });
                        min_bp = r_bp;
                        continue 'operand;
                    }
                }
                match stack.pop() {
                    None => return Ok(lhs),
                    Some(Frame::Prefix {
                        op,
                        start,
                        min_bp: saved,
                    }) => {
                        let span = start.to(lhs.span);
                        lhs = Expr::new(
                            ExprKind::Unary {
                                op,
                                expr: Box::new(lhs),
                            },
                            span,
                        );
                        min_bp = saved;
                    }
                    Some(Frame::Infix {
                        lhs: left,
                        op,
                        min_bp: saved,
                    }) => {
                        let span = left.span.to(lhs.span);
                        let kind = match op {
                            InfixOp::Binary(op) => ExprKind::Binary {
                                op,
                                left: Box::new(left),
                                right: Box::new(lhs),
                            },
                            InfixOp::LegacyJoin(side) => ExprKind::LegacyOuterJoin {
                                left: Box::new(left),
                                right: Box::new(lhs),
                                side,
                            },
                        };
                        lhs = Expr::new(kind, span);
                        min_bp = saved;
                    }
                    Some(Frame::Paren {
                        open,
                        min_bp: saved,
                    }) => {
                        let close = self.expect_op(Op::RParen)?;
                        let nested = Expr::new(ExprKind::Nested(Box::new(lhs)), open.to(close));
                        lhs = self.parse_postfix(nested)?;
                        min_bp = saved;
                    }
                }
            }
        }
    }

    fn peek_prefix_op(&self) -> Option<UnaryOp> {
        match self.peek().kind {
            TokenKind::Operator(Op::Plus) => Some(UnaryOp::Plus),
            TokenKind::Operator(Op::Minus) => Some(UnaryOp::Minus),
            TokenKind::Operator(Op::Tilde) => Some(UnaryOp::BitNot),
            TokenKind::Keyword(Keyword::NOT) => Some(UnaryOp::Not),
            _ => None,
        }
    }

    fn peek_quantifier(&self) -> Option<Quantifier> {
        if !self.check_op_at(1, Op::LParen) {
            return None;
        }
        match self.peek().keyword()? {
            Keyword::ALL => Some(Quantifier::All),
            Keyword::ANY => Some(Quantifier::Any),
            Keyword::SOME => Some(Quantifier::Some),
            _ => None,
        }
    }

    fn peek_infix_op(&self) -> Option<(InfixOp, (u8, u8))> {
        let binary = |op| Some((InfixOp::Binary(op), binary_bp(op)));
        match self.peek().kind {
            TokenKind::Keyword(Keyword::OR) => binary(BinaryOp::Or),
            TokenKind::Keyword(Keyword::AND) => binary(BinaryOp::And),
            TokenKind::Operator(op) => match op {
                Op::Star => binary(BinaryOp::Multiply),
                Op::Slash => binary(BinaryOp::Divide),
                Op::Percent => binary(BinaryOp::Modulo),
                Op::Plus => binary(BinaryOp::Add),
                Op::Minus => binary(BinaryOp::Subtract),
                Op::Ampersand => binary(BinaryOp::BitAnd),
                Op::Caret => binary(BinaryOp::BitXor),
                Op::Pipe => binary(BinaryOp::BitOr),
                Op::Eq => binary(BinaryOp::Eq),
                Op::NotEq | Op::BangEq => binary(BinaryOp::NotEq),
                Op::Lt => binary(BinaryOp::Lt),
                Op::LtEq => binary(BinaryOp::LtEq),
                Op::Gt => binary(BinaryOp::Gt),
                Op::GtEq => binary(BinaryOp::GtEq),
                Op::NotLt => binary(BinaryOp::NotLt),
                Op::NotGt => binary(BinaryOp::NotGt),
                Op::StarEq => Some((InfixOp::LegacyJoin(OuterJoinSide::Left), COMPARISON_BP)),
                Op::EqStar => Some((InfixOp::LegacyJoin(OuterJoinSide::Right), COMPARISON_BP)),
                _ => None,
            },
            _ => None,
        }
    }

    // ========================================================================
    // Predicates at comparison level
    // ========================================================================

    fn check_special_form(&self) -> bool {
        let is_form = |kw: Option<Keyword>| {
            matches!(
                kw,
                Some(Keyword::BETWEEN | Keyword::IN | Keyword::LIKE)
            )
        };
        match self.peek().keyword() {
            Some(Keyword::IS) => true,
            Some(Keyword::NOT) => is_form(self.peek_nth(1).keyword()),
            kw => is_form(kw),
        }
    }

    /// `[NOT] BETWEEN`, `[NOT] IN`, `[NOT] LIKE`, `IS [NOT] NULL`.
    fn parse_special_form(&mut self, lhs: Expr) -> ParseResult<Expr> {
        let start = lhs.span;
        if self.eat_keyword(Keyword::IS) {
            let negated = self.eat_keyword(Keyword::NOT);
            self.expect_keyword(Keyword::NULL)?;
            return Ok(Expr::new(
                ExprKind::IsNull {
                    expr: Box::new(lhs),
                    negated,
                },
                self.span_from(start),
            ));
        }

        let negated = self.eat_keyword(Keyword::NOT);
        let kind = if self.eat_keyword(Keyword::BETWEEN) {
            let low = self.parse_expr_bp(COMPARISON_BP.1)?;
            self.expect_keyword(Keyword::AND)?;
            let high = self.parse_expr_bp(COMPARISON_BP.1)?;
            ExprKind::Between {
                expr: Box::new(lhs),
                low: Box::new(low),
                high: Box::new(high),
            }
        } else if self.eat_keyword(Keyword::IN) {
            if self.check_op(Op::LParen) && self.starts_subquery_at(1) {
                let (subquery, _) = self.parse_parenthesized_query()?;
                ExprKind::InSubquery {
                    expr: Box::new(lhs),
                    subquery: Box::new(subquery),
                }
            } else {
                self.expect_op(Op::LParen)?;
                let list = self.parse_expr_list()?;
                self.expect_op(Op::RParen)?;
                ExprKind::InList {
                    expr: Box::new(lhs),
                    list,
                }
            }
        } else {
            self.expect_keyword(Keyword::LIKE)?;
            let pattern = self.parse_expr_bp(COMPARISON_BP.1)?;
            let escape = if self.eat_keyword(Keyword::ESCAPE) {
                Some(Box::new(self.parse_expr_bp(COMPARISON_BP.1)?))
            } else {
                None
            };
            ExprKind::Like {
                expr: Box::new(lhs),
                pattern: Box::new(pattern),
                escape,
            }
        };
        let form = Expr::new(kind, self.span_from(start));
        if !negated {
            return Ok(form);
        }
        // `a NOT BETWEEN x AND y` has the same shape as `NOT a BETWEEN x AND y`
        let span = form.span;
        Ok(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Not,
                expr: Box::new(form),
            },
            span,
        ))
    }

    // ========================================================================
    // Atoms
    // ========================================================================

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = *self.peek();
        let span = token.span;
        let atom = match token.kind {
            TokenKind::Number(kind) => {
                self.advance();
                let text = token.text.to_string();
                let literal = match kind {
                    NumberKind::Integer => Literal::Integer(text),
                    NumberKind::Decimal => Literal::Decimal(text),
                    NumberKind::Float => Literal::Float(text),
                    NumberKind::Money => Literal::Money(text),
                };
                Expr::new(ExprKind::Literal(literal), span)
            }
            TokenKind::StringLiteral(kind) => {
                self.advance();
                Expr::new(
                    ExprKind::Literal(Literal::String {
                        value: token.string_value(),
                        unicode: kind == StringKind::Unicode,
                    }),
                    span,
                )
            }
            TokenKind::BinaryLiteral => {
                self.advance();
                let digits = token.text.get(2..).unwrap_or("").to_string();
                Expr::new(ExprKind::Literal(Literal::Binary(digits)), span)
            }
            TokenKind::Variable => {
                self.advance();
                Expr::new(ExprKind::Variable(token.text.to_string()), span)
            }
            TokenKind::Operator(Op::Star) => {
                self.advance();
                Expr::new(ExprKind::Wildcard { qualifier: None }, span)
            }
            TokenKind::Operator(Op::LParen) => {
                let (query, close) = self.parse_parenthesized_query()?;
                Expr::new(ExprKind::Subquery(Box::new(query)), span.to(close))
            }
            TokenKind::Operator(Op::LBrace) => self.parse_odbc_escape()?,
            TokenKind::Keyword(kw) => self.parse_keyword_atom(kw)?,
            TokenKind::Identifier | TokenKind::QuotedIdentifier(_) => self.parse_name_atom()?,
            _ => return Err(self.expected("expression")),
        };
        self.parse_postfix(atom)
    }

    fn parse_keyword_atom(&mut self, kw: Keyword) -> ParseResult<Expr> {
        let start = self.current_span();
        match kw {
            Keyword::NULL => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Null), start))
            }
            Keyword::DEFAULT => {
                self.advance();
                Ok(Expr::new(ExprKind::Default, start))
            }
            Keyword::CASE => self.parse_case(),
            Keyword::EXISTS => {
                self.advance();
                let (query, close) = self.parse_parenthesized_query()?;
                Ok(Expr::new(ExprKind::Exists(Box::new(query)), start.to(close)))
            }
            Keyword::CONVERT | Keyword::TRY_CONVERT if self.check_op_at(1, Op::LParen) => {
                self.advance();
                self.parse_convert(start, kw == Keyword::TRY_CONVERT)
            }
            Keyword::IDENTITYCOL => {
                let token = self.advance();
                let ident = Ident::new(token.text, token.span);
                Ok(Expr::new(ExprKind::Column(ObjectName::from_ident(ident)), start))
            }
            _ if kw.is_function_name() && self.check_op_at(1, Op::LParen) => {
                let token = self.advance();
                let name = ObjectName::from_ident(Ident::new(token.text, token.span));
                self.parse_function_call(name)
            }
            _ if kw.is_niladic_function() => {
                let token = self.advance();
                let name = ObjectName::from_ident(Ident::new(token.text, token.span));
                Ok(Expr::new(
                    ExprKind::Function(FunctionCall {
                        name,
                        args: Vec::new(),
                        distinct: false,
                        niladic: true,
                        within_group: Vec::new(),
                        span: start,
                    }),
                    start,
                ))
            }
            _ => Err(self.expected("expression")),
        }
    }

    /// Column reference, wildcard, function call, `NEXT VALUE FOR`, or `type::method()`.
    fn parse_name_atom(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        if self.check_op_at(1, Op::LParen) {
            if self.check_word_ci("CAST") || self.check_word_ci("TRY_CAST") {
                let is_try = self.check_word_ci("TRY_CAST");
                self.advance();
                return self.parse_cast(start, is_try);
            }
            if self.check_word_ci("PARSE") || self.check_word_ci("TRY_PARSE") {
                let is_try = self.check_word_ci("TRY_PARSE");
                self.advance();
                return self.parse_parse(start, is_try);
            }
        }
        if self.check_word_ci("NEXT")
            && self.check_word_ci_at(1, "VALUE")
            && self.check_keyword_at(2, Keyword::FOR)
        {
            return self.parse_next_value_for();
        }

        let mut parts = vec![self.parse_identifier()?];
        while self.check_op(Op::Dot) {
            let dot = self.advance().span;
            if self.check_op(Op::Star) {
                self.advance();
                let qualifier = ObjectName {
                    parts,
                    span: start.to(dot),
                };
                return Ok(Expr::new(
                    ExprKind::Wildcard {
                        qualifier: Some(qualifier),
                    },
                    self.span_from(start),
                ));
            }
            if self.check_op(Op::Dot) {
                parts.push(Ident::new("", dot.empty_at_end()));
                continue;
            }
            parts.push(self.parse_identifier_or_keyword()?);
        }
        let name = ObjectName {
            parts,
            span: self.span_from(start),
        };

        if self.check_op(Op::LParen) {
            let is_method = name.parts.len() > 1
                && COLUMN_METHODS
                    .iter()
                    .any(|m| name.name().value.eq_ignore_ascii_case(m));
            if is_method {
                let mut parts = name.parts;
                let method = parts.pop().unwrap_or_else(|| Ident::new("", start));
                let target_span = parts
                    .first()
                    .map_or(start, |first| first.span.to(parts[parts.len() - 1].span));
                let target = Expr::new(
                    ExprKind::Column(ObjectName {
                        parts,
                        span: target_span,
                    }),
                    target_span,
                );
                return self.parse_method_call(target, method);
            }
            return self.parse_function_call(name);
        }

        if self.eat_op(Op::DoubleColon) {
            let method = self.parse_identifier_or_keyword()?;
            let args = if self.check_op(Op::LParen) {
                self.parse_call_args()?
            } else {
                Vec::new()
            };
            return Ok(Expr::new(
                ExprKind::StaticMethodCall {
                    type_name: name,
                    method,
                    args,
                },
                self.span_from(start),
            ));
        }

        let span = name.span;
        Ok(Expr::new(ExprKind::Column(name), span))
    }

    fn parse_next_value_for(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.advance();
        self.advance();
        self.expect_keyword(Keyword::FOR)?;
        let sequence = self.parse_object_name()?;
        let over = if self.check_keyword(Keyword::OVER) {
            self.advance();
            Some(self.parse_window_spec()?)
        } else {
            None
        };
        Ok(Expr::new(
            ExprKind::NextValueFor { sequence, over },
            self.span_from(start),
        ))
    }

    /// `name ( [DISTINCT | ALL] args )`, cursor at `(`.
    fn parse_function_call(&mut self, name: ObjectName) -> ParseResult<Expr> {
        let start = name.span;
        self.expect_op(Op::LParen)?;
        let distinct = self.eat_keyword(Keyword::DISTINCT);
        if !distinct {
            self.eat_keyword(Keyword::ALL);
        }
        let is_rowset = name.is_single() && name.name().matches("OPENROWSET");
        let mut args = Vec::new();
        if !self.check_op(Op::RParen) {
            loop {
                if is_rowset && self.check_keyword(Keyword::BULK) {
                    let span = self.consume_until_list_end()?;
                    args.push(Expr::new(ExprKind::Opaque(self.text(span).to_string()), span));
                } else {
                    args.push(self.parse_expr()?);
                }
                // TRIM(chars FROM string)
                if self.eat_keyword(Keyword::FROM) {
                    args.push(self.parse_expr()?);
                }
                if !self.eat_op(Op::Comma) {
                    break;
                }
            }
        }
        self.expect_op(Op::RParen)?;
        let span = self.span_from(start);
        Ok(Expr::new(
            ExprKind::Function(FunctionCall {
                name,
                args,
                distinct,
                niladic: false,
                within_group: Vec::new(),
                span,
            }),
            span,
        ))
    }

    /// `( [expr, ...] )`
    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect_op(Op::LParen)?;
        if self.eat_op(Op::RParen) {
            return Ok(Vec::new());
        }
        let args = self.parse_expr_list()?;
        self.expect_op(Op::RParen)?;
        Ok(args)
    }

    fn parse_method_call(&mut self, target: Expr, method: Ident) -> ParseResult<Expr> {
        let start = target.span;
        let args = self.parse_call_args()?;
        Ok(Expr::new(
            ExprKind::MethodCall {
                target: Box::new(target),
                method,
                args,
            },
            self.span_from(start),
        ))
    }

    /// `CAST(expr AS type)`, cursor at `(`.
    fn parse_cast(&mut self, start: SourceSpan, is_try: bool) -> ParseResult<Expr> {
        self.expect_op(Op::LParen)?;
        let expr = self.parse_expr()?;
        self.expect_keyword(Keyword::AS)?;
        let data_type = self.parse_data_type()?;
        self.expect_op(Op::RParen)?;
        Ok(Expr::new(
            ExprKind::Cast {
                expr: Box::new(expr),
                data_type,
                is_try,
            },
            self.span_from(start),
        ))
    }

    /// `CONVERT(type, expr [, style])`, cursor at `(`.
    fn parse_convert(&mut self, start: SourceSpan, is_try: bool) -> ParseResult<Expr> {
        self.expect_op(Op::LParen)?;
        let data_type = self.parse_data_type()?;
        self.expect_op(Op::Comma)?;
        let expr = self.parse_expr()?;
        let style = if self.eat_op(Op::Comma) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_op(Op::RParen)?;
        Ok(Expr::new(
            ExprKind::Convert {
                data_type,
                expr: Box::new(expr),
                style,
                is_try,
            },
            self.span_from(start),
        ))
    }

    /// `PARSE(expr AS type [USING culture])`, cursor at `(`.
    fn parse_parse(&mut self, start: SourceSpan, is_try: bool) -> ParseResult<Expr> {
        self.expect_op(Op::LParen)?;
        let expr = self.parse_expr()?;
        self.expect_keyword(Keyword::AS)?;
        let data_type = self.parse_data_type()?;
        let culture = if self.eat_word_ci("USING") {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_op(Op::RParen)?;
        Ok(Expr::new(
            ExprKind::Parse {
                expr: Box::new(expr),
                data_type,
                culture,
                is_try,
            },
            self.span_from(start),
        ))
    }

    fn parse_case(&mut self) -> ParseResult<Expr> {
        let start = self.expect_keyword(Keyword::CASE)?;
        let operand = if self.check_keyword(Keyword::WHEN) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let mut when_clauses = Vec::new();
        while self.eat_keyword(Keyword::WHEN) {
            let condition = self.parse_expr()?;
            self.expect_keyword(Keyword::THEN)?;
            let result = self.parse_expr()?;
            when_clauses.push(WhenClause { condition, result });
        }
        if when_clauses.is_empty() {
            return Err(self.expected("WHEN"));
        }
        let else_result = if self.eat_keyword(Keyword::ELSE) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_keyword(Keyword::END)?;
        Ok(Expr::new(
            ExprKind::Case {
                operand,
                when_clauses,
                else_result,
            },
            self.span_from(start),
        ))
    }

    /// `{fn ...}`, `{d '...'}` and other ODBC escapes, kept as text.
    fn parse_odbc_escape(&mut self) -> ParseResult<Expr> {
        let start = self.expect_op(Op::LBrace)?;
        let mut depth = 1usize;
        while depth > 0 {
            if self.is_at_end() {
                return Err(self.expected("'}'"));
            }
            match self.advance().op() {
                Some(Op::LBrace) => depth += 1,
                Some(Op::RBrace) => depth -= 1,
                _ => {}
            }
        }
        let span = self.span_from(start);
        self.push_diagnostic(Diagnostic::unsupported(
            "ODBC escape sequence is not interpreted",
            span,
        ));
        Ok(Expr::new(ExprKind::Opaque(self.text(span).to_string()), span))
    }

    // ========================================================================
    // Postfix forms
    // ========================================================================

    fn parse_postfix(&mut self, mut expr: Expr) -> ParseResult<Expr> {
        loop {
            let start = expr.span;
            if self.eat_keyword(Keyword::COLLATE) {
                let collation = self.parse_identifier()?;
                expr = Expr::new(
                    ExprKind::Collate {
                        expr: Box::new(expr),
                        collation,
                    },
                    self.span_from(start),
                );
            } else if self.check_word_ci("AT")
                && self.check_word_ci_at(1, "TIME")
                && self.check_word_ci_at(2, "ZONE")
            {
                self.advance();
                self.advance();
                self.advance();
                let zone = self.parse_expr_bp(UNARY_BP)?;
                expr = Expr::new(
                    ExprKind::AtTimeZone {
                        expr: Box::new(expr),
                        zone: Box::new(zone),
                    },
                    self.span_from(start),
                );
            } else if self.check_op(Op::Dot) && accepts_member_access(&expr) {
                self.advance();
                let member = self.parse_identifier_or_keyword()?;
                expr = if self.check_op(Op::LParen) {
                    self.parse_method_call(expr, member)?
                } else {
                    Expr::new(
                        ExprKind::MemberAccess {
                            target: Box::new(expr),
                            member,
                        },
                        self.span_from(start),
                    )
                };
            } else if self.check_word_ci("WITHIN") && self.check_keyword_at(1, Keyword::GROUP) {
                let ExprKind::Function(mut call) = expr.kind else {
                    return Err(self.expected("end of expression"));
                };
                self.advance();
                self.advance();
                self.expect_op(Op::LParen)?;
                self.expect_keyword(Keyword::ORDER)?;
                self.expect_keyword(Keyword::BY)?;
                call.within_group = self.parse_order_by_list()?;
                self.expect_op(Op::RParen)?;
                call.span = self.span_from(start);
                expr = Expr::new(ExprKind::Function(call), self.span_from(start));
            } else if self.check_keyword(Keyword::OVER)
                && matches!(expr.kind, ExprKind::Function(_))
            {
                self.advance();
                let over = self.parse_window_spec()?;
                if let ExprKind::Function(function) = expr.kind {
                    expr = Expr::new(ExprKind::Window { function, over }, self.span_from(start));
                } else {
                    return Ok(expr);
                }
            } else {
                return Ok(expr);
            }
        }
    }

    /// `( [PARTITION BY ...] [ORDER BY ...] [ROWS | RANGE frame] )`
    pub(crate) fn parse_window_spec(&mut self) -> ParseResult<WindowSpec> {
        let start = self.expect_op(Op::LParen)?;
        let mut partition_by = Vec::new();
        if self.check_word_ci("PARTITION") && self.check_keyword_at(1, Keyword::BY) {
            self.advance();
            self.advance();
            partition_by = self.parse_expr_list()?;
        }
        let mut order_by = Vec::new();
        if self.eat_keyword(Keyword::ORDER) {
            self.expect_keyword(Keyword::BY)?;
            order_by = self.parse_order_by_list()?;
        }
        let units = if self.eat_word_ci("ROWS") {
            Some(WindowFrameUnits::Rows)
        } else if self.eat_word_ci("RANGE") {
            Some(WindowFrameUnits::Range)
        } else {
            None
        };
        let frame = match units {
            Some(units) => Some(self.parse_window_frame(units)?),
            None => None,
        };
        let close = self.expect_op(Op::RParen)?;
        Ok(WindowSpec {
            partition_by,
            order_by,
            frame,
            span: start.to(close),
        })
    }

    fn parse_window_frame(&mut self, units: WindowFrameUnits) -> ParseResult<WindowFrame> {
        if self.eat_keyword(Keyword::BETWEEN) {
            let start = self.parse_frame_bound()?;
            self.expect_keyword(Keyword::AND)?;
            let end = self.parse_frame_bound()?;
            return Ok(WindowFrame {
                units,
                start,
                end: Some(end),
            });
        }
        Ok(WindowFrame {
            units,
            start: self.parse_frame_bound()?,
            end: None,
        })
    }

    fn parse_frame_bound(&mut self) -> ParseResult<WindowFrameBound> {
        if self.eat_word_ci("UNBOUNDED") {
            if self.eat_word_ci("PRECEDING") {
                return Ok(WindowFrameBound::UnboundedPreceding);
            }
            self.expect_word_ci("FOLLOWING")?;
            return Ok(WindowFrameBound::UnboundedFollowing);
        }
        if self.eat_keyword(Keyword::CURRENT) {
            self.expect_word_ci("ROW")?;
            return Ok(WindowFrameBound::CurrentRow);
        }
        let offset = Box::new(self.parse_expr_bp(COMPARISON_BP.1)?);
        if self.eat_word_ci("PRECEDING") {
            return Ok(WindowFrameBound::Preceding(offset));
        }
        self.expect_word_ci("FOLLOWING")?;
        Ok(WindowFrameBound::Following(offset))
    }

    /// Items after `ORDER BY`.
    pub(crate) fn parse_order_by_list(&mut self) -> ParseResult<Vec<OrderByItem>> {
        self.parse_comma_separated(|p| {
            let expr = p.parse_expr()?;
            let start = expr.span;
            let direction = if p.eat_keyword(Keyword::ASC) {
                Some(SortDirection::Asc)
            } else if p.eat_keyword(Keyword::DESC) {
                Some(SortDirection::Desc)
            } else {
                None
            };
            Ok(OrderByItem {
                expr,
                direction,
                span: p.span_from(start),
            })
        })
    }

    /// Whether the token at `offset` begins a query.
    pub(crate) fn starts_subquery_at(&self, offset: usize) -> bool {
        self.check_keyword_at(offset, Keyword::SELECT) || self.check_keyword_at(offset, Keyword::WITH)
    }
}

fn binary_bp(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Or => OR_BP,
        BinaryOp::And => AND_BP,
        BinaryOp::BitOr => BIT_OR_BP,
        BinaryOp::BitXor => BIT_XOR_BP,
        BinaryOp::BitAnd => BIT_AND_BP,
        BinaryOp::Add | BinaryOp::Subtract => ADDITIVE_BP,
        BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => MULTIPLICATIVE_BP,
        _ => COMPARISON_BP,
    }
}

fn accepts_member_access(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Variable(_)
            | ExprKind::Function(_)
            | ExprKind::Nested(_)
            | ExprKind::MethodCall { .. }
            | ExprKind::MemberAccess { .. }
            | ExprKind::StaticMethodCall { .. }
    )
}
