//! 式の解析
//!
//! 再帰下降による優先順位解析。低い方から:
//! `or` → `and` → `not` → 比較 → `|` → `^` → `+ -` → `@` → 単項 → `**` → 後置

use crate::ast::{BinOp, BoolOpKind, CmpOp, Expr, ExprKind, UnaryOp};
use crate::lexer::Token;

use super::{ParseResult, Parser};

impl Parser {
    pub(super) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let first = self.parse_and()?;
        if !self.check(&Token::Or) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.match_token(&Token::Or) {
            values.push(self.parse_and()?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp {
                op: BoolOpKind::Or,
                values,
            },
            self.span_from(start),
        ))
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let first = self.parse_not()?;
        if !self.check(&Token::And) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.match_token(&Token::And) {
            values.push(self.parse_not()?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp {
                op: BoolOpKind::And,
                values,
            },
            self.span_from(start),
        ))
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        if self.match_token(&Token::Not) {
            let operand = Box::new(self.parse_not()?);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand,
                },
                self.span_from(start),
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let left = self.parse_bitor()?;
        let op = match self.current_token() {
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::NotEq) => CmpOp::NotEq,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::LtEq) => CmpOp::LtE,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::GtEq) => CmpOp::GtE,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_bitor()?;
        Ok(Expr::new(
            ExprKind::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            self.span_from(start),
        ))
    }

    fn parse_bitor(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let mut left = self.parse_bitxor()?;
        while self.match_token(&Token::Pipe) {
            let right = self.parse_bitxor()?;
            left = Expr::new(
                ExprKind::Binary {
                    op: BinOp::BitOr,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                self.span_from(start),
            );
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let mut left = self.parse_additive()?;
        while self.match_token(&Token::Caret) {
            let right = self.parse_additive()?;
            left = Expr::new(
                ExprKind::Binary {
                    op: BinOp::BitXor,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                self.span_from(start),
            );
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let mut left = self.parse_matmul()?;
        loop {
            let op = if self.match_token(&Token::Plus) {
                BinOp::Add
            } else if self.match_token(&Token::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.parse_matmul()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                self.span_from(start),
            );
        }
        Ok(left)
    }

    fn parse_matmul(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let mut left = self.parse_unary()?;
        while self.match_token(&Token::At) {
            let right = self.parse_unary()?;
            left = Expr::new(
                ExprKind::Binary {
                    op: BinOp::MatMult,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                self.span_from(start),
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        if self.match_token(&Token::Minus) {
            let operand = Box::new(self.parse_unary()?);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand,
                },
                self.span_from(start),
            ));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let base = self.parse_postfix()?;
        if self.match_token(&Token::DoubleStar) {
            // `**` は右結合
            let exponent = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::Binary {
                    op: BinOp::Pow,
                    left: Box::new(base),
                    right: Box::new(exponent),
                },
                self.span_from(start),
            ));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(&Token::LeftParen) {
                expr = self.parse_call(expr, start)?;
            } else if self.match_token(&Token::Dot) {
                let attr = self.expect_identifier()?;
                expr = Expr::new(
                    ExprKind::Attribute {
                        value: Box::new(expr),
                        attr,
                    },
                    self.span_from(start),
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// デコンストラクタ呼び出しを解析
    fn parse_call(&mut self, func: Expr, start: usize) -> ParseResult<Expr> {
        self.expect(Token::LeftParen)?;
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while !self.check(&Token::RightParen) && !self.is_at_end() {
            // `name=value` はキーワード引数
            if let (Some(Token::Identifier(name)), Some(Token::Assign)) =
                (self.current_token(), self.peek(1))
            {
                let name = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_expr()?;
                keywords.push((name, value));
            } else {
                args.push(self.parse_expr()?);
            }

            if !self.check(&Token::RightParen) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RightParen)?;
        Ok(Expr::new(
            ExprKind::Call {
                func: Box::new(func),
                args,
                keywords,
            },
            self.span_from(start),
        ))
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let token = match self.current_token() {
            Some(t) => t.clone(),
            None => return Err(self.unexpected("式")),
        };

        match token {
            Token::Integer(i) => {
                self.advance();
                Ok(Expr::new(ExprKind::Int(i), self.span_from(start)))
            }
            Token::Float(x) => {
                self.advance();
                Ok(Expr::new(ExprKind::Float(x), self.span_from(start)))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::new(ExprKind::Str(s), self.span_from(start)))
            }
            Token::True => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), self.span_from(start)))
            }
            Token::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), self.span_from(start)))
            }
            Token::NoneLit => {
                self.advance();
                Ok(Expr::new(ExprKind::NoneLit, self.span_from(start)))
            }
            Token::Ellipsis => {
                self.advance();
                Ok(Expr::new(ExprKind::Ellipsis, self.span_from(start)))
            }
            Token::Identifier(name) => {
                self.advance();
                Ok(Expr::new(ExprKind::Name(name), self.span_from(start)))
            }
            Token::LeftParen => self.parse_paren(start),
            Token::LeftBracket => self.parse_list(start),
            Token::LeftBrace => self.parse_braces(start),
            _ => Err(self.unexpected("式")),
        }
    }

    /// 括弧の中身：グループ化またはタプル
    fn parse_paren(&mut self, start: usize) -> ParseResult<Expr> {
        self.expect(Token::LeftParen)?;
        if self.match_token(&Token::RightParen) {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), self.span_from(start)));
        }

        let first = self.parse_element()?;
        if !self.check(&Token::Comma) {
            self.expect(Token::RightParen)?;
            return Ok(first);
        }

        let mut elts = vec![first];
        while self.match_token(&Token::Comma) {
            if self.check(&Token::RightParen) {
                break;
            }
            elts.push(self.parse_element()?);
        }
        self.expect(Token::RightParen)?;
        Ok(Expr::new(ExprKind::Tuple(elts), self.span_from(start)))
    }

    fn parse_list(&mut self, start: usize) -> ParseResult<Expr> {
        self.expect(Token::LeftBracket)?;
        let mut elts = Vec::new();
        while !self.check(&Token::RightBracket) && !self.is_at_end() {
            elts.push(self.parse_element()?);
            if !self.check(&Token::RightBracket) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RightBracket)?;
        Ok(Expr::new(ExprKind::List(elts), self.span_from(start)))
    }

    /// 波括弧の中身：セットまたは辞書
    fn parse_braces(&mut self, start: usize) -> ParseResult<Expr> {
        self.expect(Token::LeftBrace)?;
        if self.match_token(&Token::RightBrace) {
            return Ok(Expr::new(
                ExprKind::Dict {
                    keys: Vec::new(),
                    values: Vec::new(),
                },
                self.span_from(start),
            ));
        }

        let first = self.parse_expr()?;
        if self.match_token(&Token::Colon) {
            // 辞書リテラル
            let mut keys = vec![first];
            let mut values = vec![self.parse_expr()?];
            while self.match_token(&Token::Comma) {
                if self.check(&Token::RightBrace) {
                    break;
                }
                keys.push(self.parse_expr()?);
                self.expect(Token::Colon)?;
                values.push(self.parse_expr()?);
            }
            self.expect(Token::RightBrace)?;
            return Ok(Expr::new(
                ExprKind::Dict { keys, values },
                self.span_from(start),
            ));
        }

        // セットリテラル
        let mut elts = vec![first];
        while self.match_token(&Token::Comma) {
            if self.check(&Token::RightBrace) {
                break;
            }
            elts.push(self.parse_expr()?);
        }
        self.expect(Token::RightBrace)?;
        Ok(Expr::new(ExprKind::Set(elts), self.span_from(start)))
    }

    /// シーケンス要素：`*name` を許す
    fn parse_element(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        if self.match_token(&Token::Star) {
            let inner = Box::new(self.parse_expr()?);
            return Ok(Expr::new(ExprKind::Starred(inner), self.span_from(start)));
        }
        self.parse_expr()
    }
}
