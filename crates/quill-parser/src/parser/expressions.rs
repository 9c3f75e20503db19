//! Pratt expression parser.
//!
//! Binary operators come from a binding-power table; prefix `-` and `!`
//! bind tighter than every binary operator, and postfix forms (member
//! access, calls, indexing, `.length`) bind tightest of all.

use quill_common::token::TokenKind;

use super::items::{array_suffix, base_type};
use super::{PResult, Parser};
use crate::ast::{BinaryOp, Expr, ExprKind, Place, PlaceKind, Pos, UnaryOp};

// ── Binding Power Tables ───────────────────────────────────────────────

/// (left_bp, right_bp, operator) for infix tokens. All left-associative.
fn infix_binding_power(op: TokenKind) -> Option<(u8, u8, BinaryOp)> {
    match op {
        TokenKind::AmpAmp => Some((1, 2, BinaryOp::And)),
        TokenKind::EqEq => Some((3, 4, BinaryOp::Equals)),
        TokenKind::Lt => Some((5, 6, BinaryOp::Less)),
        TokenKind::Plus => Some((7, 8, BinaryOp::Plus)),
        TokenKind::Minus => Some((7, 8, BinaryOp::Minus)),
        TokenKind::Star => Some((9, 10, BinaryOp::Times)),
        TokenKind::Slash => Some((9, 10, BinaryOp::Div)),
        _ => None,
    }
}

const PREFIX_BP: u8 = 11;

/// Magnitude of INT_MIN; only legal right after a unary minus.
const INT_MIN_MAGNITUDE: &str = "2147483648";

// ── Entry Points ───────────────────────────────────────────────────────

pub(crate) fn expr(p: &mut Parser) -> PResult<Expr> {
    expr_bp(p, 0)
}

fn expr_bp(p: &mut Parser, min_bp: u8) -> PResult<Expr> {
    let mut lhs = prefix(p)?;
    loop {
        let Some((l_bp, r_bp, op)) = infix_binding_power(p.current()) else {
            break;
        };
        if l_bp < min_bp {
            break;
        }
        let pos = p.bump();
        let rhs = expr_bp(p, r_bp)?;
        lhs = mk(
            p,
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            pos,
        );
    }
    Ok(lhs)
}

fn prefix(p: &mut Parser) -> PResult<Expr> {
    let op = match p.current() {
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Bang => UnaryOp::Negate,
        _ => {
            let atom = atom(p)?;
            return postfix(p, atom);
        }
    };
    let pos = p.bump();
    if op == UnaryOp::Minus
        && p.at(TokenKind::IntLiteral)
        && p.current_text() == INT_MIN_MAGNITUDE
    {
        p.bump();
        return Ok(mk(p, ExprKind::Int(i32::MIN), pos));
    }
    let operand = expr_bp(p, PREFIX_BP)?;
    Ok(mk(
        p,
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        pos,
    ))
}

fn atom(p: &mut Parser) -> PResult<Expr> {
    let pos = p.current_pos();
    let kind = match p.current() {
        TokenKind::IntLiteral => {
            let Ok(value) = p.current_text().parse::<i32>() else {
                return Err(p.error(format!(
                    "integer literal {} is out of range",
                    p.current_text()
                )));
            };
            p.bump();
            ExprKind::Int(value)
        }
        TokenKind::True => {
            p.bump();
            ExprKind::Bool(true)
        }
        TokenKind::False => {
            p.bump();
            ExprKind::Bool(false)
        }
        TokenKind::Null => {
            p.bump();
            ExprKind::Null
        }
        TokenKind::This => {
            p.bump();
            ExprKind::This
        }
        TokenKind::Ident => {
            let (name, _) = p.ident()?;
            if p.at(TokenKind::LParen) {
                let args = args(p)?;
                ExprKind::Call { name, args }
            } else {
                ExprKind::Read(place(p, PlaceKind::Var(name), pos))
            }
        }
        TokenKind::LParen => {
            p.bump();
            let inner = expr(p)?;
            p.expect(TokenKind::RParen)?;
            return Ok(inner);
        }
        TokenKind::New => {
            p.bump();
            if p.at(TokenKind::Ident) && p.nth(1) == TokenKind::LParen {
                let (class, _) = p.ident()?;
                p.expect(TokenKind::LParen)?;
                p.expect(TokenKind::RParen)?;
                ExprKind::NewObject { class }
            } else {
                let base = base_type(p)?;
                p.expect(TokenKind::LBracket)?;
                let size = expr(p)?;
                p.expect(TokenKind::RBracket)?;
                let elem = array_suffix(p, base);
                ExprKind::NewArray {
                    elem,
                    size: Box::new(size),
                }
            }
        }
        _ => return Err(p.error_expected("an expression")),
    };
    Ok(mk(p, kind, pos))
}

fn postfix(p: &mut Parser, mut lhs: Expr) -> PResult<Expr> {
    loop {
        match p.current() {
            TokenKind::Dot => {
                p.bump();
                let (name, pos) = p.ident()?;
                let kind = if p.at(TokenKind::LParen) {
                    ExprKind::MethodCall {
                        receiver: Box::new(lhs),
                        method: name,
                        args: args(p)?,
                    }
                } else if name == "length" {
                    ExprKind::ArrayLength(Box::new(lhs))
                } else {
                    ExprKind::Read(place(
                        p,
                        PlaceKind::Field {
                            receiver: Box::new(lhs),
                            field: name,
                        },
                        pos,
                    ))
                };
                lhs = mk(p, kind, pos);
            }
            TokenKind::LBracket => {
                let pos = p.bump();
                let index = expr(p)?;
                p.expect(TokenKind::RBracket)?;
                let kind = ExprKind::Read(place(
                    p,
                    PlaceKind::Index {
                        array: Box::new(lhs),
                        index: Box::new(index),
                    },
                    pos,
                ));
                lhs = mk(p, kind, pos);
            }
            _ => return Ok(lhs),
        }
    }
}

/// `'(' (expr (',' expr)*)? ')'`
fn args(p: &mut Parser) -> PResult<Vec<Expr>> {
    p.expect(TokenKind::LParen)?;
    let mut args = Vec::new();
    if !p.at(TokenKind::RParen) {
        loop {
            args.push(expr(p)?);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen)?;
    Ok(args)
}

fn mk(p: &mut Parser, kind: ExprKind, pos: Pos) -> Expr {
    Expr {
        id: p.fresh_id(),
        kind,
        pos: Some(pos),
    }
}

fn place(p: &mut Parser, kind: PlaceKind, pos: Pos) -> Place {
    Place {
        id: p.fresh_id(),
        kind,
        pos: Some(pos),
    }
}
