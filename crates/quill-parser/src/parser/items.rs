//! Items, types, blocks and statements.

use quill_common::token::TokenKind;

use super::expressions::expr;
use super::{PResult, Parser};
use crate::ast::{
    Block, ClassDecl, ExprKind, FunctionDecl, NodeId, Pos, Program, Stmt, StmtKind, TypeExpr,
    VarDecl,
};
use crate::error::ParseError;

/// Parse a whole program. Items completed before an error are kept.
pub(crate) fn program(p: &mut Parser) -> (Program, Option<ParseError>) {
    let mut program = Program {
        functions: Vec::new(),
        classes: Vec::new(),
        pos: Some(p.current_pos()),
    };
    while !p.at(TokenKind::Eof) {
        let item = if p.at(TokenKind::Class) {
            class_decl(p).map(|c| program.classes.push(c))
        } else {
            function_decl(p).map(|f| program.functions.push(f))
        };
        if let Err(err) = item {
            return (program, Some(err));
        }
    }
    (program, None)
}

fn class_decl(p: &mut Parser) -> PResult<ClassDecl> {
    p.expect(TokenKind::Class)?;
    let id = p.fresh_id();
    let (name, pos) = p.ident()?;
    let extends = if p.eat(TokenKind::Extends) {
        Some(p.ident()?.0)
    } else {
        None
    };
    p.expect(TokenKind::LBrace)?;

    let mut fields = Vec::new();
    let mut methods = Vec::new();
    while !p.at(TokenKind::RBrace) {
        if p.at(TokenKind::Eof) {
            return Err(p.error_expected("`}` to close the class body"));
        }
        let ty = type_expr(p)?;
        let member_id = p.fresh_id();
        let (member, member_pos) = p.ident()?;
        if p.at(TokenKind::LParen) {
            methods.push(function_rest(p, member_id, ty, member, member_pos)?);
        } else {
            p.expect(TokenKind::Semicolon)?;
            fields.push(VarDecl {
                id: member_id,
                ty,
                name: member,
                pos: Some(member_pos),
            });
        }
    }
    p.bump();

    Ok(ClassDecl {
        id,
        name,
        extends,
        fields,
        methods,
        pos: Some(pos),
    })
}

fn function_decl(p: &mut Parser) -> PResult<FunctionDecl> {
    let return_type = type_expr(p)?;
    let id = p.fresh_id();
    let (name, pos) = p.ident()?;
    function_rest(p, id, return_type, name, pos)
}

/// Parameter list and body, once `type name` has been read.
fn function_rest(
    p: &mut Parser,
    id: NodeId,
    return_type: TypeExpr,
    name: String,
    pos: Pos,
) -> PResult<FunctionDecl> {
    p.expect(TokenKind::LParen)?;
    let mut params = Vec::new();
    if !p.at(TokenKind::RParen) {
        loop {
            params.push(var_decl(p)?);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen)?;
    let body = block(p)?;
    Ok(FunctionDecl {
        id,
        return_type,
        name,
        params,
        body,
        pos: Some(pos),
    })
}

fn var_decl(p: &mut Parser) -> PResult<VarDecl> {
    let ty = type_expr(p)?;
    let id = p.fresh_id();
    let (name, pos) = p.ident()?;
    Ok(VarDecl {
        id,
        ty,
        name,
        pos: Some(pos),
    })
}

/// `('int' | 'boolean' | IDENT) ('[' ']')*`
pub(crate) fn type_expr(p: &mut Parser) -> PResult<TypeExpr> {
    let base = base_type(p)?;
    Ok(array_suffix(p, base))
}

pub(crate) fn base_type(p: &mut Parser) -> PResult<TypeExpr> {
    match p.current() {
        TokenKind::Int => {
            p.bump();
            Ok(TypeExpr::Int)
        }
        TokenKind::Boolean => {
            p.bump();
            Ok(TypeExpr::Bool)
        }
        TokenKind::Ident => Ok(TypeExpr::Class(p.ident()?.0)),
        _ => Err(p.error_expected("a type")),
    }
}

/// Wrap `ty` once per `[]` pair that follows.
pub(crate) fn array_suffix(p: &mut Parser, mut ty: TypeExpr) -> TypeExpr {
    while p.at(TokenKind::LBracket) && p.nth(1) == TokenKind::RBracket {
        p.bump();
        p.bump();
        ty = TypeExpr::array_of(ty);
    }
    ty
}

fn block(p: &mut Parser) -> PResult<Block> {
    let pos = p.expect(TokenKind::LBrace)?;
    let mut stmts = Vec::new();
    while !p.at(TokenKind::RBrace) {
        if p.at(TokenKind::Eof) {
            return Err(p.error_expected("`}` to close the block"));
        }
        stmts.push(stmt(p)?);
    }
    p.bump();
    Ok(Block {
        stmts,
        pos: Some(pos),
    })
}

/// Whether the upcoming tokens start a local variable declaration.
fn at_var_decl(p: &Parser) -> bool {
    match p.current() {
        TokenKind::Int | TokenKind::Boolean => true,
        TokenKind::Ident => {
            p.nth(1) == TokenKind::Ident
                || (p.nth(1) == TokenKind::LBracket && p.nth(2) == TokenKind::RBracket)
        }
        _ => false,
    }
}

fn stmt(p: &mut Parser) -> PResult<Stmt> {
    let pos = Some(p.current_pos());
    let kind = match p.current() {
        TokenKind::LBrace => StmtKind::Block(block(p)?),
        TokenKind::If => {
            p.bump();
            p.expect(TokenKind::LParen)?;
            let cond = expr(p)?;
            p.expect(TokenKind::RParen)?;
            let then_branch = Box::new(stmt(p)?);
            let else_branch = if p.eat(TokenKind::Else) {
                Some(Box::new(stmt(p)?))
            } else {
                None
            };
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            }
        }
        TokenKind::While => {
            p.bump();
            p.expect(TokenKind::LParen)?;
            let cond = expr(p)?;
            p.expect(TokenKind::RParen)?;
            StmtKind::While {
                cond,
                body: Box::new(stmt(p)?),
            }
        }
        TokenKind::Return => {
            p.bump();
            let value = expr(p)?;
            p.expect(TokenKind::Semicolon)?;
            StmtKind::Return(value)
        }
        _ if at_var_decl(p) => {
            let decl = var_decl(p)?;
            p.expect(TokenKind::Semicolon)?;
            StmtKind::VarDecl(decl)
        }
        _ => {
            let lhs = expr(p)?;
            if p.at(TokenKind::Eq) {
                let ExprKind::Read(target) = lhs.kind else {
                    return Err(p.error(
                        "left-hand side of an assignment must be a variable, field or array element",
                    ));
                };
                p.bump();
                let value = expr(p)?;
                p.expect(TokenKind::Semicolon)?;
                StmtKind::Assign { target, value }
            } else {
                p.expect(TokenKind::Semicolon)?;
                StmtKind::Expr(lhs)
            }
        }
    };
    Ok(Stmt { kind, pos })
}
