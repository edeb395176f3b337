//! Recursive-descent parser from tokens to a [`TemplateSet`].

use tpl_ir::{ensure_sufficient_stack, Block, Branch, CmdId, Expr, ExprId, Pipe, PipeId, Stmt, StmtId, TemplateSet, Tree};

use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{self, Keyword, Token, TokenKind};

/// How a statement list ended.
enum Stop {
    /// `{{end}}`, at this offset.
    End(usize),
    /// `{{else`, at this offset. The rest of the action is left unread.
    Else(usize),
    Eof,
}

/// Declarations a pipeline may open with.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Decls {
    None,
    /// `$x :=`
    One,
    /// `$x :=` or `$i, $v :=`
    UpToTwo,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum BranchKind {
    If,
    Range,
    With,
}

impl BranchKind {
    fn keyword(self) -> Keyword {
        match self {
            BranchKind::If => Keyword::If,
            BranchKind::Range => Keyword::Range,
            BranchKind::With => Keyword::With,
        }
    }
}

pub(crate) struct Parser<'src> {
    src: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    /// Tree receiving statements; swapped out while inside `define`.
    tree: Tree,
    defined: Vec<Tree>,
    /// Enclosing `if`/`range`/`with` count.
    depth: usize,
    in_define: bool,
}

impl<'src> Parser<'src> {
    pub(crate) fn parse(name: &str, src: &'src str) -> Result<TemplateSet, ParseError> {
        let mut parser = Parser {
            src,
            tokens: lexer::lex(src)?,
            pos: 0,
            tree: Tree::new(name),
            defined: Vec::new(),
            depth: 0,
            in_define: false,
        };
        let (root, stop) = parser.list()?;
        match stop {
            Stop::Eof => {}
            Stop::End(offset) => return Err(parser.error(ParseErrorKind::UnexpectedEnd, offset)),
            Stop::Else(offset) => return Err(parser.error(ParseErrorKind::UnexpectedElse, offset)),
        }
        parser.tree.set_root(root);
        let mut set = TemplateSet::new(parser.tree);
        for tree in parser.defined {
            set.define(tree);
        }
        tracing::debug!(
            template = name,
            defined = set.defined().len(),
            "parsed template"
        );
        Ok(set)
    }

    // Token cursor

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_offset(&self) -> usize {
        self.tokens[self.pos].offset
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)].kind
    }

    /// Take the next token. `Eof` is sticky.
    fn next(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError::new(kind, self.src, offset)
    }

    fn unexpected(&self, token: &Token, context: &'static str) -> ParseError {
        self.error(
            ParseErrorKind::Unexpected {
                found: token.kind.describe(),
                context,
            },
            token.offset,
        )
    }

    fn expect(&mut self, kind: &TokenKind, context: &'static str) -> Result<(), ParseError> {
        let token = self.next();
        if token.kind == *kind {
            Ok(())
        } else {
            Err(self.unexpected(&token, context))
        }
    }

    fn expect_close(&mut self, context: &'static str) -> Result<(), ParseError> {
        self.expect(&TokenKind::RightDelim, context)
    }

    fn expect_name(&mut self, context: &'static str) -> Result<String, ParseError> {
        let token = self.next();
        match token.kind {
            TokenKind::Str(name) => Ok(name),
            _ => Err(self.unexpected(&token, context)),
        }
    }

    // Statements

    fn list(&mut self) -> Result<(Block, Stop), ParseError> {
        let mut block = Block::new();
        loop {
            let token = self.next();
            match token.kind {
                TokenKind::Eof => return Ok((block, Stop::Eof)),
                TokenKind::Text(text) => block.push(self.tree.text(text)),
                TokenKind::LeftDelim => {
                    let keyword = match self.peek() {
                        TokenKind::Keyword(keyword) => Some(*keyword),
                        _ => None,
                    };
                    let open = token.offset;
                    match keyword {
                        Some(Keyword::End) => {
                            self.pos += 1;
                            self.expect_close("end")?;
                            return Ok((block, Stop::End(open)));
                        }
                        Some(Keyword::Else) => {
                            self.pos += 1;
                            return Ok((block, Stop::Else(open)));
                        }
                        Some(Keyword::If) => block.push(self.branch(BranchKind::If, open)?),
                        Some(Keyword::Range) => block.push(self.branch(BranchKind::Range, open)?),
                        Some(Keyword::With) => block.push(self.branch(BranchKind::With, open)?),
                        Some(Keyword::Template) => {
                            self.pos += 1;
                            block.push(self.invoke()?);
                        }
                        Some(Keyword::Define) => {
                            self.pos += 1;
                            self.define(open)?;
                        }
                        None => {
                            let pipe = self.pipeline(Decls::One)?;
                            self.expect_close("action")?;
                            block.push(self.tree.alloc_stmt(Stmt::Action(pipe)));
                        }
                    }
                }
                _ => return Err(self.unexpected(&token, "template")),
            }
        }
    }

    /// `{{if|range|with pipeline}} ... {{end}}`; the cursor is on the keyword.
    fn branch(&mut self, kind: BranchKind, open: usize) -> Result<StmtId, ParseError> {
        self.pos += 1;
        self.depth += 1;
        let result = ensure_sufficient_stack(|| self.branch_rest(kind, open));
        self.depth -= 1;
        result
    }

    fn branch_rest(&mut self, kind: BranchKind, open: usize) -> Result<StmtId, ParseError> {
        let decls = if kind == BranchKind::Range {
            Decls::UpToTwo
        } else {
            Decls::One
        };
        let keyword = kind.keyword().as_str();
        let pipe = self.pipeline(decls)?;
        self.expect_close(keyword)?;
        let (body, stop) = self.list()?;
        let else_body = match stop {
            Stop::End(_) => Block::new(),
            // `{{else if ...}}` and `{{else with ...}}` chain into a nested
            // branch that shares this branch's `{{end}}`.
            Stop::Else(else_at)
                if kind != BranchKind::Range
                    && self.peek() == &TokenKind::Keyword(kind.keyword()) =>
            {
                self.pos += 1;
                vec![self.branch_rest(kind, else_at)?]
            }
            Stop::Else(_) => {
                self.expect_close("else")?;
                match self.list()? {
                    (else_body, Stop::End(_)) => else_body,
                    (_, Stop::Else(offset)) => {
                        return Err(self.error(ParseErrorKind::UnexpectedElse, offset))
                    }
                    (_, Stop::Eof) => return Err(self.error(ParseErrorKind::MissingEnd(keyword), open)),
                }
            }
            Stop::Eof => return Err(self.error(ParseErrorKind::MissingEnd(keyword), open)),
        };
        let branch = Branch::new(pipe, body, else_body);
        let stmt = match kind {
            BranchKind::If => Stmt::If(branch),
            BranchKind::Range => Stmt::Range(branch),
            BranchKind::With => Stmt::With(branch),
        };
        Ok(self.tree.alloc_stmt(stmt))
    }

    /// `{{template "name" [pipeline]}}`; the keyword is consumed.
    fn invoke(&mut self) -> Result<StmtId, ParseError> {
        let name = self.expect_name("template invocation")?;
        let pipe = if self.peek() == &TokenKind::RightDelim {
            None
        } else {
            Some(self.pipeline(Decls::None)?)
        };
        self.expect_close("template invocation")?;
        Ok(self.tree.alloc_stmt(Stmt::Invoke { name, pipe }))
    }

    /// `{{define "name"}} ... {{end}}`; the keyword is consumed.
    fn define(&mut self, open: usize) -> Result<(), ParseError> {
        if self.depth > 0 || self.in_define {
            return Err(self.error(ParseErrorKind::NestedDefine, open));
        }
        let name = self.expect_name("define")?;
        self.expect_close("define")?;
        let outer = std::mem::replace(&mut self.tree, Tree::new(name));
        self.in_define = true;
        let listed = self.list();
        self.in_define = false;
        let mut defined = std::mem::replace(&mut self.tree, outer);
        match listed? {
            (body, Stop::End(_)) => defined.set_root(body),
            (_, Stop::Else(offset)) => return Err(self.error(ParseErrorKind::UnexpectedElse, offset)),
            (_, Stop::Eof) => return Err(self.error(ParseErrorKind::MissingEnd("define"), open)),
        }
        self.defined.push(defined);
        Ok(())
    }

    // Pipelines

    fn pipeline(&mut self, allowed: Decls) -> Result<PipeId, ParseError> {
        let decls = self.declarations(allowed)?;
        let mut cmds = vec![self.command()?];
        while self.eat(&TokenKind::Pipe) {
            cmds.push(self.command()?);
        }
        Ok(self.tree.alloc_pipe(Pipe::new(decls, cmds)))
    }

    fn declarations(&mut self, allowed: Decls) -> Result<Vec<String>, ParseError> {
        let starts_decl = matches!(self.peek(), TokenKind::Variable(path) if path.len() == 1)
            && matches!(self.peek_nth(1), TokenKind::Declare | TokenKind::Comma);
        if !starts_decl {
            return Ok(Vec::new());
        }
        if allowed == Decls::None {
            return Err(self.error(
                ParseErrorKind::Unsupported("declaration in a template invocation"),
                self.peek_offset(),
            ));
        }
        let mut names = vec![self.declared_name()?];
        if self.eat(&TokenKind::Comma) {
            if allowed != Decls::UpToTwo {
                return Err(self.error(ParseErrorKind::TooManyDecls("this pipeline"), self.peek_offset()));
            }
            names.push(self.declared_name()?);
            if self.peek() == &TokenKind::Comma {
                return Err(self.error(ParseErrorKind::TooManyDecls("range"), self.peek_offset()));
            }
        }
        self.expect(&TokenKind::Declare, "declaration")?;
        Ok(names)
    }

    fn declared_name(&mut self) -> Result<String, ParseError> {
        let token = self.next();
        match token.kind {
            TokenKind::Variable(mut path) if path.len() == 1 => Ok(path.remove(0)),
            _ => Err(self.unexpected(&token, "declaration")),
        }
    }

    fn command(&mut self) -> Result<CmdId, ParseError> {
        let start = self.peek_offset();
        let mut operands = Vec::new();
        while !matches!(
            self.peek(),
            TokenKind::RightDelim | TokenKind::RParen | TokenKind::Pipe | TokenKind::Eof
        ) {
            operands.push(self.operand()?);
        }
        let mut operands = operands.into_iter();
        let Some(head) = operands.next() else {
            return Err(self.error(ParseErrorKind::MissingCommand, start));
        };
        Ok(self.tree.command(head, operands))
    }

    fn operand(&mut self) -> Result<ExprId, ParseError> {
        let token = self.next();
        let expr = match token.kind {
            TokenKind::Dot => Expr::Dot,
            TokenKind::Field(path) => Expr::Field(path),
            TokenKind::Variable(path) => Expr::Variable(path),
            TokenKind::Ident(name) => Expr::Identifier(name),
            TokenKind::Str(text) => Expr::Str(text),
            TokenKind::Number(text) => Expr::Number(text),
            TokenKind::Bool(value) => Expr::Bool(value),
            TokenKind::LParen => {
                let pipe = ensure_sufficient_stack(|| self.pipeline(Decls::One))?;
                let close = self.peek_offset();
                self.expect(&TokenKind::RParen, "parenthesized pipeline")?;
                if matches!(self.peek(), TokenKind::Field(_)) && self.peek_offset() == close + 1 {
                    return Err(self.error(
                        ParseErrorKind::Unsupported("field access on a parenthesized pipeline"),
                        self.peek_offset(),
                    ));
                }
                Expr::Pipe(pipe)
            }
            _ => return Err(self.unexpected(&token, "command")),
        };
        Ok(self.tree.alloc_expr(expr))
    }
}
