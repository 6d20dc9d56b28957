//! Recursive-descent parser building the Vapor IR.

use super::lexer::{Lexer, Token};
use super::{ParseError, ParseResult};
use crate::ir::{Addr, DataSegment, DataValue, Function, Instr, Operand, Program};

/// Builtins accepted by the translator, mirroring the operation set of the
/// upstream Vapor toolchain.
const BUILTIN_OPS: &[&str] = &[
    "Add",
    "Sub",
    "MulS",
    "Eq",
    "Lt",
    "LtS",
    "PrintIntS",
    "HeapAllocZ",
    "Error",
];

pub struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> ParseResult<Self> {
        let tokens = Lexer::new(source).collect::<ParseResult<Vec<_>>>()?;
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, tok)| tok)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, tok)| tok.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Line of the token at the cursor, falling back to the last line seen.
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|(line, _)| *line)
            .unwrap_or(1)
    }

    fn unexpected(&self, wanted: &str) -> ParseError {
        match self.peek() {
            Some(tok) => ParseError::Unexpected {
                line: self.line(),
                message: format!("expected {wanted}, found {}", tok.describe()),
            },
            None => ParseError::UnexpectedEof,
        }
    }

    fn next_required(&mut self, wanted: &str) -> ParseResult<Token> {
        match self.peek() {
            Some(_) => Ok(self.advance().ok_or(ParseError::UnexpectedEof)?),
            None => Err(self.unexpected(wanted)),
        }
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.peek() == Some(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&expected.describe()))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Ident(_)) => match self.advance() {
                Some(Token::Ident(name)) => Ok(name),
                _ => Err(ParseError::UnexpectedEof),
            },
            _ => Err(self.unexpected("an identifier")),
        }
    }

    /// Consume the end of an instruction line: a newline or end of input.
    fn expect_line_end(&mut self) -> ParseResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(Token::Newline) => {
                self.advance();
                Ok(())
            }
            Some(_) => Err(self.unexpected("end of line")),
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.advance();
        }
    }

    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut program = Program::default();
        self.skip_newlines();
        while let Some(token) = self.peek() {
            match token {
                Token::Const => program.segments.push(self.parse_segment()?),
                Token::Func => program.functions.push(self.parse_function()?),
                _ => return Err(self.unexpected("'const' or 'func'")),
            }
            self.skip_newlines();
        }
        Ok(program)
    }

    fn parse_segment(&mut self) -> ParseResult<DataSegment> {
        self.expect(Token::Const)?;
        let name = self.expect_ident()?;
        self.expect_line_end()?;

        let mut values = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek().cloned() {
                Some(Token::Int(value)) => {
                    self.advance();
                    values.push(DataValue::Int(value));
                    self.expect_line_end()?;
                }
                Some(Token::LabelRef(label)) => {
                    self.advance();
                    values.push(DataValue::Label(label));
                    self.expect_line_end()?;
                }
                _ => break,
            }
        }
        Ok(DataSegment { name, values })
    }

    fn parse_function(&mut self) -> ParseResult<Function> {
        self.expect(Token::Func)?;
        let mut func = Function::new(self.expect_ident()?);

        self.expect(Token::LParen)?;
        while matches!(self.peek(), Some(Token::Ident(_))) {
            func.params.push(self.expect_ident()?);
        }
        self.expect(Token::RParen)?;
        self.expect_line_end()?;

        loop {
            self.skip_newlines();
            match self.peek().cloned() {
                None | Some(Token::Func) | Some(Token::Const) => break,
                Some(Token::Ident(name)) => {
                    self.advance();
                    match self.peek() {
                        Some(Token::Colon) => {
                            self.advance();
                            let line = self.line();
                            if func.labels.insert(name.clone(), func.body.len()).is_some() {
                                return Err(ParseError::DuplicateLabel { line, name });
                            }
                            self.expect_line_end()?;
                        }
                        Some(Token::Eq) => {
                            self.advance();
                            let instr = self.parse_assign_rhs(name)?;
                            func.body.push(instr);
                            self.expect_line_end()?;
                        }
                        Some(Token::LParen) => {
                            let instr = self.parse_builtin(None, name)?;
                            func.body.push(instr);
                            self.expect_line_end()?;
                        }
                        _ => return Err(self.unexpected("':', '=' or '('")),
                    }
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let (base, offset) = self.parse_mem_ref()?;
                    self.expect(Token::Eq)?;
                    let src = self.parse_operand()?;
                    func.body.push(Instr::MemWrite { base, offset, src });
                    self.expect_line_end()?;
                }
                Some(Token::If) | Some(Token::If0) => {
                    let positive = self.advance() == Some(Token::If);
                    let cond = self.parse_operand()?;
                    self.expect(Token::Goto)?;
                    let target = match self.next_required("a label")? {
                        Token::LabelRef(label) => label,
                        _ => {
                            return Err(ParseError::Unexpected {
                                line: self.line(),
                                message: "branch target must be a label".into(),
                            })
                        }
                    };
                    func.body.push(Instr::Branch {
                        cond,
                        positive,
                        target,
                    });
                    self.expect_line_end()?;
                }
                Some(Token::Goto) => {
                    self.advance();
                    let target = match self.next_required("a label or variable")? {
                        Token::LabelRef(label) => Addr::Label(label),
                        Token::Ident(var) => Addr::Var(var),
                        _ => {
                            return Err(ParseError::Unexpected {
                                line: self.line(),
                                message: "goto target must be a label or variable".into(),
                            })
                        }
                    };
                    func.body.push(Instr::Goto { target });
                    self.expect_line_end()?;
                }
                Some(Token::Ret) => {
                    self.advance();
                    let value = match self.peek() {
                        None | Some(Token::Newline) => None,
                        Some(_) => Some(self.parse_operand()?),
                    };
                    func.body.push(Instr::Return { value });
                    self.expect_line_end()?;
                }
                Some(_) => return Err(self.unexpected("an instruction")),
            }
        }
        Ok(func)
    }

    fn parse_assign_rhs(&mut self, dest: String) -> ParseResult<Instr> {
        match self.peek().cloned() {
            Some(Token::Call) => {
                self.advance();
                let addr = match self.next_required("a call target")? {
                    Token::LabelRef(label) => Addr::Label(label),
                    Token::Ident(var) => Addr::Var(var),
                    _ => {
                        return Err(ParseError::Unexpected {
                            line: self.line(),
                            message: "call target must be a label or variable".into(),
                        })
                    }
                };
                self.expect(Token::LParen)?;
                let args = self.parse_args()?;
                Ok(Instr::Call { dest, addr, args })
            }
            Some(Token::LBracket) => {
                self.advance();
                let (base, offset) = self.parse_mem_ref()?;
                Ok(Instr::MemRead { dest, base, offset })
            }
            Some(Token::Ident(name)) => {
                self.advance();
                if self.peek() == Some(&Token::LParen) {
                    self.parse_builtin(Some(dest), name)
                } else {
                    Ok(Instr::Assign {
                        dest,
                        src: Operand::Var(name),
                    })
                }
            }
            Some(Token::Int(value)) => {
                self.advance();
                Ok(Instr::Assign {
                    dest,
                    src: Operand::Imm(value),
                })
            }
            Some(Token::LabelRef(label)) => {
                self.advance();
                Ok(Instr::Assign {
                    dest,
                    src: Operand::Label(label),
                })
            }
            _ => Err(self.unexpected("an assignment source")),
        }
    }

    /// Parse a builtin application; the cursor sits on the opening paren.
    fn parse_builtin(&mut self, dest: Option<String>, op: String) -> ParseResult<Instr> {
        if !BUILTIN_OPS.contains(&op.as_str()) {
            return Err(ParseError::UnknownBuiltin {
                line: self.line(),
                name: op,
            });
        }
        self.expect(Token::LParen)?;
        let args = self.parse_args()?;
        Ok(Instr::Builtin { dest, op, args })
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Operand>> {
        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RParen) => {
                    self.advance();
                    return Ok(args);
                }
                Some(_) => args.push(self.parse_operand()?),
                None => return Err(ParseError::UnexpectedEof),
            }
        }
    }

    fn parse_operand(&mut self) -> ParseResult<Operand> {
        match self.next_required("an operand")? {
            Token::Ident(name) => Ok(Operand::Var(name)),
            Token::Int(value) => Ok(Operand::Imm(value)),
            Token::LabelRef(label) => Ok(Operand::Label(label)),
            Token::Str(text) => Ok(Operand::Str(text)),
            tok => Err(ParseError::Unexpected {
                line: self.line(),
                message: format!("expected an operand, found {}", tok.describe()),
            }),
        }
    }

    /// Parse `base(+offset)?]`; the opening bracket is already consumed.
    fn parse_mem_ref(&mut self) -> ParseResult<(String, i64)> {
        let base = match self.next_required("a variable")? {
            Token::Ident(name) => name,
            _ => {
                return Err(ParseError::Unexpected {
                    line: self.line(),
                    message: "memory base must be a variable".into(),
                })
            }
        };
        let offset = if self.peek() == Some(&Token::Plus) {
            self.advance();
            match self.next_required("an offset")? {
                Token::Int(value) => value,
                _ => {
                    return Err(ParseError::Unexpected {
                        line: self.line(),
                        message: "memory offset must be an integer".into(),
                    })
                }
            }
        } else {
            0
        };
        self.expect(Token::RBracket)?;
        Ok((base, offset))
    }
}

/// Parse Vapor source text into a [`Program`].
pub fn parse(source: &str) -> ParseResult<Program> {
    Parser::new(source)?.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_empty_function() {
        let program = parse("func Main()\n  ret\n").unwrap();
        assert_eq!(program.functions.len(), 1);
        let func = &program.functions[0];
        assert_eq!(func.name, "Main");
        assert!(func.params.is_empty());
        assert_eq!(func.body, vec![Instr::Return { value: None }]);
    }

    #[test]
    fn parses_const_segment() {
        let source = "const vmt_A\n  :A_foo\n  42\n\nfunc Main()\n  ret\n";
        let program = parse(source).unwrap();
        assert_eq!(program.segments.len(), 1);
        let seg = &program.segments[0];
        assert_eq!(seg.name, "vmt_A");
        assert_eq!(
            seg.values,
            vec![DataValue::Label("A_foo".into()), DataValue::Int(42)]
        );
    }

    #[test]
    fn parses_call_and_builtin() {
        let source = "func Main()\n  t.0 = call :F(t.1 2)\n  t.2 = Add(t.0 1)\n  PrintIntS(t.2)\n  ret\n";
        let program = parse(source).unwrap();
        let body = &program.functions[0].body;
        assert_eq!(
            body[0],
            Instr::Call {
                dest: "t.0".into(),
                addr: Addr::Label("F".into()),
                args: vec![Operand::Var("t.1".into()), Operand::Imm(2)],
            }
        );
        assert_eq!(
            body[1],
            Instr::Builtin {
                dest: Some("t.2".into()),
                op: "Add".into(),
                args: vec![Operand::Var("t.0".into()), Operand::Imm(1)],
            }
        );
        assert_eq!(
            body[2],
            Instr::Builtin {
                dest: None,
                op: "PrintIntS".into(),
                args: vec![Operand::Var("t.2".into())],
            }
        );
    }

    #[test]
    fn parses_memory_and_branch() {
        let source =
            "func F(this)\n  t.0 = [this+4]\n  [this] = t.0\n  if0 t.0 goto :end\nend:\n  ret t.0\n";
        let program = parse(source).unwrap();
        let func = &program.functions[0];
        assert_eq!(func.params, vec!["this".to_string()]);
        assert_eq!(
            func.body[0],
            Instr::MemRead {
                dest: "t.0".into(),
                base: "this".into(),
                offset: 4,
            }
        );
        assert_eq!(
            func.body[1],
            Instr::MemWrite {
                base: "this".into(),
                offset: 0,
                src: Operand::Var("t.0".into()),
            }
        );
        assert_eq!(
            func.body[2],
            Instr::Branch {
                cond: Operand::Var("t.0".into()),
                positive: false,
                target: "end".into(),
            }
        );
        assert_eq!(func.resolve_label("end"), Some(3));
        assert_eq!(
            func.body[3],
            Instr::Return {
                value: Some(Operand::Var("t.0".into()))
            }
        );
    }

    #[test]
    fn parses_indirect_goto_and_label_assign() {
        let source = "func F()\n  t.0 = :F_go\n  goto t.0\nF_go:\n  ret\n";
        let program = parse(source).unwrap();
        let body = &program.functions[0].body;
        assert_eq!(
            body[0],
            Instr::Assign {
                dest: "t.0".into(),
                src: Operand::Label("F_go".into()),
            }
        );
        assert_eq!(
            body[1],
            Instr::Goto {
                target: Addr::Var("t.0".into()),
            }
        );
    }

    #[test]
    fn rejects_unknown_builtin() {
        let err = parse("func Main()\n  t.0 = Frobnicate(1)\n  ret\n").unwrap_err();
        assert!(matches!(err, ParseError::UnknownBuiltin { .. }));
    }

    #[test]
    fn rejects_duplicate_label() {
        let err = parse("func Main()\nl:\n  ret\nl:\n").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateLabel { .. }));
    }

    #[test]
    fn rejects_literal_memory_base() {
        let err = parse("func Main()\n  t.0 = [4+4]\n  ret\n").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { .. }));
    }

    #[test]
    fn rejects_junk_at_top_level() {
        assert!(parse("ret\n").is_err());
    }
}
