//! Plural-Forms header parsing and evaluation.
//!
//! Catalog headers carry a C-like expression selecting the plural form for a
//! count, e.g. `nplurals=3; plural=(n==1 ? 0 : n%10>=2 && n%10<=4 ? 1 : 2);`.
//! The supported subset is `n`, unsigned integer literals, parentheses, and
//! the operators `! * / % + - < <= > >= == != && || ?:` with C precedence.
//! Arithmetic wraps; division or modulo by zero yields 0.
//!
//! Expressions longer than [`MAX_TOKENS`] tokens or nested deeper than
//! [`MAX_DEPTH`] levels are rejected, which bounds the recursion of both
//! parsing and evaluation.

use crate::{MocacheError, Result};

/// Maximum number of tokens in a plural expression.
pub const MAX_TOKENS: usize = 512;

/// Maximum nesting of parentheses, `!` and `?:` in a plural expression.
pub const MAX_DEPTH: usize = 64;

/// Parsed plural-form selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluralExpr {
    /// The count `n`.
    N,
    /// Integer literal.
    Const(u64),
    /// Logical negation.
    Not(Box<PluralExpr>),
    /// Binary operation.
    Binary(BinOp, Box<PluralExpr>, Box<PluralExpr>),
    /// `cond ? then : otherwise`.
    Ternary(Box<PluralExpr>, Box<PluralExpr>, Box<PluralExpr>),
}

/// Binary operators of the plural expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl PluralExpr {
    /// Parse an expression such as `n != 1`.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.ternary()?;
        if parser.pos != parser.tokens.len() {
            return Err(invalid(source, "trailing input"));
        }
        Ok(expr)
    }

    /// Evaluate the expression for count `n`.
    pub fn evaluate(&self, n: u64) -> u64 {
        match self {
            Self::N => n,
            Self::Const(v) => *v,
            Self::Not(inner) => u64::from(inner.evaluate(n) == 0),
            Self::Ternary(cond, then, otherwise) => {
                if cond.evaluate(n) != 0 {
                    then.evaluate(n)
                } else {
                    otherwise.evaluate(n)
                }
            }
            Self::Binary(op, lhs, rhs) => {
                let l = lhs.evaluate(n);
                // Short-circuit like C so the right side is not evaluated.
                match op {
                    BinOp::Or if l != 0 => return 1,
                    BinOp::And if l == 0 => return 0,
                    _ => {}
                }
                let r = rhs.evaluate(n);
                match op {
                    BinOp::Or | BinOp::And => u64::from(r != 0),
                    BinOp::Eq => u64::from(l == r),
                    BinOp::Ne => u64::from(l != r),
                    BinOp::Lt => u64::from(l < r),
                    BinOp::Le => u64::from(l <= r),
                    BinOp::Gt => u64::from(l > r),
                    BinOp::Ge => u64::from(l >= r),
                    BinOp::Add => l.wrapping_add(r),
                    BinOp::Sub => l.wrapping_sub(r),
                    BinOp::Mul => l.wrapping_mul(r),
                    BinOp::Div => l.checked_div(r).unwrap_or(0),
                    BinOp::Rem => l.checked_rem(r).unwrap_or(0),
                }
            }
        }
    }
}

/// The `Plural-Forms` header of a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralForms {
    /// Number of plural forms.
    pub nplurals: usize,
    /// Form selector.
    pub expr: PluralExpr,
}

impl Default for PluralForms {
    /// Germanic rule: `nplurals=2; plural=(n != 1);`
    fn default() -> Self {
        Self {
            nplurals: 2,
            expr: PluralExpr::Binary(
                BinOp::Ne,
                Box::new(PluralExpr::N),
                Box::new(PluralExpr::Const(1)),
            ),
        }
    }
}

impl PluralForms {
    /// Parse a header value like `nplurals=2; plural=(n != 1);`.
    pub fn parse(header: &str) -> Result<Self> {
        let mut nplurals = None;
        let mut expr = None;
        for part in header.split(';') {
            let Some((name, value)) = part.split_once('=') else {
                continue;
            };
            match name.trim() {
                "nplurals" => {
                    let n: usize = value
                        .trim()
                        .parse()
                        .map_err(|_| invalid(header, "nplurals is not an integer"))?;
                    if n == 0 {
                        return Err(invalid(header, "nplurals must be positive"));
                    }
                    nplurals = Some(n);
                }
                "plural" => expr = Some(PluralExpr::parse(value)?),
                _ => {}
            }
        }
        match (nplurals, expr) {
            (Some(nplurals), Some(expr)) => Ok(Self { nplurals, expr }),
            _ => Err(invalid(header, "expected nplurals and plural")),
        }
    }

    /// Form index for `n`, clamped to `nplurals - 1`.
    pub fn index(&self, n: u64) -> usize {
        let raw = usize::try_from(self.expr.evaluate(n)).unwrap_or(usize::MAX);
        raw.min(self.nplurals.saturating_sub(1))
    }
}

fn invalid(source: &str, reason: &str) -> MocacheError {
    let shown: String = source.trim().chars().take(80).collect();
    MocacheError::InvalidCatalog(format!("plural forms '{shown}': {reason}"))
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    N,
    Num(u64),
    Op(&'static str),
    LParen,
    RParen,
    Question,
    Colon,
}

/// Operators, longest first so `<=` wins over `<`.
const OPERATORS: &[&str] = &[
    "||", "&&", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "!",
];

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = source;
    while let Some(c) = rest.chars().next() {
        if tokens.len() > MAX_TOKENS {
            return Err(invalid(source, "expression too long"));
        }
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if c.is_ascii_digit() {
            let end = rest
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(rest.len());
            let value = rest[..end]
                .parse()
                .map_err(|_| invalid(source, "integer literal out of range"))?;
            tokens.push(Token::Num(value));
            rest = &rest[end..];
            continue;
        }
        let (token, len) = match c {
            'n' => (Token::N, 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '?' => (Token::Question, 1),
            ':' => (Token::Colon, 1),
            _ => match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
                Some(&op) => (Token::Op(op), op.len()),
                None => return Err(invalid(source, &format!("unexpected character '{c}'"))),
            },
        };
        tokens.push(token);
        rest = &rest[len..];
    }
    if tokens.len() > MAX_TOKENS {
        return Err(invalid(source, "expression too long"));
    }
    Ok(tokens)
}

// ============================================================================
// Recursive-descent parser
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

/// Binary precedence levels, loosest first.
const LEVELS: &[&[(&str, BinOp)]] = &[
    &[("||", BinOp::Or)],
    &[("&&", BinOp::And)],
    &[("==", BinOp::Eq), ("!=", BinOp::Ne)],
    &[
        ("<", BinOp::Lt),
        ("<=", BinOp::Le),
        (">", BinOp::Gt),
        (">=", BinOp::Ge),
    ],
    &[("+", BinOp::Add), ("-", BinOp::Sub)],
    &[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Rem)],
];

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn error(&self, reason: &str) -> MocacheError {
        MocacheError::InvalidCatalog(format!("plural expression: {reason} at token {}", self.pos))
    }

    /// Run `f` one nesting level deeper.
    fn nested(&mut self, f: fn(&mut Self) -> Result<PluralExpr>) -> Result<PluralExpr> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn ternary(&mut self) -> Result<PluralExpr> {
        self.nested(Self::ternary_inner)
    }

    fn ternary_inner(&mut self) -> Result<PluralExpr> {
        let cond = self.binary(0)?;
        if self.peek() != Some(Token::Question) {
            return Ok(cond);
        }
        self.bump();
        let then = self.ternary()?;
        if self.bump() != Some(Token::Colon) {
            return Err(self.error("expected ':'"));
        }
        let otherwise = self.ternary()?;
        Ok(PluralExpr::Ternary(
            Box::new(cond),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn binary(&mut self, level: usize) -> Result<PluralExpr> {
        let Some(ops) = LEVELS.get(level) else {
            return self.nested(Self::unary);
        };
        let mut lhs = self.binary(level + 1)?;
        while let Some(Token::Op(symbol)) = self.peek() {
            let Some(&(_, op)) = ops.iter().find(|(s, _)| *s == symbol) else {
                break;
            };
            self.bump();
            let rhs = self.binary(level + 1)?;
            lhs = PluralExpr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<PluralExpr> {
        match self.bump() {
            Some(Token::Op("!")) => Ok(PluralExpr::Not(Box::new(self.nested(Self::unary)?))),
            Some(Token::N) => Ok(PluralExpr::N),
            Some(Token::Num(v)) => Ok(PluralExpr::Const(v)),
            Some(Token::LParen) => {
                let inner = self.ternary()?;
                if self.bump() != Some(Token::RParen) {
                    return Err(self.error("expected ')'"));
                }
                Ok(inner)
            }
            _ => Err(self.error("expected operand")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str, n: u64) -> u64 {
        PluralExpr::parse(expr).unwrap().evaluate(n)
    }

    #[test]
    fn germanic_rule() {
        assert_eq!(eval("n != 1", 1), 0);
        assert_eq!(eval("n != 1", 0), 1);
        assert_eq!(eval("(n != 1)", 7), 1);
    }

    #[test]
    fn french_rule() {
        assert_eq!(eval("n > 1", 0), 0);
        assert_eq!(eval("n > 1", 1), 0);
        assert_eq!(eval("n > 1", 2), 1);
    }

    #[test]
    fn polish_rule() {
        let polish = "(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2)";
        assert_eq!(eval(polish, 1), 0);
        assert_eq!(eval(polish, 2), 1);
        assert_eq!(eval(polish, 5), 2);
        assert_eq!(eval(polish, 12), 2);
        assert_eq!(eval(polish, 22), 1);
    }

    #[test]
    fn precedence_matches_c() {
        assert_eq!(eval("1 + 2 * 3", 0), 7);
        assert_eq!(eval("n % 10 == 1 && n % 100 != 11", 21), 1);
        assert_eq!(eval("n % 10 == 1 && n % 100 != 11", 11), 0);
        assert_eq!(eval("!n", 0), 1);
    }

    #[test]
    fn nested_ternary_is_right_associative() {
        let expr = "n == 0 ? 0 : n == 1 ? 1 : 2";
        assert_eq!(eval(expr, 0), 0);
        assert_eq!(eval(expr, 1), 1);
        assert_eq!(eval(expr, 9), 2);
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(eval("n / 0", 5), 0);
        assert_eq!(eval("n % 0", 5), 0);
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(PluralExpr::parse("n ==").is_err());
        assert!(PluralExpr::parse("(n != 1").is_err());
        assert!(PluralExpr::parse("n ? 1").is_err());
        assert!(PluralExpr::parse("x + 1").is_err());
        assert!(PluralExpr::parse("n 1").is_err());
    }

    #[test]
    fn parses_header() {
        let forms = PluralForms::parse("nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : 2);")
            .unwrap();
        assert_eq!(forms.nplurals, 3);
        assert_eq!(forms.index(1), 0);
        assert_eq!(forms.index(5), 2);
    }

    #[test]
    fn index_is_clamped() {
        let forms = PluralForms::parse("nplurals=2; plural=n;").unwrap();
        assert_eq!(forms.index(0), 0);
        assert_eq!(forms.index(1), 1);
        assert_eq!(forms.index(40), 1);
    }

    #[test]
    fn header_requires_both_fields() {
        assert!(PluralForms::parse("nplurals=2;").is_err());
        assert!(PluralForms::parse("plural=n != 1;").is_err());
        assert!(PluralForms::parse("nplurals=0; plural=0;").is_err());
    }

    #[test]
    fn rejects_deep_nesting() {
        let deep = format!("{}n{}", "(".repeat(20_000), ")".repeat(20_000));
        let err = PluralExpr::parse(&deep).unwrap_err();
        assert!(matches!(err, MocacheError::InvalidCatalog(_)));

        // Short enough to tokenize, too deep to parse.
        let parens = format!("{}n{}", "(".repeat(100), ")".repeat(100));
        let err = PluralExpr::parse(&parens).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"), "{err}");

        let nots = format!("{}n", "!".repeat(MAX_DEPTH * 2));
        assert!(PluralExpr::parse(&nots).is_err());

        let ternaries = "n ? ".repeat(MAX_DEPTH * 2) + "0" + &" : 1".repeat(MAX_DEPTH * 2);
        assert!(PluralExpr::parse(&ternaries).is_err());
    }

    #[test]
    fn rejects_overlong_expression() {
        let long = vec!["n"; MAX_TOKENS].join(" + ");
        assert!(PluralExpr::parse(&long).is_err());
    }

    #[test]
    fn moderate_nesting_is_accepted() {
        let expr = format!("{}n != 1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(eval(&expr, 2), 1);
    }

    #[test]
    fn default_is_germanic() {
        let forms = PluralForms::default();
        assert_eq!(forms.index(1), 0);
        assert_eq!(forms.index(2), 1);
    }
}
