//! The layered type space of tree nodes.
//!
//! Every code unit carries a broad category refined by a specific kind.
//! Each layer is a closed enum so downstream checks can match exhaustively.

/// Trivia kept in the tree for full fidelity.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LexicalElementKind {
    WhiteSpace,
    EndOfLine,
    SingleLineComment,
    MultiLineComment,
    PreprocessorDirective,
    SkippedSection,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenKind {
    /// An identifier.
    Literal,
    Number,
    String,

    // Keywords.
    Abstract,
    Class,
    Const,
    Else,
    Enum,
    Extern,
    False,
    Fixed,
    If,
    Interface,
    Internal,
    Namespace,
    New,
    Override,
    Partial,
    Private,
    Protected,
    Public,
    Readonly,
    Return,
    Sealed,
    Static,
    Struct,
    True,
    Unsafe,
    Using,
    Virtual,
    Void,
    Volatile,
    While,

    // Punctuation.
    OpenParenthesis,
    CloseParenthesis,
    OpenCurlyBracket,
    CloseCurlyBracket,
    OpenSquareBracket,
    CloseSquareBracket,
    OpenGenericBracket,
    CloseGenericBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,

    // Operators.
    Not,
    Equals,
    ConditionalEquals,
    NotEquals,
    ConditionalAnd,
    ConditionalOr,
    LogicalAnd,
    LogicalOr,
    Plus,
    Minus,
    Multiplication,
    Division,
    Mod,
    LessThan,
    GreaterThan,
    LessThanOrEquals,
    GreaterThanOrEquals,
    Increment,
    Decrement,
    Tilde,
}

impl TokenKind {
    /// Opening brackets that have a matching close registered on the tree.
    pub fn is_open_bracket(self) -> bool {
        matches!(
            self,
            Self::OpenParenthesis | Self::OpenSquareBracket | Self::OpenGenericBracket
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ExpressionKind {
    Literal,
    Parenthesized,
    Not,
    Negative,
    Positive,
    BitwiseNot,
    Increment,
    Decrement,
    MemberAccess,
    Invocation,
    EqualTo,
    NotEqualTo,
    LessThan,
    GreaterThan,
    LessThanOrEqualTo,
    GreaterThanOrEqualTo,
    ConditionalAnd,
    ConditionalOr,
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Mod,
    Assignment,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StatementKind {
    Block,
    Expression,
    VariableDeclaration,
    Return,
    If,
    While,
    Unsafe,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ElementKind {
    /// The root of a source unit.
    Document,
    UsingDirective,
    Namespace,
    Class,
    Struct,
    Interface,
    Enum,
    EnumItem,
    Method,
    Field,
    Property,
}

impl ElementKind {
    /// The access level assumed when the declaration names none.
    pub fn default_access(self) -> crate::AccessModifier {
        match self {
            Self::Document | Self::Namespace | Self::UsingDirective => {
                crate::AccessModifier::Public
            }
            _ => crate::AccessModifier::Private,
        }
    }

    /// Non-access modifiers this element kind accepts. The first token
    /// outside this set ends the modifier scan.
    pub fn allowed_modifiers(self) -> &'static [TokenKind] {
        use TokenKind::*;

        match self {
            Self::Class | Self::Struct | Self::Interface => {
                &[New, Unsafe, Static, Sealed, Abstract, Partial]
            }
            Self::Enum => &[New],
            Self::Method => {
                &[New, Unsafe, Static, Virtual, Sealed, Override, Abstract, Extern, Partial]
            }
            Self::Field => &[New, Unsafe, Const, Readonly, Static, Volatile, Fixed],
            Self::Property => &[New, Unsafe, Static, Virtual, Sealed, Override, Abstract, Extern],
            Self::Document | Self::UsingDirective | Self::Namespace | Self::EnumItem => &[],
        }
    }
}

/// The broad category of a code unit.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CodeUnitCategory {
    LexicalElement,
    Token,
    Expression,
    Statement,
    Element,
    Attribute,
}

/// The full type tag of a code unit: category plus specific kind.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CodeUnitKind {
    LexicalElement(LexicalElementKind),
    Token(TokenKind),
    Expression(ExpressionKind),
    Statement(StatementKind),
    Element(ElementKind),
    /// An attribute block attached to a declaration.
    Attribute,
}

impl CodeUnitKind {
    pub fn category(self) -> CodeUnitCategory {
        match self {
            Self::LexicalElement(_) => CodeUnitCategory::LexicalElement,
            Self::Token(_) => CodeUnitCategory::Token,
            Self::Expression(_) => CodeUnitCategory::Expression,
            Self::Statement(_) => CodeUnitCategory::Statement,
            Self::Element(_) => CodeUnitCategory::Element,
            Self::Attribute => CodeUnitCategory::Attribute,
        }
    }

    pub fn token(self) -> Option<TokenKind> {
        match self {
            Self::Token(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn element(self) -> Option<ElementKind> {
        match self {
            Self::Element(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_trivia(self) -> bool {
        matches!(self, Self::LexicalElement(_))
    }
}
