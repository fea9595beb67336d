/// A model vocabulary ID. Sessions treat tokens as opaque: they are
/// compared for equality (EOS detection) and carried around, nothing more,
/// so the newtype intentionally exposes no ordering or arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token(pub i32);

impl From<i32> for Token {
    #[inline]
    fn from(value: i32) -> Self {
        Token(value)
    }
}

impl From<Token> for i32 {
    #[inline]
    fn from(token: Token) -> i32 {
        token.0
    }
}
