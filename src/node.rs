//! The element tree input type: markup nodes, literal text and dynamic
//! references, as a tagged union that compilation matches on
//! exhaustively.

use kstring::KString;

use crate::value::Expr;

/// One node of an element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A markup node: element token (or special form tag) plus the
    /// ordered trailing items.
    Markup(Markup),
    /// Literal text; static, escaped at compile time.
    Text(KString),
    /// A dynamic reference; evaluated and escaped at render time.
    Dynamic(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Markup {
    /// The raw element token, e.g. `div.main#hero`, or one of the
    /// reserved special form tags.
    pub tag: KString,
    /// Everything after the element token.
    pub args: Vec<Arg>,
    /// Stable key, carried as out-of-band metadata (not a child).
    pub key: Option<KString>,
}

/// A trailing item of a markup node. Which kinds are admissible where
/// is checked by the compiler, per element or special form.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A child node.
    Node(Node),
    /// A property mapping (only meaningful directly after the token).
    Props(Props),
    /// A bare test expression, for `if`/`when`/`cond`.
    Expr(Expr),
    /// Loop bindings, for `for`: (variable, iterable) pairs.
    Bindings(Vec<(KString, Expr)>),
}

/// Ordered attribute-name to value mapping.
pub type Props = Vec<(KString, AttValue)>;

#[derive(Debug, Clone, PartialEq)]
pub enum AttValue {
    /// Static value, written verbatim between the quotes.
    Text(KString),
    /// Value computed at render time.
    Dynamic(Expr),
    /// Sentinel: leave the attribute out entirely.
    Omit,
}

impl Markup {
    pub fn with_key(mut self, key: &str) -> Markup {
        self.key = Some(KString::from_ref(key));
        self
    }
}

impl From<Markup> for Node {
    fn from(m: Markup) -> Node {
        Node::Markup(m)
    }
}

// Constructor helpers, mostly for making templates in tests and
// calling code readable.

pub fn markup(tag: &str, args: Vec<Arg>) -> Markup {
    Markup {
        tag: KString::from_ref(tag),
        args,
        key: None,
    }
}

pub fn text(s: &str) -> Node {
    Node::Text(KString::from_ref(s))
}

pub fn att(name: &str, value: &str) -> (KString, AttValue) {
    (KString::from_ref(name), AttValue::Text(KString::from_ref(value)))
}

pub fn dynamic_att(name: &str, expr: Expr) -> (KString, AttValue) {
    (KString::from_ref(name), AttValue::Dynamic(expr))
}
