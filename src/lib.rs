//! Compile element tree templates into flat HTML emission programs.

//! An element tree (markup nodes with optional property maps and stable
//! keys, literal text, dynamic references, and the control forms
//! `fragment`, `for`, `if`, `when`, `cond`) is compiled once into a
//! program of write instructions, peephole-optimized, and then executed
//! any number of times against an output sink, once per render.

//! Static text is escaped at compile time, dynamic values at render
//! time. The compiled program is immutable and holds no per-render
//! state, so it can be shared between concurrent renders (each render
//! owning its sink).

pub mod tag;
pub mod node;
pub mod value;
pub mod program;
pub mod compile;
pub mod optimize;

use std::env;

use lazy_static::lazy_static;

pub use compile::{compile, compile_optimized, CompileError};
pub use node::{att, dynamic_att, markup, text, Arg, AttValue, Markup, Node, Props};
pub use optimize::optimize;
pub use program::Instr;
pub use value::{Env, Expr, Value};

/// Escape text for use as HTML content: the HTML4 entities for `&`,
/// `<`, `>`, `"` and `'`.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

lazy_static! {
    /// Compilation tracing to stderr, via the `AHTML_TEMPLATE_TRACE`
    /// env var. Purely observational, never affects compiled output.
    pub static ref TRACE: bool = match env::var("AHTML_TEMPLATE_TRACE") {
        Ok(s) => s.parse().unwrap_or(false),
        Err(_) => false,
    };
}

#[macro_export]
macro_rules! trace {
    ($formatstr:expr $(,$arg:expr)*) => {
        if *$crate::TRACE {
            eprintln!(concat!("T: ", $formatstr) $(,$arg)*);
        }
    }
}

#[test]
fn t_html_escape() {
    assert_eq!(html_escape("abc"), "abc");
    assert_eq!(html_escape("<b>&\"x'</b>"),
               "&lt;b&gt;&amp;&quot;x&#39;&lt;/b&gt;");
    assert_eq!(html_escape(""), "");
}
