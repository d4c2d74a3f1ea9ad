//! The emission program: the instruction tree compilation produces and
//! the optimizer rewrites, and the small executor that interprets it
//! against an output sink.

use std::io::Write;

use anyhow::Result;
use kstring::KString;

use crate::html_escape;
use crate::value::{Env, Expr};

// https://www.w3.org/International/questions/qa-byte-order-mark#problems
const BOM: &str = "\u{FEFF}";
const DOCTYPE: &str = "<!DOCTYPE html>\n";

/// One emission instruction. A whole program is simply the root
/// instruction, usually a `Sequence`.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// Write static text. Already escaped where escaping was due;
    /// finalized at compile time.
    Literal(String),
    /// Evaluate each expression, escape its rendering, write the
    /// concatenation in list order.
    Dynamic(Vec<Expr>),
    /// Ordered composition.
    Sequence(Vec<Instr>),
    /// Run `body` once per binding combination, in iteration order;
    /// the leftmost binding is the outermost loop.
    Repeat {
        bindings: Vec<(KString, Expr)>,
        body: Box<Instr>,
    },
    /// Two-armed conditional.
    Branch {
        test: Expr,
        then: Box<Instr>,
        otherwise: Box<Instr>,
    },
    /// One-armed conditional; writes nothing on a false test.
    Guard {
        test: Expr,
        body: Box<Instr>,
    },
    /// First truthy test wins; writes nothing if none matches.
    MultiBranch(Vec<(Expr, Instr)>),
}

impl Instr {
    /// Execute against `out`, in program order. Render-time failures
    /// (unbound variables, non-iterable loop values, sink errors)
    /// propagate unchanged.
    pub fn print_html_fragment(&self, out: &mut impl Write, env: &Env) -> Result<()> {
        match self {
            Instr::Literal(text) => out.write_all(text.as_bytes())?,
            Instr::Dynamic(exprs) => {
                for expr in exprs {
                    let text = expr.eval(env)?.render_string();
                    out.write_all(html_escape(&text).as_bytes())?;
                }
            }
            Instr::Sequence(instrs) => {
                for instr in instrs {
                    instr.print_html_fragment(out, env)?;
                }
            }
            Instr::Repeat { bindings, body } => {
                print_repeat(bindings, body, out, env)?;
            }
            Instr::Branch { test, then, otherwise } => {
                if test.eval(env)?.is_truthy() {
                    then.print_html_fragment(out, env)?;
                } else {
                    otherwise.print_html_fragment(out, env)?;
                }
            }
            Instr::Guard { test, body } => {
                if test.eval(env)?.is_truthy() {
                    body.print_html_fragment(out, env)?;
                }
            }
            Instr::MultiBranch(arms) => {
                for (test, instr) in arms {
                    if test.eval(env)?.is_truthy() {
                        instr.print_html_fragment(out, env)?;
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Like `print_html_fragment`, but for a whole document: prepends
    /// a byte-order mark (to make sure the output is read correctly
    /// from files, too) and the doctype.
    pub fn print_html_document(&self, out: &mut impl Write, env: &Env) -> Result<()> {
        out.write_all(BOM.as_bytes())?;
        out.write_all(DOCTYPE.as_bytes())?;
        self.print_html_fragment(out, env)
    }

    pub fn to_html_fragment_string(&self, env: &Env) -> Result<String> {
        let mut v = Vec::new();
        self.print_html_fragment(&mut v, env)?;
        // Only UTF-8 string data was written into v.
        Ok(String::from_utf8(v)?)
    }

    pub fn to_html_string(&self, env: &Env, want_doctype: bool) -> Result<String> {
        let mut v = Vec::new();
        if want_doctype {
            self.print_html_document(&mut v, env)
        } else {
            self.print_html_fragment(&mut v, env)
        }?;
        Ok(String::from_utf8(v)?)
    }

    /// For a fully static program (a single `Literal`, as the
    /// optimizer leaves behind when there is no dynamic content), the
    /// preserialized text.
    pub fn as_static_str(&self) -> Option<&str> {
        match self {
            Instr::Literal(text) => Some(text),
            _ => None,
        }
    }
}

fn print_repeat(bindings: &[(KString, Expr)], body: &Instr,
                out: &mut impl Write, env: &Env) -> Result<()> {
    match bindings {
        [] => body.print_html_fragment(out, env),
        [(name, iterable), rest @ ..] => {
            for item in iterable.eval(env)?.into_iterable()? {
                let env = env.clone().with(name, item);
                print_repeat(rest, body, out, &env)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn run(instr: &Instr, env: &Env) -> String {
        instr.to_html_fragment_string(env).unwrap()
    }

    #[test]
    fn t_literal_and_sequence() {
        let p = Instr::Sequence(vec![
            Instr::Literal("<p>".into()),
            Instr::Literal("hi".into()),
            Instr::Literal("</p>".into()),
        ]);
        assert_eq!(run(&p, &Env::new()), "<p>hi</p>");
        assert_eq!(p.as_static_str(), None);
        assert_eq!(Instr::Literal("<p>hi</p>".into()).as_static_str(),
                   Some("<p>hi</p>"));
    }

    #[test]
    fn t_dynamic_escapes() {
        let p = Instr::Dynamic(vec![Expr::var("x"), Expr::Int(1)]);
        let env = Env::new().with("x", Value::Str(KString::from_ref("<b>")));
        assert_eq!(run(&p, &env), "&lt;b&gt;1");
    }

    #[test]
    fn t_repeat_nests_leftmost_outermost() {
        let p = Instr::Repeat {
            bindings: vec![
                (KString::from_ref("a"), Expr::Range(0, 2)),
                (KString::from_ref("b"), Expr::Range(0, 2)),
            ],
            body: Box::new(Instr::Dynamic(vec![Expr::var("a"),
                                               Expr::var("b")])),
        };
        assert_eq!(run(&p, &Env::new()), "00011011");
    }

    #[test]
    fn t_branch_guard_multibranch() {
        let branch = Instr::Branch {
            test: Expr::var("t"),
            then: Box::new(Instr::Literal("yes".into())),
            otherwise: Box::new(Instr::Literal("no".into())),
        };
        assert_eq!(run(&branch, &Env::new().with("t", Value::Bool(true))),
                   "yes");
        assert_eq!(run(&branch, &Env::new().with("t", Value::Bool(false))),
                   "no");

        let guard = Instr::Guard {
            test: Expr::Bool(false),
            body: Box::new(Instr::Literal("never".into())),
        };
        assert_eq!(run(&guard, &Env::new()), "");

        let mb = Instr::MultiBranch(vec![
            (Expr::Bool(false), Instr::Literal("a".into())),
            (Expr::Bool(true), Instr::Literal("b".into())),
            (Expr::Bool(true), Instr::Literal("c".into())),
        ]);
        assert_eq!(run(&mb, &Env::new()), "b");
        let none = Instr::MultiBranch(vec![
            (Expr::Bool(false), Instr::Literal("a".into())),
        ]);
        assert_eq!(run(&none, &Env::new()), "");
    }

    #[test]
    fn t_render_errors_propagate() {
        let p = Instr::Dynamic(vec![Expr::var("missing")]);
        assert!(p.to_html_fragment_string(&Env::new()).is_err());
        let p = Instr::Repeat {
            bindings: vec![(KString::from_ref("x"), Expr::Int(5))],
            body: Box::new(Instr::Literal("x".into())),
        };
        assert!(p.to_html_fragment_string(&Env::new()).is_err());
    }

    #[test]
    fn t_document() {
        let p = Instr::Literal("<html></html>".into());
        assert_eq!(p.to_html_string(&Env::new(), true).unwrap(),
                   "\u{FEFF}<!DOCTYPE html>\n<html></html>");
        assert_eq!(p.to_html_string(&Env::new(), false).unwrap(),
                   "<html></html>");
    }
}
