//! Render-time expressions, values and variable bindings.

//! Compiled programs carry expressions; evaluation happens once per
//! render, against the `Env` the caller (or an enclosing `for`
//! instruction) provides. Kept deliberately small: variables, a few
//! literals, ranges and lists are all the templates need.

use std::collections::HashMap;
use std::fmt::Write;

use anyhow::{bail, Result};
use kstring::KString;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Variable reference, looked up in the render environment.
    Var(KString),
    Str(KString),
    Int(i64),
    Bool(bool),
    /// Half-open integer range, an iterable.
    Range(i64, i64),
    List(Vec<Expr>),
}

impl Expr {
    pub fn var(name: &str) -> Expr {
        Expr::Var(KString::from_ref(name))
    }

    pub fn str(s: &str) -> Expr {
        Expr::Str(KString::from_ref(s))
    }

    pub fn eval(&self, env: &Env) -> Result<Value> {
        match self {
            Expr::Var(name) => env.get(name).cloned().ok_or_else(
                || anyhow::anyhow!("unbound template variable {name:?}")),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Range(from, to) => Ok(Value::List(
                (*from..*to).map(Value::Int).collect())),
            Expr::List(items) => Ok(Value::List(
                items.iter().map(|e| e.eval(env))
                    .collect::<Result<Vec<_>>>()?)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(KString),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    /// Only `false` is false; 0 and the empty string are true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    /// The unescaped text rendering. Lists render as the concatenation
    /// of their elements.
    pub fn render_string(&self) -> String {
        let mut s = String::new();
        self.render_into(&mut s);
        s
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Value::Str(v) => out.push_str(v),
            Value::Int(n) => {
                let _ = write!(out, "{}", n);
            }
            Value::Bool(b) => {
                let _ = write!(out, "{}", b);
            }
            Value::List(items) => {
                for item in items {
                    item.render_into(out);
                }
            }
        }
    }

    /// The elements to iterate over in a `for` instruction.
    pub fn into_iterable(self) -> Result<Vec<Value>> {
        match self {
            Value::List(items) => Ok(items),
            v => bail!("cannot iterate over non-list value {v:?}"),
        }
    }
}

/// Variable bindings for one render. `for` instructions extend a
/// clone per iteration; the program itself is never mutated.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: HashMap<KString, Value>,
}

impl Env {
    pub fn new() -> Env {
        Env::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.bindings.insert(KString::from_ref(name), value);
    }

    pub fn with(mut self, name: &str, value: Value) -> Env {
        self.set(name, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_eval_literals() {
        let env = Env::new();
        assert_eq!(Expr::Int(42).eval(&env).unwrap(), Value::Int(42));
        assert_eq!(Expr::str("hi").eval(&env).unwrap(),
                   Value::Str(KString::from_ref("hi")));
        assert_eq!(Expr::Range(0, 3).eval(&env).unwrap(),
                   Value::List(vec![Value::Int(0), Value::Int(1),
                                    Value::Int(2)]));
    }

    #[test]
    fn t_eval_var() {
        let env = Env::new().with("x", Value::Int(7));
        assert_eq!(Expr::var("x").eval(&env).unwrap(), Value::Int(7));
        assert!(Expr::var("y").eval(&env).is_err());
    }

    #[test]
    fn t_truthiness() {
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::Str(KString::from_ref("")).is_truthy());
        assert!(Value::List(vec![]).is_truthy());
    }

    #[test]
    fn t_render_string() {
        assert_eq!(Value::Int(-3).render_string(), "-3");
        assert_eq!(Value::Str(KString::from_ref("a<b")).render_string(),
                   "a<b");
        assert_eq!(Value::List(vec![Value::Str(KString::from_ref("n=")),
                                    Value::Int(1)]).render_string(),
                   "n=1");
    }

    #[test]
    fn t_iterable() {
        assert_eq!(Value::List(vec![Value::Int(1)]).into_iterable().unwrap(),
                   vec![Value::Int(1)]);
        assert!(Value::Int(1).into_iterable().is_err());
    }
}
