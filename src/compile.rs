//! Recursive compilation of an element tree into an emission program:
//! literal elements, the five special forms (`fragment`, `for`, `if`,
//! `when`, `cond`), literal text and dynamic references.

use kstring::KString;
use thiserror::Error;

use crate::html_escape;
use crate::node::{Arg, AttValue, Markup, Node, Props};
use crate::optimize::optimize;
use crate::program::Instr;
use crate::tag::{parse_tag, TagSpec};
use crate::trace;
use crate::value::Expr;

/// Compile-time errors. Fatal to the compilation of the enclosing
/// program; there is no partial compilation.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("malformed `{form}` form: expected {expected}, got {got}")]
    MalformedSpecialForm {
        form: &'static str,
        expected: &'static str,
        got: String,
    },
    #[error("unsupported node shape: {0}")]
    UnsupportedNodeShape(String),
}

/// Compile one element tree node into an (unoptimized) emission
/// program.
pub fn compile(node: &Node) -> Result<Instr, CompileError> {
    match node {
        Node::Markup(m) => match m.tag.as_str() {
            "fragment" => compile_fragment(m),
            "for" => compile_for(m),
            "if" => compile_if(m),
            "when" => compile_when(m),
            "cond" => compile_cond(m),
            _ => compile_element(m),
        },
        // Static text, escaped once, now.
        Node::Text(s) => Ok(Instr::Literal(html_escape(s))),
        // Escaping is deferred to render time, the value isn't known
        // yet.
        Node::Dynamic(e) => Ok(Instr::Dynamic(vec![e.clone()])),
    }
}

/// `compile` followed by the optimizer passes.
pub fn compile_optimized(node: &Node) -> Result<Instr, CompileError> {
    Ok(optimize(compile(node)?))
}

/// Shape analysis of a markup node's trailing items: a property
/// mapping in second position is consumed as the node's properties,
/// otherwise children start right after the token.
fn split_props(args: &[Arg]) -> (Option<&Props>, &[Arg]) {
    match args {
        [Arg::Props(props), rest @ ..] => (Some(props), rest),
        _ => (None, args),
    }
}

fn child_node(arg: &Arg) -> Result<&Node, CompileError> {
    match arg {
        Arg::Node(node) => Ok(node),
        other => Err(CompileError::UnsupportedNodeShape(format!("{other:?}"))),
    }
}

fn malformed(form: &'static str, expected: &'static str, m: &Markup)
             -> CompileError {
    CompileError::MalformedSpecialForm {
        form,
        expected,
        got: format!("{:?}", m.args),
    }
}

/// Set `name` in `atts`, replacing an existing entry in place (the
/// original position is kept), appending otherwise.
fn set_att(atts: &mut Props, name: KString, value: AttValue) {
    if let Some(slot) = atts.iter_mut().find(|(n, _)| *n == name) {
        slot.1 = value;
    } else {
        atts.push((name, value));
    }
}

/// The final attribute set of a literal element: stable key first,
/// then caller-supplied properties (which may replace the key entry),
/// then computed `class` and `id` from the token, which replace any
/// caller-supplied class/id.
fn merged_props(spec: &TagSpec, key: Option<&KString>, props: Option<&Props>)
                -> Props {
    let mut atts = Props::new();
    if let Some(key) = key {
        set_att(&mut atts, KString::from_static("key"),
                AttValue::Text(key.clone()));
    }
    if let Some(props) = props {
        for (name, value) in props {
            set_att(&mut atts, name.clone(), value.clone());
        }
    }
    if let Some(class) = spec.class_attribute() {
        set_att(&mut atts, KString::from_static("class"),
                AttValue::Text(class));
    }
    if let Some(id) = &spec.id {
        set_att(&mut atts, KString::from_static("id"),
                AttValue::Text(id.clone()));
    }
    atts
}

fn compile_element(m: &Markup) -> Result<Instr, CompileError> {
    let spec = parse_tag(&m.tag);
    if spec.element.is_empty() {
        return Err(CompileError::UnsupportedNodeShape(format!("{m:?}")));
    }
    let (props, children) = split_props(&m.args);
    trace!("element {:?}: {} props, {} children",
           spec.element, props.map_or(0, |p| p.len()), children.len());
    let atts = merged_props(&spec, m.key.as_ref(), props);

    let mut items = Vec::new();
    items.push(Instr::Literal(format!("<{}", spec.element)));
    for (name, value) in &atts {
        match value {
            AttValue::Omit => (),
            // Attribute values are written verbatim, not escaped
            // (trusted-attribute-value assumption, inherited).
            AttValue::Text(v) => items.push(Instr::Literal(
                format!(" {}=\"{}\"", name, v))),
            AttValue::Dynamic(e) => {
                items.push(Instr::Literal(format!(" {}=\"", name)));
                items.push(Instr::Dynamic(vec![e.clone()]));
                items.push(Instr::Literal("\"".into()));
            }
        }
    }
    items.push(Instr::Literal(">".into()));
    for arg in children {
        items.push(compile(child_node(arg)?)?);
    }
    // Always an explicit closing tag, no self-closing special case.
    items.push(Instr::Literal(format!("</{}>", spec.element)));
    Ok(Instr::Sequence(items))
}

/// `(fragment props? child ...)`: just the children in order. Props
/// and key are accepted syntactically but a fragment has no tag of its
/// own, so they produce no markup.
fn compile_fragment(m: &Markup) -> Result<Instr, CompileError> {
    let (props, children) = split_props(&m.args);
    trace!("fragment: {} props, {} children",
           props.map_or(0, |p| p.len()), children.len());
    let mut items = Vec::with_capacity(children.len());
    for arg in children {
        items.push(compile(child_node(arg)?)?);
    }
    Ok(Instr::Sequence(items))
}

/// `(for bindings body)`: the body runs once per binding combination,
/// in iteration order.
fn compile_for(m: &Markup) -> Result<Instr, CompileError> {
    match &m.args[..] {
        [Arg::Bindings(bindings), Arg::Node(body)] => Ok(Instr::Repeat {
            bindings: bindings.clone(),
            body: Box::new(compile(body)?),
        }),
        _ => Err(malformed("for", "(for bindings body)", m)),
    }
}

/// `(if test then else)`.
fn compile_if(m: &Markup) -> Result<Instr, CompileError> {
    match &m.args[..] {
        [Arg::Expr(test), Arg::Node(then), Arg::Node(otherwise)] => {
            Ok(Instr::Branch {
                test: test.clone(),
                then: Box::new(compile(then)?),
                otherwise: Box::new(compile(otherwise)?),
            })
        }
        _ => Err(malformed("if", "(if test then else)", m)),
    }
}

/// `(when test then)`: nothing is written on a false test.
fn compile_when(m: &Markup) -> Result<Instr, CompileError> {
    match &m.args[..] {
        [Arg::Expr(test), Arg::Node(body)] => Ok(Instr::Guard {
            test: test.clone(),
            body: Box::new(compile(body)?),
        }),
        _ => Err(malformed("when", "(when test then)", m)),
    }
}

/// `(cond test1 expr1 test2 expr2 ...)`: first truthy test wins;
/// nothing is written if none matches.
fn compile_cond(m: &Markup) -> Result<Instr, CompileError> {
    let expected = "(cond test expr ...) with an even number of items";
    if m.args.len() % 2 != 0 {
        return Err(malformed("cond", expected, m));
    }
    let mut arms = Vec::with_capacity(m.args.len() / 2);
    for pair in m.args.chunks(2) {
        match pair {
            [Arg::Expr(test), Arg::Node(body)] => {
                arms.push((test.clone(), compile(body)?));
            }
            _ => return Err(malformed("cond", expected, m)),
        }
    }
    Ok(Instr::MultiBranch(arms))
}
