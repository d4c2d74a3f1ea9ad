//! Peephole optimization of emission programs: flatten nested
//! sequences, then merge runs of adjacent literal writes. Both passes
//! are total and preserve the written byte stream exactly; the
//! composition is idempotent.

use itertools::Itertools;

use crate::program::Instr;

pub fn optimize(instr: Instr) -> Instr {
    merge_literals(flatten(instr))
}

/// Pass A: splice the elements of any immediate `Sequence` child into
/// its parent `Sequence`, bottom-up. Maximizes adjacency for pass B,
/// which only looks at siblings within one sequence.
fn flatten(instr: Instr) -> Instr {
    match instr {
        Instr::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match flatten(item) {
                    Instr::Sequence(inner) => out.extend(inner),
                    other => out.push(other),
                }
            }
            Instr::Sequence(out)
        }
        Instr::Repeat { bindings, body } => Instr::Repeat {
            bindings,
            body: Box::new(flatten(*body)),
        },
        Instr::Branch { test, then, otherwise } => Instr::Branch {
            test,
            then: Box::new(flatten(*then)),
            otherwise: Box::new(flatten(*otherwise)),
        },
        Instr::Guard { test, body } => Instr::Guard {
            test,
            body: Box::new(flatten(*body)),
        },
        Instr::MultiBranch(arms) => Instr::MultiBranch(
            arms.into_iter().map(|(test, i)| (test, flatten(i))).collect()),
        leaf @ (Instr::Literal(_) | Instr::Dynamic(_)) => leaf,
    }
}

/// Pass B: within each `Sequence`, collapse every run of adjacent
/// `Literal` instructions into one whose text is their concatenation.
/// Non-literal instructions pass through unchanged (recursively
/// rewritten) and act as flush boundaries. A sequence left with a
/// single element collapses to that element.
fn merge_literals(instr: Instr) -> Instr {
    match instr {
        Instr::Sequence(items) => {
            let mut merged: Vec<Instr> = items
                .into_iter()
                .map(merge_literals)
                .coalesce(|a, b| match (a, b) {
                    (Instr::Literal(mut x), Instr::Literal(y)) => {
                        x.push_str(&y);
                        Ok(Instr::Literal(x))
                    }
                    (a, b) => Err((a, b)),
                })
                .collect();
            if merged.len() == 1 {
                merged.remove(0)
            } else {
                Instr::Sequence(merged)
            }
        }
        Instr::Repeat { bindings, body } => Instr::Repeat {
            bindings,
            body: Box::new(merge_literals(*body)),
        },
        Instr::Branch { test, then, otherwise } => Instr::Branch {
            test,
            then: Box::new(merge_literals(*then)),
            otherwise: Box::new(merge_literals(*otherwise)),
        },
        Instr::Guard { test, body } => Instr::Guard {
            test,
            body: Box::new(merge_literals(*body)),
        },
        Instr::MultiBranch(arms) => Instr::MultiBranch(
            arms.into_iter()
                .map(|(test, i)| (test, merge_literals(i)))
                .collect()),
        leaf @ (Instr::Literal(_) | Instr::Dynamic(_)) => leaf,
    }
}
