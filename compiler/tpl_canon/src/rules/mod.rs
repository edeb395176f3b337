//! Rewrite rules.
//!
//! Each rule recognizes one reducible pipe shape. Detection is read-only
//! and yields a [`Rewrite`], a self-contained description of the edit in
//! terms of node handles. The driver applies it afterwards with exclusive
//! access to the tree, so a rewrite lands in full or not at all.
//!
//! # Roles
//!
//! A pipe is examined in one of four roles relative to its host statement
//! (the innermost enclosing statement):
//!
//! | Role      | Pipe                                      | Rule order                              |
//! |-----------|-------------------------------------------|-----------------------------------------|
//! | `Print`   | own pipe of a non-declaring action        | parens, operands, method, compound, split, fold, paren-head, chain |
//! | `Assign`  | own pipe of a declaring action            | parens, operands, method, fold, paren-head, chain |
//! | `Subject` | own pipe of `if`/`range`/`with`/`template`| parens, fold, subject, compound, operands, method, paren-head, chain |
//! | `Nested`  | parenthesized pipe inside an operand      | parens, operands, fold, paren-head, chain |
//!
//! The operand step hoists nested pipes and argument reads in the order
//! they are evaluated. When the leftmost one sits behind commands that run
//! first, those commands are hoisted instead, under the method-call,
//! parenthesized-head, argument-read or chained-call rule.
//!
//! The first rule that matches wins. Hoists splice the new assignment
//! immediately before the host; the print split splices the re-print
//! immediately after it.

mod apply;
mod detect;

use std::fmt;

use tpl_ir::{CmdId, Operand, PipeId, StmtId, Tree};

pub(crate) use apply::apply;

/// Identifies a rewrite rule, for statistics and logs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    /// `v | f a` → `f a v` for a bare value `v`.
    FoldPipedValue,
    /// `f a | g` → `$t := f a` then `$t | g`.
    ChainedCall,
    /// `f (p)` → `$t := p` then `f $t`.
    NestedPipe,
    /// `{{if f a}}` → `$t := f a` then `{{if $t}}`.
    SubjectCall,
    /// `((p))` → `p`.
    RedundantParens,
    /// `{{if .A.B}}`, `{{.M "x"}}` → `$t := ...` then `$t`.
    CompoundHead,
    /// `{{f a}}` → `{{$t := f a}}{{$t}}`.
    SplitPrint,
    /// `f .A` → `$t := .A` then `f $t`.
    ArgumentRead,
    /// `.M a | g` → `$t := .M a` then `$t | g`.
    MethodCall,
    /// `(p) | f` → `$t := p` then `$t | f`.
    ParenthesizedHead,
}

impl Rule {
    pub const ALL: [Rule; 10] = [
        Rule::FoldPipedValue,
        Rule::ChainedCall,
        Rule::NestedPipe,
        Rule::SubjectCall,
        Rule::RedundantParens,
        Rule::CompoundHead,
        Rule::SplitPrint,
        Rule::ArgumentRead,
        Rule::MethodCall,
        Rule::ParenthesizedHead,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Rule::FoldPipedValue => "fold-piped-value",
            Rule::ChainedCall => "chained-call",
            Rule::NestedPipe => "nested-pipe",
            Rule::SubjectCall => "subject-call",
            Rule::RedundantParens => "redundant-parens",
            Rule::CompoundHead => "compound-head",
            Rule::SplitPrint => "split-print",
            Rule::ArgumentRead => "argument-read",
            Rule::MethodCall => "method-call",
            Rule::ParenthesizedHead => "parenthesized-head",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a pipe relates to its host statement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    Print,
    Assign,
    Subject,
    Nested,
}

/// One entry of a role's rule order.
#[derive(Copy, Clone, Debug)]
enum Step {
    /// Nested pipes and argument reads, in evaluation order.
    Operands,
    Rule(Rule),
}

impl Role {
    fn order(self) -> &'static [Step] {
        use Rule::{
            ChainedCall, CompoundHead, FoldPipedValue, MethodCall, ParenthesizedHead,
            RedundantParens, SplitPrint, SubjectCall,
        };
        use Step::{Operands, Rule as R};
        match self {
            Role::Print => &[
                R(RedundantParens),
                Operands,
                R(MethodCall),
                R(CompoundHead),
                R(SplitPrint),
                R(FoldPipedValue),
                R(ParenthesizedHead),
                R(ChainedCall),
            ],
            Role::Assign => &[
                R(RedundantParens),
                Operands,
                R(MethodCall),
                R(FoldPipedValue),
                R(ParenthesizedHead),
                R(ChainedCall),
            ],
            Role::Subject => &[
                R(RedundantParens),
                R(FoldPipedValue),
                R(SubjectCall),
                R(CompoundHead),
                Operands,
                R(MethodCall),
                R(ParenthesizedHead),
                R(ChainedCall),
            ],
            Role::Nested => &[
                R(RedundantParens),
                Operands,
                R(FoldPipedValue),
                R(ParenthesizedHead),
                R(ChainedCall),
            ],
        }
    }
}

/// A pipe under examination, with the statement hoists land in front of.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Site {
    pub host: StmtId,
    pub pipe: PipeId,
    pub role: Role,
}

/// A planned edit. Handles refer to nodes that exist when it is planned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Rewrite {
    /// Append the head of `pipe.cmds[from]` to the arguments of
    /// `pipe.cmds[into]`, then drop `cmds[from]`.
    Fold {
        pipe: PipeId,
        from: usize,
        into: usize,
    },
    /// Hoist the first `len` commands of `pipe` as one assignment and put a
    /// temporary in their place.
    HoistLeading {
        pipe: PipeId,
        len: usize,
        host: StmtId,
    },
    /// Hoist one operand of `cmd` and put a temporary in its place. A
    /// parenthesized declaration is hoisted as is and read through its own
    /// variable.
    HoistOperand {
        cmd: CmdId,
        operand: Operand,
        host: StmtId,
    },
    /// Hoist every command of `pipe`, leaving a lone temporary.
    HoistAll { pipe: PipeId, host: StmtId },
    /// Replace the commands of `pipe` with those of `inner`.
    Unwrap { pipe: PipeId, inner: PipeId },
    /// Turn the printing `action` into an assignment and re-print after it.
    SplitPrint { action: StmtId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Planned {
    pub rule: Rule,
    pub rewrite: Rewrite,
}

/// First rule, in the site's role order, that matches.
pub(crate) fn plan(tree: &Tree, site: &Site) -> Option<Planned> {
    site.role.order().iter().find_map(|&step| match step {
        Step::Operands => detect::operands(tree, site),
        Step::Rule(rule) => {
            detect::detect(tree, site, rule).map(|rewrite| Planned { rule, rewrite })
        }
    })
}

#[cfg(test)]
mod tests;
