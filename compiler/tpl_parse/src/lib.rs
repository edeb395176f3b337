//! Reference parser for the `{{ }}` template language.
//!
//! Produces a [`tpl_ir::Tree`] (or a [`TemplateSet`] when the source
//! `define`s templates). Supported:
//!
//! - text, `{{/* comments */}}`, trim markers `{{- ` and ` -}}`
//! - `{{pipeline}}` with `$x :=` declarations
//! - `{{if}}`, `{{else if}}`, `{{range $i, $v := ...}}`, `{{with}}`,
//!   `{{else with}}`, `{{else}}`, `{{end}}`
//! - `{{template "name" [pipeline]}}`, top-level `{{define "name"}}`
//! - operands: `.`, `.A.B`, `$`, `$x.A`, identifiers, `"strings"`,
//!   `` `raw strings` ``, numbers, `true`/`false`, `(pipelines)`
//!
//! Not supported: `nil`, `=` reassignment, `break`/`continue`, `block`,
//! field access on parenthesized pipelines.

mod error;
mod lexer;
mod parser;

pub use error::{ParseError, ParseErrorKind};

use tpl_ir::{TemplateSet, Tree};

/// Parse `src` as an anonymous template, discarding any `define`d ones.
pub fn parse(src: &str) -> Result<Tree, ParseError> {
    parse_set("", src).map(TemplateSet::into_main)
}

/// Parse `src` as template `name` together with the templates it defines.
pub fn parse_set(name: &str, src: &str) -> Result<TemplateSet, ParseError> {
    parser::Parser::parse(name, src)
}
