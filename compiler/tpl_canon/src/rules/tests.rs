use pretty_assertions::assert_eq;
use tpl_ir::{Expr, Operand, Stmt, Tree};

use super::*;
use crate::names::TempNames;

fn parsed(src: &str) -> Tree {
    match tpl_parse::parse(src) {
        Ok(tree) => tree,
        Err(err) => panic!("{err}"),
    }
}

/// The site for the first root statement's own pipe.
fn root_site(tree: &Tree) -> Site {
    let host = tree.root()[0];
    let stmt = tree.stmt(host);
    let Some(pipe) = stmt.governing_pipe() else {
        panic!("{} has no pipe", tree.dump_stmt(host));
    };
    let role = match stmt {
        Stmt::Action(_) if tree.pipe(pipe).is_assignment() => Role::Assign,
        Stmt::Action(_) => Role::Print,
        _ => Role::Subject,
    };
    Site { host, pipe, role }
}

fn rule_for(src: &str) -> Option<Rule> {
    let tree = parsed(src);
    plan(&tree, &root_site(&tree)).map(|planned| planned.rule)
}

/// Plan and apply one rewrite at the first root statement.
fn rewrite_once(src: &str) -> String {
    let mut tree = parsed(src);
    let Some(planned) = plan(&tree, &root_site(&tree)) else {
        panic!("no rule applies to {src}");
    };
    apply(&mut tree, &mut TempNames::new("var"), &planned);
    tree.to_string()
}

#[test]
fn print_of_a_call_splits() {
    let tree = parsed(r#"{{up "a"}}"#);
    let site = root_site(&tree);
    assert_eq!(
        plan(&tree, &site),
        Some(Planned {
            rule: Rule::SplitPrint,
            rewrite: Rewrite::SplitPrint { action: site.host },
        })
    );
    assert_eq!(rewrite_once(r#"{{up "a"}}"#), r#"{{$var0 := up "a"}}{{$var0}}"#);
}

#[test]
fn assignment_of_a_call_is_already_canonical() {
    assert_eq!(rule_for(r#"{{$x := up "a"}}"#), None);
    assert_eq!(rule_for(r#"{{$x := .}}"#), None);
}

#[test]
fn fold_moves_the_leading_value_into_the_next_call() {
    let tree = parsed(r#"{{$x := "a" | f 1}}"#);
    let site = root_site(&tree);
    assert_eq!(
        plan(&tree, &site).map(|p| p.rewrite),
        Some(Rewrite::Fold {
            pipe: site.pipe,
            from: 0,
            into: 1,
        })
    );
    assert_eq!(rewrite_once(r#"{{$x := "a" | f 1}}"#), r#"{{$x := f 1 "a"}}"#);
    assert_eq!(rewrite_once("{{$x := $y | f | g}}"), "{{$x := f $y | g}}");
}

#[test]
fn fold_never_skips_a_command() {
    assert_eq!(rule_for(r#"{{$x := 1 | "a" | f}}"#), None);
    assert_eq!(rule_for(r#"{{$x := "x" | .M | up}}"#), None);
    assert_eq!(
        rewrite_once(r#"{{"x" | .M | up}}"#),
        r#"{{$var0 := "x" | .M | up}}{{$var0}}"#
    );
}

#[test]
fn path_reads_stay_ahead_of_hoisted_arguments() {
    let tree = parsed("{{$x := .A | f (g 1)}}");
    let site = root_site(&tree);
    let cmd = tree.pipe(site.pipe).cmds[0];
    assert_eq!(
        plan(&tree, &site),
        Some(Planned {
            rule: Rule::ArgumentRead,
            rewrite: Rewrite::HoistOperand {
                cmd,
                operand: Operand::Head,
                host: site.host,
            },
        })
    );
    assert_eq!(
        rewrite_once("{{$x := .A | f (g 1)}}"),
        "{{$var0 := .A}}{{$x := $var0 | f (g 1)}}"
    );
    assert_eq!(rewrite_once("{{$x := .A | f 1}}"), "{{$x := f 1 .A}}");
}

#[test]
fn fold_needs_the_value_before_the_call() {
    assert_eq!(rule_for(r#"{{$x := f | "a"}}"#), None);
}

#[test]
fn fold_skips_booleans() {
    assert_eq!(rule_for("{{$x := true | not}}"), None);
}

#[test]
fn subject_call_hoists_the_whole_pipe() {
    assert_eq!(rule_for("{{if eq 1 2}}{{end}}"), Some(Rule::SubjectCall));
    assert_eq!(
        rewrite_once("{{with $v := f 1}}{{$v}}{{end}}"),
        "{{$var0 := f 1}}{{with $v := $var0}}{{$v}}{{end}}"
    );
}

#[test]
fn subject_without_arguments_is_left_alone() {
    assert_eq!(rule_for("{{if true}}{{end}}"), None);
    assert_eq!(rule_for("{{if now}}{{end}}"), None);
}

#[test]
fn compound_heads_hoist_in_print_and_subject_roles() {
    assert_eq!(rule_for("{{.A.B}}"), Some(Rule::CompoundHead));
    assert_eq!(rule_for("{{range .List}}{{end}}"), Some(Rule::CompoundHead));
    assert_eq!(rule_for("{{$x.A}}"), Some(Rule::CompoundHead));
    assert_eq!(rule_for(r#"{{.M "ff"}}"#), Some(Rule::CompoundHead));
    assert_eq!(rule_for(r#"{{template "t" .S.S}}"#), Some(Rule::CompoundHead));
    assert_eq!(rule_for("{{$x := .A.B}}"), None);
    assert_eq!(rule_for("{{$x}}"), None);
    assert_eq!(rule_for("{{.}}"), None);
}

#[test]
fn argument_reads_hoist_paths_but_not_dot() {
    let tree = parsed("{{$x := f . .A}}");
    let site = root_site(&tree);
    let cmd = tree.pipe(site.pipe).cmds[0];
    assert_eq!(
        plan(&tree, &site),
        Some(Planned {
            rule: Rule::ArgumentRead,
            rewrite: Rewrite::HoistOperand {
                cmd,
                operand: Operand::Arg(1),
                host: site.host,
            },
        })
    );
    assert_eq!(rewrite_once("{{$x := f . .A}}"), "{{$var0 := .A}}{{$x := f . $var0}}");
    assert_eq!(rule_for("{{$x := f .}}"), None);
}

#[test]
fn operands_hoist_left_to_right() {
    let tree = parsed("{{$x := f .A (g 1)}}");
    let site = root_site(&tree);
    let cmd = tree.pipe(site.pipe).cmds[0];
    assert_eq!(
        plan(&tree, &site),
        Some(Planned {
            rule: Rule::ArgumentRead,
            rewrite: Rewrite::HoistOperand {
                cmd,
                operand: Operand::Arg(0),
                host: site.host,
            },
        })
    );
    assert_eq!(rewrite_once("{{$x := f .A (g 1)}}"), "{{$var0 := .A}}{{$x := f $var0 (g 1)}}");
    assert_eq!(rewrite_once("{{$x := f $y (g .A)}}"), "{{$var0 := g .A}}{{$x := f $y $var0}}");
}

#[test]
fn later_arguments_wait_for_the_commands_in_front() {
    assert_eq!(rule_for("{{$x := f 1 | g (h 2)}}"), Some(Rule::ChainedCall));
    assert_eq!(
        rewrite_once("{{$x := f 1 | g (h 2)}}"),
        "{{$var0 := f 1}}{{$x := $var0 | g (h 2)}}"
    );
    assert_eq!(
        rewrite_once("{{$x := 1 | f | g .A}}"),
        "{{$var0 := 1 | f}}{{$x := $var0 | g .A}}"
    );
    assert_eq!(rule_for(r#"{{$x := .M "a" | g (h 2)}}"#), Some(Rule::MethodCall));
}

#[test]
fn plain_values_in_front_do_not_delay_argument_hoists() {
    assert_eq!(
        rewrite_once(r#"{{$x := "a" | f (g 1)}}"#),
        r#"{{$var0 := g 1}}{{$x := "a" | f $var0}}"#
    );
    assert_eq!(
        rewrite_once(r#"{{$x := "a" | .M (g 1)}}"#),
        r#"{{$var0 := g 1}}{{$x := "a" | .M $var0}}"#
    );
}

#[test]
fn parenthesized_declarations_are_hoisted_as_written() {
    let mut tree = parsed("{{$x := f ($y := 1) $y}}");
    let Some(planned) = plan(&tree, &root_site(&tree)) else {
        panic!("no rule applies");
    };
    assert_eq!(planned.rule, Rule::NestedPipe);
    let mut names = TempNames::new("var");
    apply(&mut tree, &mut names, &planned);
    assert_eq!(tree.to_string(), "{{$y := 1}}{{$x := f $y $y}}");
    assert_eq!(names.minted(), 0);

    assert_eq!(rewrite_once("{{$x := ($y := 1) | f}}"), "{{$y := 1}}{{$x := $y | f}}");
}

#[test]
fn nested_pipes_in_arguments_are_hoisted_whole() {
    assert_eq!(rule_for(r#"{{$x := up (lower "a")}}"#), Some(Rule::NestedPipe));
    assert_eq!(
        rewrite_once(r#"{{$x := eq ("a" | up) "b"}}"#),
        r#"{{$var0 := "a" | up}}{{$x := eq $var0 "b"}}"#
    );
}

#[test]
fn method_calls_feeding_a_pipe_are_hoisted() {
    assert_eq!(rule_for(r#"{{$x := .M "ff" | up}}"#), Some(Rule::MethodCall));
    assert_eq!(
        rewrite_once(r#"{{$x := .M "ff" | up}}"#),
        r#"{{$var0 := .M "ff"}}{{$x := $var0 | up}}"#
    );
}

#[test]
fn parenthesized_head_feeding_a_call_is_hoisted() {
    assert_eq!(rule_for(r#"{{$x := (lower "a") | up}}"#), Some(Rule::ParenthesizedHead));
    assert_eq!(
        rewrite_once(r#"{{$x := ("a" | lower) | up}}"#),
        r#"{{$var0 := "a" | lower}}{{$x := $var0 | up}}"#
    );
    assert_eq!(
        rewrite_once(r#"{{$x := (lower "a") | .M}}"#),
        r#"{{$var0 := lower "a"}}{{$x := $var0 | .M}}"#
    );
}

#[test]
fn chained_calls_hoist_the_leading_one() {
    assert_eq!(rule_for(r#"{{$x := up "a" | lower}}"#), Some(Rule::ChainedCall));
    assert_eq!(
        rewrite_once(r#"{{$x := up "a" | lower}}"#),
        r#"{{$var0 := up "a"}}{{$x := $var0 | lower}}"#
    );
}

#[test]
fn redundant_parentheses_unwrap_one_level() {
    assert_eq!(rewrite_once("{{((($x)))}}"), "{{(($x))}}");
    assert_eq!(rewrite_once(r#"{{$t := ("what" | up)}}"#), r#"{{$t := "what" | up}}"#);
}

#[test]
fn parentheses_around_a_declaration_stay() {
    assert_eq!(rule_for("{{($y := 1)}}"), None);
}

#[test]
fn nested_role_only_rearranges_and_hoists() {
    let tree = parsed(r#"{{f (.A | g)}}"#);
    let host = tree.root()[0];
    let outer = root_site(&tree).pipe;
    let arg = tree.cmd(tree.pipe(outer).cmds[0]).args[0];
    let Expr::Pipe(inner) = *tree.expr(arg) else {
        panic!("expected a nested pipe");
    };
    let site = Site {
        host,
        pipe: inner,
        role: Role::Nested,
    };
    assert_eq!(plan(&tree, &site).map(|p| p.rule), Some(Rule::FoldPipedValue));
}

#[test]
fn rule_names_are_distinct() {
    let mut names: Vec<_> = Rule::ALL.iter().map(|rule| rule.to_string()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), Rule::ALL.len());
}
