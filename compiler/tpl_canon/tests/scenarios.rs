//! End-to-end canonicalization of parsed templates.

use pretty_assertions::assert_eq;
use tpl_canon::{canonicalize, canonicalize_set, init_tracing, is_canonical, CanonConfig};
use tpl_ir::Tree;

fn parsed(src: &str) -> Tree {
    match tpl_parse::parse(src) {
        Ok(tree) => tree,
        Err(err) => panic!("parse of {src:?} failed: {err}"),
    }
}

fn canon(src: &str) -> String {
    init_tracing();
    let mut tree = parsed(src);
    canonicalize(&mut tree);
    tree.to_string()
}

#[track_caller]
fn check(src: &str, expected: &str) {
    assert_eq!(canon(src), expected, "canonicalizing {src}");
}

// Reference scenarios

#[test]
fn piped_value_becomes_last_argument() {
    check(
        r#"{{"son" | split "wat"}}"#,
        r#"{{$var0 := split "wat" "son"}}{{$var0}}"#,
    );
}

#[test]
fn chains_are_hoisted_front_to_back() {
    check(
        "{{1 | incr | incr | mul 2}}",
        "{{$var1 := incr 1}}{{$var2 := incr $var1}}{{$var0 := mul 2 $var2}}{{$var0}}",
    );
}

#[test]
fn condition_with_nested_pipe() {
    check(
        r#"{{if eq ("what" | up | lower) "what"}}{{end}}"#,
        r#"{{$var2 := up "what"}}{{$var1 := lower $var2}}{{$var0 := eq $var1 "what"}}{{if $var0}}{{end}}"#,
    );
}

#[test]
fn parenthesized_assignment_with_hygiene() {
    check(r#"{{$t := ("what" | up)}}"#, r#"{{$tpl_t := up "what"}}"#);
}

#[test]
fn range_over_a_field() {
    check(
        "{{range .List}}{{.}}{{end}}",
        "{{$var0 := .List}}{{range $var0}}{{.}}{{end}}",
    );
}

#[test]
fn redundant_parentheses_collapse() {
    check(r#"{{$x := "r"}}{{(((($x))))}}"#, r#"{{$tpl_x := "r"}}{{$tpl_x}}"#);
}

// Pipelines in print position

#[test]
fn dot_and_fields_piped_into_calls() {
    check("{{. | up}}", "{{$var0 := up .}}{{$var0}}");
    check(
        "{{.S | up}}",
        "{{$var1 := .S}}{{$var0 := up $var1}}{{$var0}}",
    );
    check("{{1 | incr}}", "{{$var0 := incr 1}}{{$var0}}");
}

#[test]
fn several_nested_arguments() {
    check(
        "{{mul (1 | incr) (2 | incr)}}",
        "{{$var0 := incr 1}}{{$var1 := incr 2}}{{$var2 := mul $var0 $var1}}{{$var2}}",
    );
}

#[test]
fn nested_argument_of_a_piped_call() {
    check(
        r#"{{"some" | split ("what" | up)}}"#,
        r#"{{$var0 := up "what"}}{{$var1 := split $var0 "some"}}{{$var1}}"#,
    );
    check(
        r#"{{"some" | split (.S | up)}}"#,
        r#"{{$var1 := .S}}{{$var0 := up $var1}}{{$var2 := split $var0 "some"}}{{$var2}}"#,
    );
    check(
        r#"{{"some" | split (("what" | lower) | up)}}"#,
        r#"{{$var1 := lower "what"}}{{$var0 := up $var1}}{{$var2 := split $var0 "some"}}{{$var2}}"#,
    );
}

#[test]
fn call_chains_in_print_position() {
    check(
        r#"{{up "what" | lower}}"#,
        r#"{{$var1 := up "what"}}{{$var0 := lower $var1}}{{$var0}}"#,
    );
    check(
        "{{up .S | lower}}",
        "{{$var0 := .S}}{{$var2 := up $var0}}{{$var1 := lower $var2}}{{$var1}}",
    );
    check(
        r#"{{("what" | lower) | split "" | join "" | up}}"#,
        r#"{{$var1 := lower "what"}}{{$var2 := split "" $var1}}{{$var3 := join "" $var2}}{{$var0 := up $var3}}{{$var0}}"#,
    );
}

// Assignments

#[test]
fn assignments_keep_their_binding() {
    check(r#"{{$t := "what" | up}}"#, r#"{{$tpl_t := up "what"}}"#);
    check(
        "{{$t := (.S | up)}}",
        "{{$var0 := .S}}{{$tpl_t := up $var0}}",
    );
}

#[test]
fn user_bindings_never_collide_with_temporaries() {
    check(
        r#"{{$var0 := up "what" | lower}}{{$var0}}"#,
        r#"{{$var0 := up "what"}}{{$tpl_var0 := lower $var0}}{{$tpl_var0}}"#,
    );
    check(
        r#"{{$var0 := eq (lower "up") "what"}}"#,
        r#"{{$var0 := lower "up"}}{{$tpl_var0 := eq $var0 "what"}}"#,
    );
}

// Branches and loops

#[test]
fn negated_condition() {
    check(
        r#"{{if not (eq ("what" | up | lower) "what")}}not eq{{end}}"#,
        r#"{{$var3 := up "what"}}{{$var2 := lower $var3}}{{$var1 := eq $var2 "what"}}{{$var0 := not $var1}}{{if $var0}}not eq{{end}}"#,
    );
}

#[test]
fn sibling_nested_arguments_keep_their_order() {
    check(
        r#"{{if eq ("what" | lower) ("what" | lower)}}{{end}}"#,
        r#"{{$var1 := lower "what"}}{{$var2 := lower "what"}}{{$var0 := eq $var1 $var2}}{{if $var0}}{{end}}"#,
    );
}

#[test]
fn range_declarations_survive_hoisting() {
    check(
        r#"{{range $i, $v := split "what" ""}}{{$i}} -> {{$v}}{{end}}"#,
        r#"{{$var0 := split "what" ""}}{{range $tpl_i, $tpl_v := $var0}}{{$tpl_i}} -> {{$tpl_v}}{{end}}"#,
    );
    check(
        r#"{{range $i, $v := "some" | split (("what" | lower) | up)}}{{end}}"#,
        r#"{{$var2 := lower "what"}}{{$var1 := up $var2}}{{$var0 := split $var1 "some"}}{{range $tpl_i, $tpl_v := $var0}}{{end}}"#,
    );
}

#[test]
fn with_body_keeps_its_dot() {
    check(
        r#"{{with $x := "output" | lower}}{{$ | up}}{{. | up | lower}}{{end}}"#,
        r#"{{$var0 := lower "output"}}{{with $tpl_x := $var0}}{{$var1 := up $}}{{$var1}}{{$var3 := up .}}{{$var2 := lower $var3}}{{$var2}}{{end}}"#,
    );
}

#[test]
fn nested_branches_hoist_into_their_own_blocks() {
    check(
        r#"{{if .A}}{{if eq .B "b"}}b{{else}}{{.C | up}}{{end}}{{end}}"#,
        r#"{{$var0 := .A}}{{if $var0}}{{$var2 := .B}}{{$var1 := eq $var2 "b"}}{{if $var1}}b{{else}}{{$var4 := .C}}{{$var3 := up $var4}}{{$var3}}{{end}}{{end}}"#,
    );
}

#[test]
fn else_if_conditions_hoist_inside_the_else() {
    check(
        "{{if .A}}a{{else if .B}}b{{end}}",
        "{{$var0 := .A}}{{if $var0}}a{{else}}{{$var1 := .B}}{{if $var1}}b{{end}}{{end}}",
    );
}

// Paths and methods

#[test]
fn path_reads() {
    check("{{.S.S}}", "{{$var0 := .S.S}}{{$var0}}");
    check(
        r#"{{split "" .S.S}}"#,
        r#"{{$var0 := .S.S}}{{$var1 := split "" $var0}}{{$var1}}"#,
    );
    check("{{call .S}}", "{{$var0 := .S}}{{$var1 := call $var0}}{{$var1}}");
    check("{{if .S.S}}yes{{end}}", "{{$var0 := .S.S}}{{if $var0}}yes{{end}}");
    check(
        "{{with $y := .S.S}}plop{{end}}",
        "{{$var0 := .S.S}}{{with $tpl_y := $var0}}plop{{end}}",
    );
    check(
        "{{$x := .}}{{$x.S.S}}",
        "{{$tpl_x := .}}{{$var0 := $tpl_x.S.S}}{{$var0}}",
    );
}

#[test]
fn method_calls() {
    check(r#"{{.Method "ff"}}"#, r#"{{$var0 := .Method "ff"}}{{$var0}}"#);
    check(
        r#"{{.Method "ff" | up}}"#,
        r#"{{$var0 := .Method "ff"}}{{$var1 := up $var0}}{{$var1}}"#,
    );
    check(
        r#"{{$x := .}}{{$x.Method "ff" | up}}"#,
        r#"{{$tpl_x := .}}{{$var0 := $tpl_x.Method "ff"}}{{$var1 := up $var0}}{{$var1}}"#,
    );
}

// Evaluation order

#[test]
fn arguments_are_hoisted_left_to_right() {
    check(
        "{{f .A (g 1)}}",
        "{{$var0 := .A}}{{$var1 := g 1}}{{$var2 := f $var0 $var1}}{{$var2}}",
    );
}

#[test]
fn leading_commands_run_before_later_arguments() {
    check(
        "{{f 1 | g (h 2)}}",
        "{{$var0 := f 1}}{{$var1 := h 2}}{{$var2 := g $var1 $var0}}{{$var2}}",
    );
    check(
        "{{.A | f (g 1)}}",
        "{{$var0 := .A}}{{$var1 := g 1}}{{$var2 := f $var1 $var0}}{{$var2}}",
    );
    check(
        "{{if .A | f .B}}{{end}}",
        "{{$var0 := .A}}{{$var2 := .B}}{{$var1 := f $var2 $var0}}{{if $var1}}{{end}}",
    );
}

#[test]
fn piped_values_only_fold_into_the_next_command() {
    check(r#"{{"x" | .M | up}}"#, r#"{{$var0 := "x" | .M | up}}{{$var0}}"#);
    check(
        r#"{{"a" | .M (g 1)}}"#,
        r#"{{$var0 := g 1}}{{"a" | .M $var0}}"#,
    );
}

#[test]
fn parenthesized_declarations_keep_their_binding() {
    check(
        "{{print ($x := 1) $x}}",
        "{{$tpl_x := 1}}{{$var0 := print $tpl_x $tpl_x}}{{$var0}}",
    );
    check(
        "{{($x := 1) | up}}{{$x}}",
        "{{$tpl_x := 1}}{{$var0 := up $tpl_x}}{{$var0}}{{$tpl_x}}",
    );
}

// Template invocations

#[test]
fn invocation_arguments() {
    check(
        r#"{{template "rr" (up "rr")}}"#,
        r#"{{$var0 := up "rr"}}{{template "rr" $var0}}"#,
    );
    check(r#"{{template "rr"}}"#, r#"{{template "rr"}}"#);
}

#[test]
fn every_defined_template_gets_its_own_session() {
    let mut set = match tpl_parse::parse_set(
        "main",
        r#"{{define "rr"}}{{.A | up}}{{end}}ww{{template "rr" .S.S}}"#,
    ) {
        Ok(set) => set,
        Err(err) => panic!("{err}"),
    };
    let stats = match canonicalize_set(&mut set, &CanonConfig::default()) {
        Ok(stats) => stats,
        Err(err) => panic!("{err}"),
    };
    assert_eq!(
        set.main().to_string(),
        r#"ww{{$var0 := .S.S}}{{template "rr" $var0}}"#
    );
    assert_eq!(
        set.lookup("rr").map(ToString::to_string).as_deref(),
        Some("{{$var1 := .A}}{{$var0 := up $var1}}{{$var0}}")
    );
    assert_eq!(
        stats.iter().map(|s| s.temporaries).collect::<Vec<_>>(),
        vec![1, 2]
    );
}

// Properties on fixed inputs

#[test]
fn text_and_trim_markers_are_preserved() {
    check("a {{- .A -}} b", "a{{$var0 := .A}}{{$var0}}b");
    check("{{/* note */}}plain", "plain");
}

#[test]
fn canonical_output_admits_no_rewrite() {
    let mut tree = parsed(
        r#"{{range $i, $v := "some" | split (("what" | lower) | up)}}{{$v.Name | printf "%s"}}{{end}}"#,
    );
    canonicalize(&mut tree);
    assert!(is_canonical(&tree));
    let again = canonicalize(&mut tree);
    assert_eq!(again.rewrites, 0);
    assert_eq!(again.passes, 1);
}

#[test]
fn booleans_piped_into_calls_are_left_as_assignments() {
    check("{{true | not}}", "{{$var0 := true | not}}{{$var0}}");
}
