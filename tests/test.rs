use toalc::{CompileError, Compiler, ErrorKind, Output, Stage};

use std::sync::Once;

/// Setup function that is only run once, even if called multiple times.
fn setup() {
    static INIT: Once = Once::new();
    INIT.call_once(|| env_logger::init());
}

fn run_ok(src: &str) -> Output {
    setup();
    Compiler::default().compile(src, Stage::Js).unwrap()
}

fn run_err(src: &str) -> CompileError {
    setup();
    Compiler::default().compile(src, Stage::Js).unwrap_err()
}

fn assert_err(src: &str, kind: ErrorKind, fragment: &str) {
    let err = run_err(src);
    assert_eq!(err.kind(), kind, "{}", err);
    assert!(
        err.to_string().contains(fragment),
        "{:?} does not contain {:?}",
        err.to_string(),
        fragment
    );
}

#[test]
fn print_statements() {
    run_ok(r#"make x with 1 ; print x; print 5; print "hello"; print true;"#);
}

#[test]
fn basic_types() {
    run_ok(r#"make a with 1; make b with 1.1; make c with true; make d with "string";"#);
}

#[test]
fn expressions() {
    run_ok("make a with 2 plus 2; make b with 1 is less than 2;");
    run_ok("make x with 1 plus (1 minus -8) times 2;");
    run_ok("make x with ( 1 plus 1 ) minus 1;");
}

#[test]
fn reassignment() {
    run_ok("make x with 1 ; change x to 2;");
    run_ok("make x with true; change x to false;");
}

#[test]
fn automation_calls() {
    run_ok("automate x(y){} make z with x;");
    run_ok(
        r#"
        automate addNums(num: a, num: b) -> num {
            output a plus b;
        }
        make x with 9;
        make y with 1;
        change x to addNums(x, 5);
        print addNums(x, y);
    "#,
    );
}

#[test]
fn if_ifnot() {
    run_ok(r#"make x with 5 ; if x is 5 { print "X IS 5"; } ifnot { print "X IS NOT 5";}"#);
    run_ok("make x with true; if x{}");
}

#[test]
fn loops() {
    run_ok("make x with 0; loop while x is less than 5 {add 1 to x;}");
    run_ok("make x with 0; loop while x is less than 5 {add 1 to x; break;}");
    run_ok("make x with [1,2,3]; loop over e in x{print e;}");
    run_ok(
        r#"
        make this_list with [1,"hello", [1,2,3], []];
        loop over element in this_list {
            print element;
        }
    "#,
    );
}

#[test]
fn loops_in_loops() {
    run_ok(
        r#"
        make x with 0;
        loop while x is less than 10 {
            print x;
            if x is 5 {
                break;
            }
            add 1 to x;
        }
    "#,
    );
}

#[test]
fn operators() {
    run_ok(
        r#"
        make x with 1;
        change x to x plus 1;
        change x to x minus 1;
        change x to x times 1;
        change x to x divided by 1;
        change x to x to the 1;
        change x to x mod 1;
    "#,
    );
}

#[test]
fn variable_expressions() {
    run_ok(
        r#"
        make x with 1;
        add 1 to x;
        subtract 1 from x;
        multiply x by 1;
        divide x by 1;
        raise x to the 1;
        mod x by 1;
    "#,
    );
}

#[test]
fn boolean_expressions() {
    run_ok(
        r#"
        make a with 1 is greater than 2;
        make b with 1 is less than 2 ;
        make c with 1 is 2 ;
        make d with 1 is not 2 ;
        make e with 1 is greater than or equal to 2 ;
        make f with 1 is less than or equal to 2 ;
    "#,
    );
}

#[test]
fn parameters_do_not_leak() {
    run_ok("automate x(y) {} make y with 1;");
}

#[test]
fn sample_program_to_js() {
    let out = run_ok(
        r#"
        make x with 5;
        if x is 5 {
            print "X IS 5";
        }
        ifnot {
            print "X IS NOT 5";
        }
    "#,
    );
    assert_eq!(
        out.to_string(),
        [
            "let x_1 = 5;",
            "if (x_1 === 5) {",
            "  console.log(\"X IS 5\");",
            "} else {",
            "  console.log(\"X IS NOT 5\");",
            "}",
        ]
        .join("\n")
    );
}

#[test]
fn analyzed_output_is_a_tree() {
    setup();
    let out = Compiler::default()
        .compile("make x with 5;", Stage::Analyzed)
        .unwrap();
    let text = out.to_string();
    assert!(text.contains("VarDecl"), "{}", text);
    assert!(text.contains("\"x\""), "{}", text);
}

#[test]
fn compiles_are_independent() {
    let c = Compiler::default();
    c.compile("make x with 1;", Stage::Js).unwrap();
    c.compile("make x with 1;", Stage::Js).unwrap();
}

#[test]
fn syntax_errors() {
    assert_err("make x with 0", ErrorKind::Syntax, "Expected \";\"");
    assert_err("make 5 with 5;", ErrorKind::Syntax, "identifier");
    assert_err("make if with 5;", ErrorKind::Syntax, "identifier");
    assert_err("ifnot{}", ErrorKind::Syntax, "ifnot");
    assert_err("make x with [1,2,3;", ErrorKind::Syntax, "Expected \"]\"");
    assert_err("make x with \"hello;", ErrorKind::Syntax, "Unterminated string");
}

#[test]
fn lookup_errors() {
    assert_err("change x to 1;", ErrorKind::ContextLookup, "Identifier 'x' not declared.");
    assert_err("add 5 to x;", ErrorKind::ContextLookup, "Identifier 'x' not declared.");
    assert_err("print x;", ErrorKind::ContextLookup, "Identifier 'x' not declared.");
}

#[test]
fn redeclaration() {
    let msg = "Identifier 'x' has already been declared.";
    assert_err("make x with 1; make x with 2;", ErrorKind::ContextAdd, msg);
    assert_err("automate x(y){} automate x(z){}", ErrorKind::ContextAdd, msg);
    assert_err("make x with 1; automate x(y){}", ErrorKind::ContextAdd, msg);
    assert_err("automate x(y){} make x with 2;", ErrorKind::ContextAdd, msg);
    assert_err(
        "make x with 1; loop while true { make x with 2; }",
        ErrorKind::ContextAdd,
        msg,
    );
    assert_err("make π with 3;", ErrorKind::ContextAdd, "'π'");
}

#[test]
fn assign_errors() {
    let msg = "Cannot assign value to automation 'x'.";
    assert_err("automate x(y){} change x to 5;", ErrorKind::Assign, msg);
    assert_err("automate x(y){} add 5 to x;", ErrorKind::Assign, msg);
    assert_err("automate x(y){} multiply x by 5;", ErrorKind::Assign, msg);
    assert_err(
        "constantly make x with 1; change x to 2;",
        ErrorKind::Assign,
        "Cannot change value of constant 'x'.",
    );
    assert_err("make x with 1; change x to true;", ErrorKind::Assign, "boolean");
}

#[test]
fn read_only_is_absolute() {
    for stmt in &[
        "change x to 2;",
        "add 1 to x;",
        "subtract 1 from x;",
        "multiply x by 2;",
        "divide x by 2;",
        "raise x to the 2;",
        "mod x by 2;",
    ] {
        let src = format!("constantly make x with 1; {}", stmt);
        assert_err(&src, ErrorKind::Assign, "constant 'x'");
    }
}

#[test]
fn call_errors() {
    assert_err(
        "make x with 5; x(5);",
        ErrorKind::Call,
        "Trying to call Variable 'x' as an Automation.",
    );
    assert_err(
        "make x with 2; multiply x by x(2);",
        ErrorKind::Call,
        "Trying to call Variable 'x' as an Automation.",
    );
    assert_err(
        "automate x ( y, z ) -> num { output y plus z; } x(1);",
        ErrorKind::Call,
        "Expected 2 arg(s), found 1.",
    );
    assert_err(
        "automate x ( y, z ) -> num { output y plus z; } x(1,2,3);",
        ErrorKind::Call,
        "Expected 2 arg(s), found 3.",
    );
    assert_err("break;", ErrorKind::Call, "Break must be called in a loop.");
    assert_err("output 1;", ErrorKind::Call, "Output must be called in an automation.");
}

#[test]
fn arity_is_checked_before_types() {
    assert_err(
        "automate f(num: a) {} f(\"a\", \"b\");",
        ErrorKind::Call,
        "Expected 1 arg(s), found 2.",
    );
    assert_err(
        "automate f(num: a) {} f(\"a\");",
        ErrorKind::Call,
        "Argument 1 (word) must be of type: number.",
    );
}

#[test]
fn auto_errors() {
    let err = run_err("automate f() -> none { output 1; }");
    assert_eq!(err.kind(), ErrorKind::Auto);
    assert!(err.msg().contains("number") && err.msg().contains("none"));

    assert_err("automate f() -> num { }", ErrorKind::Auto, "'f' must have an output.");
    assert_err("automate f() -> any { output 1; }", ErrorKind::Auto, "cannot be any");
    assert_err("automate f(none: p) { }", ErrorKind::Auto, "parameter 'p'");
}

#[test]
fn type_errors() {
    assert_err(
        r#"make x with 5; make y with "hello"; add y to x;"#,
        ErrorKind::Type,
        "Expected a numeric value, got type 'word'.",
    );
    assert_err(
        "make x with 5; if x{}",
        ErrorKind::Type,
        "Expected a true/false value, got type 'number'",
    );
    assert_err("if 5 {}", ErrorKind::Type, "true/false");
    assert_err("automate f(str: s) {}", ErrorKind::Type, "Unknown type 'str'.");
}

#[test]
fn errors_are_located() {
    let err = run_err("make x with 1;\n  make x with 2;");
    assert!(
        err.to_string().starts_with("Line 2, col 8: ContextAddError"),
        "{}",
        err
    );
}

#[test]
fn rendered_errors_point_at_the_source() {
    let src = "make x with 1;\nprint y;";
    let err = run_err(src);
    assert_eq!(
        Compiler::render_error(src, &err),
        "print y;\n      ^\nLine 2, col 7: ContextLookupError: Identifier 'y' not declared."
    );
}

#[test]
fn backslash_before_end_of_input() {
    setup();
    let err = Compiler::default()
        .compile("print \"abc\\", Stage::Parsed)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(err.msg().contains("Unterminated string"), "{}", err);
}

#[test]
fn break_in_automation_nested_in_loop() {
    let src = "loop while true { automate f() { break; } break; }";
    setup();
    Compiler::default().compile(src, Stage::Analyzed).unwrap();
    assert_err(src, ErrorKind::Call, "cannot leave a loop outside it");
}
