#[cfg(test)]
mod interpreter_tests {
    use monkey_interpreter as monkey;

    use monkey::environment::Environment;
    use monkey::interpreter::Interpreter;
    use monkey::parser::parse;
    use monkey::value::Value;

    /// Evaluate `source` in a fresh global scope, returning the result and
    /// everything `print` wrote.
    fn eval_with_output(source: &str) -> (Value, String) {
        let program = parse(source).unwrap_or_else(|e| panic!("parse failed: {:?}", e));
        let env = Environment::new_global();
        let mut interpreter = Interpreter::with_output(Vec::new());

        let value = interpreter.evaluate(&program, &env);
        let output = String::from_utf8(interpreter.into_output()).unwrap();

        (value, output)
    }

    fn eval(source: &str) -> Value {
        eval_with_output(source).0
    }

    fn assert_integer(source: &str, expected: i64) {
        match eval(source) {
            Value::Integer(n) => assert_eq!(n, expected, "input: {}", source),
            other => panic!("{}: expected Integer({}), got {:?}", source, expected, other),
        }
    }

    fn assert_boolean(source: &str, expected: bool) {
        match eval(source) {
            Value::Boolean(b) => assert_eq!(b, expected, "input: {}", source),
            other => panic!("{}: expected Boolean({}), got {:?}", source, expected, other),
        }
    }

    fn assert_null(source: &str) {
        let value = eval(source);
        assert!(matches!(value, Value::Null), "{}: expected Null, got {:?}", source, value);
    }

    fn assert_string(source: &str, expected: &str) {
        match eval(source) {
            Value::String(s) => assert_eq!(s, expected, "input: {}", source),
            other => panic!("{}: expected String({:?}), got {:?}", source, expected, other),
        }
    }

    fn assert_error(source: &str, expected: &str) {
        match eval(source) {
            Value::Error(message) => assert_eq!(message, expected, "input: {}", source),
            other => panic!("{}: expected Error({:?}), got {:?}", source, expected, other),
        }
    }

    fn assert_integer_array(source: &str, expected: &[i64]) {
        match eval(source) {
            Value::Array(elements) => {
                let got: Vec<i64> = elements
                    .iter()
                    .map(|e| match e {
                        Value::Integer(n) => *n,
                        other => panic!("{}: non-integer element {:?}", source, other),
                    })
                    .collect();
                assert_eq!(got, expected, "input: {}", source);
            }
            other => panic!("{}: expected Array, got {:?}", source, other),
        }
    }

    #[test]
    fn integer_expressions() {
        let cases = [
            ("5", 5),
            ("10", 10),
            ("-5", -5),
            ("-10", -10),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("-50 + 100 + -50", 0),
            ("5 * 2 + 10", 20),
            ("5 + 2 * 10", 25),
            ("20 + 2 * -10", 0),
            ("50 / 2 * 2 + 10", 60),
            ("2 * (5 + 10)", 30),
            ("3 * 3 * 3 + 10", 37),
            ("3 * (3 * 3) + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
            ("7 / 2", 3),
            ("-7 / 2", -3),
        ];

        for (input, expected) in cases {
            assert_integer(input, expected);
        }
    }

    #[test]
    fn boolean_expressions() {
        let cases = [
            ("true", true),
            ("false", false),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 < 1", false),
            ("1 > 1", false),
            ("1 == 1", true),
            ("1 != 1", false),
            ("1 == 2", false),
            ("1 != 2", true),
            ("true == true", true),
            ("false == false", true),
            ("true == false", false),
            ("true != false", true),
            ("false != true", true),
            ("(1 < 2) == false", false),
            ("(1 > 2) == true", false),
            ("(1 < 2) == true", true),
            ("(1 > 2) == false", true),
            ("(1 <= 2) == true", true),
            ("(2 >= 1) == true", true),
            ("(1 >= 2) == true", false),
            ("(2 <= 1) == true", false),
        ];

        for (input, expected) in cases {
            assert_boolean(input, expected);
        }
    }

    #[test]
    fn logical_operators_coerce_to_truthiness() {
        let cases = [
            ("true && true", true),
            ("1 && 2", true),
            ("false || true", true),
            ("0 || 1", true),
            ("[] || 1", true),
            ("[] || \"true\"", true),
            ("\"\" || \"true\"", true),
            ("\"\" || [true]", true),
            ("\"\" || [1, 2]", true),
            ("false && false", false),
            ("true && false", false),
            ("false && true", false),
            ("0 && 0", false),
            ("0 || 0", false),
            ("false || false", false),
            ("\"\" && \"\"", false),
            ("\"\" && []", false),
            ("\"\" && true", false),
            ("[] && true", false),
        ];

        for (input, expected) in cases {
            assert_boolean(input, expected);
        }
    }

    #[test]
    fn logical_operators_short_circuit() {
        let source = "
            let hits = 0;
            let touch = fn() { hits = hits + 1; true };
            false && touch();
            true || touch();
            true && touch();
            false || touch();
            hits";

        assert_integer(source, 2);
    }

    #[test]
    fn logical_operators_yield_fresh_booleans() {
        assert_boolean("5 && 7", true);
        assert_boolean("\"a\" || 0", true);
    }

    #[test]
    fn bang_operator() {
        let cases = [
            ("!true", false),
            ("!false", true),
            ("!5", false),
            ("!!true", true),
            ("!!false", false),
            ("!!5", true),
            ("!0", true),
            ("!\"\"", true),
            ("![]", true),
        ];

        for (input, expected) in cases {
            assert_boolean(input, expected);
        }
    }

    #[test]
    fn if_else_expressions() {
        assert_integer("if (true) { 10 }", 10);
        assert_null("if (false) { 10 }");
        assert_integer("if (1) { 10 }", 10);
        assert_integer("if (1 < 2) { 10 }", 10);
        assert_null("if (1 > 2) { 10 }");
        assert_integer("if (1 > 2) { 10 } else { 20 }", 20);
        assert_integer("if (1 < 2) { 10 } else { 20 }", 10);
        assert_integer("if (1 > 2) { 10 } else if (2 > 1) { 30 } else { 20 }", 30);
        assert_null("if (true) { }");
    }

    #[test]
    fn return_statements() {
        assert_integer("return 10;", 10);
        assert_integer("return 10; 9;", 10);
        assert_integer("return 2 * 5; 9;", 10);
        assert_integer("9; return 2 * 5; 9;", 10);
        assert_integer(
            "
            if (10 > 1) {
              if (10 > 1) {
                return 10;
              }

              return 1;
            }",
            10,
        );
        assert_null("return;");
    }

    #[test]
    fn return_unwinds_only_to_the_enclosing_call() {
        let source = "
            let f = fn() {
              if (true) { if (true) { return 1; } }
              return 2;
            };
            f() + 10";

        assert_integer(source, 11);
    }

    #[test]
    fn error_handling() {
        let cases = [
            ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
            ("5; true + false; 5", "unknown operator: BOOLEAN + BOOLEAN"),
            ("if (10 > 1) { true + false; }", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "
                if (10 > 1) {
                  if (10 > 1) {
                    return true + false;
                  }

                  return 1;
                }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: foobar"),
            ("\"Hello\" - \"World\"", "unknown operator: STRING - STRING"),
            ("x = 31 + 38", "identifier not found: x"),
            ("true < false", "unknown operator: BOOLEAN < BOOLEAN"),
            ("[1] + [2]", "unknown operator: ARRAY + ARRAY"),
            ("1 == \"1\"", "type mismatch: INTEGER == STRING"),
            ("5(1)", "not a function: INTEGER"),
            ("1[0]", "index operator not supported: INTEGER"),
            ("[1][true]", "index must be INTEGER, got BOOLEAN"),
        ];

        for (input, expected) in cases {
            assert_error(input, expected);
        }
    }

    #[test]
    fn errors_stop_sibling_evaluation() {
        let (value, output) = eval_with_output("[print(1), 1 + true, print(2)]");

        assert!(value.is_error());
        assert_eq!(output, "1\n");

        let (value, output) = eval_with_output("let f = fn(a, b) { a }; f(missing, print(3))");

        assert!(matches!(value, Value::Error(ref m) if m == "identifier not found: missing"));
        assert_eq!(output, "");
    }

    #[test]
    fn errors_cross_function_boundaries() {
        assert_error(
            "let f = fn() { 1 + true; 99 }; let g = fn() { f(); 5 }; g(); 7",
            "type mismatch: INTEGER + BOOLEAN",
        );
    }

    #[test]
    fn assignment_checks_target_before_evaluating_value() {
        let (value, output) = eval_with_output("y = print(1)");

        assert!(matches!(value, Value::Error(ref m) if m == "identifier not found: y"));
        assert_eq!(output, "");
    }

    #[test]
    fn let_statements() {
        assert_integer("let a = 5; a;", 5);
        assert_integer("let a = 5 * 5; a;", 25);
        assert_integer("let a = 5; let b = a; b;", 5);
        assert_integer("let a = 5; let b = a; let c = a + b + 5; c;", 15);
        assert_null("let a = 5;");
    }

    #[test]
    fn redeclaring_in_the_same_scope_fails() {
        assert_error("let a = 1; let a = 2;", "a declared in for loop initialization");
        assert_integer("let a = 1; let f = fn() { let a = 2; a }; f() + a", 3);
    }

    #[test]
    fn reassignment_statements() {
        assert_integer("let a = 5; a = a + 1; a;", 6);
        assert_integer("let a = \"lol\"; a = [1, 2, 3]; a[0];", 1);
        assert_string("let s = \"Hello \"; s = s + \"World!\"; s;", "Hello World!");
        assert_integer("let a = 1; a = 41 + a", 42);
    }

    #[test]
    fn reassignment_reaches_the_owning_scope() {
        let source = "
            let count = 0;
            let outer = fn() {
              let middle = fn() {
                let inner = fn() { count = count + 1; };
                inner();
                inner();
              };
              middle();
            };
            outer();
            count";

        assert_integer(source, 2);
    }

    #[test]
    fn reassignment_inside_if_updates_outer_binding() {
        assert_integer("let x = 1; if (true) { x = 2; } x", 2);
        assert_error("if (true) { let y = 1; } y", "identifier not found: y");
    }

    #[test]
    fn function_object() {
        match eval("fn(x) { x + 2; };") {
            Value::Function(function) => {
                assert_eq!(function.parameters, vec!["x".to_string()]);
                assert_eq!(function.body.to_string(), "(x + 2)");
            }
            other => panic!("expected Function, got {:?}", other),
        }

        assert_eq!(eval("fn(x, y) { x + y }").to_string(), "fn(x, y) {\n(x + y)\n}");
    }

    #[test]
    fn function_application() {
        assert_integer("let identity = fn(x) { x; }; identity(5);", 5);
        assert_integer("let identity = fn(x) { return x; }; identity(5);", 5);
        assert_integer("let double = fn(x) { x * 2; }; double(5);", 10);
        assert_integer("let add = fn(x, y) { x + y; }; add(5, 5);", 10);
        assert_integer("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20);
        assert_integer("fn(x) { x; }(5)", 5);
        assert_null("fn() { }()");
    }

    #[test]
    fn function_arity_mismatch() {
        assert_error(
            "let add = fn(x, y) { x + y }; add(1)",
            "wrong number of arguments. got=1, want=2",
        );
        assert_error("fn() { 1 }(1, 2)", "wrong number of arguments. got=2, want=0");
    }

    #[test]
    fn recursion() {
        let source = "
            let fib = fn(n) { if (n < 2) { return n; } fib(n - 1) + fib(n - 2) };
            fib(15)";

        assert_integer(source, 610);
    }

    #[test]
    fn enclosing_environments() {
        let source = "
            let first = 10;
            let second = 10;
            let third = 10;

            let ourFunction = fn(first) {
              let second = 20;

              first + second + third;
            };

            ourFunction(20) + first + second;";

        assert_integer(source, 70);
    }

    #[test]
    fn closures() {
        let source = "
            let newAdder = fn(x) {
              fn(y) { x + y };
            };

            let addTwo = newAdder(2);
            addTwo(2);";

        assert_integer(source, 4);
    }

    #[test]
    fn closures_capture_independent_instances() {
        let source = "
            let newAdder = fn(x) { fn(y) { x + y } };
            let addTwo = newAdder(2);
            let addTen = newAdder(10);
            addTwo(1) * 100 + addTen(1)";

        assert_integer(source, 311);
    }

    #[test]
    fn closures_share_captured_scope() {
        let source = "
            let counter = fn() {
              let n = 0;
              fn() { n = n + 1; n }
            };
            let tick = counter();
            tick();
            tick();
            tick()";

        assert_integer(source, 3);
    }

    #[test]
    fn closures_see_later_rebinding() {
        assert_integer("let x = 1; let f = fn() { x }; x = 5; f()", 5);
    }

    #[test]
    fn strings() {
        assert_string("\"Hello World!\"", "Hello World!");
        assert_string("\"Hello\" + \" \" + \"World!\"", "Hello World!");
        assert_boolean("\"a\" == \"a\"", true);
        assert_boolean("\"a\" != \"a\"", false);
        assert_error("\"a\" < \"b\"", "unknown operator: STRING < STRING");
    }

    #[test]
    fn equality_for_reference_values_is_identity() {
        assert_boolean("let a = [1]; a == a", true);
        assert_boolean("[1] == [1]", false);
        assert_boolean("let f = fn() { 1 }; f == f", true);
        assert_boolean("len == len", true);
        assert_boolean("first([]) == last([])", true);
        assert_boolean("let a = [1]; a != push(a, 2)", true);
    }

    #[test]
    fn division_by_zero_is_an_error_value() {
        assert_error("10 / 0", "division by zero");
        assert_error("let f = fn(d) { 1 / d }; f(0); 5", "division by zero");
    }

    #[test]
    fn integer_arithmetic_wraps() {
        assert_integer("9223372036854775807 + 1", i64::MIN);
        assert_integer("(-9223372036854775807 - 1) / -1", i64::MIN);
        assert_integer("-(-9223372036854775807 - 1)", i64::MIN);
    }

    #[test]
    fn builtin_functions() {
        assert_integer("len(\"\")", 0);
        assert_integer("len(\"four\")", 4);
        assert_integer("len(\"hello world\")", 11);
        assert_error("len(1)", "argument to `len` not supported, got INTEGER");
        assert_error("len([1, 2])", "argument to `len` not supported, got ARRAY");
        assert_error("len(\"one\", \"two\")", "wrong number of arguments. got=2, want=1");
        assert_integer("first([1, 2, 3])", 1);
        assert_null("first([])");
        assert_integer("last([1, 2, 3])", 3);
        assert_null("last([])");
        assert_integer_array("rest([1, 2, 3])", &[2, 3]);
        assert_integer_array("rest([1])", &[]);
        assert_null("rest([])");
        assert_integer_array("push([1], 2)", &[1, 2]);
        assert_integer_array("push([], 1)", &[1]);
        assert_integer_array("pop([1, 2, 3])", &[1, 2]);
        assert_integer_array("pop([1])", &[]);
        assert_null("pop([])");
        assert_boolean("bool(true)", true);
        assert_boolean("bool(false)", false);
        assert_boolean("bool(\"\")", false);
        assert_boolean("bool([])", false);
        assert_boolean("bool(\"false\")", true);
        assert_boolean("bool([false])", true);
        assert_boolean("bool(0)", false);
        assert_null("print(\"\")");
        assert_null("print()");
    }

    #[test]
    fn array_builtins_do_not_mutate_their_input() {
        assert_integer_array("let a = [1]; let b = push(a, 2); a", &[1]);
        assert_integer_array("let a = [1, 2, 3]; pop(a); rest(a); a", &[1, 2, 3]);
    }

    #[test]
    fn print_writes_to_the_output_sink() {
        let (value, output) =
            eval_with_output("print(\"hi\"); print([1, \"a\"]); print(); print(fn(x) { x })");

        assert!(matches!(value, Value::Null));
        assert_eq!(output, "hi\n[1, a]\n\nfn(x) {\nx\n}\n");
    }

    #[test]
    fn builtins_can_be_shadowed_by_user_bindings() {
        assert_integer("let len = fn(x) { 42 }; len(\"abc\")", 42);
        assert_integer("let f = fn(first) { first }; f(7)", 7);
        assert_integer("len(\"abc\")", 3);
    }

    #[test]
    fn builtins_are_first_class() {
        assert_integer("let size = len; size(\"four\")", 4);
        assert_integer("let apply = fn(f, x) { f(x) }; apply(first, [9, 8])", 9);
        assert_eq!(eval("len").to_string(), "builtin function len");
    }

    #[test]
    fn array_literals() {
        assert_integer_array("[1, 2 * 2, 3 + 3]", &[1, 4, 6]);
        assert_integer_array("[]", &[]);
    }

    #[test]
    fn array_index_expressions() {
        assert_integer("[1, 2, 3][0]", 1);
        assert_integer("[1, 2, 3][1]", 2);
        assert_integer("[1, 2, 3][2]", 3);
        assert_integer("let i = 0; [1][i];", 1);
        assert_integer("[1, 2, 3][1 + 1];", 3);
        assert_integer("let myArray = [1, 2, 3]; myArray[2];", 3);
        assert_integer("let myArray = [1, 2, 3]; myArray[0] + myArray[1] + myArray[2];", 6);
        assert_integer("let myArray = [1, 2, 3]; let i = myArray[0]; myArray[i]", 2);
        assert_null("[1, 2, 3][3]");
        assert_null("[1, 2, 3][-1]");
    }

    #[test]
    fn for_loops() {
        let source = "
            let sum = 0;
            for (let i = 0; i < 5; i = i + 1) {
              let doubled = i * 2;
              sum = sum + doubled;
            }
            sum";

        assert_integer(source, 20);
        assert_null("for (let i = 0; i < 3; i = i + 1) { i }");
    }

    #[test]
    fn for_loop_break_and_continue() {
        let source = "
            let sum = 0;
            for (let i = 0; i < 100; i = i + 1) {
              if (i == 5) { break; }
              if (i == 2) { continue; }
              sum = sum + i;
            }
            sum";

        assert_integer(source, 8);
        assert_integer("let n = 0; for (;;) { n = n + 1; if (n == 4) { break; } } n", 4);
    }

    #[test]
    fn for_loop_followed_by_semicolon_continues_the_program() {
        let source = "
            let s = 0;
            for (let i = 0; i < 3; i = i + 1) { s = s + i; };
            s = s * 10;
            s";

        assert_integer(source, 30);
    }

    #[test]
    fn duplicate_parameters_are_rejected_before_evaluation() {
        let errors = parse("fn(x, x) { x }(1, 2)").unwrap_err();

        assert_eq!(errors[0].message(), "Duplicate parameter name 'x'");
    }

    #[test]
    fn for_loop_scope_does_not_leak() {
        assert_error(
            "for (let i = 0; i < 1; i = i + 1) { } i",
            "identifier not found: i",
        );
    }

    #[test]
    fn return_inside_loop_leaves_the_function() {
        let source = "
            let find = fn(arr, target, n) {
              for (let i = 0; i < n; i = i + 1) {
                if (arr[i] == target) { return i; }
              }
              return -1;
            };
            find([4, 5, 6], 6, 3) * 10 + find([1], 9, 1)";

        assert_integer(source, 19);
    }

    #[test]
    fn loop_control_outside_a_loop_is_an_error() {
        assert_error("break;", "break outside of loop");
        assert_error("continue; 5", "continue outside of loop");
        assert_error(
            "let f = fn() { break; }; for (;;) { f(); }",
            "break outside of loop",
        );
    }

    #[test]
    fn errors_inside_loops_propagate() {
        assert_error(
            "for (let i = 0; i < 3; i = i + 1) { if (i == 1) { i + true } }",
            "type mismatch: INTEGER + BOOLEAN",
        );
    }

    #[test]
    fn evaluation_is_repeatable_on_fresh_environments() {
        let program =
            parse("let a = [1, 2]; let f = fn(x) { push(x, len(\"ab\")) }; f(a)").unwrap();

        let first =
            Interpreter::with_output(Vec::new()).evaluate(&program, &Environment::new_global());
        let second =
            Interpreter::with_output(Vec::new()).evaluate(&program, &Environment::new_global());

        assert_eq!(first.to_string(), "[1, 2, 2]");
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn global_environment_persists_across_programs() {
        let env = Environment::new_global();
        let mut interpreter = Interpreter::with_output(Vec::new());

        interpreter.evaluate(&parse("let x = 40;").unwrap(), &env);
        let value = interpreter.evaluate(&parse("x + 2").unwrap(), &env);

        assert!(matches!(value, Value::Integer(42)));
    }
}
