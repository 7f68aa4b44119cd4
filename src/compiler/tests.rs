use super::*;

macro_rules! unwrap {
    ($a: expr, $src: expr) => {{
        match $a {
            Ok(a) => a,
            Err(e) => {
                let (msg, _) = report(vec![OptimizeError::annotated(e)], "unit test", $src, &Options::default());
                panic!("{}", msg);
            },
        }
    }};
}

fn optimize(build: impl FnOnce(&mut Ast) -> ExprId) -> String {
    let mut ast = Ast::new();
    let root = build(&mut ast);
    let src = ast.display(root).to_string();

    let root = unwrap!(Optimizer::default().optimize(&mut ast, root), &src);
    ast.display(root).to_string()
}

macro_rules! test_on {
    ($name: ident : |$ast: ident| $build: block -> $exp: tt) => {
        #[test]
        fn $name() {
            assert_eq!(optimize(|$ast: &mut Ast| $build), $exp);
        }
    };
}

fn part(owner: &str, name: &str, target: &str) -> PartRef { PartRef::new(owner, name, target) }

test_on!(unused_parameter_frees_invariant:
    |ast| {
        let people = ast.all("Person");
        let companies = ast.all("Company");
        let name = ast.part(part("Company", "name", "string"));
        let filter = ast.filter(companies, name);
        let lambda = ast.lambda("p", filter);
        ast.foreach(people, lambda)
    }
    -> "foreach(all(`Person`), filter(all(`Company`), ($#0 -> $#0.get(`Company#name`))))"
);

test_on!(join_hoists_both_sides:
    |ast| {
        let people = ast.all("Person");
        let companies = ast.all("Company");
        let c = ast.var("c");
        let name = ast.access(c, part("Company", "name", "string"));
        let p = ast.var("p");
        let employer = ast.access(p, part("Person", "employer", "string"));
        let eq = ast.is_equal(name, employer);
        let c_lambda = ast.lambda("c", eq);
        let filter = ast.filter(companies, c_lambda);
        let p_lambda = ast.lambda("p", filter);
        ast.foreach(people, p_lambda)
    }
    -> "call(($#0 -> foreach(all(`Person`), ($p -> call(($#1 -> filter($#0, ($c -> ($c.get(`Company#name`) == $#1)))), \
    $p.get(`Person#employer`))))), all(`Company`))"
);

test_on!(inlined_limit_and_redundant_conjunct:
    |ast| {
        let people = ast.all("Person");
        let p = ast.var("p");
        let age = ast.access(p, part("Person", "age", "integer"));
        let limit = ast.var("limit");
        let gt = ast.compare_op(CompareKind::Gt, age, limit);
        let t = ast.literal(true);
        let and = ast.and(gt, t);
        let lambda = ast.lambda("p", and);
        let filter = ast.filter(people, lambda);
        let three = ast.literal(3);
        ast.call_let("limit", three, filter)
    }
    -> "filter(all(`Person`), ($p -> ($p.get(`Person#age`) > 3)))"
);

test_on!(shared_binding_is_kept_and_its_value_folded:
    |ast| {
        let x = ast.var("x");
        let seven = ast.literal(7);
        let product = ast.arithmetic(ArithmeticOp::Mul, x, seven);
        let y1 = ast.var("y");
        let y2 = ast.var("y");
        let list = ast.list(vec![y1, y2]);
        let size = ast.size(list);
        let inner = ast.call_let("y", product, size);
        let six = ast.literal(6);
        ast.call_let("x", six, inner)
    }
    -> "call(($y -> size(list($y, $y))), 42)"
);

test_on!(dead_branch:
    |ast| {
        let f = ast.literal(false);
        let kb = ast.kb_query("q");
        let condition = ast.and(f, kb);
        let all = ast.all("A");
        let one = ast.literal(1);
        let two = ast.literal(2);
        let list = ast.list(vec![one, two]);
        ast.if_else(condition, all, list)
    }
    -> "[1, 2]"
);

test_on!(conjunction_coerces_to_boolean:
    |ast| {
        let t = ast.literal(true);
        let all = ast.all("Person");
        ast.and(t, all)
    }
    -> "toBoolean(all(`Person`))"
);

test_on!(concatenation_after_inlining:
    |ast| {
        let s = ast.var("s");
        let one = ast.literal(1);
        let two = ast.literal(2);
        let three = ast.literal(3);
        let list = ast.list(vec![one, two, three]);
        let size = ast.size(list);
        let body = ast.add(s, size);
        let n = ast.literal("n");
        ast.call_let("s", n, body)
    }
    -> "'n3'"
);

test_on!(side_effects_survive:
    |ast| {
        let random = ast.method("random", vec![]);
        let now = ast.method("now", vec![]);
        let list = ast.list(vec![random, now]);
        let v = ast.literal("up");
        let upper = ast.method("toUpperCase", vec![v]);
        ast.block(vec![list, upper])
    }
    -> "{list(random(), now()); 'UP'}"
);

#[test]
#[should_panic(expected = "cannot find variable `$z`")]
fn unresolved_variable_is_reported() {
    optimize(|ast| {
        let people = ast.all("Person");
        let z = ast.var("z");
        let lambda = ast.lambda("p", z);
        ast.foreach(people, lambda)
    });
}
