//! Integration tests for horn-db
//!
//! Builds clause databases the way a front end would and checks the text
//! each output path produces.

use horn_db::{
    ConstraintPolicy, CoverConstraint, HeadNormalization, HornClause, HornClauseDb, HornError,
    HornFormat, HornWrite, HornWriteConfig, Query,
};
use horn_expr::ir::{FunctionBuilder, Type};
use horn_expr::{ExprFactory, ExprId, Sort};
use std::io::Read;

fn write(config: HornWriteConfig, db: &mut HornClauseDb, efac: &mut ExprFactory) -> String {
    let mut out = Vec::new();
    HornWrite::new(config)
        .run(db, efac, &mut out)
        .expect("write failed");
    String::from_utf8(out).expect("output is not utf-8")
}

/// Scenario A: `f(x) :- x > 0`, with `f` already a relation.
fn scenario_a() -> (ExprFactory, HornClauseDb) {
    let mut efac = ExprFactory::new();
    let mut db = HornClauseDb::new();
    let f = efac.mk_decl("f", vec![Sort::Int]);
    db.register_relation(&efac, f).unwrap();
    let x = efac.mk_var("x", Sort::Int);
    let zero = efac.mk_int(0);
    let gt = efac.mk_gt(x, zero);
    let head = efac.mk_fapp(f, vec![x]).unwrap();
    db.add_rule(HornClause::new(vec![gt], head));
    db.set_query(Query::new(vec![head]));
    (efac, db)
}

/// Scenario B: `f(x) \/ g(x) :- x > 0`.
fn scenario_b() -> (ExprFactory, HornClauseDb, ExprId, ExprId) {
    let mut efac = ExprFactory::new();
    let mut db = HornClauseDb::new();
    let f = efac.mk_decl("f", vec![Sort::Int]);
    let g = efac.mk_decl("g", vec![Sort::Int]);
    db.register_relation(&efac, f).unwrap();
    db.register_relation(&efac, g).unwrap();
    let x = efac.mk_var("x", Sort::Int);
    let zero = efac.mk_int(0);
    let gt = efac.mk_gt(x, zero);
    let fx = efac.mk_fapp(f, vec![x]).unwrap();
    let gx = efac.mk_fapp(g, vec![x]).unwrap();
    let head = efac.mk_or(vec![fx, gx]);
    db.add_rule(HornClause::new(vec![gt], head));
    db.set_query(Query::new(vec![fx, gx]));
    (efac, db, fx, gx)
}

#[test]
fn test_scenario_a_clp() {
    let (mut efac, mut db) = scenario_a();
    let text = write(
        HornWriteConfig::with_format(HornFormat::Clp),
        &mut db,
        &mut efac,
    );
    assert_eq!(text, "f(X) :- X>0.\nfalse :- f(X).\n");
}

#[test]
fn test_scenario_a_smt2() {
    let (mut efac, mut db) = scenario_a();
    let before = db.rules().to_vec();
    let text = write(HornWriteConfig::default(), &mut db, &mut efac);
    let expected = "\
(declare-rel f (Int))
(declare-var x Int)
(rule (=> (> x 0) (f x)))
(query (f x))
";
    assert_eq!(text, expected);
    // normalization was a no-op
    assert_eq!(db.rules(), &before[..]);
    assert_eq!(db.relations().len(), 1);
}

#[test]
fn test_scenario_a_native() {
    let (mut efac, mut db) = scenario_a();
    let config = HornWriteConfig {
        internal_writer: false,
        ..HornWriteConfig::default()
    };
    let text = write(config, &mut db, &mut efac);
    let expected = "\
(set-logic HORN)
(declare-fun f (Int) Bool)
(assert (forall ((x Int)) (=> (> x 0) (f x))))
(assert (forall ((x Int)) (=> (f x) false)))
(check-sat)
";
    assert_eq!(text, expected);
}

#[test]
fn test_scenario_b_smt2() {
    let (mut efac, mut db, _, _) = scenario_b();
    let text = write(HornWriteConfig::default(), &mut db, &mut efac);

    assert!(text.contains("(declare-rel f (Int))\n"), "{text}");
    assert!(text.contains("(declare-rel g (Int))\n"), "{text}");
    assert!(text.contains("(declare-rel head_rel_0 (Int))\n"), "{text}");
    assert!(text.contains("(rule (=> (> x 0) (head_rel_0 x)))\n"), "{text}");
    assert!(text.contains("(rule (=> (f x) (head_rel_0 x)))\n"), "{text}");
    assert!(text.contains("(rule (=> (g x) (head_rel_0 x)))\n"), "{text}");
    assert!(!text.contains("(or "), "{text}");
}

#[test]
fn test_scenario_b_normalized_heads() {
    let (mut efac, mut db, fx, gx) = scenario_b();
    let (_, summary) = HornWrite::default().render(&mut db, &mut efac).unwrap();
    let stats = summary.normalized.unwrap();
    assert_eq!(stats.relations_added, 1);
    assert_eq!(stats.clauses_added, 2);
    assert_eq!(summary.rules, 3);

    for rule in db.rules() {
        assert!(db.is_relation_app(&efac, rule.head));
    }
    let h = db.relations()[2];
    let x = efac.fapp_args(fx)[0];
    let defining: Vec<_> = db.rules_defining(&efac, h).collect();
    assert_eq!(defining.len(), 3);
    for rule in &defining {
        assert_eq!(efac.fapp_args(rule.head), &[x]);
    }
    assert!(defining.iter().any(|r| r.body == vec![fx]));
    assert!(defining.iter().any(|r| r.body == vec![gx]));
}

#[test]
fn test_scenario_b_clp_rejects_disjunctive_head() {
    let (mut efac, mut db, _, _) = scenario_b();
    let rules = db.rules().to_vec();
    let mut out = Vec::new();
    let err = HornWrite::new(HornWriteConfig::with_format(HornFormat::Clp))
        .run(&mut db, &mut efac, &mut out)
        .unwrap_err();
    assert!(matches!(err, HornError::NonRelationalHead(ref h) if h == "(or (f x) (g x))"));
    assert!(out.is_empty());
    assert_eq!(db.rules(), &rules[..]);
    assert_eq!(db.relations().len(), 2);
}

#[test]
fn test_clp_rejects_comparison_head() {
    let mut efac = ExprFactory::new();
    let mut db = HornClauseDb::new();
    let x = efac.mk_var("x", Sort::Int);
    let y = efac.mk_var("y", Sort::Int);
    let zero = efac.mk_int(0);
    let gt = efac.mk_gt(x, zero);
    let lt = efac.mk_lt(y, zero);
    db.add_rule(HornClause::new(vec![gt], lt));
    db.set_query(Query::new(vec![gt]));

    let mut out = Vec::new();
    let err = HornWrite::new(HornWriteConfig::with_format(HornFormat::Clp))
        .run(&mut db, &mut efac, &mut out)
        .unwrap_err();
    assert!(matches!(err, HornError::NonRelationalHead(_)));
    assert!(out.is_empty());
}

/// `p(x)` with `x: Int` and `s(x)` with `x: Bool`. Both SMT2 writers accept
/// the database and keep the two variables apart.
#[test]
fn test_same_var_name_with_two_sorts() {
    let mut efac = ExprFactory::new();
    let mut db = HornClauseDb::new();
    let p = efac.mk_decl("p", vec![Sort::Int]);
    let s = efac.mk_decl("s", vec![Sort::Bool]);
    db.register_relation(&efac, p).unwrap();
    db.register_relation(&efac, s).unwrap();
    let x_int = efac.mk_var("x", Sort::Int);
    let x_bool = efac.mk_var("x", Sort::Bool);
    let px = efac.mk_fapp(p, vec![x_int]).unwrap();
    let sx = efac.mk_fapp(s, vec![x_bool]).unwrap();
    db.add_fact(px);
    db.add_fact(sx);
    db.set_query(Query::new(vec![px, sx]));

    let internal = write(HornWriteConfig::default(), &mut db, &mut efac);
    let expected = "\
(declare-rel p (Int))
(declare-rel s (Bool))
(declare-var x Int)
(declare-var x!1 Bool)
(rule (p x))
(rule (s x!1))
(query (and (p x) (s x!1)))
";
    assert_eq!(internal, expected);

    let native = write(
        HornWriteConfig {
            internal_writer: false,
            ..HornWriteConfig::default()
        },
        &mut db,
        &mut efac,
    );
    let expected = "\
(set-logic HORN)
(declare-fun p (Int) Bool)
(declare-fun s (Bool) Bool)
(assert (forall ((x Int)) (p x)))
(assert (forall ((x!1 Bool)) (s x!1)))
(assert (forall ((x Int) (x!1 Bool)) (=> (and (p x) (s x!1)) false)))
(check-sat)
";
    assert_eq!(native, expected);
}

#[test]
fn test_canonical_head_args_keep_one_sort_per_name() {
    let mut efac = ExprFactory::new();
    let mut db = HornClauseDb::new();
    let r = efac.mk_decl("r", vec![Sort::Int, Sort::Int]);
    let q = efac.mk_decl("q", vec![Sort::Bool, Sort::Bool]);
    db.register_relation(&efac, r).unwrap();
    db.register_relation(&efac, q).unwrap();
    let x = efac.mk_var("x", Sort::Int);
    let b = efac.mk_var("b", Sort::Bool);
    let rxx = efac.mk_fapp(r, vec![x, x]).unwrap();
    let qbb = efac.mk_fapp(q, vec![b, b]).unwrap();
    db.add_fact(rxx);
    db.add_fact(qbb);
    db.set_query(Query::new(vec![rxx]));

    for internal_writer in [true, false] {
        let config = HornWriteConfig {
            internal_writer,
            canonical_head_args: true,
            ..HornWriteConfig::default()
        };
        let mut db = db.clone();
        let text = write(config, &mut db, &mut efac);
        assert!(!text.contains("!1"), "{text}");
        if internal_writer {
            assert!(text.contains("(declare-var hd_arg_0 Int)\n"), "{text}");
            assert!(text.contains("(declare-var hd_arg_1 Bool)\n"), "{text}");
        }
    }
}

#[test]
fn test_format_selection() {
    let (mut efac, mut db) = scenario_a();
    let clp = write(
        HornWriteConfig::with_format(HornFormat::Clp),
        &mut db,
        &mut efac,
    );
    assert!(!clp.contains("(rule"));
    assert!(!clp.contains("(assert"));

    for internal_writer in [true, false] {
        let config = HornWriteConfig {
            internal_writer,
            ..HornWriteConfig::default()
        };
        let smt2 = write(config, &mut db, &mut efac);
        assert!(!smt2.contains(":-"));
    }
}

#[test]
fn test_never_normalize_rejects_compound_head() {
    let (mut efac, mut db, _, _) = scenario_b();
    let config = HornWriteConfig {
        head_normalization: HeadNormalization::Never,
        ..HornWriteConfig::default()
    };
    let mut out = Vec::new();
    let err = HornWrite::new(config)
        .run(&mut db, &mut efac, &mut out)
        .unwrap_err();
    assert!(matches!(err, HornError::NonRelationalHead(_)));
    assert!(out.is_empty());
}

#[test]
fn test_missing_relation_writes_nothing() {
    let (mut efac, mut db) = scenario_a();
    let ghost = efac.mk_decl("ghost", vec![]);
    let app = efac.mk_fapp(ghost, vec![]).unwrap();
    db.add_fact(app);

    let mut out = Vec::new();
    let err = HornWrite::default()
        .run(&mut db, &mut efac, &mut out)
        .unwrap_err();
    assert!(matches!(err, HornError::UndefinedRelation(ref n) if n == "ghost"));
    assert!(out.is_empty());
}

#[test]
fn test_constraints_rejected_by_policy() {
    let (mut efac, mut db) = scenario_a();
    let head = db.rules()[0].head;
    let t = efac.mk_true();
    db.add_constraint(CoverConstraint { app: head, formula: t });

    let config = HornWriteConfig {
        constraint_policy: ConstraintPolicy::Reject,
        ..HornWriteConfig::with_format(HornFormat::Clp)
    };
    let mut out = Vec::new();
    let err = HornWrite::new(config)
        .run(&mut db, &mut efac, &mut out)
        .unwrap_err();
    assert!(matches!(err, HornError::UnsupportedConstraints(1)));
    assert!(out.is_empty());

    // default policy drops them
    let text = write(HornWriteConfig::default(), &mut db, &mut efac);
    assert!(text.contains("(rule (=> (> x 0) (f x)))"));
}

/// Two instructions named `x` in different functions stay distinct all
/// the way to the output.
#[test]
fn test_ir_names_unique_in_output() {
    let f = FunctionBuilder::new("f")
        .block("entry")
        .inst(Some("x"), Type::Int(32), "add i32 1, 2")
        .build();
    let g = FunctionBuilder::new("g")
        .block("entry")
        .inst(Some("x"), Type::Int(32), "mul i32 3, 4")
        .build();

    let mut efac = ExprFactory::new();
    let mut db = HornClauseDb::new();
    let rel = efac.mk_decl("pair", vec![Sort::Int, Sort::Int]);
    db.register_relation(&efac, rel).unwrap();
    let fx = efac.mk_value_const(f.instruction("x").unwrap()).unwrap();
    let gx = efac.mk_value_const(g.instruction("x").unwrap()).unwrap();
    assert_ne!(fx, gx);
    let head = efac.mk_fapp(rel, vec![fx, gx]).unwrap();
    let lt = efac.mk_lt(fx, gx);
    db.add_rule(HornClause::new(vec![lt], head));
    db.set_query(Query::new(vec![head]));

    let text = write(HornWriteConfig::default(), &mut db, &mut efac);
    assert!(text.contains("(declare-var f@%x Int)\n"), "{text}");
    assert!(text.contains("(declare-var g@%x Int)\n"), "{text}");
    assert!(text.contains("(rule (=> (< f@%x g@%x) (pair f@%x g@%x)))\n"), "{text}");

    let clp = write(
        HornWriteConfig::with_format(HornFormat::Clp),
        &mut db,
        &mut efac,
    );
    assert!(clp.starts_with("pair(F__x,G__x) :- F__x<G__x.\n"), "{clp}");
}

#[test]
fn test_write_to_file() {
    let (mut efac, mut db) = scenario_a();
    let mut file = tempfile::tempfile().expect("Failed to create temp file");
    let summary = HornWrite::default()
        .run(&mut db, &mut efac, &mut file)
        .expect("write failed");

    use std::io::Seek;
    file.rewind().unwrap();
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    assert_eq!(contents.len(), summary.bytes);
    assert!(contents.starts_with("(declare-rel f (Int))\n"));
}

#[test]
fn test_config_from_json() {
    let config: HornWriteConfig =
        serde_json::from_str(r#"{"format":"clp","constraint_policy":"reject"}"#).unwrap();
    assert_eq!(config.format, HornFormat::Clp);
    assert_eq!(config.constraint_policy, ConstraintPolicy::Reject);
    assert!(config.internal_writer);

    let (mut efac, mut db) = scenario_a();
    let text = write(config, &mut db, &mut efac);
    assert!(text.starts_with("f(X) :- X>0."));
}
