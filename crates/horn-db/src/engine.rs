//! Fixed-point engine seam
//!
//! The relational output path hands the clause database to a fixed-point
//! engine, which keeps its own representation of relations and rules. The
//! engine can print itself in its native format ([`FixedPoint::to_native_string`]),
//! or be printed by this crate's formatter (`smt2::render`). The two texts
//! differ byte for byte but state the same clauses.
//!
//! [`HornEngine`] is the in-tree engine. Its native format is the
//! CHC-COMP dialect of SMT-LIB:
//!
//! ```text
//! (set-logic HORN)
//! (declare-fun inv (Int) Bool)
//! (assert (forall ((x Int)) (=> (= x 0) (inv x))))
//! (assert (forall ((x Int)) (=> (and (inv x) (< x 0)) false)))
//! (check-sat)
//! ```

use crate::{HornError, HornResult};
use horn_expr::Sort;
use num_bigint::BigInt;
use num_traits::Signed;
use rustc_hash::FxHashMap;
use std::fmt;
use std::fmt::Write as _;

/// Engine-side term: an SMT-LIB s-expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Bool(bool),
    Int(BigInt),
    /// Symbol, already quoted if it needs to be
    Sym(String),
    App(String, Vec<Term>),
}

impl Term {
    /// Conjunction of `terms`: `true` when empty, the term itself when single.
    pub fn conjunction(terms: &[Term]) -> Term {
        match terms {
            [] => Term::Bool(true),
            [single] => single.clone(),
            _ => Term::App("and".to_string(), terms.to_vec()),
        }
    }

    /// Name of the head symbol (`f` for both `f` and `(f ...)`).
    pub fn head_symbol(&self) -> Option<&str> {
        match self {
            Term::Sym(name) | Term::App(name, _) => Some(name),
            _ => None,
        }
    }

    fn args(&self) -> &[Term] {
        match self {
            Term::App(_, args) => args,
            _ => &[],
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Bool(b) => write!(f, "{b}"),
            Term::Int(n) if n.is_negative() => write!(f, "(- {})", n.abs()),
            Term::Int(n) => write!(f, "{n}"),
            Term::Sym(name) => f.write_str(name),
            Term::App(name, args) => {
                write!(f, "({name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Relation signature as known to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSig {
    pub name: String,
    pub domain: Vec<Sort>,
}

/// Universally quantified variable of a rule or query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineVar {
    pub name: String,
    pub sort: Sort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRule {
    pub vars: Vec<EngineVar>,
    pub body: Vec<Term>,
    pub head: Term,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineQuery {
    pub vars: Vec<EngineVar>,
    pub body: Vec<Term>,
}

/// What the writer needs from a fixed-point engine.
pub trait FixedPoint {
    fn register_relation(&mut self, relation: RelationSig) -> HornResult<()>;
    fn add_rule(&mut self, rule: EngineRule) -> HornResult<()>;
    fn set_query(&mut self, query: EngineQuery) -> HornResult<()>;

    fn relations(&self) -> &[RelationSig];
    fn rules(&self) -> &[EngineRule];
    fn query(&self) -> Option<&EngineQuery>;

    /// The engine's own textual serialization.
    fn to_native_string(&self) -> String;
}

/// In-tree fixed-point engine.
#[derive(Debug, Default)]
pub struct HornEngine {
    relations: Vec<RelationSig>,
    by_name: FxHashMap<String, usize>,
    rules: Vec<EngineRule>,
    query: Option<EngineQuery>,
}

impl HornEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, name: &str) -> Option<&RelationSig> {
        self.by_name.get(name).map(|i| &self.relations[*i])
    }
}

fn sort_list(sorts: &[Sort]) -> String {
    sorts
        .iter()
        .map(Sort::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `(forall ((x S) ...) body)`, or just `body` without variables.
fn quantified(vars: &[EngineVar], body: &Term) -> String {
    if vars.is_empty() {
        return body.to_string();
    }
    let binders = vars
        .iter()
        .map(|v| format!("({} {})", v.name, v.sort))
        .collect::<Vec<_>>()
        .join(" ");
    format!("(forall ({binders}) {body})")
}

impl FixedPoint for HornEngine {
    fn register_relation(&mut self, relation: RelationSig) -> HornResult<()> {
        if let Some(existing) = self.lookup(&relation.name) {
            if existing.domain != relation.domain {
                return Err(HornError::SortMismatch {
                    name: relation.name,
                    expected: format!("({})", sort_list(&existing.domain)),
                    actual: format!("({})", sort_list(&relation.domain)),
                });
            }
            return Ok(());
        }
        self.by_name
            .insert(relation.name.clone(), self.relations.len());
        self.relations.push(relation);
        Ok(())
    }

    fn add_rule(&mut self, rule: EngineRule) -> HornResult<()> {
        let relation = rule
            .head
            .head_symbol()
            .and_then(|name| self.lookup(name))
            .ok_or_else(|| HornError::NonRelationalHead(rule.head.to_string()))?;
        let arity = rule.head.args().len();
        if relation.domain.len() != arity {
            return Err(HornError::ArityMismatch {
                name: relation.name.clone(),
                expected: relation.domain.len(),
                actual: arity,
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    fn set_query(&mut self, query: EngineQuery) -> HornResult<()> {
        self.query = Some(query);
        Ok(())
    }

    fn relations(&self) -> &[RelationSig] {
        &self.relations
    }

    fn rules(&self) -> &[EngineRule] {
        &self.rules
    }

    fn query(&self) -> Option<&EngineQuery> {
        self.query.as_ref()
    }

    fn to_native_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "(set-logic HORN)");
        for rel in &self.relations {
            let _ = writeln!(
                out,
                "(declare-fun {} ({}) Bool)",
                rel.name,
                sort_list(&rel.domain)
            );
        }
        for rule in &self.rules {
            let clause = if rule.body.is_empty() {
                rule.head.clone()
            } else {
                Term::App(
                    "=>".to_string(),
                    vec![Term::conjunction(&rule.body), rule.head.clone()],
                )
            };
            let _ = writeln!(out, "(assert {})", quantified(&rule.vars, &clause));
        }
        if let Some(query) = &self.query {
            let goal = Term::App(
                "=>".to_string(),
                vec![Term::conjunction(&query.body), Term::Bool(false)],
            );
            let _ = writeln!(out, "(assert {})", quantified(&query.vars, &goal));
        }
        let _ = writeln!(out, "(check-sat)");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_var(name: &str) -> EngineVar {
        EngineVar {
            name: name.to_string(),
            sort: Sort::Int,
        }
    }

    fn app(name: &str, args: Vec<Term>) -> Term {
        Term::App(name.to_string(), args)
    }

    fn sym(name: &str) -> Term {
        Term::Sym(name.to_string())
    }

    fn inv_engine() -> HornEngine {
        let mut fp = HornEngine::new();
        fp.register_relation(RelationSig {
            name: "inv".to_string(),
            domain: vec![Sort::Int],
        })
        .unwrap();
        fp
    }

    #[test]
    fn test_term_display() {
        let t = app("+", vec![sym("x"), Term::Int(BigInt::from(-3))]);
        assert_eq!(t.to_string(), "(+ x (- 3))");
        assert_eq!(Term::conjunction(&[]).to_string(), "true");
        assert_eq!(Term::conjunction(&[sym("p")]).to_string(), "p");
        assert_eq!(
            Term::conjunction(&[sym("p"), sym("q")]).to_string(),
            "(and p q)"
        );
    }

    #[test]
    fn test_register_relation_idempotent() {
        let mut fp = inv_engine();
        fp.register_relation(RelationSig {
            name: "inv".to_string(),
            domain: vec![Sort::Int],
        })
        .unwrap();
        assert_eq!(fp.relations().len(), 1);

        let err = fp
            .register_relation(RelationSig {
                name: "inv".to_string(),
                domain: vec![Sort::Bool],
            })
            .unwrap_err();
        assert!(matches!(err, HornError::SortMismatch { .. }));
    }

    #[test]
    fn test_rule_head_must_be_relation() {
        let mut fp = inv_engine();
        let err = fp
            .add_rule(EngineRule {
                vars: vec![int_var("x")],
                body: vec![],
                head: app("or", vec![sym("a"), sym("b")]),
            })
            .unwrap_err();
        assert!(matches!(err, HornError::NonRelationalHead(ref h) if h == "(or a b)"));

        let err = fp
            .add_rule(EngineRule {
                vars: vec![],
                body: vec![],
                head: app("inv", vec![sym("x"), sym("y")]),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            HornError::ArityMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_native_string() {
        let mut fp = inv_engine();
        fp.add_rule(EngineRule {
            vars: vec![int_var("x")],
            body: vec![app("=", vec![sym("x"), Term::Int(BigInt::from(0))])],
            head: app("inv", vec![sym("x")]),
        })
        .unwrap();
        fp.set_query(EngineQuery {
            vars: vec![int_var("x")],
            body: vec![
                app("inv", vec![sym("x")]),
                app("<", vec![sym("x"), Term::Int(BigInt::from(0))]),
            ],
        })
        .unwrap();
        let expected = "\
(set-logic HORN)
(declare-fun inv (Int) Bool)
(assert (forall ((x Int)) (=> (= x 0) (inv x))))
(assert (forall ((x Int)) (=> (and (inv x) (< x 0)) false)))
(check-sat)
";
        assert_eq!(fp.to_native_string(), expected);
    }

    #[test]
    fn test_native_string_without_vars() {
        let mut fp = HornEngine::new();
        fp.register_relation(RelationSig {
            name: "start".to_string(),
            domain: vec![],
        })
        .unwrap();
        fp.add_rule(EngineRule {
            vars: vec![],
            body: vec![],
            head: sym("start"),
        })
        .unwrap();
        let text = fp.to_native_string();
        assert!(text.contains("(declare-fun start () Bool)\n"));
        assert!(text.contains("(assert start)\n"));
    }
}
