//! Constraint logic programming output
//!
//! Each rule becomes one Prolog clause and the query becomes a clause with
//! head `false`:
//!
//! ```text
//! inv(X) :- X=0.
//! false :- inv(X), X<0.
//! ```

use crate::db::HornClauseDb;
use crate::{HornError, HornResult};
use horn_expr::{Atom, ExprFactory, ExprId, Node, Op};
use num_traits::Signed;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// Prints a clause database as CLP clauses.
pub struct ClpWriter<'a> {
    db: &'a HornClauseDb,
    efac: &'a ExprFactory,
}

/// Prolog variable names for the variables of one clause.
struct VarNames {
    names: FxHashMap<ExprId, String>,
}

impl VarNames {
    fn new(efac: &ExprFactory, vars: &[ExprId]) -> Self {
        let mut used = FxHashSet::default();
        let mut names = FxHashMap::default();
        for &var in vars {
            let raw = efac.name_of(var).map(Atom::render).unwrap_or_default();
            let base = prolog_var(&raw);
            let mut name = base.clone();
            let mut k = 1;
            while !used.insert(name.clone()) {
                name = format!("{base}_{k}");
                k += 1;
            }
            names.insert(var, name);
        }
        Self { names }
    }

    fn get(&self, var: ExprId) -> &str {
        self.names.get(&var).map_or("_", String::as_str)
    }
}

/// Prolog variable for `raw`: characters outside `[A-Za-z0-9_]` become `_`
/// and the first letter is capitalized (`V` is prepended when there is no
/// leading letter).
fn prolog_var(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let mut chars = sanitized.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => sanitized,
        Some(c) if c.is_ascii_lowercase() => {
            let mut name = c.to_ascii_uppercase().to_string();
            name.push_str(chars.as_str());
            name
        }
        _ => format!("V{sanitized}"),
    }
}

/// `name` as a Prolog atom, single-quoted unless it is a plain identifier.
fn prolog_atom(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        return name.to_string();
    }
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

fn infix(op: &Op) -> Option<&'static str> {
    Some(match op {
        Op::Eq | Op::Iff => "=",
        Op::Ne => "=\\=",
        Op::Lt => "<",
        Op::Le => "=<",
        Op::Gt => ">",
        Op::Ge => ">=",
        Op::Add => "+",
        Op::Sub => "-",
        Op::Mul => "*",
        Op::Div => "/",
        Op::Mod => " mod ",
        _ => return None,
    })
}

impl<'a> ClpWriter<'a> {
    pub fn new(db: &'a HornClauseDb, efac: &'a ExprFactory) -> Self {
        Self { db, efac }
    }

    /// Every rule head must be a relation application to become a clause
    /// head.
    pub fn check_heads(&self) -> HornResult<()> {
        match self
            .db
            .rules()
            .iter()
            .find(|r| !self.db.is_relation_app(self.efac, r.head))
        {
            Some(rule) => Err(HornError::NonRelationalHead(
                self.efac.display(rule.head).to_string(),
            )),
            None => Ok(()),
        }
    }

    /// Conjuncts of `body` as goals: nested conjunctions flattened, `true`
    /// dropped.
    fn goals(&self, body: &[ExprId]) -> Vec<ExprId> {
        let mut goals = Vec::new();
        let mut stack: Vec<ExprId> = body.iter().rev().copied().collect();
        while let Some(e) = stack.pop() {
            match self.efac.get(e) {
                Node::App(Op::And, children) => stack.extend(children.iter().rev()),
                Node::Atom(Atom::Bool(true)) => {}
                _ => goals.push(e),
            }
        }
        goals
    }

    fn write_clause(
        &self,
        out: &mut dyn fmt::Write,
        head: Option<ExprId>,
        body: &[ExprId],
    ) -> fmt::Result {
        let mut roots: Vec<ExprId> = head.into_iter().collect();
        roots.extend(body);
        let vars = VarNames::new(self.efac, &self.efac.free_consts_of(&roots));

        match head {
            Some(h) => self.write_term(out, h, &vars, false)?,
            None => out.write_str("false")?,
        }
        let goals = self.goals(body);
        if !goals.is_empty() {
            out.write_str(" :- ")?;
            self.write_goals(out, &goals, &vars)?;
        }
        out.write_str(".\n")
    }

    fn write_goals(&self, out: &mut dyn fmt::Write, goals: &[ExprId], vars: &VarNames) -> fmt::Result {
        for (i, goal) in goals.iter().enumerate() {
            if i > 0 {
                out.write_str(", ")?;
            }
            self.write_term(out, *goal, vars, false)?;
        }
        Ok(())
    }

    fn write_term(
        &self,
        out: &mut dyn fmt::Write,
        id: ExprId,
        vars: &VarNames,
        brkt: bool,
    ) -> fmt::Result {
        match self.efac.get(id) {
            Node::Atom(Atom::Int(n)) if brkt && n.is_negative() => write!(out, "({n})"),
            Node::Atom(Atom::Int(n)) => write!(out, "{n}"),
            Node::Atom(Atom::Bool(b)) => write!(out, "{b}"),
            Node::Atom(atom) => out.write_str(&prolog_atom(&atom.render())),
            Node::App(Op::Const(_), _) => out.write_str(vars.get(id)),
            Node::App(Op::Decl(_), _) | Node::App(Op::FApp, _) => {
                let name = self.efac.name_of(id).map(Atom::render).unwrap_or_default();
                out.write_str(&prolog_atom(&name))?;
                let args = self.efac.fapp_args(id);
                if args.is_empty() {
                    return Ok(());
                }
                out.write_char('(')?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.write_char(',')?;
                    }
                    self.write_term(out, *arg, vars, false)?;
                }
                out.write_char(')')
            }
            Node::App(Op::And, _) => {
                out.write_char('(')?;
                self.write_goals(out, &self.goals(&[id]), vars)?;
                out.write_char(')')
            }
            Node::App(Op::Or, children) => {
                out.write_char('(')?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.write_str(" ; ")?;
                    }
                    self.write_term(out, *child, vars, false)?;
                }
                out.write_char(')')
            }
            Node::App(Op::Not, children) => {
                out.write_str("\\+ ")?;
                self.write_term(out, children[0], vars, true)
            }
            Node::App(Op::Implies, children) => {
                out.write_str("(\\+ ")?;
                self.write_term(out, children[0], vars, true)?;
                out.write_str(" ; ")?;
                self.write_term(out, children[1], vars, false)?;
                out.write_char(')')
            }
            Node::App(Op::Neg, children) => {
                out.write_char('-')?;
                self.write_term(out, children[0], vars, true)
            }
            Node::App(Op::Ite, children) => {
                out.write_str("ite(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.write_char(',')?;
                    }
                    self.write_term(out, *child, vars, false)?;
                }
                out.write_char(')')
            }
            Node::App(op, children) => {
                let sym = infix(op).unwrap_or(",");
                if brkt {
                    out.write_char('(')?;
                }
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.write_str(sym)?;
                    }
                    self.write_term(out, *child, vars, true)?;
                }
                if brkt {
                    out.write_char(')')?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for ClpWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in self.db.rules() {
            self.write_clause(f, Some(rule.head), &rule.body)?;
        }
        if let Some(query) = self.db.query() {
            self.write_clause(f, None, &query.body)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{HornClause, Query};
    use horn_expr::ir::{FunctionBuilder, Type};
    use horn_expr::Sort;

    #[test]
    fn test_prolog_var() {
        assert_eq!(prolog_var("x"), "X");
        assert_eq!(prolog_var("Y"), "Y");
        assert_eq!(prolog_var("main@%x"), "Main__x");
        assert_eq!(prolog_var("_t"), "V_t");
        assert_eq!(prolog_var("1a"), "V1a");
        assert_eq!(prolog_var(""), "V");
    }

    #[test]
    fn test_prolog_atom() {
        assert_eq!(prolog_atom("inv"), "inv");
        assert_eq!(prolog_atom("head_rel_0"), "head_rel_0");
        assert_eq!(prolog_atom("Inv"), "'Inv'");
        assert_eq!(prolog_atom("main@bb"), "'main@bb'");
        assert_eq!(prolog_atom("it's"), "'it\\'s'");
    }

    fn render(db: &HornClauseDb, efac: &ExprFactory) -> String {
        ClpWriter::new(db, efac).to_string()
    }

    #[test]
    fn test_rule_and_query() {
        let mut efac = ExprFactory::new();
        let mut db = HornClauseDb::new();
        let inv = efac.mk_decl("inv", vec![Sort::Int]);
        db.register_relation(&efac, inv).unwrap();
        let x = efac.mk_var("x", Sort::Int);
        let zero = efac.mk_int(0);
        let head = efac.mk_fapp(inv, vec![x]).unwrap();
        let init = efac.mk_eq(x, zero);
        db.add_rule(HornClause::new(vec![init], head));
        let neg = efac.mk_lt(x, zero);
        db.set_query(Query::new(vec![head, neg]));

        assert_eq!(render(&db, &efac), "inv(X) :- X=0.\nfalse :- inv(X), X<0.\n");
    }

    #[test]
    fn test_check_heads_rejects_comparison_head() {
        let mut efac = ExprFactory::new();
        let mut db = HornClauseDb::new();
        let x = efac.mk_var("x", Sort::Int);
        let y = efac.mk_var("y", Sort::Int);
        let zero = efac.mk_int(0);
        let gt = efac.mk_gt(x, zero);
        let lt = efac.mk_lt(y, zero);
        db.add_rule(HornClause::new(vec![gt], lt));

        let err = ClpWriter::new(&db, &efac).check_heads().unwrap_err();
        assert!(matches!(err, HornError::NonRelationalHead(ref h) if h == "(< y 0)"));
    }

    #[test]
    fn test_conjunctions_flatten_and_true_drops() {
        let mut efac = ExprFactory::new();
        let mut db = HornClauseDb::new();
        let p = efac.mk_decl("p", vec![]);
        db.register_relation(&efac, p).unwrap();
        let a = efac.mk_var("a", Sort::Bool);
        let b = efac.mk_var("b", Sort::Bool);
        let t = efac.mk_true();
        let inner = efac.mk_and(vec![a, t]);
        let body = efac.mk_and(vec![inner, b]);
        let head = efac.mk_fapp(p, vec![]).unwrap();
        db.add_rule(HornClause::new(vec![body, t], head));
        db.add_fact(head);

        ClpWriter::new(&db, &efac).check_heads().unwrap();
        assert_eq!(render(&db, &efac), "p :- A, B.\np.\n");
    }

    #[test]
    fn test_nested_terms() {
        let mut efac = ExprFactory::new();
        let mut db = HornClauseDb::new();
        let r = efac.mk_decl("r", vec![Sort::Int, Sort::Int]);
        db.register_relation(&efac, r).unwrap();
        let x = efac.mk_var("x", Sort::Int);
        let y = efac.mk_var("y", Sort::Int);
        let two = efac.mk_int(2);
        let m1 = efac.mk_int(-1);
        let sum = efac.mk_add(x, m1);
        let prod = efac.mk_mul(sum, two);
        let head = efac.mk_fapp(r, vec![prod, y]).unwrap();
        let lt = efac.mk_lt(x, y);
        let ge = efac.mk_ge(y, two);
        let either = efac.mk_or(vec![lt, ge]);
        let neq = efac.mk_ne(x, y);
        let not = efac.mk_not(neq);
        db.add_rule(HornClause::new(vec![either, not], head));

        assert_eq!(
            render(&db, &efac),
            "r((X+(-1))*2,Y) :- (X<Y ; Y>=2), \\+ (X=\\=Y).\n"
        );
    }

    #[test]
    fn test_ir_variable_names() {
        let f = FunctionBuilder::new("f")
            .block("entry")
            .inst(Some("x"), Type::Int(32), "add i32 1, 2")
            .build();
        let g = FunctionBuilder::new("g")
            .block("entry")
            .inst(Some("x"), Type::Int(32), "add i32 3, 4")
            .build();
        let mut efac = ExprFactory::new();
        let mut db = HornClauseDb::new();
        let rel = efac.mk_decl("pair", vec![Sort::Int, Sort::Int]);
        db.register_relation(&efac, rel).unwrap();
        let fx = efac.mk_value_const(f.instruction("x").unwrap()).unwrap();
        let gx = efac.mk_value_const(g.instruction("x").unwrap()).unwrap();
        let head = efac.mk_fapp(rel, vec![fx, gx]).unwrap();
        db.add_fact(head);

        assert_eq!(render(&db, &efac), "pair(F__x,G__x).\n");
    }

    #[test]
    fn test_variable_collision_numbered() {
        let mut efac = ExprFactory::new();
        let mut db = HornClauseDb::new();
        let rel = efac.mk_decl("q", vec![Sort::Int, Sort::Int]);
        db.register_relation(&efac, rel).unwrap();
        let a = efac.mk_var("x.1", Sort::Int);
        let b = efac.mk_var("x_1", Sort::Int);
        let head = efac.mk_fapp(rel, vec![a, b]).unwrap();
        db.add_fact(head);

        assert_eq!(render(&db, &efac), "q(X_1,X_1_1).\n");
    }
}
