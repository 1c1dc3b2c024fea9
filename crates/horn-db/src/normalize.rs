//! Rule head normalization
//!
//! Relational output formats require every rule head to be an application
//! of a declared relation. [`normalize_heads`] rewrites the remaining heads
//! through fresh relations:
//!
//! ```text
//! f(x) \/ g(x) :- b      becomes      head_rel_0(x) :- b.
//!                                     head_rel_0(x) :- f(x).
//!                                     head_rel_0(x) :- g(x).
//! ```
//!
//! In general a head `H` with free variables `v` is replaced by `h(v)` for
//! a fresh relation `h`, and `h(v) :- d` is added for each
//! disjunct `d` of `H` (or `h(v) :- H` when `H` is not a disjunction).

use crate::clause::HornClause;
use crate::db::{relation_name, HornClauseDb};
use crate::HornResult;
use horn_expr::{ExprFactory, ExprId, Node, Op, Sort, Symbol};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

/// What [`normalize_heads`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Rules whose head was replaced
    pub rewritten: usize,
    pub relations_added: usize,
    /// Defining clauses added for the fresh relations
    pub clauses_added: usize,
}

impl NormalizeStats {
    pub fn is_noop(&self) -> bool {
        self.rewritten == 0
    }
}

/// Fresh names that do not clash with anything already taken.
struct FreshNames {
    taken: FxHashSet<String>,
    next: usize,
}

impl FreshNames {
    fn new(taken: FxHashSet<String>) -> Self {
        Self { taken, next: 0 }
    }

    fn fresh(&mut self, prefix: &str) -> String {
        loop {
            let name = format!("{prefix}_{}", self.next);
            self.next += 1;
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}

/// Names of the variables of every rule and of the query.
fn var_names(db: &HornClauseDb, efac: &ExprFactory) -> FxHashSet<String> {
    db.rules
        .iter()
        .flat_map(|r| r.vars(efac))
        .chain(db.query().into_iter().flat_map(|q| q.vars(efac)))
        .filter_map(|v| efac.name_of(v).map(|atom| atom.render()))
        .collect()
}

/// Make every rule head a relation application. See the module docs.
///
/// Identical heads share one fresh relation. A database whose heads are
/// already relation applications is left unchanged.
pub fn normalize_heads(db: &mut HornClauseDb, efac: &mut ExprFactory) -> HornResult<NormalizeStats> {
    let mut stats = NormalizeStats::default();
    if db.rules.iter().all(|r| db.is_relation_app(efac, r.head)) {
        return Ok(stats);
    }

    let mut taken = var_names(db, efac);
    taken.extend(db.relations().iter().map(|&decl| relation_name(efac, decl)));
    let mut names = FreshNames::new(taken);
    let mut replaced: FxHashMap<ExprId, ExprId> = FxHashMap::default();
    let mut defining = Vec::new();

    let rules = std::mem::take(&mut db.rules);
    let mut out = Vec::with_capacity(rules.len());
    for mut rule in rules {
        if db.is_relation_app(efac, rule.head) {
            out.push(rule);
            continue;
        }
        let head = rule.head;
        let new_head = match replaced.get(&head) {
            Some(&app) => app,
            None => {
                let vars = efac.free_consts(head);
                let domain: Vec<Sort> = vars
                    .iter()
                    .filter_map(|&v| efac.const_sort(v).cloned())
                    .collect();
                let name = names.fresh("head_rel");
                let decl = efac.mk_decl(Symbol::new(&name), domain);
                db.register_relation(efac, decl)?;
                let app = efac.mk_fapp(decl, vars)?;

                let disjuncts = match efac.get(head) {
                    Node::App(Op::Or, children) => children.clone(),
                    _ => vec![head],
                };
                debug!(
                    relation = %name,
                    head = %efac.display(head),
                    disjuncts = disjuncts.len(),
                    "introducing relation for rule head"
                );
                for d in disjuncts {
                    defining.push(HornClause::new(vec![d], app));
                    stats.clauses_added += 1;
                }
                stats.relations_added += 1;
                replaced.insert(head, app);
                app
            }
        };
        rule.head = new_head;
        stats.rewritten += 1;
        out.push(rule);
    }
    out.extend(defining);
    db.rules = out;

    info!(
        rewritten = stats.rewritten,
        relations = stats.relations_added,
        clauses = stats.clauses_added,
        "normalized rule heads"
    );
    Ok(stats)
}

/// Give every relation-application head pairwise distinct variable
/// arguments. An argument that is not a variable, or repeats an earlier
/// one, is replaced by a fresh variable `v` and `v = arg` joins the body.
///
/// Returns the number of rules rewritten.
pub fn canonicalize_head_args(db: &mut HornClauseDb, efac: &mut ExprFactory) -> HornResult<usize> {
    let mut rewritten = 0;
    // one pool for the whole database: a name keeps one sort everywhere
    let mut names = FreshNames::new(var_names(db, efac));
    let mut rules = std::mem::take(&mut db.rules);
    for rule in &mut rules {
        let Some(decl) = efac.fapp_decl(rule.head) else {
            continue;
        };
        let args = efac.fapp_args(rule.head).to_vec();
        let domain = efac.decl_domain(decl).unwrap_or_default().to_vec();

        let mut seen = FxHashSet::default();
        let mut new_args = Vec::with_capacity(args.len());
        let mut equalities = Vec::new();
        for (arg, sort) in args.into_iter().zip(domain) {
            if efac.is_const(arg) && seen.insert(arg) {
                new_args.push(arg);
                continue;
            }
            let var = efac.mk_var(&names.fresh("hd_arg"), sort);
            equalities.push(efac.mk_eq(var, arg));
            new_args.push(var);
        }
        if equalities.is_empty() {
            continue;
        }
        rule.head = efac.mk_fapp(decl, new_args)?;
        rule.body.extend(equalities);
        rewritten += 1;
    }
    db.rules = rules;
    if rewritten > 0 {
        debug!(rewritten, "canonicalized head arguments");
    }
    Ok(rewritten)
}
