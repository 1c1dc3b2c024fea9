//! Horn clause database

use crate::clause::{CoverConstraint, HornClause, Query};
use crate::engine::{EngineQuery, EngineRule, EngineVar, FixedPoint, RelationSig};
use crate::smt2::Translator;
use crate::{HornError, HornResult};
use horn_expr::{ExprError, ExprFactory, ExprId, Node, Op};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Relations, rules, the query and cover constraints of one verification
/// problem. Expressions live in the [`ExprFactory`] passed to each call.
#[derive(Debug, Clone, Default)]
pub struct HornClauseDb {
    relations: Vec<ExprId>,
    relation_set: FxHashSet<ExprId>,
    pub(crate) rules: Vec<HornClause>,
    query: Option<Query>,
    constraints: Vec<CoverConstraint>,
}

impl HornClauseDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register relation declaration `decl`. Registering twice is a no-op.
    pub fn register_relation(&mut self, efac: &ExprFactory, decl: ExprId) -> HornResult<()> {
        if efac.decl_domain(decl).is_none() {
            return Err(ExprError::Malformed(format!(
                "`{}` is not a relation declaration",
                efac.display(decl)
            ))
            .into());
        }
        if self.relation_set.insert(decl) {
            self.relations.push(decl);
        }
        Ok(())
    }

    pub fn has_relation(&self, decl: ExprId) -> bool {
        self.relation_set.contains(&decl)
    }

    /// Registered relations in registration order
    pub fn relations(&self) -> &[ExprId] {
        &self.relations
    }

    pub fn add_rule(&mut self, rule: HornClause) {
        self.rules.push(rule);
    }

    pub fn add_fact(&mut self, head: ExprId) {
        self.rules.push(HornClause::fact(head));
    }

    pub fn rules(&self) -> &[HornClause] {
        &self.rules
    }

    pub fn set_query(&mut self, query: Query) {
        self.query = Some(query);
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn add_constraint(&mut self, constraint: CoverConstraint) {
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[CoverConstraint] {
        &self.constraints
    }

    /// Is `e` an application of a registered relation?
    pub fn is_relation_app(&self, efac: &ExprFactory, e: ExprId) -> bool {
        efac.fapp_decl(e).is_some_and(|decl| self.has_relation(decl))
    }

    /// Rules whose head applies `decl`.
    pub fn rules_defining<'a>(
        &'a self,
        efac: &'a ExprFactory,
        decl: ExprId,
    ) -> impl Iterator<Item = &'a HornClause> + 'a {
        self.rules
            .iter()
            .filter(move |rule| efac.fapp_decl(rule.head) == Some(decl))
    }

    /// Check that every relation application refers to a registered
    /// relation and that a query is present.
    pub fn validate(&self, efac: &ExprFactory) -> HornResult<()> {
        let mut roots = Vec::new();
        for rule in &self.rules {
            roots.push(rule.head);
            roots.extend(&rule.body);
        }
        if let Some(query) = &self.query {
            roots.extend(&query.body);
        }
        for app in relation_apps(efac, &roots) {
            let Some(decl) = efac.fapp_decl(app) else {
                continue;
            };
            if !self.has_relation(decl) {
                return Err(HornError::UndefinedRelation(relation_name(efac, decl)));
            }
            let expected = efac.decl_domain(decl).map_or(0, <[_]>::len);
            let actual = efac.fapp_args(app).len();
            if expected != actual {
                return Err(HornError::ArityMismatch {
                    name: relation_name(efac, decl),
                    expected,
                    actual,
                });
            }
        }
        if self.query.is_none() {
            return Err(HornError::NoQuery);
        }
        Ok(())
    }

    /// Load relations, rules and (unless skipped) the query into `fp`.
    ///
    /// Cover constraints have no engine representation: unless
    /// `skip_constraints` is set, a database holding any is rejected.
    pub fn load_fixed_point(
        &self,
        efac: &ExprFactory,
        fp: &mut dyn FixedPoint,
        skip_constraints: bool,
        skip_query: bool,
    ) -> HornResult<()> {
        if !skip_constraints && !self.constraints.is_empty() {
            return Err(HornError::UnsupportedConstraints(self.constraints.len()));
        }

        let mut tr = Translator::new(efac);
        for &decl in &self.relations {
            fp.register_relation(RelationSig {
                name: tr.name(decl),
                domain: efac.decl_domain(decl).unwrap_or_default().to_vec(),
            })?;
        }
        for rule in &self.rules {
            fp.add_rule(EngineRule {
                vars: engine_vars(&mut tr, efac, &rule.vars(efac)),
                body: tr.terms(&rule.body),
                head: tr.term(rule.head),
            })?;
        }
        if !skip_query {
            if let Some(query) = &self.query {
                fp.set_query(EngineQuery {
                    vars: engine_vars(&mut tr, efac, &query.vars(efac)),
                    body: tr.terms(&query.body),
                })?;
            }
        }
        debug!(
            relations = self.relations.len(),
            rules = self.rules.len(),
            query = !skip_query && self.query.is_some(),
            "loaded clause database into fixed-point engine"
        );
        Ok(())
    }
}

fn engine_vars(tr: &mut Translator<'_>, efac: &ExprFactory, vars: &[ExprId]) -> Vec<EngineVar> {
    vars.iter()
        .filter_map(|&v| {
            efac.const_sort(v).map(|sort| EngineVar {
                name: tr.name(v),
                sort: sort.clone(),
            })
        })
        .collect()
}

pub(crate) fn relation_name(efac: &ExprFactory, decl: ExprId) -> String {
    efac.name_of(decl)
        .map(|atom| atom.render())
        .unwrap_or_else(|| efac.display(decl).to_string())
}

/// Relation applications reachable from `roots`, each listed once.
fn relation_apps(efac: &ExprFactory, roots: &[ExprId]) -> Vec<ExprId> {
    let mut seen = FxHashSet::default();
    let mut apps = Vec::new();
    let mut stack: Vec<ExprId> = roots.to_vec();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        match efac.get(id) {
            Node::App(Op::FApp, _) => apps.push(id),
            Node::App(Op::Const(_) | Op::Decl(_), _) | Node::Atom(_) => {}
            Node::App(_, children) => stack.extend(children),
        }
    }
    apps
}
