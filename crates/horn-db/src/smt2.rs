//! SMT-LIB translation and the internal relational formatter
//!
//! [`Translator`] turns expressions into engine [`Term`]s. [`render`] prints
//! a loaded engine in the rule/query dialect:
//!
//! ```text
//! (declare-rel inv (Int))
//! (declare-var x Int)
//! (rule (=> (= x 0) (inv x)))
//! (query (and (inv x) (< x 0)))
//! ```

use crate::engine::{EngineVar, FixedPoint, Term};
use crate::HornResult;
use horn_expr::{Atom, ExprFactory, ExprId, Node, Op, Sort};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt::Write as _;

const SYMBOL_EXTRA_CHARS: &str = "~!@$%^&*_-+=<>.?/";

fn is_simple_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if first.is_ascii_digit() || first == '@' || first == '.' {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || SYMBOL_EXTRA_CHARS.contains(c))
}

/// SMT-LIB symbol for `name`, wrapped in `|...|` when it is not a simple
/// symbol. `|` and `\` cannot appear inside a quoted symbol and become `_`.
pub fn symbol(name: &str) -> String {
    if is_simple_symbol(name) {
        return name.to_string();
    }
    let inner: String = name
        .chars()
        .map(|c| if c == '|' || c == '\\' { '_' } else { c })
        .collect();
    format!("|{inner}|")
}

/// Expression to [`Term`] translation, memoized per node.
///
/// Variables are named after their symbol. Distinct variables that share a
/// symbol but not a sort get distinct names: the first sort seen keeps the
/// symbol, later ones become `name!k`.
pub struct Translator<'a> {
    efac: &'a ExprFactory,
    cache: FxHashMap<ExprId, Term>,
    var_sorts: FxHashMap<String, Sort>,
}

impl<'a> Translator<'a> {
    pub fn new(efac: &'a ExprFactory) -> Self {
        Self {
            efac,
            cache: FxHashMap::default(),
            var_sorts: FxHashMap::default(),
        }
    }

    /// Symbol naming a variable, declaration or relation application.
    pub fn name(&mut self, id: ExprId) -> String {
        let efac = self.efac;
        let base = match efac.name_of(id) {
            Some(atom) => symbol(&atom.render()),
            None => symbol(&efac.display(id).to_string()),
        };
        match efac.const_sort(id) {
            Some(sort) => self.claim(base, sort),
            None => base,
        }
    }

    fn claim(&mut self, base: String, sort: &Sort) -> String {
        let mut candidate = base.clone();
        for k in 1.. {
            match self.var_sorts.get(&candidate) {
                Some(s) if s == sort => break,
                Some(_) => candidate = suffixed(&base, k),
                None => {
                    self.var_sorts.insert(candidate.clone(), sort.clone());
                    break;
                }
            }
        }
        candidate
    }

    pub fn term(&mut self, id: ExprId) -> Term {
        if let Some(term) = self.cache.get(&id) {
            return term.clone();
        }
        let efac = self.efac;
        let term = match efac.get(id) {
            Node::Atom(Atom::Bool(b)) => Term::Bool(*b),
            Node::Atom(Atom::Int(n)) => Term::Int(n.clone()),
            Node::Atom(atom) => Term::Sym(symbol(&atom.render())),
            Node::App(Op::Const(_) | Op::Decl(_), _) => Term::Sym(self.name(id)),
            Node::App(Op::FApp, children) => {
                let name = self.name(id);
                if children.len() == 1 {
                    Term::Sym(name)
                } else {
                    Term::App(name, self.terms(&children[1..]))
                }
            }
            Node::App(op, children) => Term::App(op.to_string(), self.terms(children)),
        };
        self.cache.insert(id, term.clone());
        term
    }

    pub fn terms(&mut self, ids: &[ExprId]) -> Vec<Term> {
        ids.iter().map(|id| self.term(*id)).collect()
    }
}

fn sort_list(sorts: &[Sort]) -> String {
    sorts
        .iter()
        .map(Sort::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `name` with a `!k` suffix, kept inside the quotes of a quoted symbol.
fn suffixed(name: &str, k: usize) -> String {
    match name.strip_prefix('|').and_then(|n| n.strip_suffix('|')) {
        Some(inner) => format!("|{inner}!{k}|"),
        None => format!("{name}!{k}"),
    }
}

/// Global variable declarations for the clauses of an engine.
///
/// Clause variables are scoped per clause, but `declare-var` is global. The
/// first sort seen for a name keeps the name; the same name with another
/// sort is declared as `name!k`.
#[derive(Default)]
struct VarDecls<'a> {
    names: FxHashMap<(&'a str, &'a Sort), String>,
    has_sort: FxHashSet<&'a str>,
    used: FxHashSet<String>,
    order: Vec<(String, &'a Sort)>,
}

impl<'a> VarDecls<'a> {
    fn declare(&mut self, var: &'a EngineVar) -> &str {
        let key = (var.name.as_str(), &var.sort);
        if !self.names.contains_key(&key) {
            let name = if self.has_sort.insert(&var.name) {
                var.name.clone()
            } else {
                (1..)
                    .map(|k| suffixed(&var.name, k))
                    .find(|n| !self.used.contains(n))
                    .unwrap_or_default()
            };
            self.used.insert(name.clone());
            self.order.push((name.clone(), &var.sort));
            self.names.insert(key, name);
        }
        &self.names[&key]
    }

    /// Renamings `vars` needs, empty when every variable keeps its name.
    fn renaming(&mut self, vars: &'a [EngineVar]) -> FxHashMap<String, String> {
        let mut map = FxHashMap::default();
        for var in vars {
            let declared = self.declare(var);
            if declared != var.name {
                map.insert(var.name.clone(), declared.to_string());
            }
        }
        map
    }
}

fn rename(term: &Term, map: &FxHashMap<String, String>) -> Term {
    match term {
        Term::Sym(name) => match map.get(name) {
            Some(new) => Term::Sym(new.clone()),
            None => term.clone(),
        },
        Term::App(f, args) => Term::App(f.clone(), args.iter().map(|a| rename(a, map)).collect()),
        Term::Bool(_) | Term::Int(_) => term.clone(),
    }
}

fn rename_all(terms: &[Term], map: &FxHashMap<String, String>) -> Vec<Term> {
    if map.is_empty() {
        return terms.to_vec();
    }
    terms.iter().map(|t| rename(t, map)).collect()
}

/// Print the contents of `fp` with relation, variable, rule and query
/// declarations.
///
/// Variables are declared once across all clauses. A name used with two
/// different sorts is declared once per sort; see [`VarDecls`].
pub fn render(fp: &dyn FixedPoint) -> HornResult<String> {
    let mut out = String::new();
    for rel in fp.relations() {
        let _ = writeln!(out, "(declare-rel {} ({}))", rel.name, sort_list(&rel.domain));
    }

    let mut decls = VarDecls::default();
    decls.used.extend(fp.relations().iter().map(|r| r.name.clone()));
    let clause_vars = fp
        .rules()
        .iter()
        .map(|r| &r.vars)
        .chain(fp.query().map(|q| &q.vars));
    decls.used.extend(clause_vars.flatten().map(|v| v.name.clone()));

    let mut rules = Vec::with_capacity(fp.rules().len());
    for rule in fp.rules() {
        let map = decls.renaming(&rule.vars);
        let head = rename(&rule.head, &map);
        rules.push((rename_all(&rule.body, &map), head));
    }
    let query = match fp.query() {
        Some(query) => {
            let map = decls.renaming(&query.vars);
            Some(rename_all(&query.body, &map))
        }
        None => None,
    };

    for (name, sort) in &decls.order {
        let _ = writeln!(out, "(declare-var {name} {sort})");
    }
    for (body, head) in &rules {
        if body.is_empty() {
            let _ = writeln!(out, "(rule {head})");
        } else {
            let _ = writeln!(out, "(rule (=> {} {head}))", Term::conjunction(body));
        }
    }
    if let Some(body) = query {
        let _ = writeln!(out, "(query {})", Term::conjunction(&body));
    }
    Ok(out)
}
