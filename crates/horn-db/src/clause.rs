//! Horn clauses and queries

use horn_expr::{ExprFactory, ExprId};

/// A rule `body => head`. The body is a conjunction of its elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HornClause {
    pub head: ExprId,
    pub body: Vec<ExprId>,
}

impl HornClause {
    pub fn new(body: Vec<ExprId>, head: ExprId) -> Self {
        Self { head, body }
    }

    /// A clause with an empty body.
    pub fn fact(head: ExprId) -> Self {
        Self {
            head,
            body: Vec::new(),
        }
    }

    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }

    /// Variables of the clause, head first, in first-occurrence order.
    pub fn vars(&self, efac: &ExprFactory) -> Vec<ExprId> {
        let mut roots = Vec::with_capacity(self.body.len() + 1);
        roots.push(self.head);
        roots.extend(&self.body);
        efac.free_consts_of(&roots)
    }
}

/// The verification goal: a headless clause whose body must be unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub body: Vec<ExprId>,
}

impl Query {
    pub fn new(body: Vec<ExprId>) -> Self {
        Self { body }
    }

    pub fn vars(&self, efac: &ExprFactory) -> Vec<ExprId> {
        efac.free_consts_of(&self.body)
    }
}

/// A formula known to hold whenever the relation application `app` does.
///
/// Neither output format can carry these; see `ConstraintPolicy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverConstraint {
    pub app: ExprId,
    pub formula: ExprId,
}
