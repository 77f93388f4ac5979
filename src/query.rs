//! Filter, sort and pagination primitives for document queries.
//!
//! A [`Query`] is built on the caller's side and shipped to the store actor,
//! which evaluates it against any document implementing [`Fields`].

use std::cmp::Ordering;

/// A value read out of a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    List(Vec<String>),
    Number(f64),
}

impl FieldValue {
    /// Equality with array semantics: a list field matches when any element equals `value`.
    pub fn matches_eq(&self, value: &str) -> bool {
        match self {
            FieldValue::Str(s) => s == value,
            FieldValue::List(items) => items.iter().any(|item| item == value),
            FieldValue::Number(n) => value
                .parse::<f64>()
                .is_ok_and(|v| number_key(v) == number_key(*n)),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            FieldValue::List(items) => items.iter().any(|item| item == value),
            _ => false,
        }
    }

    /// Empty strings and empty lists count as absent for `required` checks.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Number(_) => false,
        }
    }

    /// Keys under which this value is stored in a secondary index.
    pub fn index_keys(&self) -> Vec<String> {
        match self {
            FieldValue::Str(s) => vec![s.clone()],
            FieldValue::List(items) => items.clone(),
            FieldValue::Number(n) => vec![number_key(*n)],
        }
    }

    fn compare(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            // Missing values sort first.
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(FieldValue::Str(x)), Some(FieldValue::Str(y))) => x.cmp(y),
            (Some(FieldValue::List(x)), Some(FieldValue::List(y))) => x.cmp(y),
            (Some(FieldValue::Number(x)), Some(FieldValue::Number(y))) => {
                x.partial_cmp(y).unwrap_or(Ordering::Equal)
            }
            (Some(x), Some(y)) => x.type_rank().cmp(&y.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Number(_) => 0,
            FieldValue::Str(_) => 1,
            FieldValue::List(_) => 2,
        }
    }
}

/// Canonical text form of a number. Index keys and equality checks both go
/// through it, so `49.0` and `49` are the same key.
pub fn number_key(n: f64) -> String {
    n.to_string()
}

/// Read access to a document's fields by their stored name.
pub trait Fields {
    fn field(&self, name: &str) -> Option<FieldValue>;
}

/// A single predicate over one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Field equals `value`; a list field matches when any element does.
    Eq { field: &'static str, value: String },
    /// List field contains `value`.
    Contains { field: &'static str, value: String },
}

impl Clause {
    pub fn field(&self) -> &'static str {
        match self {
            Clause::Eq { field, .. } | Clause::Contains { field, .. } => *field,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Clause::Eq { value, .. } | Clause::Contains { value, .. } => value,
        }
    }

    pub fn matches<D: Fields + ?Sized>(&self, doc: &D) -> bool {
        match (self, doc.field(self.field())) {
            (Clause::Eq { value, .. }, Some(actual)) => actual.matches_eq(value),
            (Clause::Contains { value, .. }, Some(actual)) => actual.contains(value),
            (_, None) => false,
        }
    }
}

/// Logical AND of clauses. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::Eq { field, value: value.into() });
        self
    }

    pub fn contains(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::Contains { field, value: value.into() });
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches<D: Fields + ?Sized>(&self, doc: &D) -> bool {
        self.clauses.iter().all(|clause| clause.matches(doc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub direction: Direction,
}

impl Sort {
    fn compare<D: Fields>(&self, a: &D, b: &D) -> Ordering {
        let ordering = FieldValue::compare(a.field(self.field).as_ref(), b.field(self.field).as_ref());
        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// Filter plus sort, skip and limit, composed before execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self { filter, ..Self::default() }
    }

    pub fn sort(mut self, field: &'static str, direction: Direction) -> Self {
        self.sort = Some(Sort { field, direction });
        self
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Every field name the query touches, for validation against a schema.
    pub fn referenced_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filter
            .clauses()
            .iter()
            .map(Clause::field)
            .chain(self.sort.iter().map(|sort| sort.field))
    }

    /// Runs the query over `docs`. Sorting is stable, so ties keep input order.
    pub fn apply<'a, D, I>(&self, docs: I) -> Vec<D>
    where
        D: Fields + Clone + 'a,
        I: IntoIterator<Item = &'a D>,
    {
        let mut matched: Vec<&D> = docs.into_iter().filter(|doc| self.filter.matches(*doc)).collect();
        if let Some(sort) = &self.sort {
            matched.sort_by(|a, b| sort.compare(*a, *b));
        }
        matched
            .into_iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Ticket {
        id: String,
        state: String,
        labels: Vec<String>,
    }

    impl Fields for Ticket {
        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "id" => Some(FieldValue::Str(self.id.clone())),
                "state" => Some(FieldValue::Str(self.state.clone())),
                "labels" => Some(FieldValue::List(self.labels.clone())),
                _ => None,
            }
        }
    }

    fn ticket(id: &str, state: &str, labels: &[&str]) -> Ticket {
        Ticket {
            id: id.to_string(),
            state: state.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = Filter::new();
        assert!(filter.matches(&ticket("t1", "open", &[])));
    }

    #[test]
    fn clauses_are_combined_with_and() {
        let filter = Filter::new().eq("state", "open").contains("labels", "bug");
        assert!(filter.matches(&ticket("t1", "open", &["bug", "ui"])));
        assert!(!filter.matches(&ticket("t2", "closed", &["bug"])));
        assert!(!filter.matches(&ticket("t3", "open", &["ui"])));
    }

    #[test]
    fn eq_on_list_field_matches_any_element() {
        let clause = Clause::Eq { field: "labels", value: "ui".into() };
        assert!(clause.matches(&ticket("t1", "open", &["bug", "ui"])));
    }

    #[test]
    fn number_equality_agrees_with_index_key() {
        let stored = FieldValue::Number(49.0);
        assert_eq!(stored.index_keys(), vec![number_key(49.0)]);
        for spelling in ["49", "49.0", "4.9e1"] {
            assert!(stored.matches_eq(spelling), "{spelling}");
            assert_eq!(spelling.parse::<f64>().map(number_key), Ok(stored.index_keys()[0].clone()));
        }
        assert!(!stored.matches_eq("forty-nine"));
    }

    #[test]
    fn unknown_field_never_matches() {
        let filter = Filter::new().eq("owner", "bob");
        assert!(!filter.matches(&ticket("t1", "open", &[])));
    }

    #[test]
    fn apply_sorts_then_skips_then_limits() {
        let docs = vec![
            ticket("t3", "open", &[]),
            ticket("t1", "open", &[]),
            ticket("t4", "closed", &[]),
            ticket("t2", "open", &[]),
        ];
        let query = Query::new(Filter::new().eq("state", "open"))
            .sort("id", Direction::Ascending)
            .skip(1)
            .limit(1);
        let page = query.apply(&docs);
        assert_eq!(page, vec![ticket("t2", "open", &[])]);

        let descending = Query::new(Filter::new()).sort("id", Direction::Descending);
        let ids: Vec<String> = descending.apply(&docs).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t4", "t3", "t2", "t1"]);
    }

    #[test]
    fn referenced_fields_include_sort() {
        let query = Query::new(Filter::new().eq("state", "open")).sort("id", Direction::Ascending);
        let fields: Vec<&str> = query.referenced_fields().collect();
        assert_eq!(fields, vec!["state", "id"]);
    }
}
