use std::cmp::Ordering;

use chrono::DateTime;
use serde_yaml::Value;

use crate::{Entity, StoreError};

/// Narrowing, ordering and paging of a list query
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filter: FilterOptions,
    pub sort_by: Vec<SortOption>,
    /// 1-based; paging applies only when both page and page_size are positive
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub queries: Vec<FuzzyQueryOption>,
}

/// Keeps records whose string field `key` contains `query`.
/// `key` may be a dotted path into nested fields.
#[derive(Debug, Clone)]
pub struct FuzzyQueryOption {
    pub key: String,
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct SortOption {
    pub key: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl ListOptions {
    pub fn page(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn sort(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by.push(SortOption {
            key: key.into(),
            order,
        });
        self
    }

    pub fn query(mut self, key: impl Into<String>, query: impl Into<String>) -> Self {
        self.filter = self.filter.query(key, query);
        self
    }

    fn window(&self) -> Option<(usize, usize)> {
        if self.page > 0 && self.page_size > 0 {
            let size = self.page_size as usize;
            Some(((self.page as usize - 1).saturating_mul(size), size))
        } else {
            None
        }
    }
}

impl FilterOptions {
    pub fn query(mut self, key: impl Into<String>, query: impl Into<String>) -> Self {
        self.queries.push(FuzzyQueryOption {
            key: key.into(),
            query: query.into(),
        });
        self
    }

    pub fn matches(&self, value: &Value) -> bool {
        self.queries.iter().all(|q| match lookup(value, &q.key) {
            Some(Value::String(field)) => field.contains(&q.query),
            _ => false,
        })
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, part| current.get(part))
}

fn compare(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(l)), Some(Value::Number(r))) => l
            .as_f64()
            .partial_cmp(&r.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(l)), Some(Value::String(r))) => {
            match (DateTime::parse_from_rfc3339(l), DateTime::parse_from_rfc3339(r)) {
                (Ok(l), Ok(r)) => l.cmp(&r),
                _ => l.cmp(r),
            }
        }
        _ => Ordering::Equal,
    }
}

struct Candidate<'a, E> {
    key: &'a str,
    raw: &'a Value,
    entity: E,
}

fn matching<'a, E, I>(
    records: I,
    template: &E,
    filter: Option<&FilterOptions>,
) -> Result<Vec<Candidate<'a, E>>, StoreError>
where
    E: Entity,
    I: Iterator<Item = (&'a String, &'a Value)>,
{
    let wanted = template.index();
    let mut selected = vec![];
    for (key, raw) in records {
        if filter.is_some_and(|f| !f.matches(raw)) {
            continue;
        }
        let entity: E = serde_yaml::from_value(raw.clone())?;
        let index = entity.index();
        if wanted.iter().all(|(k, v)| index.get(k) == Some(v)) {
            selected.push(Candidate { key, raw, entity });
        }
    }
    Ok(selected)
}

/// apply index selection and list options to the records of one table
pub(crate) fn select<'a, E, I>(
    records: I,
    template: &E,
    options: Option<&ListOptions>,
) -> Result<Vec<E>, StoreError>
where
    E: Entity,
    I: Iterator<Item = (&'a String, &'a Value)>,
{
    let mut selected = matching(records, template, options.map(|op| &op.filter))?;
    selected.sort_by(|a, b| a.key.cmp(b.key));

    let Some(options) = options else {
        return Ok(selected.into_iter().map(|c| c.entity).collect());
    };

    if !options.sort_by.is_empty() {
        selected.sort_by(|a, b| {
            options
                .sort_by
                .iter()
                .map(|op| {
                    let ord = compare(lookup(a.raw, &op.key), lookup(b.raw, &op.key));
                    match op.order {
                        SortOrder::Ascending => ord,
                        SortOrder::Descending => ord.reverse(),
                    }
                })
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }

    let entities = selected.into_iter().map(|c| c.entity);
    Ok(match options.window() {
        Some((skip, take)) => entities.skip(skip).take(take).collect(),
        None => entities.collect(),
    })
}

pub(crate) fn count<'a, E, I>(
    records: I,
    template: &E,
    filter: Option<&FilterOptions>,
) -> Result<u64, StoreError>
where
    E: Entity,
    I: Iterator<Item = (&'a String, &'a Value)>,
{
    Ok(matching(records, template, filter)?.len() as u64)
}
