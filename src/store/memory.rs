//! In-process repository: one ordered map per table behind an async RwLock.

use super::{ChildLinks, Page, ParentRepository, Repository};
use crate::domain::{ChildOf, EntityFields, EntityId, ParentOf, Persisted, Record, TableDef};
use crate::error::AppError;
use crate::query::{Direction, ListQuery, Order};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Table<F> {
    rows: BTreeMap<EntityId, F>,
    /// Next id to hand out. Never reused, even after deletes.
    next_id: i64,
}

impl<F: EntityFields> Table<F> {
    /// Inserts or replaces. Fields must already be validated.
    fn store(&mut self, record: Record<F>) -> Result<Persisted<F>, AppError> {
        match record {
            Record::Unsaved(fields) => {
                let id = EntityId::new(self.next_id);
                self.next_id += 1;
                self.rows.insert(id, fields.clone());
                Ok(Persisted::new(id, fields))
            }
            Record::Saved(p) => match self.rows.get_mut(&p.id()) {
                Some(slot) => {
                    *slot = p.fields.clone();
                    Ok(p)
                }
                None => Err(AppError::NotFound(format!("{} {}", F::ENTITY_NAME, p.id()))),
            },
        }
    }

    fn check_all_exist(&self, ids: &[EntityId]) -> Result<(), AppError> {
        match ids.iter().find(|id| !self.rows.contains_key(*id)) {
            Some(missing) => Err(AppError::BadRequest(format!("{} {} does not exist", F::ENTITY_NAME, missing))),
            None => Ok(()),
        }
    }
}

impl<F: ChildOf> Table<F> {
    fn relink(&mut self, parent: EntityId, children: &[EntityId]) {
        for (id, fields) in self.rows.iter_mut() {
            if children.contains(id) {
                fields.set_parent(Some(parent));
            } else if fields.parent() == Some(parent) {
                fields.set_parent(None);
            }
        }
    }
}

#[derive(Clone)]
pub struct MemoryRepository<F> {
    table: Arc<RwLock<Table<F>>>,
}

impl<F> MemoryRepository<F> {
    pub fn new() -> Self {
        MemoryRepository {
            table: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }
}

impl<F> Default for MemoryRepository<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Row with its fields as a column-keyed JSON object, for sorting by column name.
struct SortRow<F> {
    id: EntityId,
    fields: F,
    columns: Value,
}

impl<F> SortRow<F> {
    fn key(&self, column: &str) -> Value {
        if column == TableDef::PK {
            return Value::from(self.id.get());
        }
        self.columns.get(column).cloned().unwrap_or(Value::Null)
    }
}

/// Nulls sort after every value ascending and before every value descending, as in PostgreSQL.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn compare_rows<F>(a: &SortRow<F>, b: &SortRow<F>, orders: &[Order]) -> Ordering {
    for order in orders {
        let ord = compare_values(&a.key(&order.column), &b.key(&order.column));
        let ord = match order.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl<F: EntityFields> Repository<F> for MemoryRepository<F> {
    async fn find_all(&self, query: &ListQuery) -> Result<Page<F>, AppError> {
        let table = self.table.read().await;
        let total = table.rows.len() as u64;
        let mut rows: Vec<SortRow<F>> = table
            .rows
            .iter()
            .map(|(id, fields)| SortRow {
                id: *id,
                fields: fields.clone(),
                columns: serde_json::to_value(fields).unwrap_or(Value::Null),
            })
            .collect();
        drop(table);

        if !query.sort.is_empty() {
            let orders = query.sort.orders_with_tiebreak();
            rows.sort_by(|a, b| compare_rows(a, b, &orders));
        }
        let rows = rows.into_iter();
        let items: Vec<Persisted<F>> = match query.page {
            Some(page) => rows
                .skip(page.offset() as usize)
                .take(page.size as usize)
                .map(|r| Persisted::new(r.id, r.fields))
                .collect(),
            None => rows.map(|r| Persisted::new(r.id, r.fields)).collect(),
        };
        Ok(Page { items, total })
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.table.read().await.rows.len() as u64)
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Persisted<F>>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).map(|f| Persisted::new(id, f.clone())))
    }

    async fn find_all_by_id(&self, ids: &[EntityId]) -> Result<Vec<Persisted<F>>, AppError> {
        let table = self.table.read().await;
        let mut wanted = ids.to_vec();
        wanted.sort();
        wanted.dedup();
        Ok(wanted
            .into_iter()
            .filter_map(|id| table.rows.get(&id).map(|f| Persisted::new(id, f.clone())))
            .collect())
    }

    async fn exists_by_id(&self, id: EntityId) -> Result<bool, AppError> {
        Ok(self.table.read().await.rows.contains_key(&id))
    }

    async fn save(&self, record: Record<F>) -> Result<Persisted<F>, AppError> {
        record.fields().validate()?;
        self.table.write().await.store(record)
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, AppError> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl<F: ChildOf> ChildLinks for MemoryRepository<F> {
    async fn children_of(&self, parent: EntityId) -> Result<Vec<EntityId>, AppError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .filter(|(_, f)| f.parent() == Some(parent))
            .map(|(id, _)| *id)
            .collect())
    }

    async fn replace_children(&self, parent: EntityId, children: &[EntityId]) -> Result<(), AppError> {
        let mut table = self.table.write().await;
        table.check_all_exist(children)?;
        table.relink(parent, children);
        Ok(())
    }
}

/// Parent table paired with the child table that points at it.
/// Combined writes lock the parent table, then the child table.
#[derive(Clone)]
pub struct MemoryParentRepository<P: ParentOf> {
    rows: MemoryRepository<P>,
    children: MemoryRepository<P::Child>,
}

impl<P: ParentOf> MemoryParentRepository<P> {
    pub fn new(rows: MemoryRepository<P>, children: MemoryRepository<P::Child>) -> Self {
        MemoryParentRepository { rows, children }
    }
}

#[async_trait]
impl<P: ParentOf> Repository<P> for MemoryParentRepository<P> {
    async fn find_all(&self, query: &ListQuery) -> Result<Page<P>, AppError> {
        self.rows.find_all(query).await
    }

    async fn count(&self) -> Result<u64, AppError> {
        self.rows.count().await
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Persisted<P>>, AppError> {
        self.rows.find_by_id(id).await
    }

    async fn find_all_by_id(&self, ids: &[EntityId]) -> Result<Vec<Persisted<P>>, AppError> {
        self.rows.find_all_by_id(ids).await
    }

    async fn exists_by_id(&self, id: EntityId) -> Result<bool, AppError> {
        self.rows.exists_by_id(id).await
    }

    async fn save(&self, record: Record<P>) -> Result<Persisted<P>, AppError> {
        self.rows.save(record).await
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, AppError> {
        self.rows.delete_by_id(id).await
    }
}

#[async_trait]
impl<P: ParentOf> ParentRepository<P> for MemoryParentRepository<P> {
    async fn save_with_children(
        &self,
        record: Record<P>,
        children: Option<&[EntityId]>,
    ) -> Result<Persisted<P>, AppError> {
        record.fields().validate()?;
        let mut parents = self.rows.table.write().await;
        let mut child_rows = self.children.table.write().await;
        if let Some(ids) = children {
            child_rows.check_all_exist(ids)?;
        }
        let saved = parents.store(record)?;
        if let Some(ids) = children {
            child_rows.relink(saved.id(), ids);
        }
        Ok(saved)
    }
}

#[async_trait]
impl<P: ParentOf + ChildOf> ChildLinks for MemoryParentRepository<P> {
    async fn children_of(&self, parent: EntityId) -> Result<Vec<EntityId>, AppError> {
        self.rows.children_of(parent).await
    }

    async fn replace_children(&self, parent: EntityId, children: &[EntityId]) -> Result<(), AppError> {
        self.rows.replace_children(parent, children).await
    }
}
