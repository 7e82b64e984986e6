//! List query parameters: `sort=field[,asc|desc]` (repeatable), `page`, `size`.

use crate::case::to_snake_case;
use crate::domain::TableDef;
use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One sort key. `column` is the storage column name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn by(column: &str, direction: Direction) -> Self {
        Sort {
            orders: vec![Order {
                column: column.to_string(),
                direction,
            }],
        }
    }

    /// Parses `sort` values. In `a,b,desc` the trailing direction applies to every property before it.
    /// Field names are camelCase and must be declared on `table`.
    pub fn parse<'a>(terms: impl IntoIterator<Item = &'a str>, table: &TableDef) -> Result<Self, AppError> {
        let mut orders = Vec::new();
        for term in terms {
            let mut parts: Vec<&str> = term.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
            let direction = match parts.last().map(|p| p.to_ascii_lowercase()) {
                Some(d) if d == "asc" => {
                    parts.pop();
                    Direction::Asc
                }
                Some(d) if d == "desc" => {
                    parts.pop();
                    Direction::Desc
                }
                _ => Direction::Asc,
            };
            for field in parts {
                let column = to_snake_case(field);
                if !table.has_column(&column) {
                    return Err(AppError::BadRequest(format!("unknown sort property: {}", field)));
                }
                orders.push(Order { column, direction });
            }
        }
        Ok(Sort { orders })
    }

    /// Requested orders followed by `id ASC` unless `id` was already requested.
    pub fn orders_with_tiebreak(&self) -> Vec<Order> {
        let mut out = self.orders.clone();
        if !out.iter().any(|o| o.column == TableDef::PK) {
            out.push(Order {
                column: TableDef::PK.to_string(),
                direction: Direction::Asc,
            });
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub sort: Sort,
    /// None lists every row.
    pub page: Option<PageRequest>,
}

impl ListQuery {
    /// Builds a query from raw pairs. Returns it with the pairs that should be carried into pagination links.
    pub fn from_params(params: &[(String, String)], table: &TableDef) -> Result<(Self, Vec<(String, String)>), AppError> {
        let mut page: Option<u32> = None;
        let mut size: Option<u32> = None;
        let mut sort_terms = Vec::new();
        let mut carried = Vec::new();

        for (k, v) in params {
            match k.as_str() {
                "page" => {
                    page = Some(v.parse().map_err(|_| AppError::BadRequest(format!("invalid page: {}", v)))?);
                }
                "size" => {
                    let n: u32 = v.parse().map_err(|_| AppError::BadRequest(format!("invalid size: {}", v)))?;
                    if n == 0 {
                        return Err(AppError::BadRequest("size must be at least 1".into()));
                    }
                    size = Some(n.min(MAX_PAGE_SIZE));
                }
                "sort" => {
                    sort_terms.push(v.as_str());
                    carried.push((k.clone(), v.clone()));
                }
                _ => {}
            }
        }

        let sort = Sort::parse(sort_terms, table)?;
        let page = match (page, size) {
            (None, None) => None,
            (p, s) => Some(PageRequest {
                page: p.unwrap_or(0),
                size: s.unwrap_or(DEFAULT_PAGE_SIZE),
            }),
        };
        Ok((ListQuery { sort, page }, carried))
    }
}
