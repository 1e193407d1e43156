pub mod commerce;
pub mod errors;
pub mod order;
pub mod party;
pub mod ports;
pub mod product;

#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: i64,
}

