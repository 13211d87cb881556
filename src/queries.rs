//! Query functions over the sample tables.
//!
//! Every function submits exactly one statement. Caller values are always
//! bound as parameters, never spliced into the SQL text.

use crate::error::Result;
use crate::params;
use crate::query::SqlQuery;
use crate::sqlite::{Executor, Row};

pub async fn get_people(db: &impl Executor) -> Result<Vec<Row>> {
    db.raw(SqlQuery::new("SELECT * FROM people")).await
}

/// Every row in the pets table
pub async fn get_pets(db: &impl Executor) -> Result<Vec<Row>> {
    db.raw(SqlQuery::new("SELECT * FROM pets")).await
}

pub async fn get_pet_owners(db: &impl Executor) -> Result<Vec<Row>> {
    let sql = r#"
        SELECT people.name AS owner, pets.name AS pet, pets.type
        FROM people
        JOIN pets ON pets.owner_id = people.id
        ORDER BY people.name, pets.name
    "#;
    db.raw(SqlQuery::new(sql)).await
}

pub async fn get_customer_orders(db: &impl Executor) -> Result<Vec<Row>> {
    let sql = r#"
        SELECT customers.name AS customer,
               products.name AS product,
               orders.quantity,
               products.price * orders.quantity AS total,
               orders.ordered_at
        FROM orders
        JOIN customers ON customers.id = orders.customer_id
        JOIN products ON products.id = orders.product_id
        ORDER BY orders.ordered_at
    "#;
    db.raw(SqlQuery::new(sql)).await
}

pub async fn get_books_with_authors(db: &impl Executor) -> Result<Vec<Row>> {
    let sql = r#"
        SELECT books.title, authors.name AS author
        FROM books
        JOIN authors_books ON authors_books.book_id = books.id
        JOIN authors ON authors.id = authors_books.author_id
        ORDER BY books.title, authors.name
    "#;
    db.raw(SqlQuery::new(sql)).await
}

pub async fn get_pets_by_type(db: &impl Executor, pet_type: &str) -> Result<Vec<Row>> {
    let query = SqlQuery::new("SELECT * FROM pets WHERE type = ?").bind(pet_type);
    db.raw(query).await
}

/// Pets of one type whose owner has exactly this name
pub async fn get_pets_by_owner_name_and_type(
    db: &impl Executor,
    owner_name: &str,
    pet_type: &str,
) -> Result<Vec<Row>> {
    let sql = r#"
        SELECT pets.*, people.name AS owner
        FROM pets
        JOIN people ON people.id = pets.owner_id
        WHERE people.name = ? AND pets.type = ?
    "#;
    let query = SqlQuery::new(sql).with_params(params![owner_name, pet_type]);
    db.raw(query).await
}

pub async fn get_orders_by_customer_email(db: &impl Executor, email: &str) -> Result<Vec<Row>> {
    let sql = r#"
        SELECT orders.*
        FROM orders
        JOIN customers ON customers.id = orders.customer_id
        WHERE customers.email = ?
        ORDER BY orders.id
    "#;
    db.raw(SqlQuery::new(sql).bind(email)).await
}

pub async fn get_books_by_author(db: &impl Executor, author_name: &str) -> Result<Vec<Row>> {
    let sql = r#"
        SELECT books.*
        FROM books
        JOIN authors_books ON authors_books.book_id = books.id
        JOIN authors ON authors.id = authors_books.author_id
        WHERE authors.name = ?
        ORDER BY books.published_year
    "#;
    db.raw(SqlQuery::new(sql).bind(author_name)).await
}

pub async fn get_products_cheaper_than(db: &impl Executor, price: f64) -> Result<Vec<Row>> {
    let query = SqlQuery::new("SELECT * FROM products WHERE price < ? ORDER BY price").bind(price);
    db.raw(query).await
}

/// Insert a pet and return the stored row
pub async fn create_pet(
    db: &impl Executor,
    name: &str,
    pet_type: &str,
    owner_id: i64,
) -> Result<Option<Row>> {
    let sql = "INSERT INTO pets (name, type, owner_id) VALUES (?, ?, ?) RETURNING *";
    let query = SqlQuery::new(sql).with_params(params![name, pet_type, owner_id]);
    db.raw_one(query).await
}

/// Rename a pet, returning the rows that changed
pub async fn update_pet_name(db: &impl Executor, id: i64, name: &str) -> Result<Vec<Row>> {
    let query = SqlQuery::new("UPDATE pets SET name = ? WHERE id = ? RETURNING *")
        .with_params(params![name, id]);
    db.raw(query).await
}

/// Delete a pet, returning the removed row
pub async fn delete_pet(db: &impl Executor, id: i64) -> Result<Option<Row>> {
    let query = SqlQuery::new("DELETE FROM pets WHERE id = ? RETURNING *").bind(id);
    db.raw_one(query).await
}
