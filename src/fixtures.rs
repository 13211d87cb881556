//! Sample tables and rows the query functions run against.

use tracing::info;

use crate::error::Result;
use crate::sqlite::Database;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS people (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER
);
CREATE TABLE IF NOT EXISTS pets (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    age INTEGER,
    owner_id INTEGER REFERENCES people(id) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS customers (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL
);
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    price REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY,
    customer_id INTEGER NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES products(id),
    quantity INTEGER NOT NULL DEFAULT 1,
    ordered_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    published_year INTEGER
);
CREATE TABLE IF NOT EXISTS authors_books (
    author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    PRIMARY KEY (author_id, book_id)
);
"#;

const SEED: &str = r#"
DELETE FROM authors_books;
DELETE FROM books;
DELETE FROM authors;
DELETE FROM orders;
DELETE FROM products;
DELETE FROM customers;
DELETE FROM pets;
DELETE FROM people;

INSERT INTO people (id, name, age) VALUES
    (1, 'Ann Duong', 34),
    (2, 'Sue Smith', 52),
    (3, 'Burt Kim', 27);

INSERT INTO pets (id, name, type, age, owner_id) VALUES
    (1, 'Rover', 'dog', 4, 1),
    (2, 'Mittens', 'cat', 7, 1),
    (3, 'Koda', 'dog', 2, 1),
    (4, 'Fido', 'dog', 9, 2),
    (5, 'Goldie', 'fish', 1, 3);

INSERT INTO customers (id, name, email) VALUES
    (1, 'Maria Lopez', 'maria@example.com'),
    (2, 'Tom Baker', 'tom@example.com');

INSERT INTO products (id, name, price) VALUES
    (1, 'Leash', 12.5),
    (2, 'Dog Bed', 49.99),
    (3, 'Fish Food', 4.25);

INSERT INTO orders (id, customer_id, product_id, quantity, ordered_at) VALUES
    (1, 1, 1, 2, '2024-01-05 10:00:00'),
    (2, 1, 3, 1, '2024-01-12 16:30:00'),
    (3, 2, 2, 1, '2024-02-01 09:15:00');

INSERT INTO authors (id, name) VALUES
    (1, 'Ursula K. Le Guin'),
    (2, 'Terry Pratchett'),
    (3, 'Neil Gaiman');

INSERT INTO books (id, title, published_year) VALUES
    (1, 'A Wizard of Earthsea', 1968),
    (2, 'Good Omens', 1990),
    (3, 'Small Gods', 1992);

INSERT INTO authors_books (author_id, book_id) VALUES
    (1, 1),
    (2, 2),
    (3, 2),
    (2, 3);
"#;

/// Create the sample tables if they do not exist yet
pub async fn create_schema(db: &Database) -> Result<()> {
    db.execute_batch(SCHEMA).await
}

/// Replace the contents of every sample table with the demo rows
pub async fn seed(db: &Database) -> Result<()> {
    create_schema(db).await?;
    db.execute_batch(SEED).await?;
    info!("seeded sample data into {}", db.name());
    Ok(())
}
