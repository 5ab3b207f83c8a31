//! SQL schema for the catalog hierarchy.
//!
//! Executed once at connection startup. The inventory table belongs to the
//! surrounding application; it is only created here when absent so the store
//! can run standalone. Its three link columns are added by
//! [`LINK_COLUMNS`] when missing.

/// Hierarchy DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS manufacturers (
    manufacturer_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name_ar         TEXT NOT NULL,
    name_en         TEXT,
    logo            TEXT,
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    category_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    manufacturer_id INTEGER NOT NULL REFERENCES manufacturers(manufacturer_id),
    name_ar         TEXT NOT NULL,
    name_en         TEXT,
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS trim_levels (
    trim_level_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id     INTEGER NOT NULL REFERENCES categories(category_id),
    name_ar         TEXT NOT NULL,
    name_en         TEXT,
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL
);

-- Names are unique per scope among active rows only.
CREATE UNIQUE INDEX IF NOT EXISTS manufacturers_active_name_uq
    ON manufacturers(name_ar) WHERE is_active = 1;
CREATE UNIQUE INDEX IF NOT EXISTS categories_active_name_uq
    ON categories(manufacturer_id, name_ar) WHERE is_active = 1;
CREATE UNIQUE INDEX IF NOT EXISTS trim_levels_active_name_uq
    ON trim_levels(category_id, name_ar) WHERE is_active = 1;

-- Parent ids never change once set.
CREATE TRIGGER IF NOT EXISTS categories_manufacturer_immutable
    BEFORE UPDATE OF manufacturer_id ON categories
    WHEN NEW.manufacturer_id IS NOT OLD.manufacturer_id
BEGIN
    SELECT RAISE(ABORT, 'categories.manufacturer_id is immutable');
END;

CREATE TRIGGER IF NOT EXISTS trim_levels_category_immutable
    BEFORE UPDATE OF category_id ON trim_levels
    WHEN NEW.category_id IS NOT OLD.category_id
BEGIN
    SELECT RAISE(ABORT, 'trim_levels.category_id is immutable');
END;

CREATE TABLE IF NOT EXISTS inventory_items (
    item_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    manufacturer TEXT,
    category     TEXT,
    trim_level   TEXT
);

-- At most one row: the holder of the run lock.
CREATE TABLE IF NOT EXISTS catalog_run_lock (
    lock_id     INTEGER PRIMARY KEY CHECK (lock_id = 1),
    run_id      TEXT NOT NULL,
    holder      TEXT NOT NULL,
    acquired_at TEXT NOT NULL
);

PRAGMA user_version = 1;
";

/// `(column, referenced table(column))` pairs added to `inventory_items`.
pub const LINK_COLUMNS: [(&str, &str); 3] = [
  ("manufacturer_id", "manufacturers(manufacturer_id)"),
  ("category_id", "categories(category_id)"),
  ("trim_level_id", "trim_levels(trim_level_id)"),
];

/// Indexes over the link columns; run after [`LINK_COLUMNS`] exist.
pub const LINK_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS inventory_items_manufacturer_idx ON inventory_items(manufacturer_id);
CREATE INDEX IF NOT EXISTS inventory_items_category_idx     ON inventory_items(category_id);
CREATE INDEX IF NOT EXISTS inventory_items_trim_level_idx   ON inventory_items(trim_level_id);
";
