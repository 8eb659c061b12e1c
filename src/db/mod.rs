//! SQLite-backed document store for packages, versions and custom elements.
//!
//! `create_*_if_absent` are the only concurrency control the import pipeline
//! relies on across processes: exactly one caller can create a given row.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

const PACKAGE_COLUMNS: &str = "name, status, last_update, description, dist_tags";
const VERSION_COLUMNS: &str = "package, version, status, last_update, description, module_type, author, time, homepage, dist_tags, custom_elements_manifest";
const ELEMENT_COLUMNS: &str = "id, package, version, author, dist_tags, tag_name, class_name, custom_element_export, declaration";

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Package operations
    // ============================================================

    /// Creates a package row unless one exists. Returns `false` if it did.
    pub fn create_package_if_absent(&self, name: &str, status: PackageStatus) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "INSERT INTO packages (name, status, last_update) VALUES (?, ?, ?)
             ON CONFLICT(name) DO NOTHING",
            (name, status.as_str(), Utc::now().to_rfc3339()),
        )?;
        Ok(rows == 1)
    }

    /// Writes the final fields of a package, creating the row if needed.
    pub fn set_package(&self, name: &str, input: SetPackageInput) -> Result<PackageRecord> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();

        conn.execute(
            "INSERT INTO packages (name, status, last_update, description, dist_tags)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(name) DO UPDATE SET
                status = ?2, last_update = ?3, description = ?4, dist_tags = ?5",
            (
                name,
                input.status.as_str(),
                now.to_rfc3339(),
                &input.description,
                serde_json::to_string(&input.dist_tags)?,
            ),
        )?;

        Ok(PackageRecord {
            name: name.to_string(),
            status: input.status,
            last_update: now,
            description: input.description,
            dist_tags: input.dist_tags,
        })
    }

    pub fn get_package(&self, name: &str) -> Result<Option<PackageRecord>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let package = conn
            .query_row(
                &format!("SELECT {} FROM packages WHERE name = ?", PACKAGE_COLUMNS),
                [name],
                package_from_row,
            )
            .optional()?;
        Ok(package)
    }

    pub fn get_all_packages(&self) -> Result<Vec<PackageRecord>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM packages ORDER BY name",
            PACKAGE_COLUMNS
        ))?;

        let packages = stmt
            .query_map([], package_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(packages)
    }

    /// Deletes the package row only. Versions must be deleted first.
    pub fn delete_package(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM packages WHERE name = ?", [name])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Version operations
    // ============================================================

    /// Creates a version row unless one exists. Returns `false` if it did.
    pub fn create_version_if_absent(
        &self,
        package: &str,
        version: &str,
        status: VersionStatus,
    ) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "INSERT INTO versions (package, version, status, last_update) VALUES (?, ?, ?, ?)
             ON CONFLICT(package, version) DO NOTHING",
            (package, version, status.as_str(), Utc::now().to_rfc3339()),
        )?;
        Ok(rows == 1)
    }

    pub fn set_version(
        &self,
        package: &str,
        version: &str,
        input: SetVersionInput,
    ) -> Result<VersionRecord> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();

        conn.execute(
            "INSERT INTO versions (package, version, status, last_update, description, module_type,
                                   author, time, homepage, dist_tags, custom_elements_manifest)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(package, version) DO UPDATE SET
                status = ?3, last_update = ?4, description = ?5, module_type = ?6, author = ?7,
                time = ?8, homepage = ?9, dist_tags = ?10, custom_elements_manifest = ?11",
            rusqlite::params![
                package,
                version,
                input.status.as_str(),
                now.to_rfc3339(),
                &input.description,
                input.module_type.as_str(),
                &input.author,
                input.time.map(|t| t.to_rfc3339()),
                &input.homepage,
                serde_json::to_string(&input.dist_tags)?,
                &input.custom_elements_manifest,
            ],
        )?;

        Ok(VersionRecord {
            package: package.to_string(),
            version: version.to_string(),
            status: input.status,
            last_update: now,
            description: input.description,
            module_type: input.module_type,
            author: input.author,
            time: input.time,
            homepage: input.homepage,
            dist_tags: input.dist_tags,
            custom_elements_manifest: input.custom_elements_manifest,
        })
    }

    pub fn get_version(&self, package: &str, version: &str) -> Result<Option<VersionRecord>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM versions WHERE package = ? AND version = ?",
                    VERSION_COLUMNS
                ),
                [package, version],
                version_from_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn get_versions(&self, package: &str) -> Result<Vec<VersionRecord>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM versions WHERE package = ? ORDER BY version",
            VERSION_COLUMNS
        ))?;

        let versions = stmt
            .query_map([package], version_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(versions)
    }

    /// Deletes a version and, by cascade, its custom elements.
    pub fn delete_version(&self, package: &str, version: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "DELETE FROM versions WHERE package = ? AND version = ?",
            [package, version],
        )?;
        Ok(rows > 0)
    }

    // ============================================================
    // Custom element operations
    // ============================================================

    /// Adds a custom element to a version, copying the version's author and
    /// dist tags onto it.
    pub fn add_custom_element(
        &self,
        package: &str,
        version: &str,
        input: NewCustomElement,
    ) -> Result<CustomElementRecord> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();

        let rows = conn.execute(
            "INSERT INTO custom_elements (id, package, version, author, dist_tags, tag_name,
                                          class_name, custom_element_export, declaration)
             SELECT ?, package, version, author, dist_tags, ?, ?, ?, ?
             FROM versions WHERE package = ? AND version = ?",
            (
                id.to_string(),
                &input.tag_name,
                &input.class_name,
                &input.custom_element_export,
                &input.declaration,
                package,
                version,
            ),
        )?;
        if rows == 0 {
            anyhow::bail!("Version not found: {}@{}", package, version);
        }

        let record = conn.query_row(
            &format!("SELECT {} FROM custom_elements WHERE id = ?", ELEMENT_COLUMNS),
            [id.to_string()],
            element_from_row,
        )?;
        Ok(record)
    }

    pub fn get_custom_elements(
        &self,
        package: &str,
        version: &str,
        tag_name: Option<&str>,
    ) -> Result<Vec<CustomElementRecord>> {
        self.query_elements(&ElementQuery {
            package: Some(package.to_string()),
            version: Some(version.to_string()),
            tag_name: tag_name.map(str::to_string),
            dist_tag: None,
            limit: None,
        })
    }

    /// Queries custom elements across every package. All filters are ANDed.
    /// A `limit` of zero is ignored.
    pub fn query_elements(&self, query: &ElementQuery) -> Result<Vec<CustomElementRecord>> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let mut filters = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(package) = &query.package {
            filters.push("package = ?");
            params.push(Box::new(package.clone()));
        }
        if let Some(version) = &query.version {
            filters.push("version = ?");
            params.push(Box::new(version.clone()));
        }
        if let Some(tag_name) = &query.tag_name {
            filters.push("tag_name = ?");
            params.push(Box::new(tag_name.clone()));
        }
        if let Some(dist_tag) = &query.dist_tag {
            filters.push("EXISTS (SELECT 1 FROM json_each(custom_elements.dist_tags) WHERE value = ?)");
            params.push(Box::new(dist_tag.clone()));
        }

        let mut sql = format!("SELECT {} FROM custom_elements", ELEMENT_COLUMNS);
        if !filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filters.join(" AND "));
        }
        sql.push_str(" ORDER BY rowid");
        // A zero limit means no limit.
        if let Some(limit) = query.limit.filter(|limit| *limit > 0) {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit));
        }

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let elements = stmt
            .query_map(params_ref.as_slice(), element_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(elements)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "wc-catalog")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("catalog.db"))
}

fn package_from_row(row: &Row<'_>) -> rusqlite::Result<PackageRecord> {
    let status: String = row.get(1)?;
    Ok(PackageRecord {
        name: row.get(0)?,
        status: PackageStatus::from_str(&status)
            .ok_or_else(|| unknown_value(1, "package status", status))?,
        last_update: parse_datetime(row.get::<_, String>(2)?),
        description: row.get(3)?,
        dist_tags: serde_json::from_str(&row.get::<_, String>(4)?).unwrap_or_default(),
    })
}

fn version_from_row(row: &Row<'_>) -> rusqlite::Result<VersionRecord> {
    let status: String = row.get(2)?;
    let module_type: String = row.get(5)?;
    Ok(VersionRecord {
        package: row.get(0)?,
        version: row.get(1)?,
        status: VersionStatus::from_str(&status)
            .ok_or_else(|| unknown_value(2, "version status", status))?,
        last_update: parse_datetime(row.get::<_, String>(3)?),
        description: row.get(4)?,
        module_type: ModuleType::from_str(&module_type).unwrap_or_default(),
        author: row.get(6)?,
        time: row.get::<_, Option<String>>(7)?.map(parse_datetime),
        homepage: row.get(8)?,
        dist_tags: serde_json::from_str(&row.get::<_, String>(9)?).unwrap_or_default(),
        custom_elements_manifest: row.get(10)?,
    })
}

fn element_from_row(row: &Row<'_>) -> rusqlite::Result<CustomElementRecord> {
    Ok(CustomElementRecord {
        id: parse_uuid(row.get::<_, String>(0)?),
        package: row.get(1)?,
        version: row.get(2)?,
        author: row.get(3)?,
        dist_tags: serde_json::from_str(&row.get::<_, String>(4)?).unwrap_or_default(),
        tag_name: row.get(5)?,
        class_name: row.get(6)?,
        custom_element_export: row.get(7)?,
        declaration: row.get(8)?,
    })
}

fn unknown_value(idx: usize, kind: &str, value: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unknown {} `{}`", kind, value).into(),
    )
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
