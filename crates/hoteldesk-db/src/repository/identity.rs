//! SurrealDB implementation of [`IdentityRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.
//!
//! Uniqueness of `email` is enforced by the `idx_identity_email` index;
//! the repository translates a violation into
//! [`DeskError::DuplicateEmail`].

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use hoteldesk_core::error::{DeskError, DeskResult};
use hoteldesk_core::models::identity::{
    CreateIdentity, Identity, IdentityCredentials, LifecycleState, Role, TechnicianCategory,
    UpdateIdentity,
};
use hoteldesk_core::repository::{
    IdentityFilter, IdentityRepository, PaginatedResult, Pagination,
};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct IdentityRow {
    name: String,
    email: String,
    password_hash: String,
    role: String,
    technician_category: Option<String>,
    department: String,
    lifecycle_state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct IdentityRowWithId {
    record_id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    technician_category: Option<String>,
    department: String,
    lifecycle_state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct BootstrapRow {
    #[allow(dead_code)]
    claimed_at: DateTime<Utc>,
}

fn decode<T: std::str::FromStr>(what: &str, raw: &str) -> Result<T, DbError> {
    raw.parse()
        .map_err(|_| DbError::Decode(format!("unknown {what}: {raw}")))
}

impl IdentityRow {
    fn into_credentials(self, id: Uuid) -> Result<IdentityCredentials, DbError> {
        let technician_category = self
            .technician_category
            .as_deref()
            .map(|c| decode::<TechnicianCategory>("technician category", c))
            .transpose()?;
        Ok(IdentityCredentials {
            identity: Identity {
                id,
                name: self.name,
                email: self.email,
                role: decode::<Role>("role", &self.role)?,
                technician_category,
                department: self.department,
                lifecycle_state: decode::<LifecycleState>("lifecycle state", &self.lifecycle_state)?,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            password_hash: self.password_hash,
        })
    }

    fn into_identity(self, id: Uuid) -> Result<Identity, DbError> {
        self.into_credentials(id).map(|c| c.identity)
    }
}

impl IdentityRowWithId {
    fn try_into_credentials(self) -> Result<IdentityCredentials, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        IdentityRow {
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            technician_category: self.technician_category,
            department: self.department,
            lifecycle_state: self.lifecycle_state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_credentials(id)
    }

    fn try_into_identity(self) -> Result<Identity, DbError> {
        self.try_into_credentials().map(|c| c.identity)
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

const CREATE_IDENTITY: &str = "CREATE type::record('identity', $id) SET \
     name = $name, email = $email, \
     password_hash = $password_hash, \
     role = $role, \
     technician_category = $technician_category, \
     department = $department, \
     lifecycle_state = $lifecycle_state";

/// Build a `WHERE` clause from the set filter fields.
fn filter_clause(filter: &IdentityFilter) -> String {
    let mut conds = Vec::new();
    if filter.lifecycle_state.is_some() {
        conds.push("lifecycle_state = $lifecycle_state");
    }
    if filter.role.is_some() {
        conds.push("role = $role");
    }
    if filter.search.is_some() {
        conds.push(
            "(string::contains(string::lowercase(name), $search) \
             OR string::contains(email, $search))",
        );
    }
    if conds.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conds.join(" AND "))
    }
}

/// Parameter bindings for [`filter_clause`].
fn filter_bindings(filter: &IdentityFilter) -> Vec<(&'static str, String)> {
    let mut binds = Vec::new();
    if let Some(state) = filter.lifecycle_state {
        binds.push(("lifecycle_state", state.as_str().to_string()));
    }
    if let Some(role) = filter.role {
        binds.push(("role", role.as_str().to_string()));
    }
    if let Some(ref search) = filter.search {
        binds.push(("search", search.trim().to_lowercase()));
    }
    binds
}

/// SurrealDB implementation of the Identity repository.
#[derive(Clone)]
pub struct SurrealIdentityRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealIdentityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    async fn email_exists(&self, email: &str) -> DeskResult<bool> {
        match self.get_by_email(email).await {
            Ok(_) => Ok(true),
            Err(DeskError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn bootstrap_claimed(&self) -> DeskResult<bool> {
        let mut result = self
            .db
            .query("SELECT claimed_at FROM bootstrap:admin")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<BootstrapRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    /// Run `sql` with the bindings of `input`. Returns the new record id
    /// once every statement has been accepted.
    async fn insert(&self, sql: &str, input: CreateIdentity) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        self.db
            .query(sql)
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .bind(("role", input.role.as_str().to_string()))
            .bind((
                "technician_category",
                input.technician_category.map(|c| c.as_str().to_string()),
            ))
            .bind(("department", input.department))
            .bind(("lifecycle_state", input.lifecycle_state.as_str().to_string()))
            .await?
            .check()
            .map_err(|e| DbError::Rejected(e.to_string()))?;

        Ok(id)
    }
}

impl<C: Connection> IdentityRepository for SurrealIdentityRepository<C> {
    async fn create(&self, input: CreateIdentity) -> DeskResult<Identity> {
        let email = input.email.clone();

        match self.insert(CREATE_IDENTITY, input).await {
            Ok(id) => self.get_by_id(id).await,
            Err(DbError::Rejected(msg)) => {
                // The unique index is the source of truth; a concurrent
                // insert for the same email lands here.
                if self.email_exists(&email).await? {
                    debug!("Unique email index rejected insert");
                    return Err(DeskError::DuplicateEmail);
                }
                Err(DbError::Rejected(msg).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> DeskResult<Identity> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('identity', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdentityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "identity".into(),
            id: id_str,
        })?;

        Ok(row.into_identity(id)?)
    }

    async fn get_by_email(&self, email: &str) -> DeskResult<Identity> {
        Ok(self.get_credentials(email).await?.identity)
    }

    async fn get_credentials(&self, email: &str) -> DeskResult<IdentityCredentials> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM identity WHERE email = $email")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdentityRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "identity".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_credentials()?)
    }

    async fn update(&self, id: Uuid, input: UpdateIdentity) -> DeskResult<Identity> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.technician_category.is_some() {
            sets.push("technician_category = $technician_category");
        }
        if input.department.is_some() {
            sets.push("department = $department");
        }
        if input.lifecycle_state.is_some() {
            sets.push("lifecycle_state = $lifecycle_state");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('identity', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(category) = input.technician_category {
            // Some(None) binds NONE and clears the field.
            builder = builder.bind((
                "technician_category",
                category.map(|c| c.as_str().to_string()),
            ));
        }
        if let Some(department) = input.department {
            builder = builder.bind(("department", department));
        }
        if let Some(state) = input.lifecycle_state {
            builder = builder.bind(("lifecycle_state", state.as_str().to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Rejected(e.to_string()))?;

        let rows: Vec<IdentityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "identity".into(),
            id: id_str,
        })?;

        Ok(row.into_identity(id)?)
    }

    async fn delete(&self, id: Uuid) -> DeskResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('identity', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdentityRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "identity".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn list(
        &self,
        filter: IdentityFilter,
        pagination: Pagination,
    ) -> DeskResult<PaginatedResult<Identity>> {
        let total = self.count(filter.clone()).await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM identity{} \
             ORDER BY created_at ASC \
             LIMIT $limit START $offset",
            filter_clause(&filter)
        );
        let mut builder = self
            .db
            .query(&query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        for binding in filter_bindings(&filter) {
            builder = builder.bind(binding);
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<IdentityRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_identity())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count(&self, filter: IdentityFilter) -> DeskResult<u64> {
        let query = format!(
            "SELECT count() AS total FROM identity{} GROUP ALL",
            filter_clause(&filter)
        );
        let mut builder = self.db.query(&query);
        for binding in filter_bindings(&filter) {
            builder = builder.bind(binding);
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;

        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn create_bootstrap(&self, input: CreateIdentity) -> DeskResult<Option<Identity>> {
        if self.bootstrap_claimed().await? {
            return Ok(None);
        }
        let email = input.email.clone();

        let sql = format!(
            "BEGIN TRANSACTION; \
             CREATE bootstrap:admin SET claimed_at = time::now(); \
             {CREATE_IDENTITY}; \
             COMMIT TRANSACTION;"
        );

        match self.insert(&sql, input).await {
            Ok(id) => self.get_by_id(id).await.map(Some),
            Err(DbError::Hash(msg)) => Err(DbError::Hash(msg).into()),
            // The whole transaction was cancelled; find out why.
            Err(e) => {
                if self.bootstrap_claimed().await? {
                    debug!("Bootstrap slot taken by a concurrent registration");
                    Ok(None)
                } else if self.email_exists(&email).await? {
                    Err(DeskError::DuplicateEmail)
                } else {
                    Err(e.into())
                }
            }
        }
    }
}
