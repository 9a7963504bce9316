//! Statements for clinic and shared tables.
//!
//! Identifiers are spliced only through [`SchemaName::qualify`]; values are
//! always bind parameters.

use clinica_security::{IdentifierError, SchemaName};

/// Tables every clinic schema carries.
pub const BASELINE_TABLES: [&str; 5] = [
    "portal_configuracion",
    "usuario",
    "usuarioperiferico",
    "profesional_salud",
    "usuario_salud",
];

/// Row id of the single portal configuration row.
pub const PORTAL_CONFIG_ID: i64 = 1;

/// `CREATE TABLE IF NOT EXISTS` for every baseline table, in creation order.
///
/// # Errors
/// [`IdentifierError`] if a table name fails quoting.
pub fn baseline_tables(schema: &SchemaName) -> Result<Vec<String>, IdentifierError> {
    let portal = schema.qualify("portal_configuracion")?;
    let usuario = schema.qualify("usuario")?;
    let periferico = schema.qualify("usuarioperiferico")?;
    let profesional = schema.qualify("profesional_salud")?;
    let paciente = schema.qualify("usuario_salud")?;

    Ok(vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {portal} (\
             id BIGSERIAL PRIMARY KEY, \
             color_primario VARCHAR(7) DEFAULT '#007bff', \
             color_secundario VARCHAR(7) DEFAULT '#6c757d', \
             logo_url VARCHAR(512), \
             nombre_portal VARCHAR(100))"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {usuario} (\
             id BIGINT PRIMARY KEY, \
             nombre VARCHAR(255) NOT NULL, \
             email VARCHAR(255) NOT NULL)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {periferico} (\
             id BIGINT PRIMARY KEY, \
             nickname VARCHAR(255) UNIQUE NOT NULL, \
             password_hash VARCHAR(255) NOT NULL, \
             dtype VARCHAR(31) NOT NULL)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {profesional} (\
             id BIGINT PRIMARY KEY, \
             nickname VARCHAR(255) UNIQUE, \
             nombre VARCHAR(255) NOT NULL, \
             email VARCHAR(255), \
             especialidad VARCHAR(64) NOT NULL, \
             departamento VARCHAR(64), \
             calidad VARCHAR(255), \
             direccion VARCHAR(255))"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {paciente} (\
             id BIGSERIAL PRIMARY KEY, \
             cod_doc VARCHAR(32) UNIQUE NOT NULL, \
             nombre VARCHAR(255) NOT NULL, \
             segundo_apellido VARCHAR(255), \
             fecha_nacimiento DATE, \
             direccion VARCHAR(255), \
             telefono VARCHAR(32), \
             email VARCHAR(255), \
             departamento VARCHAR(64), \
             localidad VARCHAR(128), \
             hcen_user_id VARCHAR(64), \
             fecha_alta TIMESTAMPTZ NOT NULL DEFAULT now(), \
             fecha_actualizacion TIMESTAMPTZ)"
        ),
    ])
}

/// Seeds the configuration row; binds `$1` primary color and `$2` portal name.
///
/// # Errors
/// [`IdentifierError`] if the table name fails quoting.
pub fn seed_portal_config(schema: &SchemaName) -> Result<String, IdentifierError> {
    Ok(format!(
        "INSERT INTO {} (id, color_primario, nombre_portal) VALUES ({PORTAL_CONFIG_ID}, $1, $2) \
         ON CONFLICT (id) DO NOTHING",
        schema.qualify("portal_configuracion")?
    ))
}

/// Shared tables in `public`.
pub const SHARED_TABLES: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS public.nodoperiferico (\
     id VARCHAR(48) PRIMARY KEY, \
     nombre VARCHAR(100) NOT NULL, \
     rut VARCHAR(32), \
     schema_name VARCHAR(63) NOT NULL, \
     activation_ref UUID NOT NULL, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS public.usuario (\
     id BIGINT PRIMARY KEY, \
     nombre VARCHAR(255) NOT NULL, \
     email VARCHAR(255) NOT NULL)",
    "CREATE TABLE IF NOT EXISTS public.usuarioperiferico (\
     id BIGINT PRIMARY KEY, \
     nickname VARCHAR(255) UNIQUE NOT NULL, \
     password_hash VARCHAR(255), \
     dtype VARCHAR(31) NOT NULL, \
     tenant_id VARCHAR(48), \
     role VARCHAR(50))",
    "CREATE TABLE IF NOT EXISTS public.administradorclinica (\
     id BIGINT PRIMARY KEY, \
     nodo_periferico_id VARCHAR(48))",
];

/// Well-known administrator of tenant `101`. Password `password123`.
///
/// The tenant's schema is provisioned by the bootstrap that runs these.
pub const SEED_ADMIN: [&str; 3] = [
    "INSERT INTO public.usuario (id, nombre, email) \
     VALUES (5001, 'Admin Global C1', 'admin.c1@global') ON CONFLICT (id) DO NOTHING",
    "INSERT INTO public.usuarioperiferico (id, nickname, password_hash, dtype, tenant_id, role) \
     VALUES (5001, 'admin_c1', '$2b$12$i4KLHFvjqcWCJ5kiIapVHuLPiXWftj/ZXIlDStUCRwzkS3bi0mfOO', \
     'AdministradorClinica', '101', 'ADMINISTRADOR') ON CONFLICT DO NOTHING",
    "INSERT INTO public.administradorclinica (id, nodo_periferico_id) \
     VALUES (5001, '101') ON CONFLICT (id) DO NOTHING",
];

/// Binds `$1` id, `$2` nombre, `$3` rut, `$4` schema name, `$5` activation ref.
///
/// The conflict branch leaves `id`, `schema_name` and `activation_ref` alone,
/// so `RETURNING` yields the reference issued on first registration.
pub const UPSERT_REGISTRY: &str = "INSERT INTO public.nodoperiferico \
     (id, nombre, rut, schema_name, activation_ref) VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (id) DO UPDATE SET nombre = EXCLUDED.nombre, rut = EXCLUDED.rut \
     RETURNING activation_ref";

pub const LIST_REGISTRY: &str = "SELECT id, nombre, rut, schema_name, created_at \
     FROM public.nodoperiferico ORDER BY id";

/// Serializes DDL for one schema across concurrent callers; binds `$1` schema name.
pub const SCHEMA_LOCK: &str = "SELECT pg_advisory_xact_lock(hashtext($1))";
