pub mod ddl;
pub mod pg_repo;
