use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS rest_ws;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO rest_ws, public;")
            .await?;

        // gen_random_uuid() is built in from PostgreSQL 13; older servers need pgcrypto
        manager
            .get_connection()
            .execute_unprepared("CREATE EXTENSION IF NOT EXISTS pgcrypto;")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // CASCADE removes every table left in the schema
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS rest_ws CASCADE;")
            .await?;

        Ok(())
    }
}
